use std::any::Any;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("updates did not settle after {passes} render passes")]
    UpdateLoop { passes: usize },
    #[error("no committed node has id `{0}`")]
    UnknownTarget(String),
    #[error("node `{target}` has no `{event}` handler")]
    NoHandler { target: String, event: String },
}

/// What an error boundary's fallback gets to see.
#[derive(Clone, Debug)]
pub struct ErrorInfo {
    pub message: String,
    /// Name of the boundary's content unit.
    pub component: String,
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    }
}
