/// Misuse of the bridge by the code built on it. These are bugs, never
/// runtime conditions: the hooks turn them into panics.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    #[error("gen effect did not yield dependencies")]
    MissingDependencies,
    #[error("gen effect yielded an empty dependency marker where a list was expected")]
    InvalidDependencies,
    #[error("second yield cannot produce data")]
    DataOnCleanupYield,
    #[error("gen effect did not exit after cleanup")]
    ExtraYield,
    #[error("gen effect returned a cleanup value in the two-yield form")]
    CleanupReturnedValue,
    #[error("gen effect resumed after teardown")]
    ResumedAfterTeardown,
    #[error("gen effect driven out of order: {0}")]
    OutOfOrder(&'static str),
    #[error("dispatched action on `{field}` before first render")]
    DispatchBeforeRender { field: &'static str },
    #[error("`{owner}` has no render-affecting field `{field}`")]
    UnknownField {
        owner: &'static str,
        field: &'static str,
    },
    #[error("field `{field}` accessed with the wrong type")]
    FieldTypeMismatch { field: &'static str },
    #[error("field `{field}` is a state field; use dispatch")]
    NotTracked { field: &'static str },
    #[error("field `{field}` is a tracked field; use set")]
    NotState { field: &'static str },
}
