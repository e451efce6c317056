//! # Host renderer
//!
//! `hookcls-host` is the function-component renderer that `hookcls` builds
//! on. It knows nothing about classes or fields; it offers the handful of
//! primitives a hook-based UI runtime needs:
//!
//! - units: `component` (a pure function of props) and `forward_ref`
//!   (props plus an external [`HandleRef`]);
//! - order-based hook slots: `use_ref`, `use_state`;
//! - render triggers: `use_trigger` returns a [`Trigger`] that schedules
//!   another render of the calling mount;
//! - effects after commit: `use_effect`, `use_layout_effect`,
//!   `use_imperative_handle`, `on_unmount`.
//!
//! ```rust
//! use hookcls_host::*;
//!
//! let counter = component("Counter", |_: &()| {
//!     let clicks = use_state(|| 0);
//!     let (_, trigger) = use_trigger();
//!     let n = *clicks.borrow();
//!     Some(
//!         Node::element("button")
//!             .id("inc")
//!             .on("click", move |_| {
//!                 *clicks.borrow_mut() += 1;
//!                 trigger.fire();
//!             })
//!             .child(format!("{n}")),
//!     )
//! });
//!
//! let mut host = Host::new();
//! host.render(counter.element(())).unwrap();
//! host.dispatch("inc", Event::new("click")).unwrap();
//! assert_eq!(host.output(), r#"<button id="inc">1</button>"#);
//! ```
//!
//! ## Scheduling
//!
//! Firing a trigger only records the mount. Nothing renders until the host
//! flushes: `Host::render`, `Host::dispatch` and `Host::flush` all do. A flush
//! renders dirty mounts parent-first and commits once per pass, so any number
//! of fires before a flush cost one render. Triggers of unmounted mounts are
//! silent no-ops.
//!
//! ## Effects
//!
//! Effects run after the tree is committed, children before parents, layout
//! effects before passive ones. An effect re-runs (cleanup first) only when
//! its dependencies change, and its last cleanup runs on unmount.

pub mod clock;
pub mod effects;
pub mod error;
pub mod events;
pub mod hooks;
pub mod node;
pub mod queue;
pub mod runtime;
pub mod scope;
pub mod unit;

mod tests;

pub use clock::{Clock, ManualClock, SystemClock};
pub use effects::Cleanup;
pub use error::{ErrorInfo, HostError, panic_message};
pub use events::{Event, EventTarget, Handler, ListenerId};
pub use hooks::{
    current_mount, on_unmount, use_effect, use_imperative_handle, use_layout_effect, use_ref,
    use_state, use_trigger,
};
pub use node::{Node, NodeKind};
pub use queue::{TimerId, Trigger, UpdateQueue};
pub use runtime::{FlushReport, Host, HostOptions, HostStats, MountId};
pub use scope::Scope;
pub use unit::{
    Element, ErrorBoundary, FnComponent, ForwardRef, HandleRef, Mountable, component, error_boundary,
    forward_ref,
};
pub use web_time::{Duration, Instant};
