//! # hookcls
//!
//! Class-style components on top of the `hookcls-host` function-component
//! renderer. A class is a `Default` struct implementing [`Component`]; the
//! values that should re-render it when they change are declared with
//! [`render_affecting!`]. [`create_component`] turns the class into a unit
//! the host can mount.
//!
//! ```rust
//! use hookcls::prelude::*;
//!
//! render_affecting! {
//!     pub struct CounterFields {
//!         count: i32 = 0,
//!     }
//! }
//!
//! #[derive(Props, Clone, PartialEq)]
//! pub struct CounterProps {
//!     #[prop(default = 1)]
//!     pub step: i32,
//! }
//!
//! #[derive(Default)]
//! struct Counter;
//!
//! impl Component for Counter {
//!     type Props = CounterProps;
//!     type Fields = CounterFields;
//!
//!     fn render(&mut self, cx: &RenderCx<'_, Self>, props: &CounterProps) -> Option<Node> {
//!         let count = cx.get(CounterFields::count);
//!         let this = cx.instance();
//!         let step = props.step;
//!         Some(
//!             Node::element("button")
//!                 .id("inc")
//!                 .on("click", move |_| {
//!                     this.update(CounterFields::count, |c| *c += step);
//!                 })
//!                 .child(format!("{count}")),
//!         )
//!     }
//! }
//!
//! let counter = create_component::<Counter>();
//! let mut host = Host::new();
//! host.render(counter.element(CounterPropsInput { step: None })).unwrap();
//! host.dispatch("inc", Event::new("click")).unwrap();
//! assert_eq!(host.output(), r#"<button id="inc">1</button>"#);
//! ```
//!
//! ## Updates
//!
//! Writing a tracked field with a value different from the current one
//! requests an update; equal values are ignored. Requests coalesce until the
//! next render of the instance begins, so any number of writes in one event
//! handler cost one render. Requests after unmount do nothing.
//!
//! Writes made before the first render (for example on an [`Instance`] that
//! is not mounted yet) are kept and schedule nothing; the first render shows
//! them. State fields are different: dispatching to one before the first
//! render is a [`ContractViolation`].
//!
//! ## Effects
//!
//! [`use_gen_effect`] runs a [`Routine`]: a small state machine that yields its
//! dependency value, then performs setup and later cleanup. See [`effect`].

extern crate self as hookcls;

pub mod bridge;
pub mod component;
pub mod effect;
pub mod error;
pub mod fields;
pub mod instance;
pub mod prelude;
pub mod props;
pub mod scheduler;
pub mod store;


pub use bridge::{ClassComponent, RenderCx, create_component};
pub use component::{Component, display_name};
pub use effect::{
    EffectRunner, Phase, Registration, Routine, SameHandler, Step, TwoPhase, WithCleanup, from_fn,
    listener_effect, registration, two_phase, use_gen_effect, use_listener, with_cleanup,
};
pub use error::ContractViolation;
pub use fields::{Field, FieldKind, FieldRegistry, FieldSet, StateField};
pub use hookcls_macros::Props;
pub use instance::{Instance, InstanceFlags, WeakInstance};
pub use props::Props;
pub use scheduler::{UpdateHandle, UpdatePolicy};
pub use store::FieldStore;

pub use hookcls_host as host;
