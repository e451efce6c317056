pub use crate::{
    ClassComponent, Component, Field, FieldSet, Instance, Props, RenderCx, StateField, Step,
    UpdateHandle, UpdatePolicy, create_component, render_affecting, two_phase, use_gen_effect,
    use_listener, with_cleanup,
};
pub use hookcls_host::{
    Cleanup, Duration, Element, Event, EventTarget, HandleRef, Host, HostOptions, Node,
    use_effect, use_ref, use_state,
};
