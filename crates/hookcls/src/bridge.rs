//! Adapts a [`Component`] class to the host's function-component protocol.
//!
//! Each class becomes two units. The outer `HookCls(Name)` unit owns the
//! bookkeeping: it keeps the instance in a hook slot, binds the instance's
//! update handle to the mount's trigger, publishes the instance through the
//! caller's [`HandleRef`], resets the pending flag and merges default props.
//! It then renders the inner `Name` unit, which only calls
//! [`Component::render`]. Hooks used inside `render` therefore belong to the
//! inner mount and never shift the outer layer's slots.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Deref;
use std::rc::Rc;

use hookcls_host::{
    Element, FnComponent, ForwardRef, HandleRef, Node, component, forward_ref, on_unmount,
    use_imperative_handle, use_ref, use_trigger,
};

use crate::component::{Component, display_name};
use crate::instance::Instance;
use crate::props::Props;

type Input<C> = <<C as Component>::Props as Props>::Input;

struct Body<C: Component> {
    instance: Instance<C>,
    props: C::Props,
}

/// Mountable form of a class. Obtain it with [`create_component`].
pub struct ClassComponent<C: Component> {
    outer: ForwardRef<Input<C>, Instance<C>>,
}

impl<C: Component> ClassComponent<C> {
    pub fn element(&self, props: Input<C>) -> Element {
        self.outer.element(props)
    }

    /// Like [`element`](Self::element), and `handle` receives the instance at
    /// commit. It keeps pointing at the same instance until unmount.
    pub fn element_with_handle(&self, props: Input<C>, handle: &HandleRef<Instance<C>>) -> Element {
        self.outer.element_with_handle(props, handle)
    }

    pub fn name(&self) -> &str {
        self.outer.name()
    }
}

impl<C: Component> Clone for ClassComponent<C> {
    fn clone(&self) -> Self {
        Self {
            outer: self.outer.clone(),
        }
    }
}

thread_local! {
    static CLASSES: RefCell<HashMap<TypeId, Box<dyn Any>>> = RefCell::new(HashMap::new());
}

/// The mountable unit for `C`. Every call on a thread returns the same unit,
/// so mounts survive parents re-rendering.
pub fn create_component<C: Component>() -> ClassComponent<C> {
    CLASSES.with(|classes| {
        let mut classes = classes.borrow_mut();
        let entry = classes
            .entry(TypeId::of::<C>())
            .or_insert_with(|| Box::new(build::<C>()));
        match entry.downcast_ref::<ClassComponent<C>>() {
            Some(class) => class.clone(),
            None => build::<C>(),
        }
    })
}

fn build<C: Component>() -> ClassComponent<C> {
    let name = display_name::<C>();
    let inner: FnComponent<Body<C>> =
        component(name, |body: &Body<C>| body.instance.render_body(&body.props));
    let defaults = Rc::new(C::default_props());

    let outer = forward_ref(
        format!("HookCls({name})"),
        move |input: &Input<C>, handle: Option<&HandleRef<Instance<C>>>| {
            let instance = (*use_ref(Instance::<C>::new)).clone();
            let (_, trigger) = use_trigger();
            instance.attach(trigger);
            on_unmount({
                let instance = instance.clone();
                move || instance.unmount()
            });
            use_imperative_handle(handle, instance.clone());

            instance.begin_render();
            let props = <C::Props as Props>::resolve(input.clone(), &defaults);
            Some(Node::from(inner.element(Body { instance, props })))
        },
    );
    log::debug!("created class unit HookCls({name})");
    ClassComponent { outer }
}

/// What `render` gets besides props: the instance being rendered.
/// Derefs to [`Instance`], so fields are read and written directly.
pub struct RenderCx<'a, C: Component> {
    instance: &'a Instance<C>,
}

impl<'a, C: Component> RenderCx<'a, C> {
    pub(crate) fn new(instance: &'a Instance<C>) -> Self {
        Self { instance }
    }

    /// An owned handle, for moving into event handlers and effects.
    pub fn instance(&self) -> Instance<C> {
        self.instance.clone()
    }
}

impl<C: Component> Deref for RenderCx<'_, C> {
    type Target = Instance<C>;

    fn deref(&self) -> &Instance<C> {
        self.instance
    }
}
