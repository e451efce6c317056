//! Mountable units and the elements that place them in a tree.
//!
//! A unit is matched across renders by identity: the host keeps a child mount
//! alive only while its parent keeps rendering the *same* unit (same `Rc`) at
//! the same key or position. Create units once and reuse them.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::error::ErrorInfo;
use crate::node::Node;

pub trait Mountable: 'static {
    fn name(&self) -> &str;

    fn render(&self, props: &dyn Any, handle: Option<&dyn Any>) -> Option<Node>;

    /// Boundaries catch panics raised while their subtree renders.
    fn is_boundary(&self) -> bool {
        false
    }

    /// Output to show instead of a failed subtree.
    fn recover(&self, _info: &ErrorInfo) -> Option<Node> {
        None
    }
}

/// A unit plus the props to render it with.
#[derive(Clone)]
pub struct Element {
    pub(crate) unit: Rc<dyn Mountable>,
    pub(crate) props: Rc<dyn Any>,
    pub(crate) handle: Option<Rc<dyn Any>>,
    pub(crate) key: Option<String>,
}

impl Element {
    pub fn new<P: 'static>(unit: Rc<dyn Mountable>, props: P) -> Self {
        Self {
            unit,
            props: Rc::new(props),
            handle: None,
            key: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn name(&self) -> &str {
        self.unit.name()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn props<P: 'static>(&self) -> Option<&P> {
        self.props.downcast_ref::<P>()
    }

    pub(crate) fn same_unit(&self, unit: &Rc<dyn Mountable>) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.unit), Rc::as_ptr(unit))
    }
}

/// External reference a parent can hand to a forwarding unit.
pub struct HandleRef<H>(Rc<RefCell<Option<H>>>);

impl<H> HandleRef<H> {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }

    pub fn get(&self) -> Option<H>
    where
        H: Clone,
    {
        self.0.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(Option<&H>) -> R) -> R {
        f(self.0.borrow().as_ref())
    }

    pub fn is_set(&self) -> bool {
        self.0.borrow().is_some()
    }

    pub(crate) fn set(&self, value: H) {
        *self.0.borrow_mut() = Some(value);
    }

    pub(crate) fn clear(&self) {
        self.0.borrow_mut().take();
    }
}

impl<H> Default for HandleRef<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Clone for HandleRef<H> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<H> PartialEq for HandleRef<H> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

struct FnUnit<P> {
    name: String,
    render: Box<dyn Fn(&P) -> Option<Node>>,
}

impl<P: 'static> Mountable for FnUnit<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, props: &dyn Any, _handle: Option<&dyn Any>) -> Option<Node> {
        match props.downcast_ref::<P>() {
            Some(props) => (self.render)(props),
            None => {
                log::error!("{}: props of unexpected type", self.name);
                None
            }
        }
    }
}

/// A plain function of props.
pub struct FnComponent<P: 'static> {
    unit: Rc<FnUnit<P>>,
}

impl<P: 'static> FnComponent<P> {
    pub fn element(&self, props: P) -> Element {
        Element::new(self.unit.clone(), props)
    }

    pub fn name(&self) -> &str {
        &self.unit.name
    }
}

impl<P: 'static> Clone for FnComponent<P> {
    fn clone(&self) -> Self {
        Self {
            unit: self.unit.clone(),
        }
    }
}

pub fn component<P: 'static>(
    name: impl Into<String>,
    render: impl Fn(&P) -> Option<Node> + 'static,
) -> FnComponent<P> {
    FnComponent {
        unit: Rc::new(FnUnit {
            name: name.into(),
            render: Box::new(render),
        }),
    }
}

type ForwardRender<P, H> = Box<dyn Fn(&P, Option<&HandleRef<H>>) -> Option<Node>>;

struct ForwardUnit<P, H> {
    name: String,
    render: ForwardRender<P, H>,
}

impl<P: 'static, H: 'static> Mountable for ForwardUnit<P, H> {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, props: &dyn Any, handle: Option<&dyn Any>) -> Option<Node> {
        let Some(props) = props.downcast_ref::<P>() else {
            log::error!("{}: props of unexpected type", self.name);
            return None;
        };
        let handle = handle.and_then(|h| h.downcast_ref::<HandleRef<H>>());
        (self.render)(props, handle)
    }
}

/// A unit that also receives the external handle its parent passed in.
pub struct ForwardRef<P: 'static, H: 'static> {
    unit: Rc<ForwardUnit<P, H>>,
}

impl<P: 'static, H: 'static> ForwardRef<P, H> {
    pub fn element(&self, props: P) -> Element {
        Element::new(self.unit.clone(), props)
    }

    pub fn element_with_handle(&self, props: P, handle: &HandleRef<H>) -> Element {
        let mut el = self.element(props);
        el.handle = Some(Rc::new(handle.clone()));
        el
    }

    pub fn name(&self) -> &str {
        &self.unit.name
    }
}

impl<P: 'static, H: 'static> Clone for ForwardRef<P, H> {
    fn clone(&self) -> Self {
        Self {
            unit: self.unit.clone(),
        }
    }
}

pub fn forward_ref<P: 'static, H: 'static>(
    name: impl Into<String>,
    render: impl Fn(&P, Option<&HandleRef<H>>) -> Option<Node> + 'static,
) -> ForwardRef<P, H> {
    ForwardRef {
        unit: Rc::new(ForwardUnit {
            name: name.into(),
            render: Box::new(render),
        }),
    }
}

struct BoundaryUnit {
    fallback: Box<dyn Fn(&ErrorInfo) -> Option<Node>>,
}

impl Mountable for BoundaryUnit {
    fn name(&self) -> &str {
        "ErrorBoundary"
    }

    fn render(&self, props: &dyn Any, _handle: Option<&dyn Any>) -> Option<Node> {
        props.downcast_ref::<Element>().cloned().map(Node::from)
    }

    fn is_boundary(&self) -> bool {
        true
    }

    fn recover(&self, info: &ErrorInfo) -> Option<Node> {
        (self.fallback)(info)
    }
}

/// Catches panics from its content's subtree and renders `fallback` instead.
/// The content is retried on the boundary's next render.
#[derive(Clone)]
pub struct ErrorBoundary {
    unit: Rc<BoundaryUnit>,
}

impl ErrorBoundary {
    pub fn new(fallback: impl Fn(&ErrorInfo) -> Option<Node> + 'static) -> Self {
        Self {
            unit: Rc::new(BoundaryUnit {
                fallback: Box::new(fallback),
            }),
        }
    }

    pub fn wrap(&self, content: Element) -> Element {
        Element::new(self.unit.clone(), content)
    }
}

/// One-off boundary around `content`. Prefer keeping an [`ErrorBoundary`]
/// around when re-rendering, so the boundary mount is reused.
pub fn error_boundary(
    fallback: impl Fn(&ErrorInfo) -> Option<Node> + 'static,
    content: Element,
) -> Element {
    ErrorBoundary::new(fallback).wrap(content)
}
