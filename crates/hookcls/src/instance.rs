//! Per-mount instances.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use bitflags::bitflags;
use hookcls_host::{Node, Trigger};

use crate::bridge::RenderCx;
use crate::component::{Component, display_name};
use crate::error::ContractViolation;
use crate::fields::{Field, FieldSet, StateField};
use crate::scheduler::UpdateHandle;
use crate::store::FieldStore;

bitflags! {
    #[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
    pub struct InstanceFlags: u8 {
        const ATTACHED = 1 << 0;
        const RENDERED = 1 << 1;
        const UNMOUNTED = 1 << 2;
    }
}

struct InstanceInner<C: Component> {
    state: RefCell<C>,
    fields: FieldStore,
    flags: Cell<InstanceFlags>,
    renders: Cell<u64>,
}

/// Handle to the one object backing a mount. Clones share the object;
/// compare with [`ptr_eq`](Self::ptr_eq) (or `==`).
pub struct Instance<C: Component>(Rc<InstanceInner<C>>);

impl<C: Component> Instance<C> {
    /// A fresh, detached instance: `C::default()` plus initial field values.
    /// Writes made before it first renders are kept and schedule nothing.
    pub fn new() -> Self {
        let updates = UpdateHandle::new(C::UPDATE_POLICY);
        Self(Rc::new(InstanceInner {
            state: RefCell::new(C::default()),
            fields: FieldStore::new(C::Fields::registry(), updates),
            flags: Cell::new(InstanceFlags::empty()),
            renders: Cell::new(0),
        }))
    }

    fn insert_flag(&self, flag: InstanceFlags) {
        let flags = self.0.flags.get();
        self.0.flags.set(flags | flag);
    }

    fn flags(&self) -> InstanceFlags {
        self.0.flags.get()
    }

    pub(crate) fn attach(&self, trigger: Trigger) {
        if !self.flags().contains(InstanceFlags::ATTACHED) {
            log::debug!("{} attached to {:?}", display_name::<C>(), trigger.mount());
            self.insert_flag(InstanceFlags::ATTACHED);
        }
        self.0.fields.updater().attach(trigger);
    }

    pub(crate) fn begin_render(&self) {
        self.0.fields.updater().begin_render();
        self.0.fields.begin_render();
        self.insert_flag(InstanceFlags::RENDERED);
        self.0.renders.set(self.0.renders.get() + 1);
    }

    pub(crate) fn render_body(&self, props: &C::Props) -> Option<Node> {
        let cx = RenderCx::new(self);
        let mut state = self.0.state.borrow_mut();
        state.render(&cx, props)
    }

    pub(crate) fn unmount(&self) {
        log::debug!("{} unmounted", display_name::<C>());
        self.insert_flag(InstanceFlags::UNMOUNTED);
        self.0.fields.updater().unmount();
    }

    pub fn fields(&self) -> &FieldStore {
        &self.0.fields
    }

    pub fn get<T: Clone + 'static>(&self, field: Field<T>) -> T {
        self.0.fields.get(field)
    }

    pub fn with<T: 'static, R>(&self, field: Field<T>, f: impl FnOnce(&T) -> R) -> R {
        self.0.fields.with(field, f)
    }

    pub fn set<T: PartialEq + 'static>(&self, field: Field<T>, value: T) -> bool {
        self.0.fields.set(field, value)
    }

    pub fn update<T: Clone + PartialEq + 'static>(
        &self,
        field: Field<T>,
        f: impl FnOnce(&mut T),
    ) -> bool {
        self.0.fields.update(field, f)
    }

    pub fn state<T: Clone + 'static>(&self, field: StateField<T>) -> T {
        self.0.fields.state(field)
    }

    #[track_caller]
    pub fn dispatch<T: 'static>(&self, field: StateField<T>, reduce: impl FnOnce(&T) -> T + 'static) {
        self.0.fields.dispatch(field, reduce)
    }

    pub fn try_dispatch<T: 'static>(
        &self,
        field: StateField<T>,
        reduce: impl FnOnce(&T) -> T + 'static,
    ) -> Result<(), ContractViolation> {
        self.0.fields.try_dispatch(field, reduce)
    }

    /// See [`UpdateHandle::request_update`].
    pub fn request_update(&self) -> bool {
        self.0.fields.updater().request_update()
    }

    /// A `Send + Sync` handle for requesting updates from elsewhere.
    pub fn updater(&self) -> UpdateHandle {
        self.0.fields.updater().clone()
    }

    /// Borrows the component struct. Panics while the instance is rendering.
    pub fn state_ref(&self) -> Ref<'_, C> {
        self.0.state.borrow()
    }

    /// Mutably borrows the component struct. Plain state is not tracked;
    /// request an update if the change must show.
    pub fn state_mut(&self) -> RefMut<'_, C> {
        self.0.state.borrow_mut()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&self.0.state.borrow())
    }

    pub fn with_state_mut<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(&mut self.0.state.borrow_mut())
    }

    pub fn is_mounted(&self) -> bool {
        let flags = self.flags();
        flags.contains(InstanceFlags::ATTACHED) && !flags.contains(InstanceFlags::UNMOUNTED)
    }

    pub fn is_unmounted(&self) -> bool {
        self.flags().contains(InstanceFlags::UNMOUNTED)
    }

    pub fn has_rendered(&self) -> bool {
        self.flags().contains(InstanceFlags::RENDERED)
    }

    pub fn render_count(&self) -> u64 {
        self.0.renders.get()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakInstance<C> {
        WeakInstance(Rc::downgrade(&self.0))
    }
}

impl<C: Component> Default for Instance<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Component> Clone for Instance<C> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<C: Component> PartialEq for Instance<C> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<C: Component> std::fmt::Debug for Instance<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("class", &display_name::<C>())
            .field("flags", &self.flags())
            .field("renders", &self.render_count())
            .finish()
    }
}

/// Non-owning instance handle for callbacks that may outlive the mount.
pub struct WeakInstance<C: Component>(Weak<InstanceInner<C>>);

impl<C: Component> WeakInstance<C> {
    pub fn upgrade(&self) -> Option<Instance<C>> {
        self.0.upgrade().map(Instance)
    }

    /// Requests an update if the instance is still around.
    pub fn request_update(&self) -> bool {
        self.upgrade().is_some_and(|i| i.request_update())
    }
}

impl<C: Component> Clone for WeakInstance<C> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
