//! Per-instance field values.

use std::any::Any;
use std::cell::{Cell, RefCell};

use smallvec::SmallVec;

use crate::error::ContractViolation;
use crate::fields::{Field, FieldKind, FieldRegistry, StateField};
use crate::scheduler::UpdateHandle;

type Updater = Box<dyn FnOnce(&mut dyn Any)>;

/// Current values of one instance's declared fields, held apart from the
/// component struct itself.
pub struct FieldStore {
    registry: &'static FieldRegistry,
    values: RefCell<SmallVec<[Box<dyn Any>; 4]>>,
    queued: RefCell<Vec<(usize, Updater)>>,
    dirty: Cell<bool>,
    rendered: Cell<bool>,
    updates: UpdateHandle,
}

#[track_caller]
pub(crate) fn violation(err: ContractViolation) -> ! {
    panic!("{err}")
}

impl FieldStore {
    pub fn new(registry: &'static FieldRegistry, updates: UpdateHandle) -> Self {
        Self {
            registry,
            values: RefCell::new(registry.initial_values()),
            queued: RefCell::new(Vec::new()),
            dirty: Cell::new(false),
            rendered: Cell::new(false),
            updates,
        }
    }

    pub fn registry(&self) -> &'static FieldRegistry {
        self.registry
    }

    fn slot(&self, name: &'static str, kind: FieldKind) -> Result<usize, ContractViolation> {
        let index = self
            .registry
            .index_of(name)
            .ok_or(ContractViolation::UnknownField {
                owner: self.registry.owner(),
                field: name,
            })?;
        match self.registry.spec(index).map(|s| s.kind) {
            Some(k) if k == kind => Ok(index),
            Some(FieldKind::State) => Err(ContractViolation::NotTracked { field: name }),
            _ => Err(ContractViolation::NotState { field: name }),
        }
    }

    fn read<T: 'static, R>(
        &self,
        name: &'static str,
        kind: FieldKind,
        f: impl FnOnce(&T) -> R,
    ) -> Result<R, ContractViolation> {
        let index = self.slot(name, kind)?;
        let values = self.values.borrow();
        let value = values[index]
            .downcast_ref::<T>()
            .ok_or(ContractViolation::FieldTypeMismatch { field: name })?;
        Ok(f(value))
    }

    /// Borrows a tracked field. `f` must not write fields of this store.
    pub fn with<T: 'static, R>(&self, field: Field<T>, f: impl FnOnce(&T) -> R) -> R {
        self.read(field.name(), FieldKind::Tracked, f)
            .unwrap_or_else(|e| violation(e))
    }

    pub fn get<T: Clone + 'static>(&self, field: Field<T>) -> T {
        self.with(field, T::clone)
    }

    /// Stores `value` and requests an update, unless it equals the current
    /// value. Returns whether anything changed.
    pub fn set<T: PartialEq + 'static>(&self, field: Field<T>, value: T) -> bool {
        self.try_set(field, value).unwrap_or_else(|e| violation(e))
    }

    pub fn try_set<T: PartialEq + 'static>(
        &self,
        field: Field<T>,
        value: T,
    ) -> Result<bool, ContractViolation> {
        let name = field.name();
        let index = self.slot(name, FieldKind::Tracked)?;
        {
            let mut values = self.values.borrow_mut();
            let current = values[index]
                .downcast_mut::<T>()
                .ok_or(ContractViolation::FieldTypeMismatch { field: name })?;
            if *current == value {
                return Ok(false);
            }
            *current = value;
        }
        self.dirty.set(true);
        log::trace!("{}.{} changed", self.registry.owner(), name);
        self.updates.request_update();
        Ok(true)
    }

    /// Applies `f` to a copy of the current value and stores the result the
    /// way [`set`](Self::set) does.
    pub fn update<T: Clone + PartialEq + 'static>(
        &self,
        field: Field<T>,
        f: impl FnOnce(&mut T),
    ) -> bool {
        let mut next = self.get(field);
        f(&mut next);
        self.set(field, next)
    }

    pub fn with_state<T: 'static, R>(&self, field: StateField<T>, f: impl FnOnce(&T) -> R) -> R {
        self.read(field.name(), FieldKind::State, f)
            .unwrap_or_else(|e| violation(e))
    }

    pub fn state<T: Clone + 'static>(&self, field: StateField<T>) -> T {
        self.with_state(field, T::clone)
    }

    /// Queues `reduce` to produce the field's next value when the next
    /// render begins, and requests that render. Updaters apply in dispatch
    /// order. Dispatching before the first render is an error.
    pub fn try_dispatch<T: 'static>(
        &self,
        field: StateField<T>,
        reduce: impl FnOnce(&T) -> T + 'static,
    ) -> Result<(), ContractViolation> {
        let name = field.name();
        let index = self.slot(name, FieldKind::State)?;
        if !self.rendered.get() {
            return Err(ContractViolation::DispatchBeforeRender { field: name });
        }
        if !self.values.borrow()[index].is::<T>() {
            return Err(ContractViolation::FieldTypeMismatch { field: name });
        }
        if self.updates.is_unmounted() {
            log::trace!("{}.{} dispatch after unmount ignored", self.registry.owner(), name);
            return Ok(());
        }
        let updater: Updater = Box::new(move |slot: &mut dyn Any| {
            if let Some(value) = slot.downcast_mut::<T>() {
                *value = reduce(value);
            }
        });
        self.queued.borrow_mut().push((index, updater));
        self.dirty.set(true);
        self.updates.request_update();
        Ok(())
    }

    /// Panicking form of [`try_dispatch`](Self::try_dispatch).
    #[track_caller]
    pub fn dispatch<T: 'static>(&self, field: StateField<T>, reduce: impl FnOnce(&T) -> T + 'static) {
        if let Err(e) = self.try_dispatch(field, reduce) {
            violation(e)
        }
    }

    /// Start of a render: apply queued updaters and reset the dirty flag.
    pub(crate) fn begin_render(&self) {
        let queued = std::mem::take(&mut *self.queued.borrow_mut());
        if !queued.is_empty() {
            let mut values = self.values.borrow_mut();
            for (index, apply) in queued {
                apply(&mut *values[index]);
            }
        }
        self.dirty.set(false);
        self.rendered.set(true);
    }

    /// A field changed (or an updater was queued) since the last render began.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn has_rendered(&self) -> bool {
        self.rendered.get()
    }

    pub fn queued_updates(&self) -> usize {
        self.queued.borrow().len()
    }

    pub fn updater(&self) -> &UpdateHandle {
        &self.updates
    }
}

impl std::fmt::Debug for FieldStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldStore")
            .field("owner", &self.registry.owner())
            .field("fields", &self.registry.len())
            .field("dirty", &self.dirty.get())
            .finish()
    }
}
