//! Hook primitives.
//!
//! Hooks are order-based: the Nth hook call during a mount's render always
//! refers to that mount's Nth slot. They may only be called while the host is
//! rendering a unit; calling one anywhere else panics.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use crate::effects::Cleanup;
use crate::queue::{Trigger, UpdateQueue};
use crate::runtime::MountId;
use crate::scope::Scope;
use crate::unit::HandleRef;

thread_local! {
    static FRAME: RefCell<Option<HookFrame>> = const { RefCell::new(None) };
}

pub(crate) struct CommitJob {
    pub mount: MountId,
    pub run: Box<dyn FnOnce()>,
}

/// Per-render hook state of the mount being rendered.
pub(crate) struct HookFrame {
    pub mount: MountId,
    pub generation: u64,
    pub slots: Vec<Box<dyn Any>>,
    pub cursor: usize,
    pub scope: Scope,
    pub queue: Arc<UpdateQueue>,
    pub layout: Vec<CommitJob>,
    pub passive: Vec<CommitJob>,
}

/// Installs a frame for the duration of one unit render. Restores the
/// previous frame on drop, including when the render panics.
pub(crate) struct FrameGuard {
    prev: Option<HookFrame>,
    active: bool,
}

impl FrameGuard {
    pub fn enter(frame: HookFrame) -> Self {
        let prev = FRAME.with(|f| f.borrow_mut().replace(frame));
        Self { prev, active: true }
    }

    pub fn exit(mut self) -> Option<HookFrame> {
        self.active = false;
        let prev = self.prev.take();
        FRAME.with(|f| std::mem::replace(&mut *f.borrow_mut(), prev))
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        if self.active {
            let prev = self.prev.take();
            FRAME.with(|f| *f.borrow_mut() = prev);
        }
    }
}

fn with_frame<R>(f: impl FnOnce(&mut HookFrame) -> R) -> R {
    FRAME.with(|cell| {
        let mut frame = cell.borrow_mut();
        match frame.as_mut() {
            Some(frame) => f(frame),
            None => panic!("hooks can only be called while a unit renders"),
        }
    })
}

/// The mount currently rendering, if any.
pub fn current_mount() -> Option<MountId> {
    FRAME.with(|f| f.borrow().as_ref().map(|frame| frame.mount))
}

/// Slot-based persistent value. `init` runs on the mount's first render only.
pub fn use_ref<T: 'static>(init: impl FnOnce() -> T) -> Rc<T> {
    let (cursor, existing) = with_frame(|f| {
        let cursor = f.cursor;
        f.cursor += 1;
        let existing = f
            .slots
            .get(cursor)
            .map(|slot| slot.downcast_ref::<Rc<T>>().cloned());
        (cursor, existing)
    });

    match existing {
        Some(Some(rc)) => rc,
        existing => {
            if existing.is_some() {
                log::warn!(
                    "use_ref: slot {} type changed; replacing. Hooks must be called in the same order every render.",
                    cursor
                );
            }
            // Run `init` outside the frame borrow.
            let rc = Rc::new(init());
            with_frame(|f| {
                let slot: Box<dyn Any> = Box::new(rc.clone());
                if cursor < f.slots.len() {
                    f.slots[cursor] = slot;
                } else {
                    f.slots.push(slot);
                }
            });
            rc
        }
    }
}

pub fn use_state<T: 'static>(init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
    use_ref(|| RefCell::new(init()))
}

/// Mutable render-trigger slot: the mount's render generation and a trigger
/// that schedules another render of this mount.
pub fn use_trigger() -> (u64, Trigger) {
    with_frame(|f| (f.generation, Trigger::new(f.mount, f.queue.clone())))
}

/// Registers `f` to run when the mount is torn down. Only the first call per
/// call site registers; later renders drop their `f`.
pub fn on_unmount(f: impl FnOnce() + 'static) {
    let installed = use_ref(|| Cell::new(false));
    if installed.replace(true) {
        return;
    }
    with_frame(|frame| frame.scope.add_disposer(f));
}

struct EffectSlot<K> {
    deps: RefCell<Option<K>>,
    cleanup: Rc<RefCell<Option<Cleanup>>>,
}

fn effect_hook<K: PartialEq + 'static>(
    deps: K,
    effect: impl FnOnce() -> Option<Cleanup> + 'static,
    layout: bool,
) {
    let slot = use_ref(|| EffectSlot::<K> {
        deps: RefCell::new(None),
        cleanup: Rc::new(RefCell::new(None)),
    });

    on_unmount({
        let cleanup = slot.cleanup.clone();
        move || {
            let last = cleanup.borrow_mut().take();
            if let Some(last) = last {
                last.run();
            }
        }
    });

    let changed = slot.deps.borrow().as_ref() != Some(&deps);
    if !changed {
        return;
    }
    *slot.deps.borrow_mut() = Some(deps);

    let cleanup = slot.cleanup.clone();
    let run = move || {
        let previous = cleanup.borrow_mut().take();
        if let Some(previous) = previous {
            previous.run();
        }
        let next = effect();
        *cleanup.borrow_mut() = next;
    };
    with_frame(|f| {
        let job = CommitJob {
            mount: f.mount,
            run: Box::new(run),
        };
        if layout {
            f.layout.push(job);
        } else {
            f.passive.push(job);
        }
    });
}

/// Runs `effect` after commit whenever `deps` changed since the last render
/// (compared with `PartialEq`; tuples compare element-wise). The previous
/// cleanup runs first, and the last one runs on unmount.
pub fn use_effect<K: PartialEq + 'static>(
    deps: K,
    effect: impl FnOnce() -> Option<Cleanup> + 'static,
) {
    effect_hook(deps, effect, false)
}

/// Like [`use_effect`], but runs before any passive effect of the same commit.
pub fn use_layout_effect<K: PartialEq + 'static>(
    deps: K,
    effect: impl FnOnce() -> Option<Cleanup> + 'static,
) {
    effect_hook(deps, effect, true)
}

/// Publishes `value` through `handle` at commit and clears it on unmount.
pub fn use_imperative_handle<H: Clone + PartialEq + 'static>(
    handle: Option<&HandleRef<H>>,
    value: H,
) {
    let handle = handle.cloned();
    use_layout_effect((handle.clone(), value.clone()), move || {
        let handle = handle?;
        handle.set(value);
        Some(Cleanup::new(move || handle.clear()))
    });
}
