//! Turns "a tracked field changed" into one render of the owning mount.
//!
//! Every instance owns an [`UpdateHandle`]. Any number of requests between two
//! renders collapse into one: the first request marks the handle pending and
//! fires (or schedules) the mount's trigger, later ones see the flag and stop.
//! The render clears the flag again.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use hookcls_host::{TimerId, Trigger};
use parking_lot::Mutex;
use web_time::Duration;

/// How an instance turns requests into renders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UpdatePolicy {
    /// Fire the mount's trigger straight away. The host still renders only
    /// on its next flush, so synchronous bursts coalesce.
    #[default]
    Immediate,
    /// Arm one host timer; the render happens on the first flush after it
    /// comes due. Requests made while it is armed are absorbed.
    Debounced(Duration),
}

impl UpdatePolicy {
    pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1);

    pub const fn debounced() -> Self {
        Self::Debounced(Self::DEFAULT_DEBOUNCE)
    }
}

enum Link {
    /// Not rendered yet. Requests are absorbed by the first render.
    Detached,
    Attached(Trigger),
    Unmounted,
}

struct Shared {
    policy: UpdatePolicy,
    link: Mutex<Link>,
    pending: AtomicBool,
    timer: Mutex<Option<TimerId>>,
    scheduled: AtomicU64,
}

/// Zero-argument update request bound to one instance. Cheap to clone and
/// safe to move to other threads or hold past unmount.
#[derive(Clone)]
pub struct UpdateHandle(Arc<Shared>);

impl UpdateHandle {
    pub fn new(policy: UpdatePolicy) -> Self {
        Self(Arc::new(Shared {
            policy,
            link: Mutex::new(Link::Detached),
            pending: AtomicBool::new(false),
            timer: Mutex::new(None),
            scheduled: AtomicU64::new(0),
        }))
    }

    /// Asks for one more render. Returns whether this call scheduled it;
    /// false when one is already pending, before the first render, and after
    /// unmount.
    pub fn request_update(&self) -> bool {
        let trigger = match &*self.0.link.lock() {
            Link::Attached(trigger) => trigger.clone(),
            Link::Detached => {
                self.0.pending.store(true, Ordering::Release);
                log::trace!("update requested before first render; deferred");
                return false;
            }
            Link::Unmounted => {
                log::trace!("update requested after unmount; ignored");
                return false;
            }
        };

        if self.0.pending.swap(true, Ordering::AcqRel) {
            return false;
        }
        let scheduled = match self.0.policy {
            UpdatePolicy::Immediate => trigger.fire(),
            UpdatePolicy::Debounced(delay) => {
                let id = trigger.fire_after(delay);
                if let Some(stale) = self.0.timer.lock().replace(id) {
                    trigger.queue().cancel(stale);
                }
                true
            }
        };
        if scheduled {
            self.0.scheduled.fetch_add(1, Ordering::Relaxed);
        }
        scheduled
    }

    pub fn policy(&self) -> UpdatePolicy {
        self.0.policy
    }

    /// A request is waiting for its render.
    pub fn is_pending(&self) -> bool {
        self.0.pending.load(Ordering::Acquire)
    }

    pub fn has_pending_timer(&self) -> bool {
        self.0.timer.lock().is_some()
    }

    pub fn is_attached(&self) -> bool {
        matches!(&*self.0.link.lock(), Link::Attached(_))
    }

    pub fn is_unmounted(&self) -> bool {
        matches!(&*self.0.link.lock(), Link::Unmounted)
    }

    /// Renders this handle has scheduled over its lifetime.
    pub fn scheduled_count(&self) -> u64 {
        self.0.scheduled.load(Ordering::Relaxed)
    }

    /// Binds the handle to its mount's trigger. No effect after unmount.
    pub(crate) fn attach(&self, trigger: Trigger) {
        let mut link = self.0.link.lock();
        match &*link {
            Link::Unmounted => {}
            Link::Attached(current) if *current == trigger => {}
            _ => {
                log::trace!("update handle attached to {:?}", trigger.mount());
                *link = Link::Attached(trigger);
            }
        }
    }

    /// A render is starting: clear the pending flag and drop an armed timer,
    /// since this render already covers it.
    pub(crate) fn begin_render(&self) {
        self.0.pending.store(false, Ordering::Release);
        let timer = self.0.timer.lock().take();
        if let (Some(id), Link::Attached(trigger)) = (timer, &*self.0.link.lock()) {
            trigger.queue().cancel(id);
        }
    }

    pub(crate) fn unmount(&self) {
        let previous = std::mem::replace(&mut *self.0.link.lock(), Link::Unmounted);
        self.0.pending.store(false, Ordering::Release);
        if let (Some(id), Link::Attached(trigger)) = (self.0.timer.lock().take(), previous) {
            trigger.queue().cancel(id);
        }
    }
}

impl std::fmt::Debug for UpdateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateHandle")
            .field("policy", &self.0.policy)
            .field("pending", &self.is_pending())
            .field("attached", &self.is_attached())
            .finish()
    }
}
