//! Pending re-render requests and timers.
//!
//! This is the only host state reachable from outside a render, so it is
//! `Send + Sync`: a [`Trigger`] may be fired from a timer thread or any other
//! callback. Firing only records the mount; the host renders on its next
//! `flush`.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use web_time::{Duration, Instant};

use crate::clock::Clock;
use crate::runtime::MountId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

struct Timer {
    id: TimerId,
    deadline: Instant,
    mount: MountId,
}

#[derive(Default)]
struct QueueInner {
    alive: HashSet<MountId>,
    pending: Vec<MountId>,
    timers: Vec<Timer>,
    next_timer: u64,
}

impl QueueInner {
    fn request(&mut self, mount: MountId) -> bool {
        if !self.alive.contains(&mount) {
            return false;
        }
        if !self.pending.contains(&mount) {
            self.pending.push(mount);
        }
        true
    }
}

pub struct UpdateQueue {
    clock: Arc<dyn Clock>,
    inner: Mutex<QueueInner>,
}

impl UpdateQueue {
    pub(crate) fn new(clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self {
            clock,
            inner: Mutex::new(QueueInner::default()),
        })
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub(crate) fn register(&self, mount: MountId) {
        self.inner.lock().alive.insert(mount);
    }

    /// Forgets a mount: later requests and its timers become no-ops.
    pub(crate) fn retire(&self, mount: MountId) {
        let mut inner = self.inner.lock();
        inner.alive.remove(&mount);
        inner.pending.retain(|m| *m != mount);
        inner.timers.retain(|t| t.mount != mount);
    }

    pub fn is_alive(&self, mount: MountId) -> bool {
        self.inner.lock().alive.contains(&mount)
    }

    pub fn schedule_after(&self, delay: Duration, trigger: &Trigger) -> TimerId {
        let deadline = self.now() + delay;
        let mut inner = self.inner.lock();
        let id = TimerId(inner.next_timer);
        inner.next_timer += 1;
        inner.timers.push(Timer {
            id,
            deadline,
            mount: trigger.mount,
        });
        log::trace!("timer {:?} for {:?} in {:?}", id, trigger.mount, delay);
        id
    }

    /// Returns false if the timer already fired or was cancelled.
    pub fn cancel(&self, id: TimerId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.timers.len();
        inner.timers.retain(|t| t.id != id);
        inner.timers.len() != before
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.inner.lock().timers.iter().map(|t| t.deadline).min()
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.lock().pending.is_empty()
    }

    /// Moves every due timer's mount into the pending set.
    pub(crate) fn fire_due(&self) -> usize {
        let now = self.now();
        let mut inner = self.inner.lock();
        let (due, rest): (Vec<Timer>, Vec<Timer>) =
            std::mem::take(&mut inner.timers).into_iter().partition(|t| t.deadline <= now);
        inner.timers = rest;
        for timer in &due {
            inner.request(timer.mount);
        }
        due.len()
    }

    pub(crate) fn take_pending(&self) -> Vec<MountId> {
        std::mem::take(&mut self.inner.lock().pending)
    }
}

/// Marks one mount for re-render.
#[derive(Clone)]
pub struct Trigger {
    mount: MountId,
    queue: Arc<UpdateQueue>,
}

impl Trigger {
    pub(crate) fn new(mount: MountId, queue: Arc<UpdateQueue>) -> Self {
        Self { mount, queue }
    }

    /// Returns false (and does nothing) once the mount is gone.
    pub fn fire(&self) -> bool {
        let queued = self.queue.inner.lock().request(self.mount);
        if !queued {
            log::trace!("trigger for retired mount {:?} ignored", self.mount);
        }
        queued
    }

    pub fn fire_after(&self, delay: Duration) -> TimerId {
        self.queue.schedule_after(delay, self)
    }

    pub fn is_live(&self) -> bool {
        self.queue.is_alive(self.mount)
    }

    pub fn mount(&self) -> MountId {
        self.mount
    }

    pub fn queue(&self) -> &Arc<UpdateQueue> {
        &self.queue
    }
}

impl PartialEq for Trigger {
    fn eq(&self, other: &Self) -> bool {
        self.mount == other.mount && Arc::ptr_eq(&self.queue, &other.queue)
    }
}

impl std::fmt::Debug for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trigger").field("mount", &self.mount).finish()
    }
}
