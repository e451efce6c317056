use std::any::Any;
use std::fmt::Write as _;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use std::sync::Arc;

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;
use web_time::Instant;

use crate::clock::{Clock, SystemClock};
use crate::error::{ErrorInfo, HostError, panic_message};
use crate::events::{Event, EventTarget};
use crate::hooks::{CommitJob, FrameGuard, HookFrame};
use crate::node::{Node, NodeKind};
use crate::queue::UpdateQueue;
use crate::scope::Scope;
use crate::unit::{Element, Mountable};

new_key_type! {
    /// One live occurrence of a unit in the tree.
    pub struct MountId;
}

struct MountRecord {
    unit: Rc<dyn Mountable>,
    props: Rc<dyn Any>,
    handle: Option<Rc<dyn Any>>,
    key: Option<String>,
    /// Index among the parent's component children at the last placement.
    position: usize,
    depth: usize,
    slots: Vec<Box<dyn Any>>,
    scope: Scope,
    children: SmallVec<[MountId; 4]>,
    /// Previous children not yet matched during a reconcile.
    stale: Vec<MountId>,
    output: Option<Node>,
    generation: u64,
}

pub struct HostOptions {
    pub clock: Arc<dyn Clock>,
    /// Upper bound on render passes per flush before giving up.
    pub max_update_passes: usize,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            max_update_passes: 64,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HostStats {
    pub renders: u64,
    pub commits: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub passes: usize,
    pub rendered: u64,
}

pub struct Host {
    mounts: SlotMap<MountId, MountRecord>,
    root: Option<MountId>,
    queue: Arc<UpdateQueue>,
    window: EventTarget,
    layout: Vec<CommitJob>,
    passive: Vec<CommitJob>,
    stats: HostStats,
    max_update_passes: usize,
}

impl Host {
    pub fn new() -> Self {
        Self::with_options(HostOptions::default())
    }

    pub fn with_options(options: HostOptions) -> Self {
        Self {
            mounts: SlotMap::with_key(),
            root: None,
            queue: UpdateQueue::new(options.clock),
            window: EventTarget::new(),
            layout: Vec::new(),
            passive: Vec::new(),
            stats: HostStats::default(),
            max_update_passes: options.max_update_passes,
        }
    }

    /// Mounts `element` as the root, or re-renders the root with new props if
    /// it is the same unit. Commits, then flushes follow-up updates.
    pub fn render(&mut self, element: Element) -> Result<FlushReport, HostError> {
        let reuse = self.root.filter(|root| {
            self.mounts
                .get(*root)
                .is_some_and(|r| element.same_unit(&r.unit) && r.key == element.key)
        });
        let root = match reuse {
            Some(root) => {
                let record = &mut self.mounts[root];
                record.props = element.props;
                record.handle = element.handle;
                root
            }
            None => {
                if let Some(old) = self.root.take() {
                    self.unmount_subtree(old);
                }
                let root = self.insert_mount(element, 0, 0);
                self.root = Some(root);
                root
            }
        };
        let renders = self.stats.renders;
        self.render_mount(root);
        self.commit();
        let initial = self.stats.renders - renders;
        let mut report = self.flush()?;
        report.rendered += initial;
        Ok(report)
    }

    /// Renders every mount whose trigger fired (or whose timer came due),
    /// parents first, then commits. Repeats until nothing is pending.
    pub fn flush(&mut self) -> Result<FlushReport, HostError> {
        let mut report = FlushReport::default();
        loop {
            self.queue.fire_due();
            if !self.queue.has_pending() {
                return Ok(report);
            }
            // Requests stay queued so a later flush can still serve them.
            if report.passes >= self.max_update_passes {
                return Err(HostError::UpdateLoop {
                    passes: report.passes,
                });
            }
            let mut pending: Vec<(MountId, usize, u64)> = self
                .queue
                .take_pending()
                .into_iter()
                .filter_map(|id| self.mounts.get(id).map(|r| (id, r.depth, r.generation)))
                .collect();
            report.passes += 1;
            pending.sort_by_key(|(_, depth, _)| *depth);

            let renders = self.stats.renders;
            for (id, _, generation) in pending {
                // Skip mounts already re-rendered by an ancestor in this pass.
                let untouched = self
                    .mounts
                    .get(id)
                    .is_some_and(|r| r.generation == generation);
                if untouched {
                    self.render_mount(id);
                }
            }
            self.commit();
            report.rendered += self.stats.renders - renders;
            log::trace!("flush pass {} rendered {}", report.passes, report.rendered);
        }
    }

    /// Calls the `event.name` handler of the committed node with `id` equal
    /// to `target`, then flushes.
    pub fn dispatch(&mut self, target: &str, event: Event) -> Result<FlushReport, HostError> {
        let handler = {
            let node = self
                .find(target)
                .ok_or_else(|| HostError::UnknownTarget(target.to_string()))?;
            node.handler(&event.name).ok_or_else(|| HostError::NoHandler {
                target: target.to_string(),
                event: event.name.clone(),
            })?
        };
        handler(&event);
        self.flush()
    }

    /// Tears down the whole tree, children first.
    pub fn unmount(&mut self) {
        if let Some(root) = self.root.take() {
            self.unmount_subtree(root);
        }
        self.layout.clear();
        self.passive.clear();
    }

    pub fn output(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root {
            self.write_mount(root, &mut out);
        }
        out
    }

    /// Live mounts by unit name, one per line, indented by depth.
    pub fn debug_tree(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root {
            self.write_tree(root, &mut out);
        }
        out
    }

    pub fn window(&self) -> EventTarget {
        self.window.clone()
    }

    pub fn queue(&self) -> &Arc<UpdateQueue> {
        &self.queue
    }

    pub fn stats(&self) -> HostStats {
        self.stats
    }

    pub fn root(&self) -> Option<MountId> {
        self.root
    }

    pub fn mount_count(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_mounted(&self, id: MountId) -> bool {
        self.mounts.contains_key(id)
    }

    /// How many times the mount has rendered.
    pub fn render_count(&self, id: MountId) -> Option<u64> {
        self.mounts.get(id).map(|r| r.generation)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.next_deadline()
    }

    fn insert_mount(&mut self, element: Element, depth: usize, position: usize) -> MountId {
        let id = self.mounts.insert(MountRecord {
            unit: element.unit,
            props: element.props,
            handle: element.handle,
            key: element.key,
            position,
            depth,
            slots: Vec::new(),
            scope: Scope::new(),
            children: SmallVec::new(),
            stale: Vec::new(),
            output: None,
            generation: 0,
        });
        self.queue.register(id);
        log::debug!("mount {} ({:?})", self.mounts[id].unit.name(), id);
        id
    }

    fn render_mount(&mut self, id: MountId) {
        let Some(record) = self.mounts.get_mut(id) else {
            return;
        };
        record.generation += 1;
        let frame = HookFrame {
            mount: id,
            generation: record.generation,
            slots: std::mem::take(&mut record.slots),
            cursor: 0,
            scope: record.scope.clone(),
            queue: self.queue.clone(),
            layout: Vec::new(),
            passive: Vec::new(),
        };
        let unit = record.unit.clone();
        let props = record.props.clone();
        let handle = record.handle.clone();

        let guard = FrameGuard::enter(frame);
        let output = unit.render(&*props, handle.as_deref());
        let frame = guard.exit();
        self.stats.renders += 1;

        let (layout, passive) = match frame {
            Some(frame) => {
                if let Some(record) = self.mounts.get_mut(id) {
                    record.slots = frame.slots;
                }
                (frame.layout, frame.passive)
            }
            None => (Vec::new(), Vec::new()),
        };

        if unit.is_boundary() {
            self.reconcile_guarded(id, output);
        } else {
            self.reconcile(id, output);
        }

        // Children were committed into the queues above; parents go after.
        self.layout.extend(layout);
        self.passive.extend(passive);
    }

    fn reconcile(&mut self, parent: MountId, output: Option<Node>) {
        let Some(record) = self.mounts.get_mut(parent) else {
            return;
        };
        record.stale = std::mem::take(&mut record.children).into_vec();
        let depth = record.depth + 1;

        let mut position = 0;
        let resolved = output.map(|node| self.resolve(parent, depth, node, &mut position));

        let leftover = match self.mounts.get_mut(parent) {
            Some(record) => {
                record.output = resolved;
                std::mem::take(&mut record.stale)
            }
            None => Vec::new(),
        };
        for id in leftover {
            self.unmount_subtree(id);
        }
    }

    fn resolve(&mut self, parent: MountId, depth: usize, mut node: Node, position: &mut usize) -> Node {
        match std::mem::replace(&mut node.kind, NodeKind::Fragment) {
            NodeKind::Component(element) => {
                let id = self.place(parent, depth, element, *position);
                *position += 1;
                node.kind = NodeKind::Mount(id);
                return node;
            }
            kind => node.kind = kind,
        }
        let children = std::mem::take(&mut node.children);
        node.children = children
            .into_iter()
            .map(|child| self.resolve(parent, depth, child, position))
            .collect();
        node
    }

    fn place(&mut self, parent: MountId, depth: usize, element: Element, position: usize) -> MountId {
        let found = self.mounts[parent].stale.iter().position(|id| {
            let r = &self.mounts[*id];
            element.same_unit(&r.unit)
                && match (&element.key, &r.key) {
                    (Some(a), Some(b)) => a == b,
                    (None, None) => r.position == position,
                    _ => false,
                }
        });

        let id = match found {
            Some(index) => {
                let id = self.mounts[parent].stale.remove(index);
                let record = &mut self.mounts[id];
                record.props = element.props;
                record.handle = element.handle;
                record.position = position;
                id
            }
            None => self.insert_mount(element, depth, position),
        };
        // Reachable from the parent before rendering, so a panic below can
        // still be cleaned up by a boundary.
        self.mounts[parent].children.push(id);
        self.render_mount(id);
        id
    }

    fn reconcile_guarded(&mut self, id: MountId, output: Option<Node>) {
        let result = catch_unwind(AssertUnwindSafe(|| self.reconcile(id, output)));
        let Err(payload) = result else {
            return;
        };

        let Some(record) = self.mounts.get_mut(id) else {
            return;
        };
        let info = ErrorInfo {
            message: panic_message(&*payload),
            component: record
                .props
                .downcast_ref::<Element>()
                .map(|el| el.name().to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
        };
        log::warn!("boundary caught panic in {}: {}", info.component, info.message);

        let doomed: Vec<MountId> = record
            .children
            .drain(..)
            .chain(record.stale.drain(..))
            .collect();
        let fallback = record.unit.recover(&info);
        for child in doomed {
            self.unmount_subtree(child);
        }
        self.reconcile(id, fallback);
    }

    fn unmount_subtree(&mut self, id: MountId) {
        let Some(record) = self.mounts.get_mut(id) else {
            return;
        };
        let children: Vec<MountId> = record
            .children
            .drain(..)
            .chain(record.stale.drain(..))
            .collect();
        for child in children {
            self.unmount_subtree(child);
        }

        self.queue.retire(id);
        if let Some(record) = self.mounts.remove(id) {
            log::debug!("unmount {} ({:?})", record.unit.name(), id);
            record.scope.dispose();
        }
    }

    fn commit(&mut self) {
        let layout = std::mem::take(&mut self.layout);
        let passive = std::mem::take(&mut self.passive);
        for job in layout.into_iter().chain(passive) {
            if self.mounts.contains_key(job.mount) {
                (job.run)();
            }
        }
        self.stats.commits += 1;
    }

    fn find(&self, target: &str) -> Option<&Node> {
        let root = self.mounts.get(self.root?)?.output.as_ref()?;
        self.find_in(root, target)
    }

    fn find_in<'a>(&'a self, node: &'a Node, target: &str) -> Option<&'a Node> {
        if node.get_attr("id") == Some(target) {
            return Some(node);
        }
        if let NodeKind::Mount(id) = &node.kind {
            let output = self.mounts.get(*id)?.output.as_ref()?;
            return self.find_in(output, target);
        }
        node.children
            .iter()
            .find_map(|child| self.find_in(child, target))
    }

    fn write_mount(&self, id: MountId, out: &mut String) {
        if let Some(node) = self.mounts.get(id).and_then(|r| r.output.as_ref()) {
            node.write_markup(out, &|child, out| self.write_mount(child, out));
        }
    }

    fn write_tree(&self, id: MountId, out: &mut String) {
        let Some(record) = self.mounts.get(id) else {
            return;
        };
        let _ = writeln!(out, "{}{}", "  ".repeat(record.depth), record.unit.name());
        for child in &record.children {
            self.write_tree(*child, out);
        }
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        // Run outstanding cleanups so nothing registered by effects leaks.
        self.unmount();
    }
}
