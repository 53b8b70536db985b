use crate::recording::{PassEvent, PassLog, RecordingPolicy};
use remeasure_core::Owned;
use remeasure_geometry::{Point, Size};
use remeasure_layout::{
    BoxPolicy, Constraints, FixedSizePolicy, LayoutContext, LinearPolicy, MeasureLayoutScheduler,
    MeasurePolicy, NodeId, SchedulerConfig,
};
use std::rc::Rc;

/// Scheduler wrapper that records every policy call and always runs the
/// consistency checker.
///
/// Every node created through the harness is wrapped in a
/// [`RecordingPolicy`] that writes to the harness log.
pub struct LayoutHarness {
    scheduler: MeasureLayoutScheduler,
    log: PassLog,
}

impl LayoutHarness {
    pub fn new(root_constraints: Constraints) -> Self {
        let mut scheduler = MeasureLayoutScheduler::with_config(
            LayoutContext::default(),
            SchedulerConfig {
                check_consistency: true,
            },
        );
        scheduler.set_root_constraints(root_constraints);
        Self {
            scheduler,
            log: PassLog::new(),
        }
    }

    pub fn scheduler(&self) -> &MeasureLayoutScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut MeasureLayoutScheduler {
        &mut self.scheduler
    }

    pub fn log(&self) -> &PassLog {
        &self.log
    }

    /// Creates a detached node whose policy is recorded.
    pub fn node(&mut self, policy: Rc<dyn MeasurePolicy>) -> NodeId {
        let recorded = RecordingPolicy::new(policy, self.log.clone());
        self.scheduler.create_node(Rc::new(recorded))
    }

    /// Creates a fixed size leaf and returns the handle that resizes it.
    pub fn leaf(&mut self, size: Size) -> (NodeId, Owned<Size>) {
        let policy = FixedSizePolicy::new(size);
        let handle = policy.handle();
        (self.node(Rc::new(policy)), handle)
    }

    pub fn boxed(&mut self) -> NodeId {
        self.node(Rc::new(BoxPolicy::default()))
    }

    pub fn column(&mut self) -> NodeId {
        self.node(Rc::new(LinearPolicy::column()))
    }

    pub fn row(&mut self) -> NodeId {
        self.node(Rc::new(LinearPolicy::row()))
    }

    pub fn set_root(&mut self, node: NodeId) {
        if let Err(err) = self.scheduler.set_root(node) {
            panic!("set_root({node}) failed: {err}");
        }
    }

    /// Appends `child` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let index = self.scheduler.tree().children(parent).len();
        if let Err(err) = self.scheduler.insert_child(parent, index, child) {
            panic!("append({parent}, {child}) failed: {err}");
        }
    }

    /// Builds a root box with a chain of `depth` nested boxes ending in a
    /// fixed leaf. Returns the ids from root to leaf and the leaf handle.
    pub fn chain(&mut self, depth: usize, leaf_size: Size) -> (Vec<NodeId>, Owned<Size>) {
        let root = self.boxed();
        self.set_root(root);
        let mut ids = vec![root];
        let mut tail = root;
        for _ in 0..depth {
            let next = self.boxed();
            self.append(tail, next);
            ids.push(next);
            tail = next;
        }
        let (leaf, handle) = self.leaf(leaf_size);
        self.append(tail, leaf);
        ids.push(leaf);
        (ids, handle)
    }

    /// Builds a root column with `count` fixed leaves.
    pub fn wide(&mut self, count: usize, leaf_size: Size) -> (NodeId, Vec<(NodeId, Owned<Size>)>) {
        let root = self.column();
        self.set_root(root);
        let leaves = (0..count)
            .map(|_| {
                let (leaf, handle) = self.leaf(leaf_size);
                self.append(root, leaf);
                (leaf, handle)
            })
            .collect();
        (root, leaves)
    }

    /// Runs one pass and returns the events it produced.
    pub fn pass(&mut self) -> Vec<PassEvent> {
        self.log.clear();
        self.scheduler.measure_and_layout();
        self.log.events()
    }

    pub fn size(&self, node: NodeId) -> Option<Size> {
        self.scheduler.node(node).and_then(|n| n.measured_size())
    }

    pub fn position(&self, node: NodeId) -> Point {
        self.scheduler
            .node(node)
            .map(|n| n.position())
            .unwrap_or(Point::ZERO)
    }

    pub fn position_in_root(&self, node: NodeId) -> Point {
        self.scheduler.tree().position_in_root(node)
    }

    pub fn measure_count(&self, node: NodeId) -> u32 {
        self.scheduler.node(node).map_or(0, |n| n.measure_count())
    }

    pub fn layout_count(&self, node: NodeId) -> u32 {
        self.scheduler.node(node).map_or(0, |n| n.layout_count())
    }
}
