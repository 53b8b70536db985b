use crate::constraints::Constraints;
use crate::context::LayoutContext;
use crate::scheduler::MeasureLayoutScheduler;
use remeasure_core::NodeId;
use remeasure_geometry::{Point, Size};
use smallvec::SmallVec;

/// Measures a node and positions its children.
///
/// `measure` runs while the node is `Measuring` (or `LookaheadMeasuring`);
/// every child measured from it is recorded as `InMeasureBlock`. `place`
/// runs while the node is `LayingOut`; children measured from it are
/// recorded as `InLayoutBlock`. Children that are not placed during `place`
/// become unplaced together with their subtrees.
pub trait MeasurePolicy {
    fn measure(&self, scope: &mut MeasureScope<'_>, constraints: Constraints) -> Size;

    /// Places every measured child at the origin.
    fn place(&self, scope: &mut PlacementScope<'_>, size: Size) {
        let _ = size;
        for child in scope.children() {
            if scope.is_measured(child) {
                scope.place(child, Point::ZERO);
            }
        }
    }
}

/// View of the scheduler handed to [`MeasurePolicy::measure`].
pub struct MeasureScope<'a> {
    scheduler: &'a mut MeasureLayoutScheduler,
    node: NodeId,
    lookahead: bool,
}

impl<'a> MeasureScope<'a> {
    pub(crate) fn new(
        scheduler: &'a mut MeasureLayoutScheduler,
        node: NodeId,
        lookahead: bool,
    ) -> Self {
        Self {
            scheduler,
            node,
            lookahead,
        }
    }

    /// Node being measured.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// True while running the lookahead pass.
    pub fn is_lookahead(&self) -> bool {
        self.lookahead
    }

    pub fn context(&self) -> LayoutContext {
        self.scheduler.context()
    }

    pub fn children(&self) -> SmallVec<[NodeId; 4]> {
        SmallVec::from_slice(self.scheduler.tree().children(self.node))
    }

    /// Measures `child` in the current pass and returns its size.
    ///
    /// Skips the policy call when the child is clean and `constraints` equal
    /// the last ones it saw.
    pub fn measure(&mut self, child: NodeId, constraints: Constraints) -> Size {
        self.scheduler
            .measure_child(self.node, child, constraints, self.lookahead)
    }

    /// Size from the most recent lookahead measure of `node`.
    pub fn lookahead_size(&self, node: NodeId) -> Option<Size> {
        self.scheduler.tree().get(node).and_then(|n| n.lookahead_size())
    }

    /// Forces pending measurements below `child` so its size is final.
    pub fn force_measure_the_subtree(&mut self, child: NodeId) {
        self.scheduler
            .force_measure_the_subtree(child, self.lookahead);
    }

    pub fn scheduler(&mut self) -> &mut MeasureLayoutScheduler {
        self.scheduler
    }
}

/// View of the scheduler handed to [`MeasurePolicy::place`].
pub struct PlacementScope<'a> {
    scheduler: &'a mut MeasureLayoutScheduler,
    node: NodeId,
    lookahead: bool,
}

impl<'a> PlacementScope<'a> {
    pub(crate) fn new(
        scheduler: &'a mut MeasureLayoutScheduler,
        node: NodeId,
        lookahead: bool,
    ) -> Self {
        Self {
            scheduler,
            node,
            lookahead,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn is_lookahead(&self) -> bool {
        self.lookahead
    }

    pub fn context(&self) -> LayoutContext {
        self.scheduler.context()
    }

    pub fn children(&self) -> SmallVec<[NodeId; 4]> {
        SmallVec::from_slice(self.scheduler.tree().children(self.node))
    }

    /// True if `child` has a size in the current pass.
    pub fn is_measured(&self, child: NodeId) -> bool {
        self.measured_size(child).is_some()
    }

    /// Size of `child` in the current pass.
    pub fn measured_size(&self, child: NodeId) -> Option<Size> {
        let node = self.scheduler.tree().get(child)?;
        if self.lookahead {
            node.lookahead_size()
        } else {
            node.measured_size()
        }
    }

    /// Measures `child` from the placement block.
    pub fn measure(&mut self, child: NodeId, constraints: Constraints) -> Size {
        self.scheduler
            .measure_child(self.node, child, constraints, self.lookahead)
    }

    /// Places `child` at `position` relative to this node.
    ///
    /// # Panics
    ///
    /// Panics if `child` was never measured in the current pass.
    pub fn place(&mut self, child: NodeId, position: Point) {
        self.scheduler
            .place_child(self.node, child, position, self.lookahead);
    }

    pub fn scheduler(&mut self) -> &mut MeasureLayoutScheduler {
        self.scheduler
    }
}
