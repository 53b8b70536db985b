use crate::constraints::Constraints;
use crate::policy::MeasurePolicy;
use remeasure_core::NodeId;
use remeasure_geometry::{Point, Rect, Size};
use smallvec::SmallVec;
use std::rc::Rc;

/// Which operation a node is currently executing.
///
/// Transitions are synchronous: a node leaves `Idle`, runs its policy on the
/// current call stack and returns to `Idle` before control goes back to the
/// scheduler loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayoutState {
    #[default]
    Idle,
    Measuring,
    LayingOut,
    LookaheadMeasuring,
    LookaheadLayingOut,
}

/// How the parent consumed this node's measurement.
///
/// A size change of a child measured `InMeasureBlock` forces the parent to
/// remeasure; a child measured `InLayoutBlock` only forces a relayout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UsageByParent {
    #[default]
    NotUsed,
    InMeasureBlock,
    InLayoutBlock,
}

/// Final geometry handed to position callbacks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutCoordinates {
    pub size: Size,
    /// Offset relative to the parent.
    pub position: Point,
    pub position_in_root: Point,
}

impl LayoutCoordinates {
    pub fn bounds_in_root(&self) -> Rect {
        Rect::from_origin_size(self.position_in_root, self.size)
    }
}

/// Callback fired by the [`OnPositionedDispatcher`](crate::OnPositionedDispatcher).
pub type OnPositionedCallback = Rc<dyn Fn(NodeId, &LayoutCoordinates)>;

/// A node in the layout arena.
///
/// Nodes are created and edited through
/// [`MeasureLayoutScheduler`](crate::MeasureLayoutScheduler); this type only
/// exposes read access to the state the scheduler maintains.
pub struct LayoutNode {
    pub(crate) id: NodeId,
    pub(crate) policy: Rc<dyn MeasurePolicy>,
    pub(crate) children: SmallVec<[NodeId; 4]>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) depth: usize,
    pub(crate) attached: bool,

    pub(crate) layout_state: LayoutState,
    pub(crate) measure_pending: bool,
    pub(crate) layout_pending: bool,
    pub(crate) lookahead_measure_pending: bool,
    pub(crate) lookahead_layout_pending: bool,

    pub(crate) is_placed: bool,
    pub(crate) placed_by_parent: bool,
    pub(crate) is_placed_in_lookahead: Option<bool>,
    pub(crate) placed_by_parent_in_lookahead: bool,

    pub(crate) measured_size: Option<Size>,
    pub(crate) lookahead_size: Option<Size>,
    pub(crate) position: Point,
    pub(crate) lookahead_position: Option<Point>,
    pub(crate) constraints: Option<Constraints>,
    pub(crate) lookahead_constraints: Option<Constraints>,
    pub(crate) measured_by_parent: UsageByParent,
    pub(crate) measured_by_parent_in_lookahead: UsageByParent,

    pub(crate) is_lookahead_root: bool,
    pub(crate) lookahead_root: Option<NodeId>,
    pub(crate) alignment_lines_required: bool,

    pub(crate) needs_on_positioned_dispatch: bool,
    pub(crate) on_positioned: SmallVec<[OnPositionedCallback; 1]>,

    pub(crate) measure_count: u32,
    pub(crate) layout_count: u32,
    pub(crate) lookahead_measure_count: u32,
}

impl LayoutNode {
    pub(crate) fn new(id: NodeId, policy: Rc<dyn MeasurePolicy>) -> Self {
        Self {
            id,
            policy,
            children: SmallVec::new(),
            parent: None,
            depth: 0,
            attached: false,
            layout_state: LayoutState::Idle,
            // New nodes need an initial measure and layout. The lookahead
            // flags are raised when the node joins a lookahead scope.
            measure_pending: true,
            layout_pending: true,
            lookahead_measure_pending: false,
            lookahead_layout_pending: false,
            is_placed: false,
            placed_by_parent: false,
            is_placed_in_lookahead: None,
            placed_by_parent_in_lookahead: false,
            measured_size: None,
            lookahead_size: None,
            position: Point::ZERO,
            lookahead_position: None,
            constraints: None,
            lookahead_constraints: None,
            measured_by_parent: UsageByParent::NotUsed,
            measured_by_parent_in_lookahead: UsageByParent::NotUsed,
            is_lookahead_root: false,
            lookahead_root: None,
            alignment_lines_required: false,
            needs_on_positioned_dispatch: false,
            on_positioned: SmallVec::new(),
            measure_count: 0,
            layout_count: 0,
            lookahead_measure_count: 0,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn policy(&self) -> Rc<dyn MeasurePolicy> {
        Rc::clone(&self.policy)
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// True when the node is reachable from the tree root.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn layout_state(&self) -> LayoutState {
        self.layout_state
    }

    pub fn measure_pending(&self) -> bool {
        self.measure_pending
    }

    pub fn layout_pending(&self) -> bool {
        self.layout_pending
    }

    pub fn lookahead_measure_pending(&self) -> bool {
        self.lookahead_measure_pending
    }

    pub fn lookahead_layout_pending(&self) -> bool {
        self.lookahead_layout_pending
    }

    pub fn is_placed(&self) -> bool {
        self.is_placed
    }

    /// `None` until the node has taken part in a lookahead placement.
    pub fn is_placed_in_lookahead(&self) -> Option<bool> {
        self.is_placed_in_lookahead
    }

    /// Defined only after the first successful measure.
    pub fn measured_size(&self) -> Option<Size> {
        self.measured_size
    }

    pub fn lookahead_size(&self) -> Option<Size> {
        self.lookahead_size
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn lookahead_position(&self) -> Option<Point> {
        self.lookahead_position
    }

    /// Constraints of the last real measure.
    pub fn constraints(&self) -> Option<Constraints> {
        self.constraints
    }

    pub fn lookahead_constraints(&self) -> Option<Constraints> {
        self.lookahead_constraints
    }

    pub fn measured_by_parent(&self) -> UsageByParent {
        self.measured_by_parent
    }

    pub fn measured_by_parent_in_lookahead(&self) -> UsageByParent {
        self.measured_by_parent_in_lookahead
    }

    pub fn is_lookahead_root(&self) -> bool {
        self.is_lookahead_root
    }

    /// Root of the lookahead scope this node lives in, if any.
    pub fn lookahead_root(&self) -> Option<NodeId> {
        self.lookahead_root
    }

    pub fn alignment_lines_required(&self) -> bool {
        self.alignment_lines_required
    }

    /// Number of real measurements performed on this node.
    pub fn measure_count(&self) -> u32 {
        self.measure_count
    }

    /// Number of real layouts performed on this node.
    pub fn layout_count(&self) -> u32 {
        self.layout_count
    }

    pub fn lookahead_measure_count(&self) -> u32 {
        self.lookahead_measure_count
    }

    pub(crate) fn has_pending_work(&self) -> bool {
        self.measure_pending
            || self.layout_pending
            || self.lookahead_measure_pending
            || self.lookahead_layout_pending
    }

    /// Pending size change the parent must react to.
    pub(crate) fn can_affect_parent(&self) -> bool {
        self.measure_pending
            && (self.measured_by_parent == UsageByParent::InMeasureBlock
                || self.alignment_lines_required)
    }

    pub(crate) fn can_affect_parent_in_lookahead(&self) -> bool {
        self.lookahead_measure_pending
            && (self.measured_by_parent_in_lookahead == UsageByParent::InMeasureBlock
                || self.alignment_lines_required)
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.layout_state != LayoutState::Idle
    }
}

impl std::fmt::Debug for LayoutNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutNode")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("depth", &self.depth)
            .field("state", &self.layout_state)
            .field("measure_pending", &self.measure_pending)
            .field("layout_pending", &self.layout_pending)
            .field("is_placed", &self.is_placed)
            .field("measured_size", &self.measured_size)
            .field("position", &self.position)
            .finish()
    }
}
