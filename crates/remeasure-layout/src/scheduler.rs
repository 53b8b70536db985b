//! Incremental measure and layout scheduling.
//!
//! Invalidations mark nodes dirty and record them in a [`DepthSortedSet`].
//! [`MeasureLayoutScheduler::measure_and_layout`] then visits dirty nodes
//! shallowest first, so a parent is always processed before the children it
//! is going to remeasure anyway. Requests that arrive while a node is mid
//! operation are either absorbed or postponed until the node is idle again.

use crate::consistency::LayoutTreeConsistencyChecker;
use crate::constraints::Constraints;
use crate::context::{LayoutContext, SchedulerConfig};
use crate::depth_sorted_set::DepthSortedSet;
use crate::error::LayoutError;
use crate::node::{LayoutNode, LayoutState, OnPositionedCallback, UsageByParent};
use crate::policy::{MeasurePolicy, MeasureScope, PlacementScope};
use crate::positioned::OnPositionedDispatcher;
use crate::tree::LayoutTree;
use remeasure_core::{FrameScheduler, NodeId};
use remeasure_geometry::{Point, Size};
use smallvec::SmallVec;
use std::rc::Rc;

/// A remeasure request that arrived while its node was laying out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PostponedRequest {
    pub node: NodeId,
    pub is_lookahead: bool,
    pub is_forced: bool,
    /// The node's measure count (lookahead count for lookahead requests)
    /// when the request arrived. A later measure satisfies the request.
    pub measure_count: u32,
}

type LayoutCompletedListener = Box<dyn FnOnce()>;

/// Owns the layout tree and drives measure and layout passes over it.
pub struct MeasureLayoutScheduler {
    tree: LayoutTree,
    relayout_nodes: DepthSortedSet,
    postponed_requests: Vec<PostponedRequest>,
    on_positioned_dispatcher: OnPositionedDispatcher,
    during_measure_layout: bool,
    root_constraints: Option<Constraints>,
    context: LayoutContext,
    config: SchedulerConfig,
    frame_scheduler: Option<Rc<dyn FrameScheduler>>,
    on_layout_completed: Vec<LayoutCompletedListener>,
}

impl Default for MeasureLayoutScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasureLayoutScheduler {
    pub fn new() -> Self {
        Self::with_config(LayoutContext::default(), SchedulerConfig::default())
    }

    pub fn with_config(context: LayoutContext, config: SchedulerConfig) -> Self {
        Self {
            tree: LayoutTree::new(),
            relayout_nodes: DepthSortedSet::new(),
            postponed_requests: Vec::new(),
            on_positioned_dispatcher: OnPositionedDispatcher::new(),
            during_measure_layout: false,
            root_constraints: None,
            context,
            config,
            frame_scheduler: None,
            on_layout_completed: Vec::new(),
        }
    }

    /// Host hook asked for a frame whenever an invalidation needs a pass.
    pub fn set_frame_scheduler(&mut self, scheduler: Rc<dyn FrameScheduler>) {
        self.frame_scheduler = Some(scheduler);
    }

    pub fn tree(&self) -> &LayoutTree {
        &self.tree
    }

    pub fn node(&self, id: NodeId) -> Option<&LayoutNode> {
        self.tree.get(id)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.tree.root()
    }

    pub fn context(&self) -> LayoutContext {
        self.context
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    pub fn root_constraints(&self) -> Option<Constraints> {
        self.root_constraints
    }

    pub fn during_measure_layout(&self) -> bool {
        self.during_measure_layout
    }

    /// True if a pass would do any work.
    pub fn has_pending_measure_or_layout(&self) -> bool {
        !self.relayout_nodes.is_empty()
    }

    pub fn dirty_nodes(&self) -> &DepthSortedSet {
        &self.relayout_nodes
    }

    pub fn postponed_requests(&self) -> &[PostponedRequest] {
        &self.postponed_requests
    }

    // ── tree editing ────────────────────────────────────────────────────

    pub fn create_node(&mut self, policy: Rc<dyn MeasurePolicy>) -> NodeId {
        self.tree.create_node(policy)
    }

    /// Makes `node` the root of the tree.
    ///
    /// The root is placed by definition and measured with the root
    /// constraints. A previous root and its subtree are detached.
    pub fn set_root(&mut self, node: NodeId) -> Result<(), LayoutError> {
        if let Some(previous) = self.tree.set_root(node)? {
            let freed = self.tree.subtree(previous);
            self.purge(&freed);
        }
        let depth = {
            let root = self.tree.node_mut(node);
            root.is_placed = true;
            root.measure_pending = true;
            root.layout_pending = true;
            root.depth
        };
        for id in self.tree.subtree(node) {
            let depth = self.tree.node(id).depth;
            self.relayout_nodes.update_depth(id, depth);
        }
        self.relayout_nodes.add(node, depth);
        self.schedule_frame();
        Ok(())
    }

    pub fn set_root_constraints(&mut self, constraints: Constraints) {
        if self.root_constraints == Some(constraints) {
            return;
        }
        self.root_constraints = Some(constraints);
        if let Some(root) = self.tree.root() {
            let node = self.tree.node_mut(root);
            node.measure_pending = true;
            let depth = node.depth;
            self.relayout_nodes.add(root, depth);
            self.schedule_frame();
        }
    }

    /// Replaces density or layout direction, invalidating every attached
    /// node's measurement.
    pub fn set_context(&mut self, context: LayoutContext) {
        if self.context == context {
            return;
        }
        self.context = context;
        let Some(root) = self.tree.root() else {
            return;
        };
        for id in self.tree.subtree(root) {
            let node = self.tree.node_mut(id);
            node.measure_pending = true;
            if node.lookahead_root.is_some() {
                node.lookahead_measure_pending = true;
            }
        }
        let depth = self.tree.node(root).depth;
        self.relayout_nodes.add(root, depth);
        self.schedule_frame();
    }

    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), LayoutError> {
        self.tree.insert_child(parent, index, child)?;
        for id in self.tree.subtree(child) {
            let depth = self.tree.node(id).depth;
            self.relayout_nodes.update_depth(id, depth);
        }
        self.invalidate_measurement(parent);
        Ok(())
    }

    /// Removes `child` and destroys its subtree.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), LayoutError> {
        let removed = self.tree.remove_child(parent, child)?;
        log::debug!("removed {} nodes under {}", removed.len(), parent);
        self.purge(&removed);
        self.invalidate_measurement(parent);
        Ok(())
    }

    pub fn move_child(&mut self, parent: NodeId, from: usize, to: usize) -> Result<(), LayoutError> {
        self.tree.move_child(parent, from, to)?;
        self.invalidate_measurement(parent);
        Ok(())
    }

    pub fn set_policy(
        &mut self,
        node: NodeId,
        policy: Rc<dyn MeasurePolicy>,
    ) -> Result<(), LayoutError> {
        self.tree
            .get_mut(node)
            .ok_or(LayoutError::Missing { id: node })?
            .policy = policy;
        self.invalidate_measurement(node);
        Ok(())
    }

    /// Opens (or closes) a lookahead scope rooted at `node`.
    pub fn set_lookahead_root(
        &mut self,
        node: NodeId,
        is_lookahead_root: bool,
    ) -> Result<(), LayoutError> {
        self.tree.set_lookahead_root(node, is_lookahead_root)?;
        for id in self.tree.subtree(node) {
            let node = self.tree.node_mut(id);
            if node.lookahead_root.is_some() {
                node.lookahead_measure_pending = true;
                node.lookahead_layout_pending = true;
            }
        }
        let needs_pass = if is_lookahead_root {
            self.request_lookahead_remeasure(node, true)
        } else {
            self.request_remeasure(node, true)
        };
        if needs_pass {
            self.schedule_frame();
        }
        Ok(())
    }

    pub fn set_alignment_lines_required(
        &mut self,
        node: NodeId,
        required: bool,
    ) -> Result<(), LayoutError> {
        self.tree
            .get_mut(node)
            .ok_or(LayoutError::Missing { id: node })?
            .alignment_lines_required = required;
        Ok(())
    }

    pub fn add_on_positioned_callback(
        &mut self,
        node: NodeId,
        callback: OnPositionedCallback,
    ) -> Result<(), LayoutError> {
        self.tree
            .get_mut(node)
            .ok_or(LayoutError::Missing { id: node })?
            .on_positioned
            .push(callback);
        Ok(())
    }

    /// Runs `listener` once, after the next completed pass.
    pub fn register_on_layout_completed(&mut self, listener: impl FnOnce() + 'static) {
        self.on_layout_completed.push(Box::new(listener));
    }

    /// Drops every reference to nodes that no longer exist.
    fn purge(&mut self, removed: &[NodeId]) {
        for &id in removed {
            self.relayout_nodes.remove(id);
            self.on_positioned_dispatcher.remove(id);
        }
        self.postponed_requests
            .retain(|request| !removed.contains(&request.node));
    }

    fn schedule_frame(&self) {
        if self.during_measure_layout {
            return;
        }
        if let Some(scheduler) = &self.frame_scheduler {
            scheduler.schedule_frame();
        }
    }

    // ── invalidation ────────────────────────────────────────────────────

    /// Invalidates the measurement of `node` and asks the host for a frame
    /// when a pass is needed.
    pub fn invalidate_measurement(&mut self, node: NodeId) -> bool {
        let Some(n) = self.tree.get(node) else {
            return false;
        };
        let needs_pass = if n.lookahead_root.is_some() {
            self.request_lookahead_remeasure(node, false)
        } else {
            self.request_remeasure(node, false)
        };
        if needs_pass {
            self.schedule_frame();
        }
        needs_pass
    }

    pub fn invalidate_layout(&mut self, node: NodeId) -> bool {
        let Some(n) = self.tree.get(node) else {
            return false;
        };
        let needs_pass = if n.lookahead_root.is_some() {
            self.request_lookahead_relayout(node, false)
        } else {
            self.request_relayout(node, false)
        };
        if needs_pass {
            self.schedule_frame();
        }
        needs_pass
    }

    /// Marks `node` as needing a measure.
    ///
    /// Returns true if the caller should schedule a pass: the request was
    /// recorded and no pass is currently running.
    pub fn request_remeasure(&mut self, node: NodeId, forced: bool) -> bool {
        let state = self.tree.node(node).layout_state;
        match state {
            LayoutState::Measuring | LayoutState::LookaheadMeasuring => {
                // The in-flight measure will see the latest state.
                false
            }
            LayoutState::LayingOut | LayoutState::LookaheadLayingOut => {
                self.postpone(node, false, forced);
                false
            }
            LayoutState::Idle => {
                let n = self.tree.node_mut(node);
                if n.measure_pending && !forced {
                    return false;
                }
                n.measure_pending = true;
                let affects_tree = n.attached && (n.is_placed || n.can_affect_parent());
                if affects_tree && !self.parent_measure_pending(node) {
                    self.add_dirty(node);
                }
                !self.during_measure_layout
            }
        }
    }

    /// Marks `node` as needing a lookahead measure, which implies a real
    /// measure as well.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not inside a lookahead scope.
    pub fn request_lookahead_remeasure(&mut self, node: NodeId, forced: bool) -> bool {
        let (state, in_scope) = {
            let n = self.tree.node(node);
            (n.layout_state, n.lookahead_root.is_some())
        };
        assert!(
            in_scope,
            "lookahead remeasure requested for node {node} outside a lookahead scope"
        );
        match state {
            LayoutState::LookaheadMeasuring => false,
            LayoutState::Measuring | LayoutState::LayingOut | LayoutState::LookaheadLayingOut => {
                self.postpone(node, true, forced);
                false
            }
            LayoutState::Idle => {
                let n = self.tree.node_mut(node);
                if n.lookahead_measure_pending && !forced {
                    return false;
                }
                n.lookahead_measure_pending = true;
                n.measure_pending = true;
                let attached = n.attached;
                let in_lookahead = n.is_placed_in_lookahead == Some(true)
                    || n.can_affect_parent_in_lookahead();
                let in_real = n.is_placed || n.can_affect_parent();
                let covered_in_lookahead = !in_lookahead || self.parent_lookahead_measure_pending(node);
                let covered_in_real = !in_real || self.parent_measure_pending(node);
                if attached && !(covered_in_lookahead && covered_in_real) {
                    self.add_dirty(node);
                }
                !self.during_measure_layout
            }
        }
    }

    /// Marks `node` as needing a layout.
    pub fn request_relayout(&mut self, node: NodeId, forced: bool) -> bool {
        let n = self.tree.node(node);
        if n.is_busy() {
            // The running operation is followed by a layout of this node.
            return false;
        }
        if !forced && (n.measure_pending || n.layout_pending) {
            return false;
        }
        let n = self.tree.node_mut(node);
        n.layout_pending = true;
        let placed = n.attached && n.is_placed;
        if placed && !self.parent_layout_pending(node) {
            self.add_dirty(node);
        }
        !self.during_measure_layout
    }

    /// Marks `node` as needing a lookahead layout, which implies a real
    /// layout as well.
    pub fn request_lookahead_relayout(&mut self, node: NodeId, forced: bool) -> bool {
        let n = self.tree.node(node);
        assert!(
            n.lookahead_root.is_some(),
            "lookahead relayout requested for node {node} outside a lookahead scope"
        );
        if n.is_busy() {
            return false;
        }
        if !forced && (n.lookahead_measure_pending || n.lookahead_layout_pending) {
            return false;
        }
        let n = self.tree.node_mut(node);
        n.lookahead_layout_pending = true;
        n.layout_pending = true;
        let placed = n.attached && (n.is_placed_in_lookahead == Some(true) || n.is_placed);
        if placed && !self.parent_layout_pending(node) {
            self.add_dirty(node);
        }
        !self.during_measure_layout
    }

    fn postpone(&mut self, node: NodeId, is_lookahead: bool, is_forced: bool) {
        if let Some(existing) = self
            .postponed_requests
            .iter_mut()
            .find(|request| request.node == node && request.is_lookahead == is_lookahead)
        {
            existing.is_forced |= is_forced;
            return;
        }
        log::trace!("postponing remeasure of {node} (lookahead: {is_lookahead})");
        let measure_count = self.measure_count(node, is_lookahead);
        self.postponed_requests.push(PostponedRequest {
            node,
            is_lookahead,
            is_forced,
            measure_count,
        });
    }

    fn drain_postponed_requests(&mut self) {
        if self.postponed_requests.is_empty() {
            return;
        }
        let requests = std::mem::take(&mut self.postponed_requests);
        for request in requests {
            if !self.tree.is_attached(request.node) {
                continue;
            }
            if self.measure_count(request.node, request.is_lookahead) > request.measure_count {
                log::trace!("postponed remeasure of {} already satisfied", request.node);
                continue;
            }
            if request.is_lookahead {
                self.request_lookahead_remeasure(request.node, request.is_forced);
            } else {
                self.request_remeasure(request.node, request.is_forced);
            }
        }
    }

    fn measure_count(&self, node: NodeId, lookahead: bool) -> u32 {
        let n = self.tree.node(node);
        if lookahead {
            n.lookahead_measure_count
        } else {
            n.measure_count
        }
    }

    fn add_dirty(&mut self, node: NodeId) {
        let n = self.tree.node(node);
        debug_assert_eq!(n.layout_state, LayoutState::Idle);
        self.relayout_nodes.add(node, n.depth);
    }

    fn parent_measure_pending(&self, node: NodeId) -> bool {
        self.tree
            .parent(node)
            .is_some_and(|parent| self.tree.node(parent).measure_pending)
    }

    fn parent_lookahead_measure_pending(&self, node: NodeId) -> bool {
        self.tree
            .parent(node)
            .is_some_and(|parent| self.tree.node(parent).lookahead_measure_pending)
    }

    fn parent_layout_pending(&self, node: NodeId) -> bool {
        self.tree.parent(node).is_some_and(|parent| {
            let parent = self.tree.node(parent);
            parent.measure_pending || parent.layout_pending
        })
    }

    // ── the pass ────────────────────────────────────────────────────────

    /// Measures and lays out every dirty node.
    ///
    /// Returns true if the root's size changed. Position callbacks and
    /// layout-completed listeners run after the tree is settled.
    ///
    /// # Panics
    ///
    /// Panics when called from inside a running pass.
    pub fn measure_and_layout(&mut self) -> bool {
        assert!(
            !self.during_measure_layout,
            "measure_and_layout cannot be called while a pass is running"
        );
        let Some(root) = self.tree.root() else {
            return false;
        };
        if self.root_constraints.is_none() {
            log::debug!("skipping measure_and_layout: root constraints not set");
            return false;
        }

        self.during_measure_layout = true;
        let mut root_size_changed = false;
        let mut processed = 0usize;
        while let Some(node) = self.relayout_nodes.pop() {
            processed += 1;
            let size_changed = self.remeasure_and_relayout_if_needed(node);
            if node == root && size_changed {
                root_size_changed = true;
            }
            if self.config.check_consistency {
                LayoutTreeConsistencyChecker::new(
                    &self.tree,
                    &self.relayout_nodes,
                    &self.postponed_requests,
                )
                .assert_consistent();
            }
        }
        self.drain_postponed_requests();
        self.during_measure_layout = false;

        log::debug!(
            "measure_and_layout processed {processed} dirty nodes (root resized: {root_size_changed})"
        );

        self.on_positioned_dispatcher.dispatch(&mut self.tree);
        for listener in std::mem::take(&mut self.on_layout_completed) {
            listener();
        }
        root_size_changed
    }

    /// Dispatches position callbacks registered during the last pass without
    /// waiting for the next one.
    pub fn dispatch_on_positioned_callbacks(&mut self) -> usize {
        self.on_positioned_dispatcher.dispatch(&mut self.tree)
    }

    /// Measures, during a running pass, every pending node under `node` so
    /// the caller can read final sizes.
    ///
    /// # Panics
    ///
    /// Panics outside [`MeasureLayoutScheduler::measure_and_layout`].
    pub fn force_measure_the_subtree(&mut self, node: NodeId, affects_lookahead: bool) {
        assert!(
            self.during_measure_layout,
            "force_measure_the_subtree must run inside measure_and_layout"
        );
        if !self.tree.contains(node) {
            return;
        }
        self.force_measure_the_subtree_internal(node, affects_lookahead);
    }

    fn force_measure_the_subtree_internal(&mut self, node: NodeId, lookahead: bool) {
        let pending = |n: &LayoutNode| {
            if lookahead {
                n.lookahead_measure_pending
            } else {
                n.measure_pending
            }
        };
        let children: SmallVec<[NodeId; 4]> = SmallVec::from_slice(self.tree.children(node));
        for child in children {
            let child_node = self.tree.node(child);
            let usage = if lookahead {
                child_node.measured_by_parent_in_lookahead
            } else {
                child_node.measured_by_parent
            };
            if usage != UsageByParent::InMeasureBlock {
                continue;
            }
            if pending(child_node) && self.relayout_nodes.contains(child) {
                self.remeasure_only(child, lookahead);
            }
            // Children that are still dirty were handled by the remeasure
            // above or will be measured by their parent.
            if !pending(self.tree.node(child)) {
                self.force_measure_the_subtree_internal(child, lookahead);
            }
        }
        if pending(self.tree.node(node)) {
            self.remeasure_only(node, lookahead);
        }
    }

    fn remeasure_only(&mut self, node: NodeId, lookahead: bool) {
        let constraints = if self.tree.root() == Some(node) {
            self.root_constraints
        } else {
            None
        };
        if lookahead {
            self.do_lookahead_remeasure(node, constraints);
        } else {
            self.do_remeasure(node, constraints);
        }
    }

    /// Processes a node popped from the dirty set. Returns true if its size
    /// changed.
    fn remeasure_and_relayout_if_needed(&mut self, node: NodeId) -> bool {
        let Some(n) = self.tree.get(node) else {
            return false;
        };
        if !n.attached {
            return false;
        }
        let is_root = self.tree.root() == Some(node);
        let parent_placed = n
            .parent
            .map_or(true, |parent| self.tree.node(parent).is_placed);
        let eligible = n.is_placed
            || (n.can_affect_parent() && parent_placed)
            || n.is_placed_in_lookahead == Some(true)
            || n.can_affect_parent_in_lookahead()
            || n.alignment_lines_required;
        if !eligible {
            log::trace!("node {node} is not placed, skipping");
            return false;
        }

        let root_constraints = if is_root { self.root_constraints } else { None };
        let mut size_changed = false;

        let n = self.tree.node(node);
        if n.lookahead_measure_pending && n.lookahead_root.is_some() {
            size_changed |= self.do_lookahead_remeasure(node, root_constraints);
        }
        if self.tree.node(node).measure_pending {
            size_changed |= self.do_remeasure(node, root_constraints);
        }

        let n = self.tree.node(node);
        if n.lookahead_layout_pending
            && n.lookahead_root.is_some()
            && n.is_placed_in_lookahead == Some(true)
        {
            let position = n.lookahead_position.unwrap_or(Point::ZERO);
            self.lookahead_place_at(node, position);
        }

        let n = self.tree.node(node);
        let parent_placed = n
            .parent
            .map_or(true, |parent| self.tree.node(parent).is_placed);
        if n.layout_pending && n.is_placed && parent_placed {
            let position = if is_root { Point::ZERO } else { n.position };
            self.place_at(node, position);
            self.on_positioned_dispatcher.on_node_positioned(node);
        }

        self.drain_postponed_requests();
        size_changed
    }

    fn do_remeasure(&mut self, node: NodeId, constraints: Option<Constraints>) -> bool {
        let n = self.tree.node(node);
        let Some(constraints) = constraints.or(n.constraints) else {
            log::trace!("node {node} has never been measured by its parent");
            return false;
        };
        let size_changed = self.remeasure(node, constraints);
        if size_changed {
            let n = self.tree.node(node);
            let usage = n.measured_by_parent;
            if let Some(parent) = n.parent {
                match usage {
                    UsageByParent::InMeasureBlock => {
                        self.request_remeasure(parent, false);
                    }
                    UsageByParent::InLayoutBlock => {
                        self.request_relayout(parent, false);
                    }
                    UsageByParent::NotUsed => {}
                }
            }
        }
        size_changed
    }

    fn do_lookahead_remeasure(&mut self, node: NodeId, constraints: Option<Constraints>) -> bool {
        let n = self.tree.node(node);
        let Some(constraints) = constraints.or(n.lookahead_constraints) else {
            log::trace!("node {node} has never been measured in lookahead");
            return false;
        };
        let size_changed = self.lookahead_remeasure(node, constraints);
        if size_changed {
            let n = self.tree.node(node);
            let usage = n.measured_by_parent_in_lookahead;
            // The parent of a lookahead root is outside the scope.
            let parent = n.parent.filter(|_| !n.is_lookahead_root);
            if let Some(parent) = parent {
                match usage {
                    UsageByParent::InMeasureBlock => {
                        self.request_lookahead_remeasure(parent, false);
                    }
                    UsageByParent::InLayoutBlock => {
                        self.request_lookahead_relayout(parent, false);
                    }
                    UsageByParent::NotUsed => {}
                }
            }
        }
        size_changed
    }

    // ── measuring ───────────────────────────────────────────────────────

    pub(crate) fn measure_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        constraints: Constraints,
        lookahead: bool,
    ) -> Size {
        assert_eq!(
            self.tree.parent(child),
            Some(parent),
            "node {child} is not a child of {parent}"
        );
        let usage = match self.tree.node(parent).layout_state {
            LayoutState::Measuring | LayoutState::LookaheadMeasuring => {
                UsageByParent::InMeasureBlock
            }
            LayoutState::LayingOut | LayoutState::LookaheadLayingOut => {
                UsageByParent::InLayoutBlock
            }
            LayoutState::Idle => panic!("node {parent} measured {child} outside measure or layout"),
        };
        if lookahead {
            self.tree.node_mut(child).measured_by_parent_in_lookahead = usage;
            self.lookahead_remeasure(child, constraints);
            self.tree.node(child).lookahead_size.unwrap_or(Size::ZERO)
        } else {
            self.tree.node_mut(child).measured_by_parent = usage;
            self.remeasure(child, constraints);
            self.tree.node(child).measured_size.unwrap_or(Size::ZERO)
        }
    }

    /// Measures `node` if it is dirty or the constraints changed. Returns
    /// true if the size changed.
    fn remeasure(&mut self, node: NodeId, constraints: Constraints) -> bool {
        let n = self.tree.node(node);
        if !n.measure_pending && n.constraints == Some(constraints) {
            return false;
        }
        if n.is_lookahead_root {
            // A lookahead root resolves its lookahead pass with the
            // constraints its parent measures it with.
            self.lookahead_remeasure(node, constraints);
        }
        let previous = self.tree.node(node).measured_size;
        self.perform_measure(node, constraints);
        self.tree.node(node).measured_size != previous
    }

    fn lookahead_remeasure(&mut self, node: NodeId, constraints: Constraints) -> bool {
        let n = self.tree.node(node);
        if !n.lookahead_measure_pending && n.lookahead_constraints == Some(constraints) {
            return false;
        }
        let previous = n.lookahead_size;
        self.perform_lookahead_measure(node, constraints);
        self.tree.node(node).lookahead_size != previous
    }

    fn perform_measure(&mut self, node: NodeId, constraints: Constraints) {
        let was_dirty = self.enter_state(node, LayoutState::Measuring);
        let policy = {
            let n = self.tree.node_mut(node);
            n.measure_pending = false;
            n.constraints = Some(constraints);
            Rc::clone(&n.policy)
        };
        let size = {
            let mut scope = MeasureScope::new(self, node, false);
            policy.measure(&mut scope, constraints)
        };
        let size = constraints.constrain_size(size);
        {
            let n = self.tree.node_mut(node);
            n.measured_size = Some(size);
            n.layout_pending = true;
            n.measure_count += 1;
        }
        log::trace!("measured {node}: {size:?} under {constraints:?}");
        self.leave_state(node, was_dirty);

        // Placed children the policy skipped still need their own measure.
        let children: SmallVec<[NodeId; 4]> = SmallVec::from_slice(self.tree.children(node));
        for child in children {
            let c = self.tree.node(child);
            if c.measure_pending && c.is_placed && !c.is_busy() {
                self.relayout_nodes.add(child, c.depth);
            }
        }
    }

    fn perform_lookahead_measure(&mut self, node: NodeId, constraints: Constraints) {
        let was_dirty = self.enter_state(node, LayoutState::LookaheadMeasuring);
        let policy = {
            let n = self.tree.node_mut(node);
            n.lookahead_measure_pending = false;
            n.lookahead_constraints = Some(constraints);
            Rc::clone(&n.policy)
        };
        let size = {
            let mut scope = MeasureScope::new(self, node, true);
            policy.measure(&mut scope, constraints)
        };
        let size = constraints.constrain_size(size);
        {
            let n = self.tree.node_mut(node);
            n.lookahead_size = Some(size);
            n.lookahead_layout_pending = true;
            n.lookahead_measure_count += 1;
        }
        log::trace!("lookahead measured {node}: {size:?}");
        self.leave_state(node, was_dirty);
    }

    // ── placing ─────────────────────────────────────────────────────────

    pub(crate) fn place_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        position: Point,
        lookahead: bool,
    ) {
        assert_eq!(
            self.tree.parent(child),
            Some(parent),
            "node {child} is not a child of {parent}"
        );
        if lookahead {
            assert!(
                self.tree.node(child).lookahead_size.is_some(),
                "node {child} must be measured in lookahead before it is placed"
            );
            self.lookahead_place_at(child, position);
        } else {
            assert!(
                self.tree.node(child).measured_size.is_some(),
                "node {child} must be measured before it is placed"
            );
            self.place_at(child, position);
        }
    }

    fn place_at(&mut self, node: NodeId, position: Point) {
        let n = self.tree.node(node);
        if n.is_lookahead_root
            && (n.lookahead_layout_pending || n.is_placed_in_lookahead != Some(true))
            && n.lookahead_size.is_some()
        {
            self.lookahead_place_at(node, position);
        }
        let n = self.tree.node_mut(node);
        let moved = !n.is_placed || n.position != position;
        n.position = position;
        n.is_placed = true;
        n.placed_by_parent = true;
        if moved {
            n.needs_on_positioned_dispatch = true;
        }
        if n.layout_pending {
            self.perform_layout(node);
        }
    }

    fn lookahead_place_at(&mut self, node: NodeId, position: Point) {
        let n = self.tree.node_mut(node);
        n.lookahead_position = Some(position);
        n.is_placed_in_lookahead = Some(true);
        n.placed_by_parent_in_lookahead = true;
        if n.lookahead_layout_pending {
            self.perform_lookahead_layout(node);
        }
    }

    fn perform_layout(&mut self, node: NodeId) {
        let was_dirty = self.enter_state(node, LayoutState::LayingOut);
        let (policy, size, children) = {
            let n = self.tree.node_mut(node);
            n.layout_pending = false;
            n.needs_on_positioned_dispatch = true;
            n.layout_count += 1;
            let size = match n.measured_size {
                Some(size) => size,
                None => panic!("node {node} must be measured before it is laid out"),
            };
            (Rc::clone(&n.policy), size, n.children.clone())
        };
        for &child in &children {
            self.tree.node_mut(child).placed_by_parent = false;
        }
        {
            let mut scope = PlacementScope::new(self, node, false);
            policy.place(&mut scope, size);
        }
        for &child in &children {
            let Some(c) = self.tree.get(child) else {
                continue;
            };
            if c.is_placed && !c.placed_by_parent {
                self.mark_subtree_not_placed(child);
            }
        }
        log::trace!("laid out {node}");
        self.leave_state(node, was_dirty);
    }

    fn perform_lookahead_layout(&mut self, node: NodeId) {
        let was_dirty = self.enter_state(node, LayoutState::LookaheadLayingOut);
        let (policy, size, children) = {
            let n = self.tree.node_mut(node);
            n.lookahead_layout_pending = false;
            let size = match n.lookahead_size {
                Some(size) => size,
                None => panic!("node {node} must be measured in lookahead before it is laid out"),
            };
            (Rc::clone(&n.policy), size, n.children.clone())
        };
        for &child in &children {
            self.tree.node_mut(child).placed_by_parent_in_lookahead = false;
        }
        {
            let mut scope = PlacementScope::new(self, node, true);
            policy.place(&mut scope, size);
        }
        for &child in &children {
            let Some(c) = self.tree.get(child) else {
                continue;
            };
            if c.is_placed_in_lookahead == Some(true) && !c.placed_by_parent_in_lookahead {
                for id in self.tree.subtree(child) {
                    self.tree.node_mut(id).is_placed_in_lookahead = Some(false);
                }
            }
        }
        self.leave_state(node, was_dirty);
    }

    fn mark_subtree_not_placed(&mut self, node: NodeId) {
        for id in self.tree.subtree(node) {
            let n = self.tree.node_mut(id);
            if n.is_placed {
                log::trace!("node {id} is no longer placed");
            }
            n.is_placed = false;
        }
    }

    /// Leaves `Idle`. A node is never in the dirty set while busy; returns
    /// whether it had to be taken out.
    fn enter_state(&mut self, node: NodeId, state: LayoutState) -> bool {
        let n = self.tree.node_mut(node);
        assert_eq!(
            n.layout_state,
            LayoutState::Idle,
            "node {node} cannot start {state:?} while {:?}",
            n.layout_state
        );
        n.layout_state = state;
        self.relayout_nodes.remove(node)
    }

    fn leave_state(&mut self, node: NodeId, was_dirty: bool) {
        let n = self.tree.node_mut(node);
        n.layout_state = LayoutState::Idle;
        if was_dirty && n.has_pending_work() {
            let depth = n.depth;
            self.relayout_nodes.add(node, depth);
        }
    }
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
