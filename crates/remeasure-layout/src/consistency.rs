use crate::depth_sorted_set::DepthSortedSet;
use crate::node::{LayoutNode, LayoutState};
use crate::scheduler::PostponedRequest;
use crate::tree::LayoutTree;
use remeasure_core::NodeId;
use std::fmt::Write;

/// Verifies between processed nodes that no dirty node has been lost.
///
/// Every placed node with pending work must be reachable by the running
/// pass: either it is in the dirty set, a postponed request names it, or an
/// ancestor that will revisit it is itself pending or busy.
pub(crate) struct LayoutTreeConsistencyChecker<'a> {
    tree: &'a LayoutTree,
    relayout_nodes: &'a DepthSortedSet,
    postponed: &'a [PostponedRequest],
}

impl<'a> LayoutTreeConsistencyChecker<'a> {
    pub(crate) fn new(
        tree: &'a LayoutTree,
        relayout_nodes: &'a DepthSortedSet,
        postponed: &'a [PostponedRequest],
    ) -> Self {
        Self {
            tree,
            relayout_nodes,
            postponed,
        }
    }

    pub(crate) fn assert_consistent(&self) {
        let inconsistent = self.find_inconsistent();
        if inconsistent.is_empty() {
            return;
        }
        let mut message = String::from("inconsistent layout state:\n");
        for id in inconsistent {
            let _ = writeln!(message, "  {:?}", self.tree.node(id));
        }
        for id in self.relayout_nodes.iter() {
            let _ = writeln!(message, "  dirty: {id}");
        }
        panic!("{message}");
    }

    fn find_inconsistent(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for id in self.relayout_nodes.iter() {
            match self.tree.get(id) {
                Some(node) if node.attached && node.layout_state == LayoutState::Idle => {}
                _ => out.push(id),
            }
        }
        let Some(root) = self.tree.root() else {
            return out;
        };
        for id in self.tree.subtree(root) {
            let node = self.tree.node(id);
            if !self.is_consistent(node) {
                out.push(id);
            }
        }
        out
    }

    fn is_consistent(&self, node: &LayoutNode) -> bool {
        let parent = node.parent.and_then(|id| self.tree.get(id));
        let parent_placed = parent.map_or(true, |parent| parent.is_placed);
        if !node.is_placed || !parent_placed {
            return true;
        }
        if self.relayout_nodes.contains(node.id) {
            return true;
        }
        let parent_busy = parent.is_some_and(|parent| parent.layout_state != LayoutState::Idle);
        if node.measure_pending {
            let postponed = self
                .postponed
                .iter()
                .any(|request| request.node == node.id && !request.is_lookahead);
            return postponed
                || parent_busy
                || parent.is_some_and(|parent| {
                    parent.measure_pending || parent.lookahead_measure_pending
                });
        }
        if node.layout_pending {
            return parent_busy
                || parent.is_some_and(|parent| parent.measure_pending || parent.layout_pending);
        }
        true
    }
}
