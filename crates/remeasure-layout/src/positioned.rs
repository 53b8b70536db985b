use crate::node::{LayoutCoordinates, LayoutState, OnPositionedCallback};
use crate::tree::LayoutTree;
use remeasure_core::NodeId;
use std::rc::Rc;

/// Collects nodes laid out during a pass and fires their position callbacks
/// once the pass is over.
///
/// Dispatch walks each registered node's subtree, shallowest registration
/// first. A node is dispatched at most once per pass: visiting it clears
/// its `needs_on_positioned_dispatch` flag, so a registration nested inside
/// an already dispatched subtree is skipped.
#[derive(Debug, Default)]
pub struct OnPositionedDispatcher {
    layout_nodes: Vec<NodeId>,
}

impl OnPositionedDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_node_positioned(&mut self, node: NodeId) {
        if !self.layout_nodes.contains(&node) {
            self.layout_nodes.push(node);
        }
    }

    pub fn remove(&mut self, node: NodeId) {
        self.layout_nodes.retain(|&id| id != node);
    }

    pub fn is_empty(&self) -> bool {
        self.layout_nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.layout_nodes.len()
    }

    /// Fires callbacks for every registered subtree.
    ///
    /// Returns the number of nodes visited.
    pub fn dispatch(&mut self, tree: &mut LayoutTree) -> usize {
        let mut nodes = std::mem::take(&mut self.layout_nodes);
        nodes.retain(|&id| tree.contains(id));
        nodes.sort_by_key(|&id| tree.node(id).depth());

        let mut pending: Vec<(NodeId, LayoutCoordinates, OnPositionedCallback)> = Vec::new();
        let mut visited = 0;
        for node in nodes {
            if tree.node(node).needs_on_positioned_dispatch {
                visited += Self::dispatch_hierarchy(tree, node, &mut pending);
            }
        }

        log::trace!(
            "dispatching {} position callbacks over {} nodes",
            pending.len(),
            visited
        );
        for (node, coordinates, callback) in pending {
            callback(node, &coordinates);
        }
        visited
    }

    fn dispatch_hierarchy(
        tree: &mut LayoutTree,
        root: NodeId,
        pending: &mut Vec<(NodeId, LayoutCoordinates, OnPositionedCallback)>,
    ) -> usize {
        let mut visited = 0;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let position_in_root = tree.position_in_root(id);
            let node = tree.node_mut(id);
            node.needs_on_positioned_dispatch = false;
            let settled = node.layout_state == LayoutState::Idle
                && !node.measure_pending
                && !node.layout_pending;
            if !node.is_placed || !settled {
                continue;
            }
            visited += 1;
            if let Some(size) = node.measured_size {
                let coordinates = LayoutCoordinates {
                    size,
                    position: node.position,
                    position_in_root,
                };
                for callback in node.on_positioned.iter() {
                    pending.push((id, coordinates, Rc::clone(callback)));
                }
            }
            stack.extend(node.children.iter().rev().copied());
        }
        visited
    }
}
