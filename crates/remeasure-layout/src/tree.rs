use crate::error::LayoutError;
use crate::node::LayoutNode;
use crate::policy::MeasurePolicy;
use remeasure_core::NodeId;
use remeasure_geometry::Point;
use std::rc::Rc;

/// Arena of layout nodes.
///
/// Slots of removed nodes are recycled, so a `NodeId` is only meaningful
/// while the node it names is alive.
#[derive(Default)]
pub struct LayoutTree {
    nodes: Vec<Option<LayoutNode>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
}

impl LayoutTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn create_node(&mut self, policy: Rc<dyn MeasurePolicy>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(LayoutNode::new(id, policy));
                id
            }
            None => {
                let id = self.nodes.len();
                self.nodes.push(Some(LayoutNode::new(id, policy)));
                id
            }
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id), Some(Some(_)))
    }

    pub fn get(&self, id: NodeId) -> Option<&LayoutNode> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut LayoutNode> {
        self.nodes.get_mut(id).and_then(Option::as_mut)
    }

    /// Internal accessor for ids the scheduler already validated.
    pub(crate) fn node(&self, id: NodeId) -> &LayoutNode {
        match self.get(id) {
            Some(node) => node,
            None => panic!("layout node {id} does not exist"),
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut LayoutNode {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("layout node {id} does not exist"),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|node| node.children()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|node| node.attached)
    }

    fn require(&self, id: NodeId) -> Result<&LayoutNode, LayoutError> {
        self.get(id).ok_or(LayoutError::Missing { id })
    }

    /// Returns true if `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Pre-order walk of the subtree rooted at `id`.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Sum of the real positions from `id` up to the root.
    pub fn position_in_root(&self, id: NodeId) -> Point {
        let mut position = Point::ZERO;
        let mut current = Some(id);
        while let Some(node) = current.and_then(|id| self.get(id)) {
            position += node.position;
            current = node.parent;
        }
        position
    }

    pub(crate) fn set_root(&mut self, id: NodeId) -> Result<Option<NodeId>, LayoutError> {
        let node = self.require(id)?;
        if let Some(parent) = node.parent {
            return Err(LayoutError::AlreadyAttached { id, parent });
        }
        let previous = self.root.replace(id);
        if let Some(previous) = previous.filter(|&previous| previous != id) {
            for node in self.subtree(previous) {
                self.node_mut(node).attached = false;
            }
        }
        self.refresh_subtree(id);
        Ok(previous.filter(|&previous| previous != id))
    }

    pub(crate) fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), LayoutError> {
        let len = self.require(parent)?.children.len();
        let child_node = self.require(child)?;
        if let Some(existing) = child_node.parent {
            return Err(LayoutError::AlreadyAttached {
                id: child,
                parent: existing,
            });
        }
        if self.root == Some(child) || self.is_ancestor(child, parent) {
            return Err(LayoutError::Cycle { parent, child });
        }
        if index > len {
            return Err(LayoutError::IndexOutOfBounds { parent, index, len });
        }
        self.node_mut(parent).children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
        self.refresh_subtree(child);
        Ok(())
    }

    /// Unlinks `child` from `parent` and frees its whole subtree.
    ///
    /// Returns the ids that were freed.
    pub(crate) fn remove_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
    ) -> Result<Vec<NodeId>, LayoutError> {
        let position = self
            .require(parent)?
            .children
            .iter()
            .position(|&id| id == child)
            .ok_or(LayoutError::NotAChild { parent, child })?;
        self.node_mut(parent).children.remove(position);
        let removed = self.subtree(child);
        for &id in &removed {
            self.nodes[id] = None;
            self.free.push(id);
        }
        Ok(removed)
    }

    pub(crate) fn move_child(
        &mut self,
        parent: NodeId,
        from: usize,
        to: usize,
    ) -> Result<(), LayoutError> {
        let len = self.require(parent)?.children.len();
        for index in [from, to] {
            if index >= len {
                return Err(LayoutError::IndexOutOfBounds { parent, index, len });
            }
        }
        let children = &mut self.node_mut(parent).children;
        let child = children.remove(from);
        children.insert(to, child);
        Ok(())
    }

    pub(crate) fn set_lookahead_root(
        &mut self,
        id: NodeId,
        is_lookahead_root: bool,
    ) -> Result<(), LayoutError> {
        self.require(id)?;
        self.node_mut(id).is_lookahead_root = is_lookahead_root;
        self.refresh_subtree(id);
        Ok(())
    }

    /// Recomputes depth, attachment and lookahead scope for `id` and its
    /// descendants from the state of `id`'s parent.
    pub(crate) fn refresh_subtree(&mut self, id: NodeId) {
        let (depth, attached, scope) = match self.parent(id).and_then(|p| self.get(p)) {
            Some(parent) => (parent.depth + 1, parent.attached, parent.lookahead_root),
            None => (0, self.root == Some(id), None),
        };
        let mut stack = vec![(id, depth, attached, scope)];
        while let Some((current, depth, attached, scope)) = stack.pop() {
            let node = self.node_mut(current);
            node.depth = depth;
            node.attached = attached;
            node.lookahead_root = if node.is_lookahead_root {
                Some(current)
            } else {
                scope
            };
            if node.lookahead_root.is_none() {
                node.lookahead_measure_pending = false;
                node.lookahead_layout_pending = false;
                node.is_placed_in_lookahead = None;
            } else if node.lookahead_size.is_none() {
                node.lookahead_measure_pending = true;
                node.lookahead_layout_pending = true;
            }
            let scope = node.lookahead_root;
            for &child in node.children.iter() {
                stack.push((child, depth + 1, attached, scope));
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/tree_tests.rs"]
mod tests;
