//! Dirty-node set ordered by tree depth.

use remeasure_core::collections::map::HashMap;
use remeasure_core::NodeId;
use std::collections::BTreeSet;

/// Set of nodes pending measure or layout, popped shallowest first.
///
/// Nodes with equal depth come out in insertion order. Adding a node that is
/// already present is a no-op and keeps its original position. The depth is
/// captured when the node is added; [`DepthSortedSet::update_depth`] re-keys
/// an entry after a tree move, otherwise the stale depth is used for the
/// current sweep.
#[derive(Debug, Default)]
pub struct DepthSortedSet {
    ordered: BTreeSet<(usize, u64, NodeId)>,
    keys: HashMap<NodeId, (usize, u64)>,
    next_sequence: u64,
}

impl DepthSortedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `node` at `depth`. Returns false if it was already present.
    pub fn add(&mut self, node: NodeId, depth: usize) -> bool {
        if self.keys.contains_key(&node) {
            return false;
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.keys.insert(node, (depth, sequence));
        self.ordered.insert((depth, sequence, node));
        true
    }

    /// Removes `node`. Returns true if it was present.
    pub fn remove(&mut self, node: NodeId) -> bool {
        match self.keys.remove(&node) {
            Some((depth, sequence)) => {
                self.ordered.remove(&(depth, sequence, node));
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.keys.contains_key(&node)
    }

    /// Re-sorts `node` under a new depth, keeping its tie-break position.
    pub fn update_depth(&mut self, node: NodeId, depth: usize) {
        if let Some(key) = self.keys.get_mut(&node) {
            let (old_depth, sequence) = *key;
            if old_depth != depth {
                self.ordered.remove(&(old_depth, sequence, node));
                self.ordered.insert((depth, sequence, node));
                key.0 = depth;
            }
        }
    }

    /// Removes and returns the shallowest node.
    pub fn pop(&mut self) -> Option<NodeId> {
        let (_, _, node) = self.ordered.pop_first()?;
        self.keys.remove(&node);
        Some(node)
    }

    pub fn peek(&self) -> Option<NodeId> {
        self.ordered.first().map(|&(_, _, node)| node)
    }

    /// Pops nodes in depth order until the set is empty.
    ///
    /// `action` receives the set itself so it can add more nodes; those are
    /// visited in the same sweep.
    pub fn pop_each(&mut self, mut action: impl FnMut(&mut Self, NodeId)) {
        while let Some(node) = self.pop() {
            action(self, node);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Nodes in pop order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ordered.iter().map(|&(_, _, node)| node)
    }

    pub fn clear(&mut self) {
        self.ordered.clear();
        self.keys.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_depth_order() {
        let mut set = DepthSortedSet::new();
        set.add(10, 3);
        set.add(11, 1);
        set.add(12, 2);
        let order: Vec<_> = std::iter::from_fn(|| set.pop()).collect();
        assert_eq!(order, vec![11, 12, 10]);
        assert!(set.is_empty());
    }

    #[test]
    fn equal_depth_keeps_insertion_order() {
        let mut set = DepthSortedSet::new();
        set.add(5, 2);
        set.add(3, 2);
        set.add(9, 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![5, 3, 9]);
    }

    #[test]
    fn add_is_idempotent() {
        let mut set = DepthSortedSet::new();
        assert!(set.add(1, 0));
        assert!(!set.add(1, 4));
        assert_eq!(set.len(), 1);
        assert_eq!(set.pop(), Some(1));
        assert_eq!(set.pop(), None);
    }

    #[test]
    fn remove_reports_membership() {
        let mut set = DepthSortedSet::new();
        set.add(1, 0);
        assert!(set.remove(1));
        assert!(!set.remove(1));
        assert!(!set.contains(1));
    }

    #[test]
    fn pop_each_visits_nodes_added_during_iteration() {
        let mut set = DepthSortedSet::new();
        set.add(1, 2);
        let mut visited = Vec::new();
        set.pop_each(|set, node| {
            visited.push(node);
            if node == 1 {
                // A dependent surfaced while processing: shallower, still visited.
                set.add(2, 0);
                set.add(1, 2);
            }
            if node == 2 {
                set.add(3, 5);
            }
        });
        assert_eq!(visited, vec![1, 2, 1, 3]);
    }

    #[test]
    fn update_depth_resorts() {
        let mut set = DepthSortedSet::new();
        set.add(1, 5);
        set.add(2, 3);
        set.update_depth(1, 0);
        assert_eq!(set.peek(), Some(1));
    }
}
