//! Low-level node navigation shared by the walker and the entity index.

use crate::geometry::V3;
use crate::octree::node::{Child, NodeId};
use crate::octree::Octree;
use crate::space::{point_in_space, Dimension};

impl<T: Default + Clone> Octree<T> {
    /// Descends from the absolute root, following subtree children while
    /// `point` remains inside the tree, stopping at the deepest node whose
    /// target child is not itself a subtree. Returns `None` if `point` is
    /// outside the root under the closed-open convention.
    pub fn node_at_pos(&self, point: V3) -> Option<(NodeId, u8)> {
        let root = self.root;
        if !point_in_space(point, &self.node(root).id) {
            return None;
        }
        let mut current = root;
        loop {
            let octant = self.node(current).id.octant_for(point);
            match &self.node(current).children[octant as usize] {
                Child::Subtree(child_id) => current = *child_id,
                _ => return Some((current, octant)),
            }
        }
    }

    /// Creates a child subtree at `parent`'s octant `octant` with the
    /// canonical sub-dimension. Asserts the slot was empty; callers that
    /// need to replace an occupied slot go through [`Octree::set_child`]
    /// instead, which invalidates the old occupant.
    pub(crate) fn new_subtree(&mut self, parent: NodeId, octant: u8) -> NodeId
    where
        T: Default,
    {
        assert!(
            self.node(parent).children[octant as usize].is_empty(),
            "new_subtree called on an occupied child slot"
        );
        let child_dim: Dimension = self.node(parent).id.child_dimension(octant);
        let child_id = self.push_node(child_dim, parent, octant);
        self.node_mut(parent).children[octant as usize] = Child::Subtree(child_id);
        child_id
    }

    /// Walks the `parent` chain to the absolute root. Works correctly
    /// even right after outside growth reassigns the designated root,
    /// since every node's own `parent` links are updated in the same
    /// step that grows the tree.
    pub fn get_root(&self, mut node: NodeId) -> NodeId {
        while self.node(node).parent.is_some() {
            node = self.node(node).parent;
        }
        node
    }

    /// Number of `parent` hops from `node` up to the absolute root.
    pub fn get_level(&self, mut node: NodeId) -> u32 {
        let mut level = 0;
        while self.node(node).parent.is_some() {
            node = self.node(node).parent;
            level += 1;
        }
        level
    }

    /// Difference between `get_level(node)` and `get_level(ancestor)`,
    /// failing if `ancestor` is not actually an ancestor of `node` (a
    /// programming error, not a recoverable one).
    pub fn get_relative_level(&self, node: NodeId, ancestor: NodeId) -> u32 {
        let mut current = node;
        let mut level = 0;
        loop {
            if current.0 == ancestor.0 {
                return level;
            }
            assert!(
                self.node(current).parent.is_some(),
                "get_relative_level: ancestor is not an ancestor of node"
            );
            current = self.node(current).parent;
            level += 1;
        }
    }
}
