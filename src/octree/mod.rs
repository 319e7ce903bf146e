//! The octree: arena-owned nodes, the directed walker, and the entity
//! index built on top, split into submodules.

pub mod detail;
pub mod entity_index;
pub mod node;
pub mod walker;

pub use node::{Child, Node, NodeId};
pub use walker::{Stop, Walker, WalkerFlags};

use crate::object_pool::ObjectPool;
use crate::space::Dimension;

/// A space-partitioned octree over payload type `T`. Owns all its nodes
/// in one arena; `NodeId`s are stable across growth (growth adds nodes
/// and relinks `parent`/`children`, it never moves an existing one).
pub struct Octree<T> {
    pool: ObjectPool<Node<T>>,
    root: NodeId,
}

impl<T: Default + Clone> Octree<T> {
    /// Creates a rooted tree of the given dimension, payload defaulted at
    /// the root (`new_entity_octree` specializes this to an empty entity
    /// set).
    pub fn new(dim: Dimension) -> Self {
        let mut pool = ObjectPool::with_capacity(8);
        let root_key = pool.push(Node::new_root(dim, T::default()));
        Octree { pool, root: NodeId(root_key) }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node<T> {
        self.pool.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        self.pool.get_mut(id.0)
    }

    pub(crate) fn push_node(&mut self, dim: Dimension, parent: NodeId, octant: u8) -> NodeId {
        let key = self.pool.push(Node {
            id: dim,
            parent,
            index_within_parent: Some(octant),
            children: std::array::from_fn(|_| Child::Empty),
            value: T::default(),
            invalidated: false,
        });
        NodeId(key)
    }

    pub fn get(&self, node: NodeId, octant: u8) -> &Child<T> {
        &self.node(node).children[octant as usize]
    }

    /// `subtree(i)`: errors (programming error — out-of-bounds octant index
    /// is not possible here since `octant` is typed `u8` and always masked
    /// to `0..8` by callers, so the only failure is "not a subtree") if the
    /// child isn't a subtree.
    pub fn subtree(&self, node: NodeId, octant: u8) -> Option<NodeId> {
        self.get(node, octant).as_subtree()
    }

    /// Replaces child `octant` of `node`, returning the old value.
    /// Replacing an existing subtree invalidates it first unless the
    /// caller explicitly preserves it some other way.
    pub fn set(&mut self, node: NodeId, octant: u8, value: Child<T>) -> Child<T> {
        if let Child::Subtree(old) = &self.node(node).children[octant as usize] {
            let old = *old;
            self.invalidate(old, true);
        }
        std::mem::replace(&mut self.node_mut(node).children[octant as usize], value)
    }

    /// Marks `node` (and, if `recursive`, every descendant subtree)
    /// invalid. Invalidated subtrees are still structurally reachable —
    /// the walker skips them rather than the tree reclaiming them
    /// immediately.
    pub fn invalidate(&mut self, node: NodeId, recursive: bool) {
        self.node_mut(node).invalidated = true;
        if recursive {
            let children: Vec<NodeId> = self
                .node(node)
                .children
                .iter()
                .filter_map(Child::as_subtree)
                .collect();
            for child in children {
                self.invalidate(child, true);
            }
        }
    }

    pub fn is_invalid(&self, node: NodeId) -> bool {
        self.node(node).invalidated
    }

    /// Outside growth: wraps the current absolute root in a new parent of
    /// dimension `new_dim`, placing the old root at `old_root_octant`
    /// within it.
    /// `new_dim.size` is twice the old root's size by construction of the
    /// caller ([`entity_index::grow_outside`]); this method only performs
    /// the relinking, since the geometry decision (which octant, which
    /// direction) depends on the entity being inserted and lives with the
    /// caller.
    pub(crate) fn wrap_root(&mut self, new_dim: Dimension, old_root_octant: u8) -> NodeId {
        let old_root = self.root;
        let new_root_key = self.pool.push(Node::new_root(new_dim, T::default()));
        let new_root = NodeId(new_root_key);
        self.node_mut(old_root).parent = new_root;
        self.node_mut(old_root).index_within_parent = Some(old_root_octant);
        self.node_mut(new_root).children[old_root_octant as usize] = Child::Subtree(old_root);
        self.root = new_root;
        new_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::V3;

    #[test]
    fn new_subtree_links_parent_and_child() {
        let mut tree = Octree::<u32>::new(Dimension::new(V3::ZERO, 1.));
        let root = tree.root();
        let child = tree.new_subtree(root, 3);
        assert_eq!(tree.node(child).parent, root);
        assert_eq!(tree.node(child).index_within_parent, Some(3));
        assert_eq!(tree.subtree(root, 3), Some(child));
        assert_eq!(tree.get_level(child), 1);
        assert_eq!(tree.get_root(child), root);
    }

    #[test]
    fn set_replacing_subtree_invalidates_it() {
        let mut tree = Octree::<u32>::new(Dimension::new(V3::ZERO, 1.));
        let root = tree.root();
        let child = tree.new_subtree(root, 0);
        tree.set(root, 0, Child::Empty);
        assert!(tree.is_invalid(child));
    }
}
