use crate::object_pool::{key_might_be_valid, key_none_value};
use crate::space::Dimension;

/// Arena index into an [`crate::octree::Octree`]'s node pool. `NONE` stands in
/// for a null reference without wrapping every field in `Option<NodeId>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_some(&self) -> bool {
        key_might_be_valid(self.0)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        NodeId(key_none_value())
    }
}

/// What occupies a child slot: absent, a recursive subtree, or a payload
/// value stored directly without an intermediate node.
#[derive(Debug, Clone)]
pub enum Child<T> {
    Empty,
    Subtree(NodeId),
    Leaf(T),
}

impl<T> Default for Child<T> {
    fn default() -> Self {
        Child::Empty
    }
}

impl<T> Child<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Child::Empty)
    }

    pub fn as_subtree(&self) -> Option<NodeId> {
        match self {
            Child::Subtree(id) => Some(*id),
            _ => None,
        }
    }
}

/// One octree node: its geometric dimension, parent back-reference, eight
/// child slots, and a user payload carried regardless of what the children
/// hold. Arena-owned by [`crate::octree::Octree`]'s node pool;
/// `parent`/`children` are plain indices, not owning pointers.
#[derive(Debug, Clone)]
pub struct Node<T> {
    pub id: Dimension,
    pub parent: NodeId,
    pub index_within_parent: Option<u8>,
    pub children: [Child<T>; 8],
    pub value: T,
    pub invalidated: bool,
}

impl<T: Default> Default for Node<T> {
    fn default() -> Self {
        Node {
            id: Dimension::new(crate::geometry::V3::ZERO, 0.),
            parent: NodeId::default(),
            index_within_parent: None,
            children: Default::default(),
            value: T::default(),
            invalidated: false,
        }
    }
}

impl<T> Node<T> {
    pub fn new_root(id: Dimension, value: T) -> Self {
        Node {
            id,
            parent: NodeId::NONE,
            index_within_parent: None,
            children: std::array::from_fn(|_| Child::Empty),
            value,
            invalidated: false,
        }
    }

    pub fn is_root(&self) -> bool {
        !self.parent.is_some()
    }
}
