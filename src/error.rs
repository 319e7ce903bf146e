use crate::octree::NodeId;

/// Recoverable errors surfaced to callers of the entity index. Programming
/// errors (dimension mismatch, out-of-bounds octant index, zero/null
/// direction) are not represented here: they fail fast with
/// `assert!`/`debug_assert!` instead.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum OctreeError {
    /// An entity's AABB did not fit under the tree even after growing the
    /// root outward `max_out_depth` times. `abs_root` is the last root the
    /// tree grew to before giving up, so the caller can retry with a
    /// larger budget or reject the scene.
    #[error("entity AABB did not fit after growing outward past the configured depth (last root: {abs_root:?})")]
    TreeOutsideGrow { abs_root: NodeId },
}
