//! Entity index: an [`Octree`] specialized to [`EntitySet`] payloads, with
//! the insertion and lookup operations a scene builder needs. Subdivides
//! on demand like a conventional sparse-voxel insertion loop, generalized
//! to (1) grow the tree outward when an AABB does not fit under the
//! current root at all, and (2) store a set of entities per node rather
//! than a single voxel value.

use std::rc::Rc;

use crate::entity::{Entity, EntitySet};
use crate::error::OctreeError;
use crate::geometry::{Aabb, V3};
use crate::octree::node::{Child, NodeId};
use crate::octree::Octree;
use crate::space::{space_in_space, Dimension};

/// Growth budgets for [`add_entity_to_octree`]: how many levels it may
/// subdivide inward and how many times it may wrap the root outward
/// before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthLimits {
    pub max_in_depth: u32,
    pub max_out_depth: u32,
}

impl Default for GrowthLimits {
    fn default() -> Self {
        GrowthLimits { max_in_depth: 32, max_out_depth: 32 }
    }
}

/// Creates a rooted entity octree over `dim`, every node defaulting to an
/// empty [`EntitySet`].
pub fn new_entity_octree(dim: Dimension) -> Octree<EntitySet> {
    Octree::new(dim)
}

/// Climbs upward from `node_at_pos(tree, aabb.origin)` until the node's
/// sub-box wholly contains `entity`'s AABB, or returns `None` if the AABB
/// escapes the root entirely (the caller must grow outward first).
pub fn get_covering_node_for_entity(tree: &Octree<EntitySet>, entity: &dyn Entity) -> Option<NodeId> {
    let aabb = entity.get_aabb();
    let mut current = tree.node_at_pos(aabb.min())?.0;
    loop {
        if space_in_space(&aabb, &tree.node(current).id) {
            return Some(current);
        }
        if !tree.node(current).parent.is_some() {
            return None;
        }
        current = tree.node(current).parent;
    }
}

/// Bit-vector selecting which of the eight positions around the current
/// root becomes the new parent's origin during outside growth:
/// `clamp(round((entity.pos - cur.pos) / cur.size), -1, 0)` per axis,
/// taken componentwise.
fn outside_growth_offset(entity_pos: V3, cur: &Dimension) -> V3 {
    let raw = (entity_pos - cur.pos) / cur.size;
    V3::new(
        raw.x.round().clamp(-1., 0.),
        raw.y.round().clamp(-1., 0.),
        raw.z.round().clamp(-1., 0.),
    )
}

/// Grows the tree outward if the entity's AABB does not fit under the
/// current root, then inward to the deepest single-child sub-box that
/// still contains the whole AABB, then inserts into that node's
/// [`EntitySet`]. Returns the fitting node, or the recoverable
/// [`OctreeError::TreeOutsideGrow`] if `max_out_depth` is exceeded — the
/// tree is left grown to its last attempted root so the caller can retry
/// with a larger budget.
pub fn add_entity_to_octree(
    tree: &mut Octree<EntitySet>,
    entity: Rc<dyn Entity>,
    limits: GrowthLimits,
) -> Result<NodeId, OctreeError> {
    let aabb = entity.get_aabb();

    if get_covering_node_for_entity(tree, entity.as_ref()).is_none() {
        grow_outside(tree, &aabb, limits.max_out_depth)?;
    }

    let mut node = get_covering_node_for_entity(tree, entity.as_ref())
        .expect("tree was just grown to cover this AABB");

    let mut depth = 0;
    while depth < limits.max_in_depth {
        let dim = tree.node(node).id;
        let candidate_octant = dim.octant_for(aabb.min());
        let candidate_dim = dim.child_dimension(candidate_octant);
        if !space_in_space(&aabb, &candidate_dim) {
            break;
        }
        node = match tree.get(node, candidate_octant) {
            Child::Subtree(child) => *child,
            Child::Empty => tree.new_subtree(node, candidate_octant),
            Child::Leaf(_) => break,
        };
        depth += 1;
    }

    tree.node_mut(node).value.insert(entity);
    Ok(node)
}

/// Wraps the current absolute root in successively larger parents
/// (doubling edge length each step) until `aabb` fits, or returns
/// [`OctreeError::TreeOutsideGrow`] after `max_out_depth` attempts. The
/// old root becomes a child of the new one at the index implied by
/// `outside_growth_offset`'s sign.
fn grow_outside(tree: &mut Octree<EntitySet>, aabb: &Aabb, max_out_depth: u32) -> Result<(), OctreeError> {
    let mut attempts = 0;
    while !space_in_space(aabb, &tree.node(tree.root()).id) {
        if attempts >= max_out_depth {
            return Err(OctreeError::TreeOutsideGrow { abs_root: tree.root() });
        }
        let old_root = tree.root();
        let old_dim = tree.node(old_root).id;
        let offset = outside_growth_offset(aabb.min(), &old_dim);
        // offset component is -1 (new parent extends below the old root on
        // that axis, so the old root lands in the *high* half) or 0 (the
        // old root keeps its position, landing in the *low* half).
        let old_root_octant = ((offset.x != 0.) as u8)
            | (((offset.y != 0.) as u8) << 1)
            | (((offset.z != 0.) as u8) << 2);
        let new_pos = old_dim.pos + offset * old_dim.size;
        let new_dim = Dimension::new(new_pos, old_dim.size * 2.);
        tree.wrap_root(new_dim, old_root_octant);
        attempts += 1;
    }
    Ok(())
}

/// Finds the deepest node containing `point`, then walks upward through
/// its ancestors returning the first entity whose [`Entity::is_within`]
/// holds.
pub fn entity_at_pos(tree: &Octree<EntitySet>, point: V3) -> Option<Rc<dyn Entity>> {
    let mut node = tree.node_at_pos(point)?.0;
    loop {
        for entity in tree.node(node).value.iter() {
            if entity.is_within(point) {
                return Some(entity.clone());
            }
        }
        if !tree.node(node).parent.is_some() {
            return None;
        }
        node = tree.node(node).parent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{SimpleSubstance, SolidTexture, StaticMaterial};
    use crate::entity::Sphere;

    fn sphere(center: V3, diameter: f32) -> Rc<dyn Entity> {
        Rc::new(Sphere {
            center,
            diameter,
            material: Rc::new(StaticMaterial::opaque_diffuse()),
            texture: Rc::new(SolidTexture(V3::splat(1.))),
            substance: Rc::new(SimpleSubstance { refractive_index: 1. }),
        })
    }

    #[test]
    fn odd_alignment_insertion_reaches_depth_one() {
        let mut tree = new_entity_octree(Dimension::new(V3::ZERO, 1.));
        let e = sphere(V3::new(0.25, 0.25, 0.25), 0.5);
        let node = add_entity_to_octree(&mut tree, e, GrowthLimits::default()).unwrap();
        assert_eq!(tree.get_level(node), 1);
        assert_eq!(tree.node(node).value.len(), 1);
    }

    #[test]
    fn straddling_entity_stays_at_root() {
        let mut tree = new_entity_octree(Dimension::new(V3::ZERO, 1.));
        let e = sphere(V3::new(0.5, 0.25, 0.5), 0.25);
        let node = add_entity_to_octree(&mut tree, e, GrowthLimits::default()).unwrap();
        assert_eq!(node, tree.root());
    }

    #[test]
    fn out_of_root_entity_grows_outward() {
        let mut tree = new_entity_octree(Dimension::new(V3::ZERO, 1.));
        let e = sphere(V3::new(5., 5., 5.), 0.1);
        let node = add_entity_to_octree(&mut tree, e, GrowthLimits::default()).unwrap();
        assert!(tree.get_level(tree.root()) == 0);
        assert!(tree.node(node).value.len() == 1);
    }

    #[test]
    fn out_of_root_entity_exceeding_budget_errors() {
        let mut tree = new_entity_octree(Dimension::new(V3::ZERO, 1.));
        let e = sphere(V3::new(1000., 1000., 1000.), 0.1);
        let limits = GrowthLimits { max_in_depth: 32, max_out_depth: 2 };
        let err = add_entity_to_octree(&mut tree, e, limits).unwrap_err();
        match err {
            OctreeError::TreeOutsideGrow { .. } => {}
        }
    }

    #[test]
    fn entity_at_pos_finds_containing_sphere() {
        let mut tree = new_entity_octree(Dimension::new(V3::ZERO, 1.));
        let e = sphere(V3::new(0.25, 0.25, 0.25), 0.5);
        add_entity_to_octree(&mut tree, e, GrowthLimits::default()).unwrap();
        let found = entity_at_pos(&tree, V3::new(0.25, 0.25, 0.25));
        assert!(found.is_some());
        let missed = entity_at_pos(&tree, V3::new(0.9, 0.9, 0.9));
        assert!(missed.is_none());
    }
}
