//! Space model: closed-open point/box membership tests and octant
//! geometry. `Dimension` is the octree node's `id`: the vertex adjacent
//! to child 0 (`pos`) plus the cube's edge length (`size`).

use crate::geometry::{Aabb, V3};

/// Child `i` sits at `canonical_child_offset(i) * size/2` relative to the
/// parent's `pos`. This is the only bit-mapping between octant index and
/// spatial direction used anywhere in the system.
pub fn canonical_child_offset(octant: u8) -> V3 {
    debug_assert!(octant < 8);
    V3::new(
        (octant & 1) as f32,
        ((octant >> 1) & 1) as f32,
        ((octant >> 2) & 1) as f32,
    )
}

/// Maps a position relative to a cube of the given size to the octant
/// index that contains it, per the canonical bit-mapping above.
pub fn hash_octant(relative: V3, size: f32) -> u8 {
    let half = size / 2.;
    (relative.x >= half) as u8 + ((relative.y >= half) as u8) * 2 + ((relative.z >= half) as u8) * 4
}

/// A cube region: the vertex adjacent to child 0, plus edge length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimension {
    pub pos: V3,
    pub size: f32,
}

impl Dimension {
    pub fn new(pos: V3, size: f32) -> Self {
        Self { pos, size }
    }

    pub fn child_dimension(&self, octant: u8) -> Dimension {
        Dimension {
            pos: self.pos + canonical_child_offset(octant) * (self.size / 2.),
            size: self.size / 2.,
        }
    }

    pub fn midpoint(&self) -> V3 {
        self.pos + V3::splat(self.size / 2.)
    }

    pub fn to_aabb(self) -> Aabb {
        Aabb::new(self.midpoint(), V3::splat(self.size))
    }

    /// The octant of `self` that contains `point`, assuming `point` is
    /// already known to lie within `self` under the closed-open rule.
    pub fn octant_for(&self, point: V3) -> u8 {
        hash_octant(point - self.pos, self.size)
    }
}

/// Closed-open point-in-box test: `pos[i] <= p[i] < pos[i] + size[i]` on
/// every axis. The half-open convention makes octant membership
/// unambiguous at boundaries.
pub fn point_in_space(p: V3, space: &Dimension) -> bool {
    p.x >= space.pos.x
        && p.x < space.pos.x + space.size
        && p.y >= space.pos.y
        && p.y < space.pos.y + space.size
        && p.z >= space.pos.z
        && p.z < space.pos.z + space.size
}

/// Whether `inner` fits wholly inside `outer`, closed on both ends of
/// `outer`'s upper bound — needed by AABB-in-box tests during tree growth,
/// where an entity whose AABB exactly touches a child's far face must
/// still be considered contained.
pub fn space_in_space(inner: &Aabb, outer: &Dimension) -> bool {
    let inner_min = inner.min();
    let inner_max = inner.max();
    let outer_max = outer.pos + V3::splat(outer.size);
    inner_min.x >= outer.pos.x
        && inner_min.y >= outer.pos.y
        && inner_min.z >= outer.pos.z
        && inner_max.x <= outer_max.x
        && inner_max.y <= outer_max.y
        && inner_max.z <= outer_max.z
}

/// Volume of the overlap between two AABBs; zero if they don't overlap.
pub fn aabb_overlap_volume(a: &Aabb, b: &Aabb) -> f32 {
    let (a_min, a_max) = (a.min(), a.max());
    let (b_min, b_max) = (b.min(), b.max());
    let dx = (a_max.x.min(b_max.x) - a_min.x.max(b_min.x)).max(0.);
    let dy = (a_max.y.min(b_max.y) - a_min.y.max(b_min.y)).max(0.);
    let dz = (a_max.z.min(b_max.z) - a_min.z.max(b_min.z)).max(0.);
    dx * dy * dz
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_offsets_cover_all_octants() {
        let expected = [
            V3::new(0., 0., 0.),
            V3::new(1., 0., 0.),
            V3::new(0., 1., 0.),
            V3::new(1., 1., 0.),
            V3::new(0., 0., 1.),
            V3::new(1., 0., 1.),
            V3::new(0., 1., 1.),
            V3::new(1., 1., 1.),
        ];
        for (i, exp) in expected.iter().enumerate() {
            assert_eq!(canonical_child_offset(i as u8), *exp);
        }
    }

    #[test]
    fn point_in_space_is_half_open() {
        let dim = Dimension::new(V3::ZERO, 1.);
        assert!(point_in_space(V3::new(0., 0., 0.), &dim));
        assert!(!point_in_space(V3::new(1., 0., 0.), &dim));
        assert!(point_in_space(V3::new(0.999, 0.999, 0.999), &dim));
    }

    #[test]
    fn entity_exactly_matching_child_box_is_contained() {
        let outer = Dimension::new(V3::ZERO, 2.);
        let child = outer.child_dimension(0);
        let inner = child.to_aabb();
        assert!(space_in_space(&inner, &child));
    }

    #[test]
    fn overlap_volume_of_disjoint_boxes_is_zero() {
        let a = Aabb::new(V3::ZERO, V3::splat(1.));
        let b = Aabb::new(V3::new(10., 10., 10.), V3::splat(1.));
        assert_eq!(aabb_overlap_volume(&a, &b), 0.);
    }
}
