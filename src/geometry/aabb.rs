use crate::geometry::ray::{Hit, Ray};
use crate::geometry::vector::V3;

/// Canonical face-to-normal map used everywhere a box face is identified by
/// index. This is the only place face ids are assigned.
pub const FACE_NORMALS: [V3; 6] = [
    V3 { x: -1., y: 0., z: 0. },
    V3 { x: 1., y: 0., z: 0. },
    V3 { x: 0., y: -1., z: 0. },
    V3 { x: 0., y: 1., z: 0. },
    V3 { x: 0., y: 0., z: -1. },
    V3 { x: 0., y: 0., z: 1. },
];

/// An axis-aligned box expressed as center + per-axis edge length, so both
/// the cube entities (equal edges) and the walker's non-cubic half-open
/// child spaces share one representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: V3,
    pub size: V3,
}

impl Aabb {
    pub fn new(center: V3, size: V3) -> Self {
        Self { center, size }
    }

    pub fn half_size(&self) -> V3 {
        self.size * 0.5
    }

    pub fn min(&self) -> V3 {
        self.center - self.half_size()
    }

    pub fn max(&self) -> V3 {
        self.center + self.half_size()
    }

    /// Slab test: computes `[t_lo, t_hi]` per axis, intersects them, and
    /// reports the face ids of the surviving extrema as entry/exit normals.
    /// Returns both hits together since, for a convex box, an intersection
    /// always has both an entry and an exit parameter (the entry `t` may be
    /// negative if `ray.start` is inside the box). A ray exactly parallel
    /// to a slab whose origin lies outside that slab returns `None`.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(Hit, Hit)> {
        let lo = self.min();
        let hi = self.max();
        let origin = [ray.start.x, ray.start.y, ray.start.z];
        let dir = [ray.dir.x, ray.dir.y, ray.dir.z];
        let lo_arr = [lo.x, lo.y, lo.z];
        let hi_arr = [hi.x, hi.y, hi.z];

        let mut t_entry = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut entry_face = 0usize;
        let mut exit_face = 1usize;

        for axis in 0..3 {
            if dir[axis] == 0. {
                if origin[axis] < lo_arr[axis] || origin[axis] > hi_arr[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1. / dir[axis];
            let t_lo_axis = (lo_arr[axis] - origin[axis]) * inv;
            let t_hi_axis = (hi_arr[axis] - origin[axis]) * inv;
            let (t_near, t_far, near_face, far_face) = if t_lo_axis <= t_hi_axis {
                (t_lo_axis, t_hi_axis, axis * 2, axis * 2 + 1)
            } else {
                (t_hi_axis, t_lo_axis, axis * 2 + 1, axis * 2)
            };
            if t_near > t_entry {
                t_entry = t_near;
                entry_face = near_face;
            }
            if t_far < t_exit {
                t_exit = t_far;
                exit_face = far_face;
            }
        }

        if t_entry > t_exit {
            return None;
        }

        Some((
            Hit { t: t_entry, normal: FACE_NORMALS[entry_face] },
            Hit { t: t_exit, normal: FACE_NORMALS[exit_face] },
        ))
    }

    pub fn contains_point_closed(&self, p: V3) -> bool {
        let lo = self.min();
        let hi = self.max();
        p.x >= lo.x && p.x <= hi.x && p.y >= lo.y && p.y <= hi.y && p.z >= lo.z && p.z <= hi.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_aligned_hit_reports_outward_normals() {
        let aabb = Aabb::new(V3::ZERO, V3::splat(2.));
        let ray = Ray::new(V3::new(-5., 0., 0.), V3::new(1., 0., 0.));
        let (entry, exit) = aabb.intersect_ray(&ray).unwrap();
        assert!((entry.t - 4.).abs() < 1e-5);
        assert_eq!(entry.normal, V3::new(-1., 0., 0.));
        assert!((exit.t - 6.).abs() < 1e-5);
        assert_eq!(exit.normal, V3::new(1., 0., 0.));
    }

    #[test]
    fn origin_inside_box_gives_negative_entry() {
        let aabb = Aabb::new(V3::ZERO, V3::splat(2.));
        let ray = Ray::new(V3::ZERO, V3::new(1., 0., 0.));
        let (entry, exit) = aabb.intersect_ray(&ray).unwrap();
        assert!(entry.t < 0.);
        assert!(exit.t > 0.);
    }

    #[test]
    fn parallel_ray_outside_slab_misses() {
        let aabb = Aabb::new(V3::ZERO, V3::splat(2.));
        let ray = Ray::new(V3::new(0., 5., 0.), V3::new(1., 0., 0.));
        assert!(aabb.intersect_ray(&ray).is_none());
    }

    #[test]
    fn diagonal_miss_returns_none() {
        let aabb = Aabb::new(V3::ZERO, V3::splat(2.));
        let ray = Ray::new(V3::new(10., 10., 10.), V3::new(1., 0., 0.));
        assert!(aabb.intersect_ray(&ray).is_none());
    }
}
