use crate::geometry::vector::V3;

/// `{start, dir}` line/ray geometry. Intersection parameters are signed:
/// `p = start + t*dir` with `t` ranging over all of `R`; forward-only
/// callers filter `t >= 0` themselves.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub start: V3,
    pub dir: V3,
}

impl Ray {
    pub fn new(start: V3, dir: V3) -> Self {
        Self { start, dir }
    }

    pub fn at(&self, t: f32) -> V3 {
        self.start + self.dir * t
    }
}

/// A single ray/plane or ray/sphere hit.
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    pub t: f32,
    pub normal: V3,
}

/// Intersects `ray` with the plane through `pos` with unit `normal`.
/// Returns at most one hit. A ray parallel to the plane (`dir . normal == 0`)
/// returns `None` unless `allow_infinity` is set, in which case the walker's
/// degenerate-guard case is honored by returning a hit at `t = f32::INFINITY`
/// — used only by the walker when a ray direction component is exactly zero.
pub fn plane_intersect(normal: V3, pos: V3, ray: &Ray, allow_infinity: bool) -> Option<Hit> {
    let denom = ray.dir.dot(&normal);
    if denom == 0. {
        return if allow_infinity {
            Some(Hit { t: f32::INFINITY, normal })
        } else {
            None
        };
    }
    let t = (pos - ray.start).dot(&normal) / denom;
    Some(Hit { t, normal })
}

/// Intersects `ray` with the sphere of `radius` centered at `center`.
/// Returns zero or two hits, ordered near-then-far (`t` ascending). The
/// caller filters by sign.
pub fn sphere_intersect(center: V3, radius: f32, ray: &Ray) -> [Option<Hit>; 2] {
    let oc = ray.start - center;
    let a = ray.dir.length_sq();
    let b = 2. * oc.dot(&ray.dir);
    let c = oc.length_sq() - radius * radius;
    let discriminant = b * b - 4. * a * c;
    if discriminant < 0. {
        return [None, None];
    }
    let sqrt_d = discriminant.sqrt();
    let t_near = (-b - sqrt_d) / (2. * a);
    let t_far = (-b + sqrt_d) / (2. * a);
    let normal_at = |t: f32| (ray.at(t) - center).normalize();
    [
        Some(Hit { t: t_near, normal: normal_at(t_near) }),
        Some(Hit { t: t_far, normal: normal_at(t_far) }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_hit_is_signed() {
        let ray = Ray::new(V3::new(0., 5., 0.), V3::new(0., -1., 0.));
        let hit = plane_intersect(V3::new(0., 1., 0.), V3::ZERO, &ray, false).unwrap();
        assert!((hit.t - 5.).abs() < 1e-6);

        let ray_away = Ray::new(V3::new(0., 5., 0.), V3::new(0., 1., 0.));
        let hit_away = plane_intersect(V3::new(0., 1., 0.), V3::ZERO, &ray_away, false).unwrap();
        assert!(hit_away.t < 0.);
    }

    #[test]
    fn parallel_plane_ray_misses_unless_allowed() {
        let ray = Ray::new(V3::new(0., 5., 0.), V3::new(1., 0., 0.));
        assert!(plane_intersect(V3::new(0., 1., 0.), V3::ZERO, &ray, false).is_none());
        assert!(plane_intersect(V3::new(0., 1., 0.), V3::ZERO, &ray, true).is_some());
    }

    #[test]
    fn sphere_hits_are_ordered_near_then_far() {
        let ray = Ray::new(V3::new(0., 0., -5.), V3::new(0., 0., 1.));
        let [near, far] = sphere_intersect(V3::ZERO, 1., &ray);
        let near = near.unwrap();
        let far = far.unwrap();
        assert!(near.t < far.t);
        assert!((near.t - 4.).abs() < 1e-5);
        assert!((far.t - 6.).abs() < 1e-5);
    }

    #[test]
    fn sphere_miss_returns_no_hits() {
        let ray = Ray::new(V3::new(5., 5., -5.), V3::new(0., 0., 1.));
        let [near, far] = sphere_intersect(V3::ZERO, 1., &ray);
        assert!(near.is_none() && far.is_none());
    }
}
