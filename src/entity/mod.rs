//! Scene entities and the per-node entity set they live in.

use std::rc::Rc;

use crate::geometry::{sphere_intersect, Aabb, Ray, V3};
use crate::material::{Material, Substance, Texture};

/// Orients `normal` to face the incoming ray (`dir.dot(normal) <= 0`),
/// flipping it if the ray is exiting a volume rather than entering one —
/// e.g. a transmission ray leaving a glass sphere from inside hits a
/// geometrically outward-facing normal that still points roughly the same
/// way as `dir`. The tracer's degenerate-normal guard assumes every
/// reported hit normal already faces the ray this way.
fn face_ray(dir: V3, normal: V3) -> V3 {
    if dir.dot(&normal) > 0. {
        -normal
    } else {
        normal
    }
}

/// The result of a ray hitting an entity: point, outward normal, the
/// forward parameter (used to pick the nearest hit across a node's entity
/// set), and the material/texture in effect at the hit.
pub struct CollisionInfo {
    pub t: f32,
    pub point: V3,
    pub normal: V3,
    pub uv: (f32, f32),
    pub material: Rc<dyn Material>,
    pub texture: Rc<dyn Texture>,
}

/// Abstract scene entity. Concrete kinds: [`Sphere`] and [`Cube`].
pub trait Entity: std::fmt::Debug {
    fn get_pos(&self) -> V3;
    fn get_aabb(&self) -> Aabb;
    fn is_within(&self, point: V3) -> bool;
    fn collision_info(&self, ray: &Ray) -> Option<CollisionInfo>;
    fn map_uv(&self, point: V3) -> (f32, f32);
    fn get_substance(&self) -> Rc<dyn Substance>;
}

#[derive(Debug, Clone)]
pub struct Sphere {
    pub center: V3,
    pub diameter: f32,
    pub material: Rc<dyn Material>,
    pub texture: Rc<dyn Texture>,
    pub substance: Rc<dyn Substance>,
}

impl Entity for Sphere {
    fn get_pos(&self) -> V3 {
        self.center
    }

    fn get_aabb(&self) -> Aabb {
        Aabb::new(self.center, V3::splat(self.diameter))
    }

    fn is_within(&self, point: V3) -> bool {
        let r = self.diameter / 2.;
        (point - self.center).length_sq() <= r * r
    }

    fn collision_info(&self, ray: &Ray) -> Option<CollisionInfo> {
        let radius = self.diameter / 2.;
        let [near, far] = sphere_intersect(self.center, radius, ray);
        let hit = near.filter(|h| h.t >= 0.).or(far.filter(|h| h.t >= 0.))?;
        let point = ray.at(hit.t);
        let uv = self.map_uv(point);
        Some(CollisionInfo {
            t: hit.t,
            point,
            normal: face_ray(ray.dir, hit.normal),
            uv,
            material: self.material.clone(),
            texture: self.texture.clone(),
        })
    }

    /// Equirectangular mapping from the unit sphere normal to `(u, v)`.
    fn map_uv(&self, point: V3) -> (f32, f32) {
        let n = (point - self.center).normalize();
        let u = 0.5 + n.z.atan2(n.x) / (2. * std::f32::consts::PI);
        let v = 0.5 - n.y.asin() / std::f32::consts::PI;
        (u, v)
    }

    fn get_substance(&self) -> Rc<dyn Substance> {
        self.substance.clone()
    }
}

#[derive(Debug, Clone)]
pub struct Cube {
    pub center: V3,
    pub edge: f32,
    pub material: Rc<dyn Material>,
    pub texture: Rc<dyn Texture>,
    pub substance: Rc<dyn Substance>,
}

impl Entity for Cube {
    fn get_pos(&self) -> V3 {
        self.center
    }

    fn get_aabb(&self) -> Aabb {
        Aabb::new(self.center, V3::splat(self.edge))
    }

    fn is_within(&self, point: V3) -> bool {
        self.get_aabb().contains_point_closed(point)
    }

    fn collision_info(&self, ray: &Ray) -> Option<CollisionInfo> {
        let (entry, exit) = self.get_aabb().intersect_ray(ray)?;
        let hit = if entry.t >= 0. { entry } else { exit };
        if hit.t < 0. {
            return None;
        }
        let point = ray.at(hit.t);
        let uv = self.map_uv(point);
        Some(CollisionInfo {
            t: hit.t,
            point,
            normal: face_ray(ray.dir, hit.normal),
            uv,
            material: self.material.clone(),
            texture: self.texture.clone(),
        })
    }

    /// Projects the hit point onto whichever face it is closest to,
    /// producing `(u, v) in [0, 1)^2` local to that face.
    fn map_uv(&self, point: V3) -> (f32, f32) {
        let aabb = self.get_aabb();
        let rel = point - aabb.min();
        let fractions = [rel.x / self.edge, rel.y / self.edge, rel.z / self.edge];
        let dominant = (0..3)
            .max_by(|&a, &b| {
                let da = (fractions[a] - 0.5).abs();
                let db = (fractions[b] - 0.5).abs();
                da.partial_cmp(&db).unwrap()
            })
            .unwrap();
        let others: Vec<f32> = (0..3).filter(|&i| i != dominant).map(|i| fractions[i]).collect();
        (others[0].clamp(0., 0.999), others[1].clamp(0., 0.999))
    }

    fn get_substance(&self) -> Rc<dyn Substance> {
        self.substance.clone()
    }
}

/// Per-node entity set. Membership-tested by pointer identity rather
/// than value equality, since entities are shared via `Rc` and never
/// duplicated.
#[derive(Debug, Clone, Default)]
pub struct EntitySet(Vec<Rc<dyn Entity>>);

impl EntitySet {
    pub fn insert(&mut self, entity: Rc<dyn Entity>) {
        if !self.contains(&entity) {
            self.0.push(entity);
        }
    }

    pub fn contains(&self, entity: &Rc<dyn Entity>) -> bool {
        self.0.iter().any(|e| Rc::ptr_eq(e, entity))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<dyn Entity>> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
