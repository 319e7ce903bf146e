//! Ray & tracer: per-ray state machine, bounce budget, and the frame loop
//! that drives the walker across an entity index. Pulls walker stops,
//! scans each stop's entities, and dispatches the nearest hit's material
//! response (reflect, refract, scatter, or absorb) until the ray is
//! exhausted, absorbed, or escapes to the sky.

use std::rc::Rc;

use crate::entity::EntitySet;
use crate::geometry::V3;
use crate::material::{ResponseType, Substance, VACUUM};
use crate::octree::entity_index::entity_at_pos;
use crate::octree::{NodeId, Octree, Walker, WalkerFlags};

/// PRNG source consumed by [`crate::geometry::isotropic_sphere_sample`] and
/// glossy-reflection scattering: `next()` returns a real in `[0, 1)`. The
/// tracer owns and borrows this for the duration of one trace call.
pub trait Rng {
    fn next(&mut self) -> f64;
}

/// Blanket impl so any `rand::RngCore` source (e.g. `rand::rngs::SmallRng`)
/// satisfies this crate's [`Rng`] trait without this crate hard-depending
/// on `rand`'s API surface when the feature is off.
#[cfg(feature = "rand-support")]
impl<T: rand::RngCore + ?Sized> Rng for T {
    fn next(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

/// One pixel's worth of camera output: a screen coordinate plus the ray
/// direction through it. Direction is not required to be unit.
#[derive(Debug, Clone, Copy)]
pub struct PixelRay {
    pub x: u32,
    pub y: u32,
    pub dir: V3,
}

/// External collaborator that produces one frame's worth of pixels.
/// Non-restartable per frame, finite — a fresh iterator is expected per
/// call to [`trace_frame`].
pub trait Camera {
    fn position(&self) -> V3;
    fn iter_pixels(&self) -> Box<dyn Iterator<Item = PixelRay> + '_>;
}

/// External collaborator mapping a direction to a background color.
pub trait Sky {
    fn get_color(&self, dir: V3) -> V3;
}

/// External collaborator that the tracer writes pixels into. Accumulating
/// multiple frames into a running mean is this sink's responsibility, not
/// the tracer's.
pub trait ExposureBuffer {
    fn set_color(&mut self, x: u32, y: u32, rgb: V3);
}

pub const WHITE: V3 = V3 { x: 1., y: 1., z: 1. };
pub const BLACK: V3 = V3 { x: 0., y: 0., z: 0. };

/// Tunable knobs grouped into one struct with a `Default` impl.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracerConfig {
    /// Bounce budget per ray; exceeding it without a light hit is not an
    /// error, just early termination to `BLACK`.
    pub refmax: u32,
    /// Attenuation coefficient `A` in `1 / (epsilon + (A*d)^2)`.
    pub attenuation_coefficient: f32,
    /// Shared epsilon: both the transmission surface-leaving nudge and the
    /// denominator floor of the attenuation formula.
    pub epsilon: f32,
}

impl Default for TracerConfig {
    fn default() -> Self {
        TracerConfig {
            refmax: 8,
            attenuation_coefficient: 1.0,
            epsilon: 1e-4,
        }
    }
}

/// Per-ray mutable state. Created once per pixel, discarded when traced —
/// stack-local to one `trace_ray` call.
pub struct RayState {
    pub refcount: u32,
    pub refmax: u32,
    pub refpoint: V3,
    pub start_node: Option<NodeId>,
    pub dir: V3,
    pub color: V3,
    pub path_distance: f32,
    pub substance: Rc<dyn Substance>,
}

impl RayState {
    pub fn new(start: V3, dir: V3, refmax: u32) -> Self {
        RayState {
            refcount: 0,
            refmax,
            refpoint: start,
            start_node: None,
            dir,
            color: WHITE,
            path_distance: 0.,
            substance: Rc::new(VACUUM),
        }
    }
}

/// Outcome of one hit's dispatch, named so a future scattering model can
/// plug a real case in where non-mirror, zero-roughness reflection
/// currently terminates the ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReflectOutcome {
    Specular,
    Glossy,
    Absorbed,
}

/// Reflects `dir` off `normal`, optionally blending in an isotropic
/// glossy lobe weighted by `roughness`.
fn scatter_reflect<R: Rng>(dir: V3, normal: V3, roughness: f32, rng: &mut R) -> V3 {
    let mirrored = dir.reflect(&normal);
    if roughness <= 0. {
        return mirrored;
    }
    let sample = crate::geometry::isotropic_sphere_sample(rng);
    let oriented = if sample.dot(&normal) < 0. { -sample } else { sample };
    (mirrored * (1. - roughness) + oriented * roughness).normalize()
}

/// Snell's law refraction. `eta = n_from / n_to`; `normal` already faces
/// the incoming ray (`dir.dot(normal) <= 0`). Returns `None` on total
/// internal reflection (`sin^2(theta_t) > 1`), in which case the caller
/// substitutes [`V3::reflect`].
fn refract(dir: V3, normal: V3, eta: f32) -> Option<V3> {
    let cos_i = -dir.dot(&normal);
    let sin2_t = eta * eta * (1. - cos_i * cos_i);
    if sin2_t > 1. {
        return None;
    }
    let cos_t = (1. - sin2_t).sqrt();
    Some(dir * eta + normal * (eta * cos_i - cos_t))
}

/// Traces one ray to completion against `tree`, returning its final color.
/// `sky` and `rng` are borrowed for the duration; the walker is
/// constructed fresh per call so concurrent tracing only needs per-ray
/// walker instances over a read-only tree.
pub fn trace_ray<S: Sky, R: Rng>(
    tree: &Octree<EntitySet>,
    sky: &S,
    rng: &mut R,
    config: &TracerConfig,
    start: V3,
    dir: V3,
) -> V3 {
    let mut ray = RayState::new(start, dir, config.refmax);
    // A stop names a child slot, not a node in its own right; the entity
    // set that slot's content might straddle lives on the *parent*
    // (`node` below), which is only reachable if the slot itself is
    // surfaced as a stop even when it's `Empty`.
    let mut walker = Walker::new(tree, WalkerFlags::INCLUDE_EMPTY);
    walker.set_pos_and_dir(ray.refpoint, ray.dir, ray.start_node);

    'travelling: loop {
        let mut light_hit = false;
        let mut exhausted = true;

        while let Some(stop) = walker.next() {
            let node = stop.pos.map(|(parent, _)| parent).unwrap_or_else(|| tree.root());
            let entities = &tree.node(node).value;
            if entities.is_empty() {
                continue;
            }

            let mut nearest: Option<(f32, crate::entity::CollisionInfo)> = None;
            for entity in entities.iter() {
                if let Some(hit) = entity.collision_info(&crate::geometry::Ray::new(ray.refpoint, ray.dir)) {
                    if hit.t < -config.epsilon {
                        continue;
                    }
                    if nearest.as_ref().map_or(true, |(t, _)| hit.t < *t) {
                        nearest = Some((hit.t, hit));
                    }
                }
            }

            let Some((_, hit)) = nearest else { continue };

            if ray.dir.dot(&hit.normal) >= 0. {
                log::warn!("degenerate hit normal (dir.normal >= 0); terminating ray");
                ray.color = BLACK;
                return ray.color;
            }

            ray.refcount += 1;
            hit.material.alter_ray(&mut ray, hit.texture.as_ref(), hit.point, hit.uv);
            ray.path_distance += (hit.point - ray.refpoint).length();
            ray.refpoint = hit.point;
            // Resume the next leg of the walk near the node that produced
            // this hit rather than re-descending from the absolute root.
            ray.start_node = Some(node);

            if hit.material.is_light_source() {
                light_hit = true;
                exhausted = false;
                break;
            }

            // Both is treated as transmissive unless the surface is also
            // flagged a mirror, in which case reflection takes precedence
            // (the same way a mirrored-glass surface would behave).
            let response = hit.material.response_type(hit.point);
            let is_mirror = hit.material.is_mirror(hit.point);
            let is_transmission = match response {
                ResponseType::Transmission => true,
                ResponseType::Both => !is_mirror,
                ResponseType::Reflection => false,
            };

            let outcome = if is_mirror {
                ReflectOutcome::Specular
            } else if hit.material.roughness_index() > 0. {
                ReflectOutcome::Glossy
            } else {
                ReflectOutcome::Absorbed
            };

            if is_transmission {
                let n_from = ray.substance.refractive_index();
                ray.refpoint = ray.refpoint + ray.dir * config.epsilon;
                let next_substance = entity_at_pos(tree, ray.refpoint)
                    .map(|e| e.get_substance())
                    .unwrap_or_else(|| Rc::new(VACUUM));
                let n_to = next_substance.refractive_index();
                let eta = n_from / n_to;
                ray.dir = match refract(ray.dir, hit.normal, eta) {
                    Some(refracted) => refracted.normalize(),
                    None => ray.dir.reflect(&hit.normal),
                };
                ray.substance = next_substance;
            } else {
                match outcome {
                    ReflectOutcome::Specular => {
                        ray.dir = ray.dir.reflect(&hit.normal);
                    }
                    ReflectOutcome::Glossy => {
                        ray.dir = scatter_reflect(ray.dir, hit.normal, hit.material.roughness_index(), rng);
                    }
                    ReflectOutcome::Absorbed => {
                        ray.color = BLACK;
                        return ray.color;
                    }
                }
            }

            if ray.refcount >= ray.refmax {
                ray.color = BLACK;
                return ray.color;
            }

            walker.set_pos_and_dir(ray.refpoint, ray.dir, ray.start_node);
            exhausted = false;
            continue 'travelling;
        }

        if light_hit {
            let d = ray.path_distance;
            let attenuation = 1. / (config.epsilon + (config.attenuation_coefficient * d).powi(2));
            ray.color = ray.color * attenuation;
        } else if exhausted {
            ray.color = ray.color.hadamard(&sky.get_color(ray.dir));
        }
        return ray.color;
    }
}

/// Consumes one camera stream and writes one pixel per draw to the
/// exposure buffer. The entity index is read-only for the duration.
pub fn trace_frame<S: Sky, R: Rng, C: Camera, B: ExposureBuffer>(
    tree: &Octree<EntitySet>,
    sky: &S,
    rng: &mut R,
    config: &TracerConfig,
    camera: &C,
    buffer: &mut B,
) {
    for pixel in camera.iter_pixels() {
        let color = trace_ray(tree, sky, rng, config, camera.position(), pixel.dir);
        buffer.set_color(pixel.x, pixel.y, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, Sphere};
    use crate::material::{SimpleSubstance, SolidTexture, StaticMaterial};
    use crate::octree::entity_index::{add_entity_to_octree, new_entity_octree, GrowthLimits};
    use crate::space::Dimension;

    struct StepRng(f64);
    impl Rng for StepRng {
        fn next(&mut self) -> f64 {
            self.0
        }
    }

    struct ConstSky(V3);
    impl Sky for ConstSky {
        fn get_color(&self, _dir: V3) -> V3 {
            self.0
        }
    }

    fn sphere(center: V3, diameter: f32, material: StaticMaterial) -> Rc<dyn Entity> {
        Rc::new(Sphere {
            center,
            diameter,
            material: Rc::new(material),
            texture: Rc::new(SolidTexture(V3::splat(1.))),
            substance: Rc::new(SimpleSubstance { refractive_index: 1. }),
        })
    }

    #[test]
    fn refmax_zero_with_no_hit_returns_sky() {
        let tree = new_entity_octree(Dimension::new(V3::ZERO, 1.));
        let sky = ConstSky(V3::new(0.2, 0.4, 0.6));
        let mut rng = StepRng(0.5);
        let config = TracerConfig { refmax: 0, ..Default::default() };
        let color = trace_ray(&tree, &sky, &mut rng, &config, V3::new(0.5, 0.5, -5.), V3::new(0., 0., 1.));
        assert_eq!(color, sky.0);
    }

    #[test]
    fn ray_hitting_light_source_terminates_with_attenuated_color() {
        let mut tree = new_entity_octree(Dimension::new(V3::new(-5., -5., -5.), 10.));
        let light = sphere(V3::new(0., 0., 5.), 1., StaticMaterial::light());
        add_entity_to_octree(&mut tree, light, GrowthLimits::default()).unwrap();
        let sky = ConstSky(V3::ZERO);
        let mut rng = StepRng(0.5);
        let config = TracerConfig::default();
        let color = trace_ray(&tree, &sky, &mut rng, &config, V3::new(0., 0., -5.), V3::new(0., 0., 1.));
        assert!(color.length_sq() > 0.);
    }

    #[test]
    fn ray_hitting_absorbing_surface_returns_black() {
        let mut tree = new_entity_octree(Dimension::new(V3::new(-5., -5., -5.), 10.));
        let wall = sphere(V3::new(0., 0., 5.), 1., StaticMaterial::opaque_diffuse());
        add_entity_to_octree(&mut tree, wall, GrowthLimits::default()).unwrap();
        let sky = ConstSky(WHITE);
        let mut rng = StepRng(0.5);
        let config = TracerConfig::default();
        let color = trace_ray(&tree, &sky, &mut rng, &config, V3::new(0., 0., -5.), V3::new(0., 0., 1.));
        assert_eq!(color, BLACK);
    }

    #[test]
    fn mirror_reflection_keeps_tracing_and_eventually_samples_sky() {
        let mut tree = new_entity_octree(Dimension::new(V3::new(-5., -5., -5.), 10.));
        let mirror = sphere(V3::new(0., 0., 2.), 1., StaticMaterial::mirror());
        add_entity_to_octree(&mut tree, mirror, GrowthLimits::default()).unwrap();
        let sky = ConstSky(V3::new(0.1, 0.2, 0.3));
        let mut rng = StepRng(0.5);
        let config = TracerConfig::default();
        let color = trace_ray(&tree, &sky, &mut rng, &config, V3::new(0., 0., -5.), V3::new(0., 0., 1.));
        // Reflects back the way it came and exits the tree without another hit.
        assert!(color.x > 0. || color.y > 0. || color.z > 0.);
    }
}
