//! Material/texture/substance interfaces consumed by the tracer: dynamic
//! per-hit response dispatch, independent of any one concrete surface.

use crate::geometry::V3;
use crate::tracer::RayState;

/// How a surface hit responds to an incoming ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Reflection,
    Transmission,
    Both,
}

pub trait Texture: std::fmt::Debug {
    /// `u, v in [0, 1)`.
    fn get_color(&self, u: f32, v: f32) -> V3;
}

pub trait Substance: std::fmt::Debug {
    fn refractive_index(&self) -> f32;
}

/// Polymorphic material capability set the tracer dispatches on.
/// `alter_ray` mutates `ray.color` and reports whether the hit produced
/// visible modulation.
pub trait Material: std::fmt::Debug {
    fn response_type(&self, point: V3) -> ResponseType;
    fn is_mirror(&self, point: V3) -> bool;
    fn is_light_source(&self) -> bool;
    fn roughness_index(&self) -> f32;
    fn alter_ray(&self, ray: &mut RayState, texture: &dyn Texture, point: V3, uv: (f32, f32)) -> bool;
}

/// A constant-response material: the common case, and the only concrete
/// variant the core ships. Callers are free to implement `Material`
/// themselves for anything response-varying.
#[derive(Debug, Clone)]
pub struct StaticMaterial {
    pub response: ResponseType,
    pub mirror: bool,
    pub light_source: bool,
    pub roughness: f32,
}

impl StaticMaterial {
    pub fn opaque_diffuse() -> Self {
        StaticMaterial {
            response: ResponseType::Reflection,
            mirror: false,
            light_source: false,
            roughness: 1.,
        }
    }

    pub fn mirror() -> Self {
        StaticMaterial {
            response: ResponseType::Reflection,
            mirror: true,
            light_source: false,
            roughness: 0.,
        }
    }

    pub fn glass() -> Self {
        StaticMaterial {
            response: ResponseType::Transmission,
            mirror: false,
            light_source: false,
            roughness: 0.,
        }
    }

    pub fn light() -> Self {
        StaticMaterial {
            response: ResponseType::Reflection,
            mirror: false,
            light_source: true,
            roughness: 0.,
        }
    }
}

impl Material for StaticMaterial {
    fn response_type(&self, _point: V3) -> ResponseType {
        self.response
    }

    fn is_mirror(&self, _point: V3) -> bool {
        self.mirror
    }

    fn is_light_source(&self) -> bool {
        self.light_source
    }

    fn roughness_index(&self) -> f32 {
        self.roughness
    }

    fn alter_ray(&self, ray: &mut RayState, texture: &dyn Texture, _point: V3, uv: (f32, f32)) -> bool {
        let sample = texture.get_color(uv.0, uv.1);
        ray.color = ray.color.hadamard(&sample);
        true
    }
}

/// A flat-color texture, useful for tests and as the simplest real
/// implementation of the `Texture` interface.
#[derive(Debug, Clone, Copy)]
pub struct SolidTexture(pub V3);

impl Texture for SolidTexture {
    fn get_color(&self, _u: f32, _v: f32) -> V3 {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SimpleSubstance {
    pub refractive_index: f32,
}

impl Substance for SimpleSubstance {
    fn refractive_index(&self) -> f32 {
        self.refractive_index
    }
}

pub const VACUUM: SimpleSubstance = SimpleSubstance { refractive_index: 1. };
