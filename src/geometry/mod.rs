//! Geometry primitives: vectors, rays, and the plane/sphere/AABB
//! intersection routines the octree walker and tracer are built on.

pub mod aabb;
pub mod ray;
pub mod vector;

pub use aabb::{Aabb, FACE_NORMALS};
pub use ray::{plane_intersect, sphere_intersect, Hit, Ray};
pub use vector::{isotropic_sphere_sample, rotate_vectors, V2, V3};
