//! Spatial acceleration engine (growable octree + directed walker) and
//! ray-evolution state machine for a CPU path tracer.

pub mod entity;
pub mod error;
pub mod geometry;
mod object_pool;
pub mod octree;
pub mod space;
pub mod material;
pub mod tracer;

pub use error::OctreeError;
pub use octree::{Child, Node, NodeId, Octree, Stop, Walker, WalkerFlags};
pub use space::Dimension;
