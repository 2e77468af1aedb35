//! Render Module
//!
//! CPU mesh building plus the wgpu state that draws a `Scene`.

pub mod gpu_state;
pub mod mesh;
pub mod vertex;

pub use gpu_state::{create_instance, surface_extent, GpuState};
pub use mesh::{add_box, build_torus, BoxFaces, Mesh};
pub use vertex::{InstanceRaw, Vertex};
