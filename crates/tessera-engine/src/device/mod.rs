//! Driver seam and GPU object ownership.
//!
//! This module is responsible for:
//! - the [`Device`] trait every backend implements
//! - [`GpuHandle`], the single owner of one driver object
//! - the OpenGL backend ([`GlDevice`]) and the in-memory [`HeadlessDevice`]

mod backend;
mod error;
mod gl;
mod handle;
pub mod headless;
mod types;

pub use backend::Device;
pub use error::BuildError;
pub use gl::{GlDevice, GlInit};
pub use handle::{GpuHandle, HandleState};
pub use headless::HeadlessDevice;
pub use types::{
    BufferTarget, BufferUsage, ComponentType, IndexFormat, ObjectKind, RawId, ShaderStage,
    TextureTarget, UniformLocation, VertexAttribute,
};
