//! Uniform values and the per-frame uniform buffer.

mod frame;
mod value;

pub use frame::{CameraBlock, FrameUniformBuffer, FrameUniformBuilder, FrameUniformSpec};
pub use value::UniformValue;
