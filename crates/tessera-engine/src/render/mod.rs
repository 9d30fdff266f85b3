//! Renderables and the render pass that draws them.

mod pass;
mod renderable;

pub use pass::{RenderPass, RenderPassBuilder};
pub use renderable::{Renderable, MODEL_UNIFORM};
