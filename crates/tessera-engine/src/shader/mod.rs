//! Shader sources, program building and linked programs.

mod builder;
mod program;
mod source;

pub use builder::{ProgramBuilder, ShaderSpec};
pub use program::Program;
pub use source::{FsLoader, ShaderSource, SourceLoader};

pub use crate::device::ShaderStage;
