//! Tessera engine crate.
//!
//! Minimal real-time rendering core: owned GPU resources built through
//! immutable builders, materials and renderables composed into a render pass
//! that is replayed once per frame.

pub mod device;
pub mod mesh;
pub mod shader;
pub mod uniform;
pub mod material;
pub mod camera;
pub mod render;

pub mod input;
pub mod time;
pub mod core;
pub mod logging;

pub use device::BuildError;
