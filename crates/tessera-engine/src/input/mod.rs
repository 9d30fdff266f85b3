//! Input subsystem.
//!
//! Public API is platform-agnostic. Hosts translate their window system's
//! events into `InputEvent`s; `platform::winit` does this for winit.

mod frame;
pub mod platform;
mod state;
mod types;

pub use frame::InputFrame;
pub use state::InputState;
pub use types::{InputEvent, Key, KeyState};
