//! Contracts between the core and the outside world.
//!
//! A [`Host`] owns the window and context, an [`App`] owns the scene, and
//! [`FrameLoop`] runs one against the other.

mod app;
mod ctx;
mod frame_loop;
mod host;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
pub use frame_loop::{FrameLoop, FrameLoopConfig, StopReason};
pub use host::Host;
