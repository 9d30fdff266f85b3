//! Perspective camera and its first-person controller.

mod perspective;
mod controller;

pub use perspective::Camera;
pub use controller::CameraController;
