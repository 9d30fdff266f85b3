use glam::Vec3;

use crate::input::{InputFrame, InputState, Key};

use super::Camera;

/// First-person look and movement.
///
/// The controller holds tuning only. The camera it steers is passed to each
/// call.
#[derive(Debug, Clone)]
pub struct CameraController {
    /// Degrees of rotation per unit of pointer motion.
    pub sensitivity: f32,
    /// Units per second.
    pub speed: f32,
    /// Pitch is clamped to `[-pitch_limit, pitch_limit]` degrees.
    pub pitch_limit: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self {
            sensitivity: 0.1,
            speed: 2.5,
            pitch_limit: 89.0,
        }
    }
}

impl CameraController {
    /// Rotates by a relative pointer movement. Moving the pointer up
    /// (negative `dy`) pitches up.
    pub fn look(&self, camera: &mut Camera, dx: f32, dy: f32) {
        camera.yaw += dx * self.sensitivity;
        camera.pitch = (camera.pitch - dy * self.sensitivity).clamp(-self.pitch_limit, self.pitch_limit);
    }

    /// Translates along the view axes for the held movement keys:
    /// `W`/`S` forward and back, `A`/`D` strafe, `Space`/`Z` up and down.
    pub fn walk(&self, camera: &mut Camera, input: &InputState, dt: f32) {
        let step = self.speed * dt;
        let forward = camera.forward();
        let right = camera.right();

        let mut offset = Vec3::ZERO;
        for (key, dir) in [
            (Key::W, forward),
            (Key::S, -forward),
            (Key::D, right),
            (Key::A, -right),
            (Key::Space, Vec3::Y),
            (Key::Z, Vec3::NEG_Y),
        ] {
            if input.key_down(key) {
                offset += dir;
            }
        }
        camera.position += offset * step;
    }

    /// Applies one frame of input: accumulated pointer motion, then movement.
    pub fn update(&self, camera: &mut Camera, input: &InputState, frame: &InputFrame, dt: f32) {
        self.look(camera, frame.pointer_delta.x, frame.pointer_delta.y);
        self.walk(camera, input, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputEvent, KeyState};

    #[test]
    fn pitch_is_clamped() {
        let controller = CameraController::default();
        let mut camera = Camera::default();
        controller.look(&mut camera, 0.0, -10_000.0);
        assert_eq!(camera.pitch, 89.0);
        controller.look(&mut camera, 0.0, 10_000.0);
        assert_eq!(camera.pitch, -89.0);
    }

    #[test]
    fn yaw_follows_horizontal_motion() {
        let controller = CameraController::default();
        let mut camera = Camera::default();
        controller.look(&mut camera, 100.0, 0.0);
        assert!((camera.yaw - -80.0).abs() < 1e-4);
    }

    #[test]
    fn forward_key_moves_along_view() {
        let controller = CameraController::default();
        let mut camera = Camera::default();
        let mut input = InputState::default();
        let mut frame = InputFrame::default();
        input.apply_event(
            &mut frame,
            InputEvent::Key {
                key: Key::W,
                state: KeyState::Pressed,
                repeat: false,
            },
        );

        controller.update(&mut camera, &input, &frame, 1.0);
        assert!((camera.position - Vec3::new(0.0, 0.0, 0.5)).length() < 1e-4);
    }

    #[test]
    fn opposing_keys_cancel() {
        let controller = CameraController::default();
        let mut camera = Camera::default();
        let mut input = InputState::default();
        input.keys_down.extend([Key::A, Key::D]);
        controller.walk(&mut camera, &input, 1.0);
        assert!((camera.position - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-5);
    }
}
