use glam::{Mat4, Vec3};

/// Perspective camera described by a position and yaw/pitch angles.
///
/// Fields are plain data and may be changed at any time. The derived
/// matrices only change when [`update_matrices`](Self::update_matrices) runs,
/// so call it after mutating and before reading them for the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Degrees. `-90` looks down `-Z`.
    pub yaw: f32,
    /// Degrees, positive looks up.
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    view: Mat4,
    projection: Mat4,
    view_projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0), -90.0, 0.0)
    }
}

impl Camera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            yaw,
            pitch,
            fov: 60.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
        };
        camera.update_matrices();
        camera
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    /// Unit vector to the camera's right, parallel to the ground plane.
    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    /// Recomputes view, projection and their product from the current fields.
    pub fn update_matrices(&mut self) {
        let forward = self.forward();
        self.view = Mat4::look_at_rh(self.position, self.position + forward, Vec3::Y);
        self.projection =
            Mat4::perspective_rh_gl(self.fov.to_radians(), self.aspect, self.near, self.far);
        self.view_projection = self.projection * self.view;
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        self.view
    }

    #[inline]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// `projection * view` as of the last [`update_matrices`](Self::update_matrices).
    #[inline]
    pub fn view_projection(&self) -> Mat4 {
        self.view_projection
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec4;

    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn default_looks_down_negative_z() {
        let camera = Camera::default();
        assert!(close(camera.forward(), Vec3::NEG_Z));
        assert!(close(camera.right(), Vec3::X));
    }

    #[test]
    fn matrices_follow_fields_only_after_update() {
        let mut camera = Camera::default();
        let before = camera.view_projection();
        camera.position = Vec3::new(5.0, 1.0, 0.0);
        assert_eq!(camera.view_projection(), before);
        camera.update_matrices();
        assert_ne!(camera.view_projection(), before);
        assert_eq!(camera.view_projection(), camera.projection() * camera.view());
    }

    #[test]
    fn point_ahead_projects_to_screen_center() {
        let camera = Camera::default();
        let ahead = camera.position + camera.forward() * 10.0;
        let clip = camera.view_projection() * Vec4::new(ahead.x, ahead.y, ahead.z, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > -1.0 && ndc.z < 1.0);
    }

    #[test]
    fn pitch_up_raises_forward() {
        let camera = Camera::new(Vec3::ZERO, -90.0, 45.0);
        assert!(camera.forward().y > 0.7);
    }
}
