use glam::Mat4;

use crate::material::Material;
use crate::mesh::Mesh;

/// Uniform the per-object transform is uploaded to.
pub const MODEL_UNIFORM: &str = "u_Model";

/// One drawable unit: a mesh drawn with a material at a transform.
///
/// Holds borrows only; the mesh and material must outlive it.
#[derive(Debug, Clone, Copy)]
pub struct Renderable<'a> {
    mesh: &'a Mesh,
    material: &'a Material<'a>,
    transform: Mat4,
}

impl<'a> Renderable<'a> {
    pub fn new(mesh: &'a Mesh, material: &'a Material<'a>, transform: Mat4) -> Self {
        Self {
            mesh,
            material,
            transform,
        }
    }

    #[inline]
    pub fn mesh(&self) -> &'a Mesh {
        self.mesh
    }

    #[inline]
    pub fn material(&self) -> &'a Material<'a> {
        self.material
    }

    #[inline]
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Binds the material, uploads the transform to [`MODEL_UNIFORM`] and
    /// issues one draw for the mesh.
    pub fn draw(&self) {
        self.material.bind();
        self.material
            .program()
            .set_uniform(MODEL_UNIFORM, self.transform);
        self.mesh.draw();
    }
}
