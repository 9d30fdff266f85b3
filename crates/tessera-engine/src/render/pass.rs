use std::cell::RefCell;

use crate::camera::Camera;
use crate::uniform::{CameraBlock, FrameUniformBuffer};

use super::renderable::Renderable;

/// A camera-driven frame: one uniform update, then one draw per renderable.
///
/// The pass owns its frame uniform buffer and borrows everything else.
/// Renderables draw in registration order; nothing is sorted.
#[derive(Debug)]
pub struct RenderPass<'a> {
    camera: &'a RefCell<Camera>,
    frame_uniform: FrameUniformBuffer,
    renderables: Vec<&'a Renderable<'a>>,
}

impl<'a> RenderPass<'a> {
    pub fn builder() -> RenderPassBuilder<'a> {
        RenderPassBuilder::default()
    }

    #[inline]
    pub fn camera(&self) -> &'a RefCell<Camera> {
        self.camera
    }

    #[inline]
    pub fn frame_uniform(&self) -> &FrameUniformBuffer {
        &self.frame_uniform
    }

    pub fn renderables(&self) -> &[&'a Renderable<'a>] {
        &self.renderables
    }

    /// Appends a renderable after the ones already registered.
    pub fn push(&mut self, renderable: &'a Renderable<'a>) {
        self.renderables.push(renderable);
    }

    /// Executes the pass.
    ///
    /// Recomputes the camera matrices from the camera's current fields,
    /// writes the combined matrix at offset 0 of the frame uniform buffer and
    /// then draws every renderable in order.
    ///
    /// # Panics
    /// Panics if the camera is already mutably borrowed.
    pub fn render(&self) {
        let block = {
            let mut camera = self.camera.borrow_mut();
            camera.update_matrices();
            CameraBlock::from_camera(&camera)
        };

        self.frame_uniform.write(&block, 0);
        self.frame_uniform.bind();

        for renderable in &self.renderables {
            renderable.draw();
        }
    }
}

/// Assembles a [`RenderPass`].
///
/// Consumes itself on every step since the pass takes ownership of the
/// frame uniform buffer.
#[derive(Debug, Default)]
pub struct RenderPassBuilder<'a> {
    camera: Option<&'a RefCell<Camera>>,
    frame_uniform: Option<FrameUniformBuffer>,
    renderables: Vec<&'a Renderable<'a>>,
}

impl<'a> RenderPassBuilder<'a> {
    #[must_use]
    pub fn camera(mut self, camera: &'a RefCell<Camera>) -> Self {
        self.camera = Some(camera);
        self
    }

    #[must_use]
    pub fn frame_uniform(mut self, buffer: FrameUniformBuffer) -> Self {
        self.frame_uniform = Some(buffer);
        self
    }

    #[must_use]
    pub fn renderable(mut self, renderable: &'a Renderable<'a>) -> Self {
        self.renderables.push(renderable);
        self
    }

    #[must_use]
    pub fn renderables(mut self, renderables: &'a [Renderable<'a>]) -> Self {
        self.renderables.extend(renderables);
        self
    }

    /// # Panics
    /// Panics if no camera or no frame uniform buffer was supplied.
    pub fn build(self) -> RenderPass<'a> {
        let Some(camera) = self.camera else {
            panic!("render pass built without a camera");
        };
        let Some(frame_uniform) = self.frame_uniform else {
            panic!("render pass built without a frame uniform buffer");
        };
        assert!(
            frame_uniform.size() >= CameraBlock::SIZE,
            "frame uniform buffer too small for the camera block ({} < {} bytes)",
            frame_uniform.size(),
            CameraBlock::SIZE
        );

        log::debug!(
            "render pass with {} renderable(s), frame uniforms at slot {}",
            self.renderables.len(),
            frame_uniform.binding()
        );

        RenderPass {
            camera,
            frame_uniform,
            renderables: self.renderables,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use glam::{Mat4, Vec3, Vec4};

    use super::*;
    use crate::device::headless::Command;
    use crate::device::{Device, HeadlessDevice, IndexFormat, VertexAttribute};
    use crate::material::{Material, Resolution};
    use crate::mesh::{Mesh, MeshBuilder};
    use crate::render::MODEL_UNIFORM;
    use crate::shader::{Program, ProgramBuilder};
    use crate::uniform::{FrameUniformBuilder, UniformValue};

    const VS: &str = "#version 430 core
layout(std140, binding = 0) uniform Camera {
    mat4 u_ViewProj;
};
layout (location = 0) in vec3 a_Position;
uniform mat4 u_Model;
void main() {
    gl_Position = u_ViewProj * u_Model * vec4(a_Position, 1.0);
}
";

    const FS: &str = "#version 430 core
out vec4 FragColor;
uniform vec4 u_Color;
void main() { FragColor = u_Color; }
";

    const QUAD_VERTICES: [f32; 12] = [
        0.5, 0.5, 0.0, //
        0.5, -0.5, 0.0, //
        -0.5, -0.5, 0.0, //
        -0.5, 0.5, 0.0,
    ];
    const QUAD_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

    fn setup() -> (Rc<HeadlessDevice>, Rc<dyn Device>) {
        let headless = Rc::new(HeadlessDevice::new());
        let device: Rc<dyn Device> = headless.clone();
        (headless, device)
    }

    fn program(device: &Rc<dyn Device>) -> Program {
        ProgramBuilder::new().vertex(VS).fragment(FS).label("flat").build(device).unwrap()
    }

    fn quad(device: &Rc<dyn Device>) -> Mesh {
        MeshBuilder::new()
            .vertex_buffer(&QUAD_VERTICES)
            .attribute(VertexAttribute::float(0, 3))
            .index_buffer(&QUAD_INDICES)
            .build(device)
            .unwrap()
    }

    #[test]
    fn quad_scene_renders_one_frame() {
        let (headless, device) = setup();

        let program = program(&device);
        let mesh = quad(&device);
        assert_eq!(mesh.index_count(), 6);

        let mut material = Material::new(&program);
        material.set("u_Color", Vec4::new(0.2, 0.6, 1.0, 1.0));
        material.resolve_uniforms();
        material.bind();
        assert!(matches!(material.resolution("u_Color"), Some(Resolution::Found(_))));
        assert_eq!(material.unresolved().count(), 0);
        assert!(program.missing_uniforms().is_empty());

        let renderable = Renderable::new(&mesh, &material, Mat4::IDENTITY);
        let camera = RefCell::new(Camera::default());
        let ubo = FrameUniformBuilder::camera(0).build(&device).unwrap();
        let ubo_id = ubo.id();
        let pass = RenderPass::builder()
            .camera(&camera)
            .frame_uniform(ubo)
            .renderable(&renderable)
            .build();

        headless.take_commands();
        pass.render();

        let expected = camera.borrow().view_projection();
        let contents = headless.buffer_contents(ubo_id).unwrap();
        assert_eq!(&contents[..64], bytemuck::bytes_of(&expected));

        // the per-object transform resolved too
        assert!(program.missing_uniforms().is_empty());

        let draws = headless.draw_calls();
        assert_eq!(draws.len(), 1);
        assert!(matches!(
            draws[0],
            Command::DrawIndexed {
                count: 6,
                format: IndexFormat::U32,
                ..
            }
        ));
    }

    #[test]
    fn frame_update_precedes_draws() {
        let (headless, device) = setup();
        let program = program(&device);
        let mesh = quad(&device);
        let material = Material::new(&program);
        let renderable = Renderable::new(&mesh, &material, Mat4::IDENTITY);
        let camera = RefCell::new(Camera::default());
        let pass = RenderPass::builder()
            .camera(&camera)
            .frame_uniform(FrameUniformBuilder::camera(0).build(&device).unwrap())
            .renderable(&renderable)
            .build();

        headless.take_commands();
        pass.render();
        let commands = headless.take_commands();
        let update = commands
            .iter()
            .position(|c| matches!(c, Command::BufferSubData { offset: 0, len: 64, .. }))
            .unwrap();
        let draw = commands.iter().position(Command::is_draw).unwrap();
        assert!(update < draw);
    }

    #[test]
    fn renderables_draw_in_registration_order() {
        let (headless, device) = setup();
        let program = program(&device);
        let meshes = [quad(&device), quad(&device), quad(&device)];
        let material = Material::new(&program);
        let renderables: Vec<Renderable<'_>> = meshes
            .iter()
            .map(|m| Renderable::new(m, &material, Mat4::IDENTITY))
            .collect();
        let camera = RefCell::new(Camera::default());
        let pass = RenderPass::builder()
            .camera(&camera)
            .frame_uniform(FrameUniformBuilder::camera(0).build(&device).unwrap())
            .renderables(&renderables)
            .build();

        let expected: Vec<_> = meshes.iter().map(|m| Some(m.vertex_array().id())).collect();
        for _ in 0..2 {
            headless.take_commands();
            pass.render();
            let order: Vec<_> = headless
                .draw_calls()
                .into_iter()
                .map(|c| match c {
                    Command::DrawIndexed { vertex_array, .. } => vertex_array,
                    other => panic!("unexpected draw {other:?}"),
                })
                .collect();
            assert_eq!(order, expected);
        }
    }

    #[test]
    fn camera_changes_reach_the_next_frame() {
        let (headless, device) = setup();
        let camera = RefCell::new(Camera::default());
        let ubo = FrameUniformBuilder::camera(0).build(&device).unwrap();
        let ubo_id = ubo.id();
        let pass = RenderPass::builder().camera(&camera).frame_uniform(ubo).build();

        pass.render();
        let first = headless.buffer_contents(ubo_id).unwrap();

        // Field changes without an explicit update; the pass recomputes.
        camera.borrow_mut().position = Vec3::new(4.0, 2.0, 8.0);
        pass.render();
        let second = headless.buffer_contents(ubo_id).unwrap();

        assert_ne!(first, second);
        assert_eq!(&second[..64], bytemuck::bytes_of(&camera.borrow().view_projection()));
    }

    #[test]
    fn renderable_uploads_its_transform() {
        let (headless, device) = setup();
        let program = program(&device);
        let mesh = quad(&device);
        let material = Material::new(&program);
        let transform = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        Renderable::new(&mesh, &material, transform).draw();

        let model = program.uniform_location(MODEL_UNIFORM).unwrap();
        assert_eq!(
            headless.uniform_value(program.id(), model),
            Some(UniformValue::Mat4(transform))
        );
    }

    #[test]
    fn material_uniform_absent_from_program_is_reported() {
        let (_headless, device) = setup();
        let program = program(&device);
        let mut material = Material::new(&program);
        material.set("u_Color", Vec4::ONE);
        material.set("u_Shininess", 32.0f32);
        material.resolve_uniforms();
        material.resolve_uniforms();

        assert_eq!(material.resolution("u_Shininess"), Some(Resolution::Missing));
        assert_eq!(material.unresolved().collect::<Vec<_>>(), vec!["u_Shininess"]);
        assert_eq!(program.missing_uniforms(), vec!["u_Shininess".to_string()]);
        assert_eq!(program.cached_uniforms(), 2);
    }

    #[test]
    #[should_panic(expected = "without a camera")]
    fn pass_without_camera_is_fatal() {
        let (_headless, device) = setup();
        let _ = RenderPass::builder()
            .frame_uniform(FrameUniformBuilder::camera(0).build(&device).unwrap())
            .build();
    }

    #[test]
    #[should_panic(expected = "without a frame uniform buffer")]
    fn pass_without_frame_uniform_is_fatal() {
        let camera = RefCell::new(Camera::default());
        let _ = RenderPass::builder().camera(&camera).build();
    }
}
