use glam::Vec4;

use crate::uniform::UniformValue;

use super::types::{
    BufferTarget, BufferUsage, IndexFormat, ObjectKind, RawId, TextureTarget, UniformLocation,
    VertexAttribute,
};

/// Driver operations consumed by the rendering core.
///
/// The model is bind-to-edit: buffer uploads and attribute setup act on whatever
/// is currently bound to the relevant target, as in OpenGL. All calls are
/// synchronous and run to completion on the calling thread.
///
/// Implementations take `&self`; any driver state lives behind the backend's own
/// interior mutability (the GL context, or the headless bookkeeping).
pub trait Device {
    /// Allocates one driver object. `Err` carries the driver's message.
    fn create(&self, kind: ObjectKind) -> Result<RawId, String>;

    /// Releases one driver object. Must only be called once per name.
    fn destroy(&self, kind: ObjectKind, id: RawId);

    /// Attaches a human-readable label for graphics debuggers.
    fn label(&self, kind: ObjectKind, id: RawId, label: &str);

    // ── buffers ──────────────────────────────────────────────────────────

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<RawId>);

    /// Replaces the storage of the buffer bound to `target` with `data`.
    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage);

    /// Allocates zero-initialized storage of `size` bytes for the bound buffer.
    fn buffer_storage(&self, target: BufferTarget, size: usize, usage: BufferUsage);

    /// Overwrites `data.len()` bytes at `offset` in the bound buffer.
    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]);

    /// Binds `buffer` to the indexed binding point `slot` of `target`.
    fn bind_buffer_base(&self, target: BufferTarget, slot: u32, buffer: RawId);

    // ── vertex arrays ────────────────────────────────────────────────────

    fn bind_vertex_array(&self, vertex_array: Option<RawId>);

    /// Declares and enables `attribute`, sourced from the bound vertex buffer.
    fn vertex_attribute(&self, attribute: &VertexAttribute);

    // ── shaders & programs ───────────────────────────────────────────────

    /// Compiles `source` into `shader`. `Err` carries the compiler info log.
    fn compile_shader(&self, shader: RawId, source: &str) -> Result<(), String>;

    fn attach_shader(&self, program: RawId, shader: RawId);

    fn detach_shader(&self, program: RawId, shader: RawId);

    /// Links `program`. `Err` carries the linker info log.
    fn link_program(&self, program: RawId) -> Result<(), String>;

    fn use_program(&self, program: Option<RawId>);

    fn uniform_location(&self, program: RawId, name: &str) -> Option<UniformLocation>;

    /// Uploads `value` to `location` of the program currently in use.
    fn set_uniform(&self, location: UniformLocation, value: &UniformValue);

    // ── textures & drawing ───────────────────────────────────────────────

    fn bind_texture(&self, unit: u32, target: TextureTarget, texture: RawId);

    /// Draws `count` indices from the element buffer of the bound vertex array.
    fn draw_indexed(&self, count: u32, format: IndexFormat);

    fn draw_arrays(&self, first: u32, count: u32);

    /// Clears color and depth of the default framebuffer.
    fn clear(&self, color: Vec4);
}
