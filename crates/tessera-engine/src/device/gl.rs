use anyhow::Result;
use glam::Vec4;
use glow::HasContext;

use crate::logging::{DriverMessage, DriverSeverity, DriverSource};
use crate::uniform::UniformValue;

use super::backend::Device;
use super::types::{
    BufferTarget, BufferUsage, ComponentType, IndexFormat, ObjectKind, RawId, ShaderStage,
    TextureTarget, UniformLocation, VertexAttribute,
};

/// Initialization parameters for the OpenGL backend.
#[derive(Debug, Clone)]
pub struct GlInit {
    /// Minimum context version as `(major, minor)`.
    pub min_version: (u32, u32),

    /// Route driver debug output into the `log` facade when supported.
    pub debug_output: bool,

    /// Forward notification-severity driver messages (often spammy).
    pub log_notifications: bool,

    /// Enable depth testing for all draws.
    pub depth_test: bool,
}

impl Default for GlInit {
    fn default() -> Self {
        Self {
            min_version: (3, 3),
            debug_output: cfg!(debug_assertions),
            log_notifications: false,
            depth_test: true,
        }
    }
}

/// OpenGL implementation of [`Device`] on top of a current `glow` context.
///
/// The caller (windowing collaborator) creates the context and makes it current
/// before constructing this type; it must stay current for the device lifetime.
pub struct GlDevice {
    gl: glow::Context,
}

impl GlDevice {
    /// Wraps a ready context and applies `init`.
    pub fn new(mut gl: glow::Context, init: GlInit) -> Result<Self> {
        let (major, minor) = {
            let v = gl.version();
            (v.major, v.minor)
        };
        let (want_major, want_minor) = init.min_version;
        anyhow::ensure!(
            (major, minor) >= (want_major, want_minor),
            "OpenGL {want_major}.{want_minor} required, context provides {major}.{minor}"
        );
        log::info!("OpenGL context {major}.{minor}");

        // Safety: the context is current on this thread per the constructor contract.
        unsafe {
            if init.debug_output && gl.supports_debug() {
                let log_notifications = init.log_notifications;
                gl.enable(glow::DEBUG_OUTPUT);
                gl.enable(glow::DEBUG_OUTPUT_SYNCHRONOUS);
                gl.debug_message_callback(move |source, _kind, id, severity, message| {
                    let severity = map_severity(severity);
                    if severity == DriverSeverity::Notification && !log_notifications {
                        return;
                    }
                    DriverMessage {
                        source: map_source(source),
                        severity,
                        id,
                        text: message,
                    }
                    .report();
                });
                log::debug!("driver debug output enabled");
            }
            if init.depth_test {
                gl.enable(glow::DEPTH_TEST);
            }
        }

        Ok(Self { gl })
    }

    /// Underlying context, for collaborator code that needs raw access.
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }
}

fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Vertex => glow::ARRAY_BUFFER,
        BufferTarget::Index => glow::ELEMENT_ARRAY_BUFFER,
        BufferTarget::Uniform => glow::UNIFORM_BUFFER,
    }
}

fn buffer_usage(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::Static => glow::STATIC_DRAW,
        BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
    }
}

fn shader_type(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        ShaderStage::Geometry => glow::GEOMETRY_SHADER,
        ShaderStage::Compute => glow::COMPUTE_SHADER,
        ShaderStage::TessControl => glow::TESS_CONTROL_SHADER,
        ShaderStage::TessEval => glow::TESS_EVALUATION_SHADER,
    }
}

fn component_type(ty: ComponentType) -> u32 {
    match ty {
        ComponentType::F32 => glow::FLOAT,
        ComponentType::U8 => glow::UNSIGNED_BYTE,
        ComponentType::I8 => glow::BYTE,
        ComponentType::U16 => glow::UNSIGNED_SHORT,
        ComponentType::I16 => glow::SHORT,
        ComponentType::U32 => glow::UNSIGNED_INT,
        ComponentType::I32 => glow::INT,
    }
}

fn texture_target(target: TextureTarget) -> u32 {
    match target {
        TextureTarget::Texture2D => glow::TEXTURE_2D,
        TextureTarget::Texture2DArray => glow::TEXTURE_2D_ARRAY,
        TextureTarget::Texture3D => glow::TEXTURE_3D,
        TextureTarget::CubeMap => glow::TEXTURE_CUBE_MAP,
    }
}

fn map_severity(severity: u32) -> DriverSeverity {
    match severity {
        glow::DEBUG_SEVERITY_HIGH => DriverSeverity::High,
        glow::DEBUG_SEVERITY_MEDIUM => DriverSeverity::Medium,
        glow::DEBUG_SEVERITY_LOW => DriverSeverity::Low,
        _ => DriverSeverity::Notification,
    }
}

fn map_source(source: u32) -> DriverSource {
    match source {
        glow::DEBUG_SOURCE_API => DriverSource::Api,
        glow::DEBUG_SOURCE_SHADER_COMPILER => DriverSource::ShaderCompiler,
        glow::DEBUG_SOURCE_WINDOW_SYSTEM => DriverSource::WindowSystem,
        glow::DEBUG_SOURCE_THIRD_PARTY => DriverSource::ThirdParty,
        glow::DEBUG_SOURCE_APPLICATION => DriverSource::Application,
        _ => DriverSource::Other,
    }
}

fn object_identifier(kind: ObjectKind) -> u32 {
    match kind {
        ObjectKind::Buffer => glow::BUFFER,
        ObjectKind::VertexArray => glow::VERTEX_ARRAY,
        ObjectKind::Shader(_) => glow::SHADER,
        ObjectKind::Program => glow::PROGRAM,
    }
}

fn to_raw(name: std::num::NonZeroU32) -> RawId {
    RawId(name)
}

// Safety (all impl methods): `GlDevice` is only constructed over a context that
// is current on the calling thread, and every name passed in was produced by
// `create` on this same context.
impl Device for GlDevice {
    fn create(&self, kind: ObjectKind) -> Result<RawId, String> {
        unsafe {
            match kind {
                ObjectKind::Buffer => self.gl.create_buffer().map(|b| to_raw(b.0)),
                ObjectKind::VertexArray => self.gl.create_vertex_array().map(|v| to_raw(v.0)),
                ObjectKind::Shader(stage) => {
                    self.gl.create_shader(shader_type(stage)).map(|s| to_raw(s.0))
                }
                ObjectKind::Program => self.gl.create_program().map(|p| to_raw(p.0)),
            }
        }
    }

    fn destroy(&self, kind: ObjectKind, id: RawId) {
        unsafe {
            match kind {
                ObjectKind::Buffer => self.gl.delete_buffer(glow::NativeBuffer(id.0)),
                ObjectKind::VertexArray => {
                    self.gl.delete_vertex_array(glow::NativeVertexArray(id.0))
                }
                ObjectKind::Shader(_) => self.gl.delete_shader(glow::NativeShader(id.0)),
                ObjectKind::Program => self.gl.delete_program(glow::NativeProgram(id.0)),
            }
        }
    }

    fn label(&self, kind: ObjectKind, id: RawId, label: &str) {
        if !self.gl.supports_debug() {
            return;
        }
        unsafe {
            self.gl
                .object_label(object_identifier(kind), id.get(), Some(label));
        }
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<RawId>) {
        unsafe {
            self.gl
                .bind_buffer(buffer_target(target), buffer.map(|b| glow::NativeBuffer(b.0)));
        }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(buffer_target(target), data, buffer_usage(usage));
        }
    }

    fn buffer_storage(&self, target: BufferTarget, size: usize, usage: BufferUsage) {
        unsafe {
            self.gl
                .buffer_data_size(buffer_target(target), size as i32, buffer_usage(usage));
        }
    }

    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_sub_data_u8_slice(buffer_target(target), offset as i32, data);
        }
    }

    fn bind_buffer_base(&self, target: BufferTarget, slot: u32, buffer: RawId) {
        unsafe {
            self.gl.bind_buffer_base(
                buffer_target(target),
                slot,
                Some(glow::NativeBuffer(buffer.0)),
            );
        }
    }

    fn bind_vertex_array(&self, vertex_array: Option<RawId>) {
        unsafe {
            self.gl
                .bind_vertex_array(vertex_array.map(|v| glow::NativeVertexArray(v.0)));
        }
    }

    fn vertex_attribute(&self, attribute: &VertexAttribute) {
        let size = attribute.components as i32;
        let ty = component_type(attribute.component_type);
        let stride = attribute.stride as i32;
        let offset = attribute.offset as i32;
        unsafe {
            let integer = attribute.component_type != ComponentType::F32;
            if integer && !attribute.normalized {
                self.gl
                    .vertex_attrib_pointer_i32(attribute.location, size, ty, stride, offset);
            } else {
                self.gl.vertex_attrib_pointer_f32(
                    attribute.location,
                    size,
                    ty,
                    attribute.normalized,
                    stride,
                    offset,
                );
            }
            self.gl.enable_vertex_attrib_array(attribute.location);
        }
    }

    fn compile_shader(&self, shader: RawId, source: &str) -> Result<(), String> {
        let shader = glow::NativeShader(shader.0);
        unsafe {
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if self.gl.get_shader_compile_status(shader) {
                Ok(())
            } else {
                Err(self.gl.get_shader_info_log(shader))
            }
        }
    }

    fn attach_shader(&self, program: RawId, shader: RawId) {
        unsafe {
            self.gl
                .attach_shader(glow::NativeProgram(program.0), glow::NativeShader(shader.0));
        }
    }

    fn detach_shader(&self, program: RawId, shader: RawId) {
        unsafe {
            self.gl
                .detach_shader(glow::NativeProgram(program.0), glow::NativeShader(shader.0));
        }
    }

    fn link_program(&self, program: RawId) -> Result<(), String> {
        let program = glow::NativeProgram(program.0);
        unsafe {
            self.gl.link_program(program);
            if self.gl.get_program_link_status(program) {
                Ok(())
            } else {
                Err(self.gl.get_program_info_log(program))
            }
        }
    }

    fn use_program(&self, program: Option<RawId>) {
        unsafe {
            self.gl
                .use_program(program.map(|p| glow::NativeProgram(p.0)));
        }
    }

    fn uniform_location(&self, program: RawId, name: &str) -> Option<UniformLocation> {
        unsafe {
            self.gl
                .get_uniform_location(glow::NativeProgram(program.0), name)
                .map(|loc| UniformLocation(loc.0))
        }
    }

    fn set_uniform(&self, location: UniformLocation, value: &UniformValue) {
        let loc = glow::NativeUniformLocation(location.0);
        let loc = Some(&loc);
        unsafe {
            match value {
                UniformValue::Int(v) => self.gl.uniform_1_i32(loc, *v),
                UniformValue::UInt(v) => self.gl.uniform_1_u32(loc, *v),
                UniformValue::Float(v) => self.gl.uniform_1_f32(loc, *v),
                UniformValue::Vec2(v) => self.gl.uniform_2_f32(loc, v.x, v.y),
                UniformValue::Vec3(v) => self.gl.uniform_3_f32(loc, v.x, v.y, v.z),
                UniformValue::Vec4(v) => self.gl.uniform_4_f32(loc, v.x, v.y, v.z, v.w),
                UniformValue::Mat4(m) => {
                    self.gl
                        .uniform_matrix_4_f32_slice(loc, false, &m.to_cols_array())
                }
            }
        }
    }

    fn bind_texture(&self, unit: u32, target: TextureTarget, texture: RawId) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(
                texture_target(target),
                Some(glow::NativeTexture(texture.0)),
            );
        }
    }

    fn draw_indexed(&self, count: u32, format: IndexFormat) {
        let element_type = match format {
            IndexFormat::U16 => glow::UNSIGNED_SHORT,
            IndexFormat::U32 => glow::UNSIGNED_INT,
        };
        unsafe {
            self.gl
                .draw_elements(glow::TRIANGLES, count as i32, element_type, 0);
        }
    }

    fn draw_arrays(&self, first: u32, count: u32) {
        unsafe {
            self.gl
                .draw_arrays(glow::TRIANGLES, first as i32, count as i32);
        }
    }

    fn clear(&self, color: Vec4) {
        unsafe {
            self.gl.clear_color(color.x, color.y, color.z, color.w);
            self.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }
}
