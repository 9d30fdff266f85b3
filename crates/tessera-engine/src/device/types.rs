use std::fmt;
use std::num::NonZeroU32;

/// Driver-side object name.
///
/// Zero is never a valid name, so `Option<RawId>` is the same size as `RawId`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct RawId(pub NonZeroU32);

impl RawId {
    /// Returns `None` for the reserved name `0`.
    #[inline]
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Resolved uniform location inside one linked program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation(pub u32);

/// Programmable pipeline stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
    Compute,
    TessControl,
    TessEval,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Compute => "compute",
            ShaderStage::TessControl => "tessellation control",
            ShaderStage::TessEval => "tessellation evaluation",
        };
        f.write_str(name)
    }
}

/// Kind of GPU object owned by a [`GpuHandle`](super::GpuHandle).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ObjectKind {
    Buffer,
    VertexArray,
    Shader(ShaderStage),
    Program,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Buffer => f.write_str("buffer"),
            ObjectKind::VertexArray => f.write_str("vertex array"),
            ObjectKind::Shader(stage) => write!(f, "{stage} shader"),
            ObjectKind::Program => f.write_str("program"),
        }
    }
}

/// Buffer binding point.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferTarget {
    Vertex,
    Index,
    Uniform,
}

/// Expected update frequency of a buffer's contents.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferUsage {
    /// Uploaded once, drawn many times.
    Static,
    /// Partially rewritten every frame.
    Dynamic,
}

/// Scalar type of one vertex attribute component.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ComponentType {
    F32,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
}

impl ComponentType {
    /// Size of one component in bytes.
    pub fn size(self) -> usize {
        match self {
            ComponentType::U8 | ComponentType::I8 => 1,
            ComponentType::U16 | ComponentType::I16 => 2,
            ComponentType::F32 | ComponentType::U32 | ComponentType::I32 => 4,
        }
    }
}

/// Layout of one vertex attribute within a vertex buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    /// Shader input location.
    pub location: u32,
    /// Number of components (1..=4).
    pub components: u8,
    pub component_type: ComponentType,
    /// Integer components are mapped to [0, 1] / [-1, 1] when set.
    pub normalized: bool,
    /// Distance in bytes between consecutive vertices; `0` means tightly packed.
    pub stride: u32,
    /// Byte offset of the first component within a vertex.
    pub offset: u32,
}

impl VertexAttribute {
    /// Float attribute with the given component count, tightly packed at offset 0.
    pub fn float(location: u32, components: u8) -> Self {
        Self {
            location,
            components,
            component_type: ComponentType::F32,
            normalized: false,
            stride: 0,
            offset: 0,
        }
    }

    #[must_use]
    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Size in bytes of this attribute alone.
    pub fn packed_size(&self) -> usize {
        self.components as usize * self.component_type.size()
    }

    /// Effective distance between vertices, resolving the tightly packed case.
    pub fn effective_stride(&self) -> usize {
        if self.stride == 0 {
            self.packed_size()
        } else {
            self.stride as usize
        }
    }
}

/// Element type of an index buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IndexFormat {
    U16,
    U32,
}

/// Texture binding target.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TextureTarget {
    Texture2D,
    Texture2DArray,
    Texture3D,
    CubeMap,
}
