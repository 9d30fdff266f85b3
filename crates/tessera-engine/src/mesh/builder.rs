use std::rc::Rc;

use bytemuck::Pod;

use crate::device::{
    BufferTarget, BufferUsage, BuildError, Device, GpuHandle, IndexFormat, ObjectKind,
    VertexAttribute,
};

use super::Mesh;

/// Integer types usable as mesh indices.
pub trait MeshIndex: Pod {
    const FORMAT: IndexFormat;
}

impl MeshIndex for u16 {
    const FORMAT: IndexFormat = IndexFormat::U16;
}

impl MeshIndex for u32 {
    const FORMAT: IndexFormat = IndexFormat::U32;
}

/// One vertex buffer payload and the attributes sourced from it.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBufferData {
    pub bytes: Vec<u8>,
    pub attributes: Vec<VertexAttribute>,
}

/// Index buffer payload.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexData {
    pub format: IndexFormat,
    pub bytes: Vec<u8>,
    pub count: u32,
}

/// Accumulated description of a mesh. Plain data, no GPU state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshSpec {
    pub vertex_buffers: Vec<VertexBufferData>,
    pub indices: Option<IndexData>,
    pub label: Option<String>,
    /// Attributes declared before any vertex buffer; rejected at build time.
    pub orphan_attributes: Vec<VertexAttribute>,
}

impl MeshSpec {
    /// Declared index count (`0` without an index buffer).
    pub fn index_count(&self) -> u32 {
        self.indices.as_ref().map_or(0, |i| i.count)
    }

    fn validate(&self) -> Result<(), BuildError> {
        if let Some(attr) = self.orphan_attributes.first() {
            return Err(BuildError::InvalidMesh(format!(
                "attribute at location {} declared before any vertex buffer",
                attr.location
            )));
        }
        if self.vertex_buffers.is_empty() {
            return Err(BuildError::InvalidMesh("no vertex buffer".into()));
        }
        for (i, vb) in self.vertex_buffers.iter().enumerate() {
            if vb.bytes.is_empty() {
                return Err(BuildError::InvalidMesh(format!("vertex buffer {i} is empty")));
            }
            for attr in &vb.attributes {
                if !(1..=4).contains(&attr.components) {
                    return Err(BuildError::InvalidMesh(format!(
                        "attribute at location {} has {} components (expected 1..=4)",
                        attr.location, attr.components
                    )));
                }
                let end = attr.offset as usize + attr.packed_size();
                if attr.stride != 0 && end > attr.stride as usize {
                    return Err(BuildError::InvalidMesh(format!(
                        "attribute at location {} spans bytes {}..{end}, past its {}-byte stride",
                        attr.location, attr.offset, attr.stride
                    )));
                }
                if end > vb.bytes.len() {
                    return Err(BuildError::InvalidMesh(format!(
                        "attribute at location {} spans bytes {}..{end} of a {}-byte buffer",
                        attr.location,
                        attr.offset,
                        vb.bytes.len()
                    )));
                }
            }
        }
        if let Some(indices) = &self.indices {
            if indices.count == 0 {
                return Err(BuildError::InvalidMesh("index buffer is empty".into()));
            }
        }
        Ok(())
    }

    /// Vertices every declared attribute can be read for. Planar layouts
    /// place each attribute at its own offset, so the shortest one wins.
    fn vertex_count(&self) -> u32 {
        self.vertex_buffers
            .iter()
            .flat_map(|vb| vb.attributes.iter().map(move |attr| (vb.bytes.len(), attr)))
            .map(|(len, attr)| {
                let end = attr.offset as usize + attr.packed_size();
                match len.checked_sub(end) {
                    Some(rest) => rest / attr.effective_stride() + 1,
                    None => 0,
                }
            })
            .min()
            .unwrap_or(0) as u32
    }
}

/// Immutable, chainable mesh description.
///
/// Every step returns a new builder; the receiver is left untouched, so a
/// partially configured builder can serve as a template for several meshes.
///
/// Attributes bind to the most recently added vertex buffer.
#[derive(Debug, Clone, Default)]
pub struct MeshBuilder {
    spec: MeshSpec,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spec(&self) -> &MeshSpec {
        &self.spec
    }

    /// Appends a vertex buffer holding `data`.
    #[must_use]
    pub fn vertex_buffer<T: Pod>(&self, data: &[T]) -> Self {
        let mut next = self.clone();
        next.spec.vertex_buffers.push(VertexBufferData {
            bytes: bytemuck::cast_slice(data).to_vec(),
            attributes: Vec::new(),
        });
        next
    }

    /// Sets the index buffer. The index count is the slice length.
    #[must_use]
    pub fn index_buffer<I: MeshIndex>(&self, indices: &[I]) -> Self {
        let mut next = self.clone();
        next.spec.indices = Some(IndexData {
            format: I::FORMAT,
            bytes: bytemuck::cast_slice(indices).to_vec(),
            count: indices.len() as u32,
        });
        next
    }

    /// Declares an attribute sourced from the last added vertex buffer.
    #[must_use]
    pub fn attribute(&self, attribute: VertexAttribute) -> Self {
        let mut next = self.clone();
        match next.spec.vertex_buffers.last_mut() {
            Some(vb) => vb.attributes.push(attribute),
            None => next.spec.orphan_attributes.push(attribute),
        }
        next
    }

    #[must_use]
    pub fn label(&self, label: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.spec.label = Some(label.into());
        next
    }

    /// Validates the description and uploads it.
    ///
    /// Either every object is created and returned inside the [`Mesh`], or none
    /// remains allocated.
    pub fn build(&self, device: &Rc<dyn Device>) -> Result<Mesh, BuildError> {
        self.spec.validate()?;

        let vertex_array = GpuHandle::create(device, ObjectKind::VertexArray)
            .map_err(BuildError::allocation(ObjectKind::VertexArray))?;

        device.bind_vertex_array(Some(vertex_array.id()));
        let uploaded = self.upload(device);
        device.bind_vertex_array(None);
        device.bind_buffer(BufferTarget::Vertex, None);
        let (vertex_buffers, index_buffer) = uploaded?;

        let mesh = Mesh {
            vertex_array,
            vertex_buffers,
            index_buffer,
            index_format: self.spec.indices.as_ref().map_or(IndexFormat::U32, |i| i.format),
            index_count: self.spec.index_count(),
            vertex_count: self.spec.vertex_count(),
        };

        if let Some(label) = &self.spec.label {
            mesh.set_debug_label(label);
        }

        log::debug!(
            "built mesh {} ({} vertex buffers, {} indices)",
            mesh.vertex_array.id(),
            mesh.vertex_buffers.len(),
            mesh.index_count
        );
        Ok(mesh)
    }

    /// Creates and fills buffers while the vertex array is bound.
    fn upload(
        &self,
        device: &Rc<dyn Device>,
    ) -> Result<(Vec<GpuHandle>, Option<GpuHandle>), BuildError> {
        let mut vertex_buffers = Vec::with_capacity(self.spec.vertex_buffers.len());
        for vb in &self.spec.vertex_buffers {
            let buffer = GpuHandle::create(device, ObjectKind::Buffer)
                .map_err(BuildError::allocation(ObjectKind::Buffer))?;
            device.bind_buffer(BufferTarget::Vertex, Some(buffer.id()));
            device.buffer_data(BufferTarget::Vertex, &vb.bytes, BufferUsage::Static);
            for attr in &vb.attributes {
                device.vertex_attribute(attr);
            }
            vertex_buffers.push(buffer);
        }

        let index_buffer = match &self.spec.indices {
            Some(indices) => {
                let buffer = GpuHandle::create(device, ObjectKind::Buffer)
                    .map_err(BuildError::allocation(ObjectKind::Buffer))?;
                // Element buffer binding is recorded in the bound vertex array.
                device.bind_buffer(BufferTarget::Index, Some(buffer.id()));
                device.buffer_data(BufferTarget::Index, &indices.bytes, BufferUsage::Static);
                Some(buffer)
            }
            None => None,
        };

        Ok((vertex_buffers, index_buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::headless::Command;
    use crate::device::HeadlessDevice;

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

    fn quad() -> MeshBuilder {
        MeshBuilder::new()
            .vertex_buffer(&QUAD_VERTICES)
            .attribute(VertexAttribute::float(0, 3).with_stride(12))
            .index_buffer(&QUAD_INDICES)
    }

    #[test]
    fn quad_has_declared_index_count() {
        let (headless, device) = setup();
        let mesh = quad().build(&device).unwrap();
        assert_eq!(mesh.index_count(), 6);
        assert_eq!(mesh.vertex_count(), 4);
        assert!(mesh.is_indexed());
        // vertex array + vertex buffer + index buffer
        assert_eq!(headless.live_objects(), 3);
    }

    #[test]
    fn index_count_follows_spec_for_u16_indices() {
        let (_headless, device) = setup();
        let builder = MeshBuilder::new()
            .vertex_buffer(&QUAD_VERTICES)
            .attribute(VertexAttribute::float(0, 3))
            .index_buffer(&[0u16, 1, 2]);
        assert_eq!(builder.spec().index_count(), 3);
        let mesh = builder.build(&device).unwrap();
        assert_eq!(mesh.index_count(), builder.spec().index_count());
    }

    #[test]
    fn attributes_bind_to_latest_vertex_buffer() {
        let (headless, device) = setup();
        let mesh = MeshBuilder::new()
            .vertex_buffer(&QUAD_VERTICES)
            .attribute(VertexAttribute::float(0, 3))
            .vertex_buffer(&[0.0f32; 8])
            .attribute(VertexAttribute::float(1, 2))
            .index_buffer(&QUAD_INDICES)
            .build(&device)
            .unwrap();

        let attrs: Vec<_> = headless
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                Command::VertexAttribute {
                    vertex_array,
                    buffer,
                    attribute,
                } => Some((vertex_array, buffer, attribute.location)),
                _ => None,
            })
            .collect();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].0, Some(mesh.vertex_array().id()));
        assert_ne!(attrs[0].1, attrs[1].1);
        assert_eq!(attrs[1].2, 1);
    }

    #[test]
    fn builder_steps_leave_template_untouched() {
        let base = MeshBuilder::new().vertex_buffer(&QUAD_VERTICES);
        let a = base.attribute(VertexAttribute::float(0, 3)).index_buffer(&QUAD_INDICES);
        let b = base.attribute(VertexAttribute::float(0, 2));

        assert!(base.spec().vertex_buffers[0].attributes.is_empty());
        assert!(base.spec().indices.is_none());
        assert_eq!(a.spec().index_count(), 6);
        assert_eq!(b.spec().vertex_buffers[0].attributes[0].components, 2);
    }

    #[test]
    fn missing_vertex_buffer_is_rejected_before_gpu_calls() {
        let (headless, device) = setup();
        let err = MeshBuilder::new().index_buffer(&QUAD_INDICES).build(&device).unwrap_err();
        assert!(matches!(err, BuildError::InvalidMesh(_)));
        assert!(headless.commands().is_empty());
        assert_eq!(headless.live_objects(), 0);
    }

    #[test]
    fn orphan_attribute_is_rejected() {
        let (_headless, device) = setup();
        let err = MeshBuilder::new()
            .attribute(VertexAttribute::float(0, 3))
            .vertex_buffer(&QUAD_VERTICES)
            .build(&device)
            .unwrap_err();
        assert!(err.to_string().contains("before any vertex buffer"));
    }

    #[test]
    fn bad_component_count_is_rejected() {
        let (_headless, device) = setup();
        let err = MeshBuilder::new()
            .vertex_buffer(&QUAD_VERTICES)
            .attribute(VertexAttribute::float(0, 5))
            .build(&device)
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidMesh(_)));
    }

    #[test]
    fn failed_index_allocation_releases_everything() {
        let (headless, device) = setup();
        // the vertex buffer succeeds, the index buffer fails
        headless.fail_create_after(ObjectKind::Buffer, 1);
        let err = quad().build(&device).unwrap_err();
        assert!(matches!(err, BuildError::Allocation { kind: ObjectKind::Buffer, .. }));
        assert_eq!(headless.live_objects(), 0);
    }

    #[test]
    fn destroy_is_idempotent_and_drop_after_is_silent() {
        let (headless, device) = setup();
        let mut mesh = quad().build(&device).unwrap();
        mesh.destroy();
        mesh.destroy();
        assert!(!mesh.is_live());
        assert_eq!(headless.live_objects(), 0);
        drop(mesh);
        assert_eq!(headless.destroy_calls(), 3);
    }

    #[test]
    fn draw_uses_stored_index_count() {
        let (headless, device) = setup();
        let mesh = quad().build(&device).unwrap();
        headless.take_commands();
        mesh.draw();
        let draws = headless.draw_calls();
        assert_eq!(draws.len(), 1);
        assert!(matches!(
            draws[0],
            Command::DrawIndexed { count: 6, format: IndexFormat::U32, .. }
        ));
    }

    #[test]
    fn non_indexed_mesh_draws_arrays() {
        let (headless, device) = setup();
        let mesh = MeshBuilder::new()
            .vertex_buffer(&QUAD_VERTICES[..9])
            .attribute(VertexAttribute::float(0, 3))
            .build(&device)
            .unwrap();
        mesh.draw();
        assert!(matches!(
            headless.draw_calls()[0],
            Command::DrawArrays { first: 0, count: 3, .. }
        ));
    }

    #[test]
    fn planar_layout_counts_vertices_per_attribute() {
        let (headless, device) = setup();
        // three positions followed by three normals
        let planar = [0.0f32; 18];
        let mesh = MeshBuilder::new()
            .vertex_buffer(&planar)
            .attribute(VertexAttribute::float(0, 3))
            .attribute(VertexAttribute::float(1, 3).with_offset(36))
            .build(&device)
            .unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        mesh.draw();
        assert!(matches!(
            headless.draw_calls()[0],
            Command::DrawArrays { first: 0, count: 3, .. }
        ));
    }

    #[test]
    fn interleaved_layout_counts_whole_vertices() {
        let (_headless, device) = setup();
        // position + uv, 20 bytes per vertex, four vertices
        let mesh = MeshBuilder::new()
            .vertex_buffer(&[0.0f32; 20])
            .attribute(VertexAttribute::float(0, 3).with_stride(20))
            .attribute(VertexAttribute::float(1, 2).with_stride(20).with_offset(12))
            .build(&device)
            .unwrap();
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn attribute_past_buffer_end_is_rejected() {
        let (headless, device) = setup();
        let err = MeshBuilder::new()
            .vertex_buffer(&[0.0f32; 3])
            .attribute(VertexAttribute::float(0, 3).with_offset(1024))
            .build(&device)
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidMesh(_)));
        assert!(err.to_string().contains("location 0"));
        assert_eq!(headless.live_objects(), 0);
    }

    #[test]
    fn attribute_wider_than_stride_is_rejected() {
        let (_headless, device) = setup();
        let err = MeshBuilder::new()
            .vertex_buffer(&QUAD_VERTICES)
            .attribute(VertexAttribute::float(2, 3).with_stride(16).with_offset(8))
            .build(&device)
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidMesh(_)));
        assert!(err.to_string().contains("location 2"));
        assert!(err.to_string().contains("stride"));
    }
}
