//! Static indexed geometry.
//!
//! A [`Mesh`] is materialized from a [`MeshBuilder`] in one validated step and
//! owns its vertex array, vertex buffers and optional index buffer.

mod builder;

pub use builder::{IndexData, MeshBuilder, MeshIndex, MeshSpec, VertexBufferData};

use crate::device::{GpuHandle, IndexFormat};

/// GPU-resident geometry.
#[derive(Debug)]
pub struct Mesh {
    vertex_array: GpuHandle,
    vertex_buffers: Vec<GpuHandle>,
    index_buffer: Option<GpuHandle>,
    index_format: IndexFormat,
    index_count: u32,
    vertex_count: u32,
}

impl Mesh {
    /// Number of indices drawn per call; `0` for non-indexed meshes.
    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Vertices readable through every declared attribute.
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.index_buffer.is_some()
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.vertex_array.is_live()
    }

    pub fn vertex_array(&self) -> &GpuHandle {
        &self.vertex_array
    }

    /// Issues one draw call for the whole mesh with whatever program is bound.
    ///
    /// # Panics
    /// Panics if the mesh was destroyed.
    pub fn draw(&self) {
        let device = self.vertex_array.device();
        device.bind_vertex_array(Some(self.vertex_array.id()));
        if self.index_buffer.is_some() {
            device.draw_indexed(self.index_count, self.index_format);
        } else {
            device.draw_arrays(0, self.vertex_count);
        }
    }

    pub fn set_debug_label(&self, label: &str) {
        self.vertex_array.set_label(label);
        for (i, vb) in self.vertex_buffers.iter().enumerate() {
            vb.set_label(&format!("{label} VBO {i}"));
        }
        if let Some(ib) = &self.index_buffer {
            ib.set_label(&format!("{label} EBO"));
        }
    }

    /// Releases every owned object. Idempotent; dropping has the same effect.
    pub fn destroy(&mut self) {
        self.vertex_array.release();
        for vb in &mut self.vertex_buffers {
            vb.release();
        }
        if let Some(ib) = &mut self.index_buffer {
            ib.release();
        }
        self.index_count = 0;
        self.vertex_count = 0;
    }
}
