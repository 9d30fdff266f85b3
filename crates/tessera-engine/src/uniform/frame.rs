use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::camera::Camera;
use crate::device::{BufferTarget, BufferUsage, BuildError, Device, GpuHandle, ObjectKind, RawId};

// ── camera block ──────────────────────────────────────────────────────────

/// CPU mirror of the std140 `Camera` uniform block:
///
/// ```glsl
/// layout(std140, binding = 0) uniform Camera { mat4 u_ViewProj; };
/// ```
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CameraBlock {
    pub view_projection: Mat4,
}

impl CameraBlock {
    pub const SIZE: usize = std::mem::size_of::<CameraBlock>();

    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view_projection: camera.view_projection(),
        }
    }
}

// ── buffer ────────────────────────────────────────────────────────────────

/// Fixed-size uniform buffer bound at a stable binding slot.
#[derive(Debug)]
pub struct FrameUniformBuffer {
    handle: GpuHandle,
    binding: u32,
    size: usize,
}

impl FrameUniformBuffer {
    #[inline]
    pub fn binding(&self) -> u32 {
        self.binding
    }

    /// Declared size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn id(&self) -> RawId {
        self.handle.id()
    }

    #[inline]
    pub fn handle(&self) -> &GpuHandle {
        &self.handle
    }

    /// Overwrites `data.len()` bytes starting at `offset`.
    ///
    /// # Panics
    /// Panics when `offset + data.len()` exceeds the declared size. An
    /// out-of-range write is a programming defect and is never truncated.
    pub fn update(&self, data: &[u8], offset: usize) {
        let end = offset.checked_add(data.len());
        assert!(
            end.is_some_and(|end| end <= self.size),
            "frame uniform update out of range: offset {offset} + {} bytes > {} bytes",
            data.len(),
            self.size
        );

        let device = self.handle.device();
        device.bind_buffer(BufferTarget::Uniform, Some(self.handle.id()));
        device.buffer_sub_data(BufferTarget::Uniform, offset, data);
    }

    /// Writes a plain-old-data value at `offset`. Same bounds rule as [`update`](Self::update).
    pub fn write<T: Pod>(&self, value: &T, offset: usize) {
        self.update(bytemuck::bytes_of(value), offset);
    }

    /// Re-attaches the buffer to its binding slot.
    pub fn bind(&self) {
        self.handle
            .device()
            .bind_buffer_base(BufferTarget::Uniform, self.binding, self.handle.id());
    }
}

// ── builder ───────────────────────────────────────────────────────────────

/// Accumulated parameters for a [`FrameUniformBuffer`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameUniformSpec {
    pub binding: u32,
    pub size: usize,
    pub label: Option<String>,
}

/// Immutable builder for [`FrameUniformBuffer`].
///
/// Every setter returns a new builder and leaves the receiver untouched.
#[derive(Debug, Clone, Default)]
pub struct FrameUniformBuilder {
    spec: FrameUniformSpec,
}

impl FrameUniformBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder sized and slotted for a [`CameraBlock`].
    pub fn camera(binding: u32) -> Self {
        Self::new().binding(binding).size(CameraBlock::SIZE)
    }

    pub fn spec(&self) -> &FrameUniformSpec {
        &self.spec
    }

    #[must_use]
    pub fn binding(&self, binding: u32) -> Self {
        let mut next = self.clone();
        next.spec.binding = binding;
        next
    }

    #[must_use]
    pub fn size(&self, size: usize) -> Self {
        let mut next = self.clone();
        next.spec.size = size;
        next
    }

    #[must_use]
    pub fn label(&self, label: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.spec.label = Some(label.into());
        next
    }

    /// Allocates zeroed storage of the declared size and binds it to its slot.
    ///
    /// # Panics
    /// Panics if the declared size is zero.
    pub fn build(&self, device: &Rc<dyn Device>) -> Result<FrameUniformBuffer, BuildError> {
        assert!(self.spec.size > 0, "frame uniform buffer declared with zero size");

        let handle = GpuHandle::create(device, ObjectKind::Buffer)
            .map_err(BuildError::allocation(ObjectKind::Buffer))?;

        device.bind_buffer(BufferTarget::Uniform, Some(handle.id()));
        device.buffer_storage(BufferTarget::Uniform, self.spec.size, BufferUsage::Dynamic);
        device.bind_buffer_base(BufferTarget::Uniform, self.spec.binding, handle.id());

        if let Some(label) = &self.spec.label {
            handle.set_label(label);
        }

        log::debug!(
            "frame uniform buffer {} ({} bytes) bound at slot {}",
            handle.id(),
            self.spec.size,
            self.spec.binding
        );

        Ok(FrameUniformBuffer {
            handle,
            binding: self.spec.binding,
            size: self.spec.size,
        })
    }
}
