use std::fmt;
use std::rc::Rc;

use super::backend::Device;
use super::types::{ObjectKind, RawId};

/// Lifecycle state of a [`GpuHandle`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum HandleState {
    Live,
    Destroyed,
}

/// Single owner of one driver object.
///
/// The handle is move-only: it is neither `Clone` nor `Copy`, so exactly one
/// owner exists at any time. The object is destroyed exactly once, either by an
/// explicit [`release`](Self::release) or when the handle is dropped.
pub struct GpuHandle {
    device: Rc<dyn Device>,
    kind: ObjectKind,
    id: Option<RawId>,
}

impl GpuHandle {
    /// Allocates a new object of `kind` on `device`.
    ///
    /// On failure nothing is retained and the driver message is returned.
    pub fn create(device: &Rc<dyn Device>, kind: ObjectKind) -> Result<Self, String> {
        let id = device.create(kind)?;
        log::trace!("allocated {kind} {id}");
        Ok(Self {
            device: Rc::clone(device),
            kind,
            id: Some(id),
        })
    }

    #[inline]
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Driver name of the owned object.
    ///
    /// # Panics
    /// Panics if the handle was already released; using a destroyed handle is a
    /// programming defect.
    #[inline]
    pub fn id(&self) -> RawId {
        match self.id {
            Some(id) => id,
            None => panic!("use of released {} handle", self.kind),
        }
    }

    #[inline]
    pub fn state(&self) -> HandleState {
        if self.id.is_some() { HandleState::Live } else { HandleState::Destroyed }
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.id.is_some()
    }

    /// Device the object was allocated on.
    #[inline]
    pub fn device(&self) -> &Rc<dyn Device> {
        &self.device
    }

    /// Destroys the object. Subsequent calls are no-ops.
    pub fn release(&mut self) {
        if let Some(id) = self.id.take() {
            log::trace!("released {} {id}", self.kind);
            self.device.destroy(self.kind, id);
        }
    }

    pub fn set_label(&self, label: &str) {
        if let Some(id) = self.id {
            self.device.label(self.kind, id, label);
        }
    }
}

impl Drop for GpuHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for GpuHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuHandle")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessDevice;

    fn headless() -> (Rc<HeadlessDevice>, Rc<dyn Device>) {
        let device = Rc::new(HeadlessDevice::new());
        let dyn_device: Rc<dyn Device> = device.clone();
        (device, dyn_device)
    }

    #[test]
    fn drop_destroys_exactly_once() {
        let (headless, device) = headless();
        {
            let handle = GpuHandle::create(&device, ObjectKind::Buffer).unwrap();
            assert_eq!(handle.state(), HandleState::Live);
            assert_eq!(headless.live_count(ObjectKind::Buffer), 1);
        }
        assert_eq!(headless.live_count(ObjectKind::Buffer), 0);
        assert_eq!(headless.destroy_calls(), 1);
    }

    #[test]
    fn release_is_idempotent() {
        let (headless, device) = headless();
        let mut handle = GpuHandle::create(&device, ObjectKind::Program).unwrap();
        handle.release();
        handle.release();
        assert_eq!(handle.state(), HandleState::Destroyed);
        drop(handle);
        assert_eq!(headless.destroy_calls(), 1);
    }

    #[test]
    fn move_transfers_ownership() {
        let (headless, device) = headless();
        let handle = GpuHandle::create(&device, ObjectKind::VertexArray).unwrap();
        let id = handle.id();
        let moved = handle;
        assert_eq!(moved.id(), id);
        assert_eq!(headless.live_count(ObjectKind::VertexArray), 1);
        drop(moved);
        assert_eq!(headless.live_count(ObjectKind::VertexArray), 0);
    }

    #[test]
    #[should_panic(expected = "use of released")]
    fn id_after_release_panics() {
        let (_headless, device) = headless();
        let mut handle = GpuHandle::create(&device, ObjectKind::Buffer).unwrap();
        handle.release();
        let _ = handle.id();
    }
}
