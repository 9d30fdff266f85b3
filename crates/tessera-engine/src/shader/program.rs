use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::device::{Device, GpuHandle, RawId, UniformLocation};
use crate::uniform::UniformValue;

/// A linked shader program.
///
/// Uniform locations are looked up lazily and cached for the life of the
/// program. Names the program does not expose are cached as `None` so the
/// driver is queried at most once per name. The cache sits behind a
/// `RefCell`; it only memoizes driver answers and never changes what a
/// lookup returns.
#[derive(Debug)]
pub struct Program {
    handle: GpuHandle,
    label: Option<String>,
    uniform_cache: RefCell<HashMap<String, Option<UniformLocation>>>,
}

impl Program {
    pub(super) fn new(handle: GpuHandle, label: Option<String>) -> Self {
        Self {
            handle,
            label,
            uniform_cache: RefCell::new(HashMap::new()),
        }
    }

    #[inline]
    pub fn id(&self) -> RawId {
        self.handle.id()
    }

    #[inline]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.handle.is_live()
    }

    #[inline]
    pub fn device(&self) -> &Rc<dyn Device> {
        self.handle.device()
    }

    /// Makes this program current.
    pub fn bind(&self) {
        self.device().use_program(Some(self.id()));
    }

    /// Location of `name`, or `None` if the program does not expose it.
    ///
    /// The first miss for a name is logged; later lookups hit the cache.
    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        if let Some(cached) = self.uniform_cache.borrow().get(name) {
            return *cached;
        }

        let location = self.device().uniform_location(self.id(), name);
        if location.is_none() {
            log::warn!(
                "uniform `{name}` not found in program {}{}",
                self.id(),
                self.label.as_deref().map(|l| format!(" ({l})")).unwrap_or_default()
            );
        }
        self.uniform_cache
            .borrow_mut()
            .insert(name.to_string(), location);
        location
    }

    /// Names reported as not found, sorted. Each was logged once.
    pub fn missing_uniforms(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .uniform_cache
            .borrow()
            .iter()
            .filter(|(_, location)| location.is_none())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Number of names looked up so far, found or not.
    pub fn cached_uniforms(&self) -> usize {
        self.uniform_cache.borrow().len()
    }

    /// Uploads `value` to `name` on the current program. Unknown names are
    /// skipped.
    ///
    /// The program must be bound.
    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) {
        if let Some(location) = self.uniform_location(name) {
            self.device().set_uniform(location, &value.into());
        }
    }

    pub fn set_debug_label(&mut self, label: impl Into<String>) {
        let label = label.into();
        self.handle.set_label(&label);
        self.label = Some(label);
    }

    /// Deletes the program. Idempotent; dropping afterwards is a no-op.
    pub fn destroy(&mut self) {
        self.handle.release();
        self.uniform_cache.borrow_mut().clear();
    }
}
