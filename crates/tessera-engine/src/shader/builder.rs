use std::path::Path;
use std::rc::Rc;

use crate::device::{BuildError, Device, GpuHandle, ObjectKind, ShaderStage};

use super::program::Program;
use super::source::{FsLoader, ShaderSource, SourceLoader};

/// One stage of a program pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSpec {
    pub stage: ShaderStage,
    pub source: ShaderSource,
}

/// Immutable builder for [`Program`].
///
/// Stages compile in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct ProgramBuilder {
    stages: Vec<ShaderSpec>,
    label: Option<String>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stages(&self) -> &[ShaderSpec] {
        &self.stages
    }

    #[must_use]
    pub fn stage(&self, stage: ShaderStage, source: impl Into<ShaderSource>) -> Self {
        let mut next = self.clone();
        next.stages.push(ShaderSpec {
            stage,
            source: source.into(),
        });
        next
    }

    #[must_use]
    pub fn vertex(&self, source: impl Into<ShaderSource>) -> Self {
        self.stage(ShaderStage::Vertex, source)
    }

    #[must_use]
    pub fn fragment(&self, source: impl Into<ShaderSource>) -> Self {
        self.stage(ShaderStage::Fragment, source)
    }

    #[must_use]
    pub fn label(&self, label: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.label = Some(label.into());
        next
    }

    /// Compiles and links every stage, reading file sources from disk.
    pub fn build(&self, device: &Rc<dyn Device>) -> Result<Program, BuildError> {
        self.build_with(device, &FsLoader)
    }

    /// Compiles and links every stage, reading file sources through `loader`.
    ///
    /// All sources are resolved before the first driver call. On failure the
    /// program object and every stage object created so far are deleted.
    pub fn build_with(
        &self,
        device: &Rc<dyn Device>,
        loader: &dyn SourceLoader,
    ) -> Result<Program, BuildError> {
        if self.stages.is_empty() {
            return Err(BuildError::EmptyPipeline);
        }

        let mut sources = Vec::with_capacity(self.stages.len());
        for spec in &self.stages {
            let text = spec
                .source
                .resolve(loader)
                .map_err(|source| BuildError::SourceUnavailable {
                    stage: spec.stage,
                    path: spec.source.path().map(Path::to_path_buf).unwrap_or_default(),
                    source,
                })?;
            sources.push((spec.stage, text));
        }

        let program = GpuHandle::create(device, ObjectKind::Program)
            .map_err(BuildError::allocation(ObjectKind::Program))?;

        let mut shaders = Vec::with_capacity(sources.len());
        for (stage, text) in &sources {
            let kind = ObjectKind::Shader(*stage);
            let shader = GpuHandle::create(device, kind).map_err(BuildError::allocation(kind))?;

            device
                .compile_shader(shader.id(), text)
                .map_err(|log| BuildError::Compilation {
                    stage: *stage,
                    label: self.label.clone(),
                    log,
                })?;

            device.attach_shader(program.id(), shader.id());
            shaders.push(shader);
        }

        device
            .link_program(program.id())
            .map_err(|log| BuildError::Linking {
                label: self.label.clone(),
                log,
            })?;

        for shader in &shaders {
            device.detach_shader(program.id(), shader.id());
        }
        drop(shaders);

        if let Some(label) = &self.label {
            program.set_label(label);
        }
        log::debug!(
            "linked program {} from {} stage(s){}",
            program.id(),
            sources.len(),
            self.label.as_deref().map(|l| format!(" ({l})")).unwrap_or_default()
        );

        Ok(Program::new(program, self.label.clone()))
    }
}
