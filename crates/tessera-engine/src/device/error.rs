use std::path::PathBuf;

use thiserror::Error;

use super::types::{ObjectKind, ShaderStage};

/// Recoverable failure of a builder's terminal `build` step.
///
/// When a build fails, every driver object it allocated has already been
/// released. The caller may retry, substitute a fallback, or abort.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A program was requested with no shader stages.
    #[error("program pipeline has no shader stages")]
    EmptyPipeline,

    /// Stage source text could not be obtained from its file.
    #[error("failed to load {stage} shader source from {}: {source}", .path.display())]
    SourceUnavailable {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stage failed to compile. `log` is the compiler output.
    #[error("{stage} shader compilation failed{}:\n{log}", label_suffix(.label))]
    Compilation {
        stage: ShaderStage,
        label: Option<String>,
        log: String,
    },

    /// All stages compiled but the program failed to link. `log` is the linker output.
    #[error("program link failed{}:\n{log}", label_suffix(.label))]
    Linking { label: Option<String>, log: String },

    /// A mesh specification is structurally invalid.
    #[error("invalid mesh specification: {0}")]
    InvalidMesh(String),

    /// The driver refused to allocate an object.
    #[error("failed to allocate {kind}: {reason}")]
    Allocation { kind: ObjectKind, reason: String },
}

impl BuildError {
    pub(crate) fn allocation(kind: ObjectKind) -> impl FnOnce(String) -> Self {
        move |reason| BuildError::Allocation { kind, reason }
    }
}

fn label_suffix(label: &Option<String>) -> String {
    match label {
        Some(l) => format!(" ({l})"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compilation_message_names_stage_and_log() {
        let err = BuildError::Compilation {
            stage: ShaderStage::Fragment,
            label: Some("quad".into()),
            log: "0:3(1): error: syntax error".into(),
        };
        let text = err.to_string();
        assert!(text.starts_with("fragment shader compilation failed (quad):"));
        assert!(text.contains("syntax error"));
    }

    #[test]
    fn allocation_helper_captures_kind() {
        let err = BuildError::allocation(ObjectKind::VertexArray)("out of memory".into());
        assert_eq!(err.to_string(), "failed to allocate vertex array: out of memory");
    }
}
