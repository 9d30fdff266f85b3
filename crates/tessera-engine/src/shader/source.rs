use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};

/// Where a shader stage's text comes from.
///
/// All variants normalize to the same compile entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderSource {
    /// Text stored in a file, fetched through a [`SourceLoader`].
    File(PathBuf),
    /// Text owned in memory.
    Text(String),
    /// Text embedded in the binary, typically via `include_str!`.
    Embedded(&'static str),
}

impl ShaderSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        ShaderSource::File(path.into())
    }

    /// File path for file-backed sources.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ShaderSource::File(path) => Some(path),
            _ => None,
        }
    }

    /// Returns the source text, loading it through `loader` for files.
    pub fn resolve(&self, loader: &dyn SourceLoader) -> io::Result<Cow<'_, str>> {
        match self {
            ShaderSource::File(path) => loader.load(path).map(Cow::Owned),
            ShaderSource::Text(text) => Ok(Cow::Borrowed(text.as_str())),
            ShaderSource::Embedded(text) => Ok(Cow::Borrowed(text)),
        }
    }
}

impl From<&'static str> for ShaderSource {
    fn from(text: &'static str) -> Self {
        ShaderSource::Embedded(text)
    }
}

impl From<String> for ShaderSource {
    fn from(text: String) -> Self {
        ShaderSource::Text(text)
    }
}

impl From<PathBuf> for ShaderSource {
    fn from(path: PathBuf) -> Self {
        ShaderSource::File(path)
    }
}

/// Collaborator that turns a path into shader text.
pub trait SourceLoader {
    fn load(&self, path: &Path) -> io::Result<String>;
}

impl<F> SourceLoader for F
where
    F: Fn(&Path) -> io::Result<String>,
{
    fn load(&self, path: &Path) -> io::Result<String> {
        self(path)
    }
}

/// Reads sources from the local filesystem.
#[derive(Debug, Copy, Clone, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}
