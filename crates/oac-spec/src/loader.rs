//! Reading documents and referenced fragments.
//!
//! The resolver never touches the filesystem directly; it reads through a
//! [`SourceLoader`] so that tests (and embedders) can serve fragments from memory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::SpecError;

/// Reads the raw text of a document or fragment.
pub trait SourceLoader {
    fn read(&self, path: &Path) -> Result<String, SpecError>;

    /// Read `path` and decode it as `T`.
    fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<T, SpecError>
    where
        Self: Sized,
    {
        let content = self.read(path)?;
        serde_yaml::from_str(&content).map_err(|source| SpecError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Loads from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn read(&self, path: &Path) -> Result<String, SpecError> {
        std::fs::read_to_string(path).map_err(|source| SpecError::Load {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Serves fragments from an in-memory map keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

impl SourceLoader for MemoryLoader {
    fn read(&self, path: &Path) -> Result<String, SpecError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| SpecError::Load {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            })
    }
}
