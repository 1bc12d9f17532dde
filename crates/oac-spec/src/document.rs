//! Loading a root document together with everything it references.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{MergeError, SpecError, ValidationError};
use crate::loader::{FsLoader, SourceLoader};
use crate::merge::merge_responses_inline;
use crate::model::Document;
use crate::registry::ReferenceRegistry;
use crate::resolver::{ResolveOptions, Resolver};
use crate::validate::{validate, ValidationSummary};

/// A document with every external reference resolved.
#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    /// The root file the document was read from.
    pub path: PathBuf,
    pub document: Document,
    /// Components created for external files during resolution.
    pub registry: ReferenceRegistry,
}

impl ResolvedDocument {
    /// Load and resolve `path` from the filesystem with default options.
    pub fn load(path: &Path) -> Result<Self, SpecError> {
        Self::load_with(path, &FsLoader, ResolveOptions::default())
    }

    pub fn load_with<L: SourceLoader>(
        path: &Path,
        loader: &L,
        options: ResolveOptions,
    ) -> Result<Self, SpecError> {
        let content = loader.read(path)?;
        let mut document = Document::from_yaml(&content).map_err(|source| SpecError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(file = %path.display(), paths = document.paths.len(), "parsed document");

        let registry = Resolver::new(loader)
            .with_options(options)
            .resolve_document(&mut document, path)?;

        Ok(Self {
            path: path.to_path_buf(),
            document,
            registry,
        })
    }

    pub fn validate(&self) -> Result<ValidationSummary, ValidationError> {
        validate(&self.document, &self.path)
    }

    /// Flatten `allOf` response schemas in place.
    pub fn merge_responses_inline(&mut self) -> Result<usize, MergeError> {
        merge_responses_inline(&mut self.document)
    }
}
