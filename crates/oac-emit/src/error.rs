use std::path::{Path, PathBuf};

use oac_spec::{MergeError, SpecError, ValidationError};
use thiserror::Error;

/// Errors produced while converting one document.
#[derive(Debug, Error)]
pub enum EmitError {
    /// Loading or resolving the document failed.
    #[error("failed to load OpenAPI document")]
    Spec(#[from] SpecError),

    /// The resolved document is missing required fields.
    #[error("validation failed")]
    Validation(#[from] ValidationError),

    #[error("failed to merge allOf")]
    Merge(#[from] MergeError),

    /// Reading or writing an artifact failed.
    #[error("i/o error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize document")]
    Json(#[from] serde_json::Error),

    /// The VitePress index has no usable front matter.
    #[error("invalid front matter in {}: {reason}", path.display())]
    Frontmatter { path: PathBuf, reason: String },
}

impl EmitError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| EmitError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
