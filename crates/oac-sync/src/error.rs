use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by [`DocSyncer`](crate::DocSyncer).
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to read mapping file {}", path.display())]
    MappingRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse mapping")]
    MappingParse(#[from] serde_json::Error),

    #[error("invalid regexp {pattern}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex_lite::Error,
    },

    #[error("failed to copy {} to {}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Destinations that could not be synced, one message each.
    #[error("sync errors:\n{}", .0.join("\n"))]
    Unresolved(Vec<String>),
}
