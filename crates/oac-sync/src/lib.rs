//! Copies documentation into place according to a regex mapping.
//!
//! A mapping is a JSON object from destination path to a list of patterns:
//!
//! ```json
//! {
//!   "output/guides/project/index.md": [".*docs/guide\\.md$", ".*docs/guide/?$"],
//!   "output/api/reference.md": [".*api/reference\\.md$"]
//! }
//! ```
//!
//! For each destination the first pattern that matches a directory or a
//! Markdown file under the base directory wins. A matched directory must
//! contain the destination's file name and is copied, contents and all, into
//! the destination's parent. A matched file is copied to the destination.

mod error;

pub use error::SyncError;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex_lite::Regex;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Destination path -> candidate source patterns, tried in order.
pub type Mappings = BTreeMap<String, Vec<String>>;

/// What a pattern matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncSource {
    Directory(PathBuf),
    File(PathBuf),
}

impl SyncSource {
    pub fn path(&self) -> &Path {
        match self {
            SyncSource::Directory(path) | SyncSource::File(path) => path,
        }
    }
}

/// One completed copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedEntry {
    pub source: SyncSource,
    pub destination: PathBuf,
}

#[derive(Debug, Clone)]
pub struct DocSyncer {
    mappings: Mappings,
    base_dir: PathBuf,
}

impl DocSyncer {
    pub fn new(mappings: Mappings, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            mappings,
            base_dir: base_dir.into(),
        }
    }

    /// Build from inline JSON (anything starting with `{`) or a mapping file path.
    pub fn from_input(input: &str, base_dir: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let input = input.trim();
        let mappings: Mappings = if input.starts_with('{') {
            serde_json::from_str(input)?
        } else {
            let path = PathBuf::from(input);
            let content = fs::read_to_string(&path)
                .map_err(|source| SyncError::MappingRead { path, source })?;
            serde_json::from_str(&content)?
        };
        Ok(Self::new(mappings, base_dir))
    }

    pub fn mappings(&self) -> &Mappings {
        &self.mappings
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Sync every destination.
    ///
    /// Invalid patterns and copy failures abort immediately. Destinations that
    /// find no usable source are collected and reported together at the end.
    pub fn execute(&self) -> Result<Vec<SyncedEntry>, SyncError> {
        let mut synced = Vec::new();
        let mut unresolved = Vec::new();

        for (dest, patterns) in &self.mappings {
            let destination = self.base_dir.join(dest);
            let Some(dest_file) = destination.file_name().map(|n| n.to_os_string()) else {
                unresolved.push(format!("destination must specify a file: {dest}"));
                continue;
            };

            let Some(source) = self.find_source(patterns)? else {
                unresolved.push(format!("no match found for destination {dest}"));
                continue;
            };

            let target = match &source {
                SyncSource::Directory(dir) => {
                    if !dir.join(&dest_file).exists() {
                        unresolved.push(format!(
                            "directory {} does not contain required file {}",
                            dir.display(),
                            dest_file.to_string_lossy()
                        ));
                        continue;
                    }
                    let parent = destination
                        .parent()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.base_dir.clone());
                    copy_dir(dir, &parent)?;
                    parent
                }
                SyncSource::File(file) => {
                    let target = if dest.ends_with('/') {
                        destination.join(file.file_name().unwrap_or_default())
                    } else {
                        destination.clone()
                    };
                    copy_file(file, &target)?;
                    target
                }
            };

            info!(source = %source.path().display(), destination = %dest, "synced");
            synced.push(SyncedEntry {
                source,
                destination: target,
            });
        }

        if unresolved.is_empty() {
            Ok(synced)
        } else {
            Err(SyncError::Unresolved(unresolved))
        }
    }

    /// First pattern with a match wins.
    fn find_source(&self, patterns: &[String]) -> Result<Option<SyncSource>, SyncError> {
        for pattern in patterns {
            let re = Regex::new(pattern).map_err(|source| SyncError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            if let Some(found) = self.find_match(&re) {
                debug!(pattern = %pattern, source = %found.path().display(), "pattern matched");
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// First directory or `.md` file, in file-name order, whose relative or
    /// full path matches `re`.
    pub fn find_match(&self, re: &Regex) -> Option<SyncSource> {
        WalkDir::new(&self.base_dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .find_map(|entry| {
                let path = entry.path();
                let relative = path.strip_prefix(&self.base_dir).unwrap_or(path);
                let matches = re.is_match(&relative.to_string_lossy())
                    || re.is_match(&path.to_string_lossy());
                if !matches {
                    return None;
                }
                if entry.file_type().is_dir() {
                    Some(SyncSource::Directory(path.to_path_buf()))
                } else if path.extension().is_some_and(|ext| ext == "md") {
                    Some(SyncSource::File(path.to_path_buf()))
                } else {
                    None
                }
            })
    }
}

fn copy_file(from: &Path, to: &Path) -> Result<(), SyncError> {
    let err = |source| SyncError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(err)?;
    }
    fs::copy(from, to).map_err(err)?;
    Ok(())
}

/// Copy the contents of `from` into `to`, creating directories as needed.
fn copy_dir(from: &Path, to: &Path) -> Result<(), SyncError> {
    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry.map_err(|e| SyncError::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: e.into(),
        })?;
        let relative = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|source| SyncError::Copy {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                source,
            })?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }
    Ok(())
}
