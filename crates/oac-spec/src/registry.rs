//! Registry of external files that have been turned into local components.
//!
//! Each resolved file path maps to exactly one `#/components/<type>/<name>`
//! identifier. The registry lives for a single conversion run and only grows.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::model::ComponentKind;
use crate::reference::component_name;

/// A component registered for an external file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRef {
    pub kind: ComponentKind,
    pub name: String,
    /// `#/components/<type>/<name>`
    pub identifier: String,
    pub file_path: PathBuf,
}

impl ComponentRef {
    fn new(kind: ComponentKind, file_path: &Path, name: String) -> Self {
        Self {
            identifier: format!("{}{}", kind.prefix(), name),
            kind,
            name,
            file_path: file_path.to_path_buf(),
        }
    }
}

/// File path -> registered component.
#[derive(Debug, Clone, Default)]
pub struct ReferenceRegistry {
    entries: BTreeMap<PathBuf, ComponentRef>,
}

impl ReferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `file_path` under a name derived from its basename.
    ///
    /// Registering the same path again returns the existing component unchanged.
    pub fn register(&mut self, kind: ComponentKind, file_path: &Path) -> ComponentRef {
        self.register_named(kind, file_path, &component_name(file_path))
    }

    /// Register `file_path` under an explicit component name.
    ///
    /// Used for component-map entries, where the authored key names the component.
    pub fn register_named(
        &mut self,
        kind: ComponentKind,
        file_path: &Path,
        name: &str,
    ) -> ComponentRef {
        self.entries
            .entry(file_path.to_path_buf())
            .or_insert_with(|| ComponentRef::new(kind, file_path, name.to_string()))
            .clone()
    }

    /// Reverse lookup by component type and name. First match in path order wins.
    pub fn lookup(&self, kind: ComponentKind, name: &str) -> Option<&ComponentRef> {
        let prefix = kind.prefix();
        self.entries
            .values()
            .find(|c| c.identifier.strip_prefix(prefix.as_str()) == Some(name))
    }

    pub fn get(&self, file_path: &Path) -> Option<&ComponentRef> {
        self.entries.get(file_path)
    }

    pub fn contains(&self, file_path: &Path) -> bool {
        self.entries.contains_key(file_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentRef> {
        self.entries.values()
    }
}
