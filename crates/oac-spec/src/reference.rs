//! `$ref` string handling: classification and target path computation.

use std::path::{Component, Path, PathBuf};

/// Whether a reference stays inside the current document or escapes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// `#/components/...` and other same-document pointers.
    Internal,
    /// Relative or absolute file paths and URLs.
    External,
}

impl RefKind {
    pub fn of(reference: &str) -> Self {
        if is_external_ref(reference) {
            RefKind::External
        } else {
            RefKind::Internal
        }
    }
}

/// A reference escapes the current file when it starts with `./`, `../` or `/`,
/// or names a URL.
pub fn is_external_ref(reference: &str) -> bool {
    reference.starts_with("./")
        || reference.starts_with("../")
        || reference.starts_with('/')
        || reference.contains("://")
}

/// Split `file#fragment` into its file and (optional) fragment parts.
pub fn split_ref(reference: &str) -> (&str, Option<&str>) {
    match reference.split_once('#') {
        Some((file, fragment)) => (file, Some(fragment)),
        None => (reference, None),
    }
}

/// Compute the file a reference points at, relative to the file it appears in.
///
/// Only `./` and `../` references are joined to the anchor's directory; anything
/// else is taken verbatim. The fragment is dropped since whole files are loaded.
pub fn resolve_ref_path(anchor: &Path, reference: &str) -> PathBuf {
    let (file, _) = split_ref(reference);
    if !file.starts_with("./") && !file.starts_with("../") {
        return PathBuf::from(file);
    }
    let base = anchor.parent().unwrap_or_else(|| Path::new(""));
    normalize(&base.join(file))
}

/// Lexically clean a path: drop `.` segments and fold `..` into its parent.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Component name for a file: its basename without extension.
pub fn component_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_external_references() {
        for reference in ["./a.yaml", "../b.yaml", "/abs.yaml", "http://x/y.yaml"] {
            assert_eq!(RefKind::of(reference), RefKind::External, "{reference}");
        }
    }

    #[test]
    fn classifies_internal_references() {
        assert_eq!(RefKind::of("#/components/schemas/Foo"), RefKind::Internal);
        assert_eq!(RefKind::of("Foo"), RefKind::Internal);
    }

    #[test]
    fn split_keeps_fragment() {
        assert_eq!(
            split_ref("./common.yaml#/User"),
            ("./common.yaml", Some("/User"))
        );
        assert_eq!(split_ref("./user.yaml"), ("./user.yaml", None));
    }

    #[test]
    fn relative_refs_resolve_against_anchor_directory() {
        let anchor = Path::new("specs/api/openapi.yaml");
        assert_eq!(
            resolve_ref_path(anchor, "./schemas/user.yaml"),
            PathBuf::from("specs/api/schemas/user.yaml")
        );
        assert_eq!(
            resolve_ref_path(anchor, "../shared/error.yaml#/Error"),
            PathBuf::from("specs/shared/error.yaml")
        );
    }

    #[test]
    fn absolute_and_url_refs_are_verbatim() {
        let anchor = Path::new("specs/openapi.yaml");
        assert_eq!(
            resolve_ref_path(anchor, "/etc/schemas/user.yaml"),
            PathBuf::from("/etc/schemas/user.yaml")
        );
        assert_eq!(
            resolve_ref_path(anchor, "https://example.com/user.yaml#/x"),
            PathBuf::from("https://example.com/user.yaml")
        );
    }

    #[test]
    fn normalize_folds_parent_segments() {
        assert_eq!(normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize(Path::new("../a/b")), PathBuf::from("../a/b"));
        assert_eq!(normalize(Path::new("/a/../../b")), PathBuf::from("/b"));
        assert_eq!(normalize(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn component_name_strips_directory_and_extension() {
        assert_eq!(component_name(Path::new("schemas/User.yaml")), "User");
        assert_eq!(component_name(Path::new("Error.v2.yml")), "Error.v2");
    }
}
