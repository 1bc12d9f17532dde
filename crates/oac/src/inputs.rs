//! Expansion of `oac convert` arguments into document paths.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use walkdir::WalkDir;

/// Expand one argument (file, directory or glob pattern) into YAML documents.
///
/// Directories are walked recursively. Files without a `.yml`/`.yaml`
/// extension are skipped. An argument that matches nothing is an error.
pub fn expand_input(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let matches: Vec<PathBuf> = glob::glob(pattern)
        .with_context(|| format!("invalid input pattern: {pattern}"))?
        .filter_map(Result::ok)
        .collect();

    if matches.is_empty() {
        bail!("no matches found for pattern: {pattern}");
    }

    let mut documents = Vec::new();
    for path in matches {
        if path.is_dir() {
            documents.extend(
                WalkDir::new(&path)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(Result::ok)
                    .filter(|entry| entry.file_type().is_file() && is_yaml(entry.path()))
                    .map(|entry| entry.into_path()),
            );
        } else if is_yaml(&path) {
            documents.push(path);
        }
    }
    Ok(documents)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "").unwrap();
        path
    }

    #[test]
    fn single_file() {
        let temp = TempDir::new().unwrap();
        let file = touch(temp.path(), "api.yaml");
        assert_eq!(expand_input(&file.to_string_lossy()).unwrap(), vec![file]);
    }

    #[test]
    fn directory_is_walked_for_yaml() {
        let temp = TempDir::new().unwrap();
        let b = touch(temp.path(), "specs/b.yml");
        let a = touch(temp.path(), "specs/nested/a.yaml");
        touch(temp.path(), "specs/readme.md");

        let found = expand_input(&temp.path().join("specs").to_string_lossy()).unwrap();
        assert_eq!(found, vec![b, a]);
    }

    #[test]
    fn glob_patterns_expand() {
        let temp = TempDir::new().unwrap();
        let users = touch(temp.path(), "users.yaml");
        let orders = touch(temp.path(), "orders.yaml");
        touch(temp.path(), "notes.txt");

        let mut found = expand_input(&temp.path().join("*").to_string_lossy()).unwrap();
        found.sort();
        assert_eq!(found, vec![orders, users]);
    }

    #[test]
    fn no_match_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = expand_input(&temp.path().join("missing-*.yaml").to_string_lossy()).unwrap_err();
        assert!(err.to_string().contains("no matches found"));
    }
}
