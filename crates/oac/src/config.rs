//! Optional `oac.yaml` with defaults for `oac convert`.
//!
//! ```yaml
//! output: build/nginx
//! docs: site/api
//! index: site/index.md
//! file_prefix: ""
//! common_prefix: v1
//! write_introduction: true
//! merge_responses_inline: false
//! max_depth: 32
//! ```
//!
//! Relative paths are resolved against the directory holding the file.
//! Command-line flags override every value.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConverterConfig {
    pub output: Option<PathBuf>,
    pub docs: Option<PathBuf>,
    pub index: Option<PathBuf>,
    pub file_prefix: Option<String>,
    pub common_prefix: Option<String>,
    pub write_introduction: Option<bool>,
    pub merge_responses_inline: Option<bool>,
    pub max_depth: Option<usize>,
}

impl ConverterConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.relative_to(base))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    fn relative_to(mut self, base: &Path) -> Self {
        for path in [&mut self.output, &mut self.docs, &mut self.index]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_every_field() {
        let config = ConverterConfig::parse(
            "output: nginx\ndocs: docs\nindex: docs/index.md\nfile_prefix: users-\ncommon_prefix: v1\nwrite_introduction: true\nmerge_responses_inline: true\nmax_depth: 16\n",
        )
        .unwrap();

        assert_eq!(config.output, Some(PathBuf::from("nginx")));
        assert_eq!(config.file_prefix.as_deref(), Some("users-"));
        assert_eq!(config.common_prefix.as_deref(), Some("v1"));
        assert_eq!(config.write_introduction, Some(true));
        assert_eq!(config.merge_responses_inline, Some(true));
        assert_eq!(config.max_depth, Some(16));
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(ConverterConfig::parse("\n").unwrap(), ConverterConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ConverterConfig::parse("outptu: nginx\n").is_err());
    }

    #[test]
    fn relative_paths_follow_config_location() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("oac.yaml");
        std::fs::write(&path, "docs: site/api\nindex: /srv/index.md\n").unwrap();

        let config = ConverterConfig::load(&path).unwrap();
        assert_eq!(config.docs, Some(temp.path().join("site/api")));
        assert_eq!(config.index, Some(PathBuf::from("/srv/index.md")));
    }
}
