//! VitePress documentation output for `vitepress-openapi`.
//!
//! For each document the writer produces, under `<docs>/<common prefix>/`:
//!
//! ```text
//! <file_prefix>spec.json          resolved document, 4-space indented
//! [tag].md                        per-tag page
//! [tag].paths.js                  dynamic route loader for the tag pages
//! <file_prefix>introduction.md    optional landing page
//! ```
//!
//! It can also register the API as a feature card in the site's `index.md`.

use std::fs;
use std::path::{Path, PathBuf};

use oac_spec::Document;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::EmitError;
use crate::templates::{introduction_page, tag_page, tag_paths_loader, PageContext};

const ICONS: &[&str] = &[
    "⚡", "🔌", "💻", "📱", "💾", "🗄️", "📊", "📈", "📋", "📝", "🗂️", "📁", "🔐", "🔒", "🔑",
    "🛡️", "🔗", "🔍", "📡", "🌐", "🔄", "📨", "📬", "☁️", "🏢", "🌉", "🎯", "🔧", "🛠️", "⚙️",
    "💡", "📌", "⏱️", "💰", "💳", "🏦", "📄", "📚", "📖", "🔔", "📢", "✅", "👥", "🤝", "🧠",
    "🚀", "✈️", "🚢", "💚", "🩺", "🔬", "🔭", "📶", "🎧",
];

/// Writes documentation pages for resolved documents.
#[derive(Debug, Clone)]
pub struct VitePressWriter {
    docs_dir: PathBuf,
    common_prefix: String,
    file_prefix: String,
    write_introduction: bool,
}

impl VitePressWriter {
    pub fn new(docs_dir: impl Into<PathBuf>, common_prefix: &str) -> Self {
        Self {
            docs_dir: docs_dir.into(),
            common_prefix: common_prefix.trim_matches('/').to_string(),
            file_prefix: String::new(),
            write_introduction: false,
        }
    }

    pub fn with_file_prefix(mut self, file_prefix: impl Into<String>) -> Self {
        self.file_prefix = file_prefix.into();
        self
    }

    pub fn with_introduction(mut self, write_introduction: bool) -> Self {
        self.write_introduction = write_introduction;
        self
    }

    /// Directory the pages for this API land in.
    pub fn output_dir(&self) -> PathBuf {
        if self.common_prefix.is_empty() {
            self.docs_dir.clone()
        } else {
            self.docs_dir.join(&self.common_prefix)
        }
    }

    /// Write every page for `document`, returning the files written.
    pub fn write(&self, document: &Document) -> Result<Vec<PathBuf>, EmitError> {
        let dir = self.output_dir();
        fs::create_dir_all(&dir).map_err(EmitError::io(&dir))?;

        let ctx = PageContext {
            title: document.title(),
            file_prefix: &self.file_prefix,
        };

        let mut written = Vec::new();

        let spec_path = dir.join(format!("{}spec.json", self.file_prefix));
        write_file(&spec_path, &spec_json(document)?)?;
        written.push(spec_path);

        let tag_path = dir.join("[tag].md");
        write_file(&tag_path, &tag_page(&ctx))?;
        written.push(tag_path);

        let loader_path = dir.join("[tag].paths.js");
        write_file(&loader_path, &tag_paths_loader(&ctx))?;
        written.push(loader_path);

        if self.write_introduction {
            let intro_path = dir.join(format!("{}introduction.md", self.file_prefix));
            write_file(&intro_path, &introduction_page(&ctx))?;
            written.push(intro_path);
        }

        info!(dir = %dir.display(), files = written.len(), "wrote VitePress docs");
        Ok(written)
    }

    /// The feature card linking to this API from the site index.
    pub fn feature(&self, document: &Document) -> Feature {
        let mut link = String::from("/api");
        if !self.common_prefix.is_empty() {
            link.push('/');
            link.push_str(&self.common_prefix);
        }
        if self.write_introduction {
            link.push('/');
            link.push_str(&self.file_prefix);
            link.push_str("introduction.md");
        }

        Feature {
            icon: icon_for_title(document.title()).to_string(),
            title: document.title().to_string(),
            details: document.description().to_string(),
            link,
        }
    }

    /// Insert or replace this API's feature card in `index_path`.
    pub fn update_index(&self, index_path: &Path, document: &Document) -> Result<(), EmitError> {
        upsert_feature(index_path, &self.feature(document))
    }
}

/// A VitePress home-page feature card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feature {
    pub icon: String,
    pub title: String,
    pub details: String,
    pub link: String,
}

/// The resolved document as JSON with 4-space indentation.
pub fn spec_json(document: &Document) -> Result<String, EmitError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    document.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Pick an icon deterministically from the title.
pub fn icon_for_title(title: &str) -> &'static str {
    let digest = Sha256::digest(title.as_bytes());
    let value = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    ICONS[value as usize % ICONS.len()]
}

/// Rewrite the front matter of `index_path` so that `features` holds `feature`,
/// replacing any entry with the same link. The page body is kept as is.
pub fn upsert_feature(index_path: &Path, feature: &Feature) -> Result<(), EmitError> {
    let content = fs::read_to_string(index_path).map_err(EmitError::io(index_path))?;
    let invalid = |reason: String| EmitError::Frontmatter {
        path: index_path.to_path_buf(),
        reason,
    };

    let (front, body) = split_front_matter(&content)
        .ok_or_else(|| invalid("expected front matter between '---' markers".into()))?;

    let mut matter = match serde_yaml::from_str::<Value>(front).map_err(|e| invalid(e.to_string()))? {
        Value::Mapping(mapping) => mapping,
        Value::Null => Mapping::new(),
        _ => return Err(invalid("front matter is not a mapping".into())),
    };

    let entry = serde_yaml::to_value(feature).map_err(|e| invalid(e.to_string()))?;
    let features = matter
        .entry(Value::from("features"))
        .or_insert_with(|| Value::Sequence(Vec::new()));
    let Value::Sequence(list) = features else {
        return Err(invalid("'features' is not a list".into()));
    };

    let existing = list
        .iter()
        .position(|f| f.get("link").and_then(Value::as_str) == Some(feature.link.as_str()));
    match existing {
        Some(index) => list[index] = entry,
        None => list.push(entry),
    }

    let rendered = serde_yaml::to_string(&matter).map_err(|e| invalid(e.to_string()))?;
    write_file(index_path, &format!("---\n{rendered}---\n{body}"))?;
    info!(index = %index_path.display(), link = %feature.link, "updated index features");
    Ok(())
}

/// Split `---\n<front>\n---\n<body>` into front matter and body. Both markers
/// must be a line of exactly `---`.
fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    let content = content.trim_start();
    let is_marker = |line: &str| line.trim_end_matches(['\r', '\n']) == "---";

    let mut lines = content.split_inclusive('\n');
    let opening = lines.next()?;
    if !is_marker(opening) || !opening.ends_with('\n') {
        return None;
    }

    let start = opening.len();
    let mut offset = start;
    for line in lines {
        if is_marker(line) {
            let body = content[offset + line.len()..].trim_start_matches(['\r', '\n']);
            return Some((&content[start..offset], body));
        }
        offset += line.len();
    }
    None
}

fn write_file(path: &Path, content: &str) -> Result<(), EmitError> {
    fs::write(path, content).map_err(EmitError::io(path))
}
