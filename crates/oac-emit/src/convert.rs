//! The per-document conversion pipeline.
//!
//! load -> resolve references -> validate -> merge `allOf` (optional) ->
//! Nginx config (optional) -> VitePress docs (optional) -> index features (optional)

use std::fs;
use std::path::{Path, PathBuf};

use oac_spec::{FsLoader, ResolveOptions, ResolvedDocument, SourceLoader};
use tracing::{debug, info};

use crate::error::EmitError;
use crate::nginx::nginx_configuration;
use crate::vitepress::VitePressWriter;

/// What to produce for each input document.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Directory for `<stem>.conf.template` Nginx files.
    pub output_dir: Option<PathBuf>,
    /// Root of the VitePress API docs.
    pub docs_dir: Option<PathBuf>,
    /// VitePress `index.md` whose features list gets a card for each API.
    pub index_path: Option<PathBuf>,
    /// Prepended to generated doc file names.
    pub file_prefix: String,
    /// Overrides the prefix derived from the document's paths.
    pub common_prefix: Option<String>,
    pub write_introduction: bool,
    /// Flatten `allOf` response schemas before emitting.
    pub merge_responses_inline: bool,
    pub resolve: ResolveOptions,
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_docs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.docs_dir = Some(dir.into());
        self
    }

    pub fn with_index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_path = Some(path.into());
        self
    }

    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    pub fn with_common_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.common_prefix = Some(prefix.into());
        self
    }

    pub fn with_introduction(mut self, write_introduction: bool) -> Self {
        self.write_introduction = write_introduction;
        self
    }

    pub fn with_merge_responses_inline(mut self, merge: bool) -> Self {
        self.merge_responses_inline = merge;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.resolve.max_depth = max_depth;
        self
    }
}

/// Outcome of converting one document.
#[derive(Debug, Clone, Default)]
pub struct Conversion {
    pub input: PathBuf,
    /// Prefix used for the docs directory and the Nginx rewrite.
    pub common_prefix: String,
    /// Components created from external files.
    pub external_components: usize,
    /// Response schemas flattened from `allOf`.
    pub merged_schemas: usize,
    /// Every file written, in order.
    pub artifacts: Vec<PathBuf>,
    /// Index file updated with a feature card, if any.
    pub index_updated: Option<PathBuf>,
}

/// Runs the conversion pipeline with one set of options.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert the document at `input`, reading references from the filesystem.
    pub fn convert(&self, input: &Path) -> Result<Conversion, EmitError> {
        self.convert_with(input, &FsLoader)
    }

    pub fn convert_with<L: SourceLoader>(
        &self,
        input: &Path,
        loader: &L,
    ) -> Result<Conversion, EmitError> {
        let options = &self.options;

        let mut resolved = ResolvedDocument::load_with(input, loader, options.resolve)?;
        debug!(
            file = %input.display(),
            components = resolved.registry.len(),
            "resolved document"
        );

        let summary = resolved.validate()?;
        let common_prefix = options
            .common_prefix
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or(summary.common_prefix);

        let mut conversion = Conversion {
            input: input.to_path_buf(),
            common_prefix,
            external_components: resolved.registry.len(),
            ..Conversion::default()
        };

        if options.merge_responses_inline {
            conversion.merged_schemas = resolved.merge_responses_inline()?;
            info!(
                file = %input.display(),
                merged = conversion.merged_schemas,
                "merged response definitions"
            );
        }

        let document = &resolved.document;

        if let Some(output_dir) = &options.output_dir {
            fs::create_dir_all(output_dir).map_err(EmitError::io(output_dir))?;
            let target = output_dir.join(format!("{}.conf.template", file_stem(input)));
            let config = nginx_configuration(document, &conversion.common_prefix);
            fs::write(&target, config).map_err(EmitError::io(&target))?;
            info!(file = %target.display(), "generated Nginx config");
            conversion.artifacts.push(target);
        }

        let writer = options.docs_dir.as_ref().map(|docs| {
            VitePressWriter::new(docs, &conversion.common_prefix)
                .with_file_prefix(options.file_prefix.clone())
                .with_introduction(options.write_introduction)
        });

        if let Some(writer) = &writer {
            conversion.artifacts.extend(writer.write(document)?);
        }

        if let Some(index_path) = &options.index_path {
            let writer = writer.unwrap_or_else(|| {
                VitePressWriter::new("", &conversion.common_prefix)
                    .with_file_prefix(options.file_prefix.clone())
                    .with_introduction(options.write_introduction)
            });
            writer.update_index(index_path, document)?;
            conversion.index_updated = Some(index_path.clone());
        }

        Ok(conversion)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("openapi"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oac_spec::{MemoryLoader, SpecError};
    use tempfile::TempDir;

    const ROOT: &str = r#"
openapi: 3.0.3
info:
  title: Pets
  description: Pet store
  version: 1.0.0
servers:
  - url: http://pets.internal
paths:
  /v1/pets:
    get:
      operationId: listPets
      summary: List pets
      description: Every pet
      responses:
        "200":
          content:
            application/json:
              schema:
                allOf:
                  - $ref: ./schemas/pet.yaml
                  - properties:
                      tag:
                        type: string
  /v1/owners:
    post:
      operationId: createOwner
      summary: Create owner
      description: New owner
"#;

    fn loader() -> MemoryLoader {
        MemoryLoader::new()
            .with_file("api/pets.yaml", ROOT)
            .with_file(
                "api/schemas/pet.yaml",
                "type: object\nproperties:\n  id:\n    type: integer\n",
            )
    }

    #[test]
    fn converts_to_every_target() {
        let temp = TempDir::new().unwrap();
        let index = temp.path().join("index.md");
        fs::write(&index, "---\nlayout: home\n---\n").unwrap();

        let options = ConvertOptions::new()
            .with_output_dir(temp.path().join("nginx"))
            .with_docs_dir(temp.path().join("docs"))
            .with_index_path(&index)
            .with_introduction(true)
            .with_merge_responses_inline(true);

        let conversion = Converter::new(options)
            .convert_with(Path::new("api/pets.yaml"), &loader())
            .unwrap();

        assert_eq!(conversion.common_prefix, "v1");
        assert_eq!(conversion.external_components, 1);
        assert_eq!(conversion.merged_schemas, 1);
        assert_eq!(conversion.artifacts.len(), 5);
        assert_eq!(conversion.index_updated.as_deref(), Some(index.as_path()));

        let nginx = fs::read_to_string(temp.path().join("nginx/pets.conf.template")).unwrap();
        assert!(nginx.contains("location /v1/owners {"));
        assert!(nginx.contains("rewrite ^/v1/(.*) /$1 break;"));
        assert!(nginx.contains("proxy_pass http://pets.internal;"));

        let spec = fs::read_to_string(temp.path().join("docs/v1/spec.json")).unwrap();
        let spec: serde_json::Value = serde_json::from_str(&spec).unwrap();
        let schema = &spec["paths"]["/v1/pets"]["get"]["responses"]["200"]["content"]
            ["application/json"]["schema"];
        assert!(schema["allOf"].is_null());
        assert_eq!(schema["properties"]["id"]["type"], "integer");

        let index = fs::read_to_string(&index).unwrap();
        assert!(index.contains("link: /api/v1/introduction.md"));
    }

    #[test]
    fn explicit_common_prefix_wins() {
        let temp = TempDir::new().unwrap();
        let options = ConvertOptions::new()
            .with_docs_dir(temp.path())
            .with_common_prefix("pets");

        let conversion = Converter::new(options)
            .convert_with(Path::new("api/pets.yaml"), &loader())
            .unwrap();

        assert_eq!(conversion.common_prefix, "pets");
        assert!(temp.path().join("pets/spec.json").exists());
    }

    #[test]
    fn validation_failure_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let loader = MemoryLoader::new()
            .with_file(
                "api/pets.yaml",
                ROOT.replace("description: Pet store", "description: \"\""),
            )
            .with_file(
                "api/schemas/pet.yaml",
                "type: object\nproperties:\n  id:\n    type: integer\n",
            );
        let options = ConvertOptions::new().with_output_dir(temp.path().join("nginx"));

        let err = Converter::new(options)
            .convert_with(Path::new("api/pets.yaml"), &loader)
            .unwrap_err();

        match err {
            EmitError::Validation(e) => assert_eq!(e.field(), "info.description"),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(!temp.path().join("nginx").exists());
    }

    #[test]
    fn missing_reference_aborts_the_document() {
        let loader = MemoryLoader::new().with_file("api/pets.yaml", ROOT);
        let err = Converter::default()
            .convert_with(Path::new("api/pets.yaml"), &loader)
            .unwrap_err();

        let EmitError::Spec(spec) = err else {
            panic!("expected spec error");
        };
        assert!(matches!(spec.root(), SpecError::Load { .. }));
        assert!(spec.root().to_string().contains("api/schemas/pet.yaml"));
    }
}
