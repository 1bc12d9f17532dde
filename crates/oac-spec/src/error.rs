use std::path::PathBuf;

use thiserror::Error;

use crate::model::{ComponentKind, HttpMethod};

/// Errors produced while loading and resolving a document.
#[derive(Debug, Error)]
pub enum SpecError {
    /// A document or referenced fragment could not be read.
    #[error("failed to read {}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document or referenced fragment is not valid YAML of the expected shape.
    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An external reference leads back to a file that is still being resolved.
    #[error("circular $ref: {chain}")]
    CircularReference { chain: String },

    /// Schema nesting exceeds the configured depth.
    #[error("schema nesting exceeds {max_depth} levels in {}", path.display())]
    SchemaTooDeep { path: PathBuf, max_depth: usize },

    /// Two different files would be registered under the same component name.
    #[error(
        "component name collision: #/components/{kind}/{name} is already taken by {existing}, cannot register {}",
        incoming.display()
    )]
    ComponentNameCollision {
        kind: ComponentKind,
        name: String,
        existing: String,
        incoming: PathBuf,
    },

    /// Any of the above, annotated with where in the document it happened.
    #[error("{context}")]
    Context {
        context: String,
        #[source]
        source: Box<SpecError>,
    },
}

impl SpecError {
    /// Wrap this error with a location such as `path '/users'` or `GET`.
    pub fn within(self, context: impl Into<String>) -> Self {
        SpecError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping every `Context` layer.
    pub fn root(&self) -> &SpecError {
        match self {
            SpecError::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Errors produced while flattening `allOf` compositions.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A member of the composition references a component that does not exist.
    #[error("cannot dereference {0} while merging allOf")]
    UnresolvedReference(String),
}

/// A document that loaded and resolved but is not fit for conversion.
#[derive(Debug, Error)]
#[error("file '{}': {kind}", file.display())]
pub struct ValidationError {
    pub file: PathBuf,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    /// The field or location that failed, e.g. `info.description`.
    pub fn field(&self) -> String {
        self.kind.field()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationErrorKind {
    #[error("missing info section")]
    MissingInfo,

    #[error("missing required field {0}")]
    MissingField(&'static str),

    #[error("no servers defined")]
    MissingServers,

    #[error("missing required field servers[0].url")]
    MissingServerUrl,

    #[error("no paths defined")]
    NoPaths,

    #[error("empty path")]
    EmptyPath,

    #[error("path '{0}' does not start with '/'")]
    PathMissingSlash(String),

    #[error("path '{0}' has no segment after the leading '/'")]
    PathWithoutSegment(String),

    #[error("path '{0}' needs a summary and description on the path or on one of its operations")]
    MissingPathDocumentation(String),

    #[error("path '{path}': {method} operation has no operationId")]
    MissingOperationId { path: String, method: HttpMethod },
}

impl ValidationErrorKind {
    pub fn field(&self) -> String {
        match self {
            Self::MissingInfo => "info".into(),
            Self::MissingField(field) => (*field).into(),
            Self::MissingServers => "servers".into(),
            Self::MissingServerUrl => "servers[0].url".into(),
            Self::NoPaths | Self::EmptyPath => "paths".into(),
            Self::PathMissingSlash(path)
            | Self::PathWithoutSegment(path)
            | Self::MissingPathDocumentation(path) => format!("paths.{path}"),
            Self::MissingOperationId { path, method } => {
                format!("paths.{path}.{}.operationId", method.as_str().to_lowercase())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn chain(err: &dyn Error) -> String {
        let mut out = err.to_string();
        let mut source = err.source();
        while let Some(inner) = source {
            out.push_str(": ");
            out.push_str(&inner.to_string());
            source = inner.source();
        }
        out
    }

    #[test]
    fn context_chain_renders_outer_to_inner() {
        let err = SpecError::CircularReference {
            chain: "a.yaml -> b.yaml -> a.yaml".into(),
        }
        .within("property 'owner'")
        .within("path '/pets'");

        assert_eq!(err.to_string(), "path '/pets'");
        assert_eq!(
            chain(&err),
            "path '/pets': property 'owner': circular $ref: a.yaml -> b.yaml -> a.yaml"
        );
        assert!(matches!(err.root(), SpecError::CircularReference { .. }));
    }

    #[test]
    fn each_layer_renders_only_itself() {
        let err = SpecError::Load {
            path: PathBuf::from("schemas/user.yaml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        }
        .within("response '200'")
        .within("GET");

        let rendered = chain(&err);
        assert_eq!(
            rendered,
            "GET: response '200': failed to read schemas/user.yaml: not found"
        );
        assert_eq!(rendered.matches("schemas/user.yaml").count(), 1);
    }

    #[test]
    fn load_error_names_the_file() {
        let err = SpecError::Load {
            path: PathBuf::from("schemas/user.yaml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("schemas/user.yaml"));
    }

    #[test]
    fn validation_error_names_file_and_field() {
        let err = ValidationError {
            file: PathBuf::from("specs/users.yaml"),
            kind: ValidationErrorKind::MissingField("info.description"),
        };
        assert_eq!(err.field(), "info.description");
        assert_eq!(
            err.to_string(),
            "file 'specs/users.yaml': missing required field info.description"
        );
    }

    #[test]
    fn operation_id_field_uses_lowercase_method() {
        let kind = ValidationErrorKind::MissingOperationId {
            path: "/users".into(),
            method: HttpMethod::Post,
        };
        assert_eq!(kind.field(), "paths./users.post.operationId");
    }
}
