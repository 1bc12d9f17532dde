//! OpenAPI document model and multi-file `$ref` resolution.
//!
//! Reads YAML/JSON OpenAPI documents, follows references that leave the
//! current file, registers the loaded fragments as local components and
//! rewrites the references to `#/components/<type>/<name>`. Also provides
//! `allOf` flattening and the required-field checks a document must pass
//! before anything is emitted from it.

pub mod document;
pub mod error;
pub mod loader;
pub mod merge;
pub mod model;
pub mod reference;
pub mod registry;
pub mod resolver;
pub mod validate;

pub use document::ResolvedDocument;
pub use error::{MergeError, SpecError, ValidationError, ValidationErrorKind};
pub use loader::{FsLoader, MemoryLoader, SourceLoader};
pub use merge::{merge_all_of, merge_responses_inline};
pub use model::{
    ComponentKind, Components, Document, HttpMethod, Info, MediaType, Operation, Parameter,
    PathItem, RequestBody, Response, Schema, SecurityScheme, Server,
};
pub use reference::{is_external_ref, RefKind};
pub use registry::{ComponentRef, ReferenceRegistry};
pub use resolver::{resolve, ResolveOptions, Resolver, DEFAULT_MAX_DEPTH};
pub use validate::{validate, ValidationSummary};
