//! External `$ref` resolution.
//!
//! Walks a document depth-first, loads every fragment referenced outside the
//! current file and rewrites schema references to local components:
//!
//! ```text
//! properties:                         properties:
//!   owner:                              owner:
//!     $ref: ./schemas/user.yaml   =>      $ref: "#/components/schemas/user"
//! ```
//!
//! Schemas are deduplicated by resolved file path through the
//! [`ReferenceRegistry`]. Operations, parameters, request bodies and responses
//! referenced from other files are spliced in place, and relative references
//! inside them resolve against the file they were loaded from.
//!
//! Resolution is a single pass. A reference back to a file that is still being
//! resolved fails with [`SpecError::CircularReference`], and schema nesting is
//! bounded by [`ResolveOptions::max_depth`].

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::SpecError;
use crate::loader::SourceLoader;
use crate::model::{
    ComponentKind, Components, Document, HttpMethod, MediaType, Operation, Parameter, PathItem,
    RequestBody, Response, Schema, SecurityScheme,
};
use crate::reference::{component_name, is_external_ref, normalize, resolve_ref_path};
use crate::registry::ReferenceRegistry;

/// Default maximum schema nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Options for reference resolution.
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// Maximum schema nesting depth, counted across files.
    pub max_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Objects that may stand in for a definition stored in another file.
trait Referencing {
    fn reference(&self) -> Option<&str>;
}

macro_rules! impl_referencing {
    ($($ty:ty),*) => {
        $(impl Referencing for $ty {
            fn reference(&self) -> Option<&str> {
                self.reference.as_deref()
            }
        })*
    };
}

impl_referencing!(Operation, Parameter, RequestBody, Response, SecurityScheme);

/// Resolves external references for one conversion run.
pub struct Resolver<'a, L: SourceLoader> {
    loader: &'a L,
    options: ResolveOptions,
    registry: ReferenceRegistry,
    /// Files whose schemas are being resolved, outermost first.
    loading: Vec<PathBuf>,
    /// Schemas imported from external files, by component name.
    imported: BTreeMap<String, Schema>,
    /// Component schemas authored inline in the document.
    authored: BTreeSet<String>,
}

impl<'a, L: SourceLoader> Resolver<'a, L> {
    pub fn new(loader: &'a L) -> Self {
        Self {
            loader,
            options: ResolveOptions::default(),
            registry: ReferenceRegistry::new(),
            loading: Vec::new(),
            imported: BTreeMap::new(),
            authored: BTreeSet::new(),
        }
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve every external reference in `document`, which was read from `path`.
    ///
    /// Returns the registry of components created for external files.
    pub fn resolve_document(
        mut self,
        document: &mut Document,
        path: &Path,
    ) -> Result<ReferenceRegistry, SpecError> {
        let root = normalize(path);
        let Document {
            components, paths, ..
        } = document;

        self.loading.push(root.clone());

        self.resolve_components(components, &root)
            .map_err(|e| e.within("components"))?;

        for (key, item) in paths.iter_mut() {
            self.resolve_path_item(item, &root)
                .map_err(|e| e.within(format!("path '{key}'")))?;
        }

        for (name, schema) in std::mem::take(&mut self.imported) {
            components.schemas.entry(name).or_insert(schema);
        }

        info!(
            file = %root.display(),
            components = self.registry.len(),
            "resolved external references"
        );
        Ok(self.registry)
    }

    fn resolve_components(
        &mut self,
        components: &mut Components,
        anchor: &Path,
    ) -> Result<(), SpecError> {
        // External component schemas are registered before parameters and paths
        // resolve so every reference to the same file lands on the authored key.
        let mut external = BTreeMap::new();
        for (key, schema) in &components.schemas {
            match external_ref(schema.reference.as_deref()) {
                Some(reference) => {
                    let target = resolve_ref_path(anchor, &reference);
                    self.registry
                        .register_named(ComponentKind::Schemas, &target, key);
                    external.insert(key.clone(), target);
                }
                None => {
                    self.authored.insert(key.clone());
                }
            }
        }

        for (key, scheme) in components.security_schemes.iter_mut() {
            let Some(reference) = external_ref(scheme.reference.as_deref()) else {
                continue;
            };
            let (loaded, target) = self
                .load_fragment::<SecurityScheme>(anchor, &reference)
                .map_err(|e| e.within(format!("securitySchemes '{key}'")))?;
            self.registry
                .register_named(ComponentKind::SecuritySchemes, &target, key);
            *scheme = loaded;
        }

        for (key, param) in components.parameters.iter_mut() {
            if let Some(reference) = external_ref(param.reference.as_deref()) {
                let target = resolve_ref_path(anchor, &reference);
                self.registry
                    .register_named(ComponentKind::Parameters, &target, key);
            }
            self.resolve_parameter(param, anchor)
                .map_err(|e| e.within(format!("parameters '{key}'")))?;
        }

        for (key, schema) in components.schemas.iter_mut() {
            let result = match external.get(key) {
                Some(target) => self.load_component_schema(target).map(|loaded| {
                    *schema = loaded;
                }),
                None => self.resolve_schema(schema, anchor, 0),
            };
            result.map_err(|e| e.within(format!("schemas '{key}'")))?;
        }
        Ok(())
    }

    fn load_component_schema(&mut self, target: &Path) -> Result<Schema, SpecError> {
        self.ensure_not_loading(target)?;
        let mut loaded: Schema = self.loader.load(target)?;
        self.loading.push(target.to_path_buf());
        let result = self.resolve_schema(&mut loaded, target, 0);
        self.loading.pop();
        result.map(|()| loaded)
    }

    fn resolve_path_item(&mut self, item: &mut PathItem, anchor: &Path) -> Result<(), SpecError> {
        for (i, param) in item.parameters.iter_mut().enumerate() {
            self.resolve_parameter(param, anchor)
                .map_err(|e| e.within(format!("parameters[{i}]")))?;
        }

        for method in HttpMethod::ALL {
            let Some(operation) = item.operation_mut(method) else {
                continue;
            };
            self.resolve_operation(operation, method, anchor)
                .map_err(|e| e.within(method.as_str()))?;
        }
        Ok(())
    }

    fn resolve_operation(
        &mut self,
        operation: &mut Operation,
        method: HttpMethod,
        anchor: &Path,
    ) -> Result<(), SpecError> {
        let mut anchor = anchor.to_path_buf();
        if let Some(reference) = external_ref(operation.reference.as_deref()) {
            let (loaded, target) = self.load_fragment::<Operation>(&anchor, &reference)?;
            *operation = loaded;
            operation.method = Some(method);
            anchor = target;
        }

        for (i, param) in operation.parameters.iter_mut().enumerate() {
            self.resolve_parameter(param, &anchor)
                .map_err(|e| e.within(format!("parameters[{i}]")))?;
        }

        if let Some(body) = operation.request_body.as_mut() {
            self.resolve_request_body(body, &anchor)
                .map_err(|e| e.within("requestBody"))?;
        }

        for (code, response) in operation.responses.iter_mut() {
            self.resolve_response(response, &anchor)
                .map_err(|e| e.within(format!("response '{code}'")))?;
        }
        Ok(())
    }

    fn resolve_parameter(&mut self, param: &mut Parameter, anchor: &Path) -> Result<(), SpecError> {
        let mut anchor = anchor.to_path_buf();
        if let Some(reference) = external_ref(param.reference.as_deref()) {
            let (loaded, target) = self.load_fragment::<Parameter>(&anchor, &reference)?;
            *param = loaded;
            anchor = target;
        }
        if let Some(schema) = param.schema.as_mut() {
            self.resolve_schema(schema, &anchor, 0)
                .map_err(|e| e.within("schema"))?;
        }
        Ok(())
    }

    fn resolve_request_body(
        &mut self,
        body: &mut RequestBody,
        anchor: &Path,
    ) -> Result<(), SpecError> {
        let mut anchor = anchor.to_path_buf();
        if let Some(reference) = external_ref(body.reference.as_deref()) {
            let (loaded, target) = self.load_fragment::<RequestBody>(&anchor, &reference)?;
            *body = loaded;
            anchor = target;
        }
        self.resolve_content(&mut body.content, &anchor)
    }

    fn resolve_response(&mut self, response: &mut Response, anchor: &Path) -> Result<(), SpecError> {
        let mut anchor = anchor.to_path_buf();
        if let Some(reference) = external_ref(response.reference.as_deref()) {
            let (loaded, target) = self.load_fragment::<Response>(&anchor, &reference)?;
            *response = loaded;
            anchor = target;
        }
        self.resolve_content(&mut response.content, &anchor)
    }

    fn resolve_content(
        &mut self,
        content: &mut BTreeMap<String, MediaType>,
        anchor: &Path,
    ) -> Result<(), SpecError> {
        for (media_type, media) in content.iter_mut() {
            if let Some(schema) = media.schema.as_mut() {
                self.resolve_schema(schema, anchor, 0)
                    .map_err(|e| e.within(format!("content '{media_type}'")))?;
            }
        }
        Ok(())
    }

    /// Resolve one schema node and everything below it.
    fn resolve_schema(
        &mut self,
        schema: &mut Schema,
        anchor: &Path,
        depth: usize,
    ) -> Result<(), SpecError> {
        if depth > self.options.max_depth {
            return Err(SpecError::SchemaTooDeep {
                path: anchor.to_path_buf(),
                max_depth: self.options.max_depth,
            });
        }

        if let Some(reference) = external_ref(schema.reference.as_deref()) {
            let target = resolve_ref_path(anchor, &reference);
            let identifier = self.import_schema(&target, depth)?;
            schema.reference = Some(identifier);
        }

        for (name, property) in schema.properties.iter_mut() {
            self.resolve_schema(property, anchor, depth + 1)
                .map_err(|e| e.within(format!("property '{name}'")))?;
        }

        if let Some(items) = schema.items.as_deref_mut() {
            self.resolve_schema(items, anchor, depth + 1)
                .map_err(|e| e.within("items"))?;
        }

        for (keyword, children) in [
            ("allOf", &mut schema.all_of),
            ("oneOf", &mut schema.one_of),
            ("anyOf", &mut schema.any_of),
        ] {
            for (i, child) in children.iter_mut().enumerate() {
                self.resolve_schema(child, anchor, depth + 1)
                    .map_err(|e| e.within(format!("{keyword}[{i}]")))?;
            }
        }
        Ok(())
    }

    /// Turn an external schema file into a component, returning its identifier.
    fn import_schema(&mut self, target: &Path, depth: usize) -> Result<String, SpecError> {
        self.ensure_not_loading(target)?;
        if let Some(existing) = self.registry.get(target) {
            return Ok(existing.identifier.clone());
        }

        let mut loaded: Schema = self.loader.load(target)?;
        self.ensure_name_available(&component_name(target), target)?;
        let component = self.registry.register(ComponentKind::Schemas, target);
        debug!(
            file = %target.display(),
            identifier = %component.identifier,
            "registered external schema"
        );

        self.loading.push(target.to_path_buf());
        let result = self.resolve_schema(&mut loaded, target, depth + 1);
        self.loading.pop();
        result.map_err(|e| e.within(target.display().to_string()))?;

        self.imported.insert(component.name, loaded);
        Ok(component.identifier)
    }

    /// Load a non-schema fragment, following chained external references.
    fn load_fragment<T>(&mut self, anchor: &Path, reference: &str) -> Result<(T, PathBuf), SpecError>
    where
        T: DeserializeOwned + Referencing,
    {
        let mut target = resolve_ref_path(anchor, reference);
        let mut hops: Vec<PathBuf> = Vec::new();
        loop {
            self.ensure_not_loading(&target)?;
            if hops.contains(&target) {
                hops.push(target);
                return Err(SpecError::CircularReference {
                    chain: render_chain(&hops),
                });
            }

            let fragment: T = self.loader.load(&target)?;
            debug!(file = %target.display(), "loaded external fragment");

            let next = fragment
                .reference()
                .filter(|r| is_external_ref(r))
                .map(|r| resolve_ref_path(&target, r));
            match next {
                Some(next) => {
                    hops.push(std::mem::replace(&mut target, next));
                }
                None => return Ok((fragment, target)),
            }
        }
    }

    fn ensure_not_loading(&self, target: &Path) -> Result<(), SpecError> {
        match self.loading.iter().position(|p| p == target) {
            Some(start) => {
                let mut chain = self.loading[start..].to_vec();
                chain.push(target.to_path_buf());
                Err(SpecError::CircularReference {
                    chain: render_chain(&chain),
                })
            }
            None => Ok(()),
        }
    }

    fn ensure_name_available(&self, name: &str, target: &Path) -> Result<(), SpecError> {
        let existing = if self.authored.contains(name) {
            Some("a schema defined in the document".to_string())
        } else {
            self.registry
                .lookup(ComponentKind::Schemas, name)
                .filter(|c| c.file_path != target)
                .map(|c| c.file_path.display().to_string())
        };
        match existing {
            Some(existing) => Err(SpecError::ComponentNameCollision {
                kind: ComponentKind::Schemas,
                name: name.to_string(),
                existing,
                incoming: target.to_path_buf(),
            }),
            None => Ok(()),
        }
    }
}

/// Resolve `document` (read from `path`) with default options.
pub fn resolve<L: SourceLoader>(
    document: &mut Document,
    path: &Path,
    loader: &L,
) -> Result<ReferenceRegistry, SpecError> {
    Resolver::new(loader).resolve_document(document, path)
}

fn external_ref(reference: Option<&str>) -> Option<String> {
    reference.filter(|r| is_external_ref(r)).map(str::to_string)
}

fn render_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
