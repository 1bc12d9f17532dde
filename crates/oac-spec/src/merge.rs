//! `allOf` flattening.

use tracing::debug;

use crate::error::MergeError;
use crate::model::{Components, Document, HttpMethod, Schema};

/// Flatten an `allOf` list into a single schema.
///
/// The first member is the base. Later members overlay their properties (last
/// write wins), append their required fields (duplicates kept) and replace the
/// type when they declare one. Members carrying a reference are dereferenced
/// through `components` first.
pub fn merge_all_of(
    schemas: &[Schema],
    components: &Components,
) -> Result<Option<Schema>, MergeError> {
    let Some((first, rest)) = schemas.split_first() else {
        return Ok(None);
    };

    let base = deref(first, components)?;
    let mut merged = Schema {
        schema_type: base.schema_type.clone(),
        description: base.description.clone(),
        required: base.required.clone(),
        properties: base.properties.clone(),
        ..Schema::default()
    };

    for schema in rest {
        let schema = deref(schema, components)?;
        for (name, property) in &schema.properties {
            merged.properties.insert(name.clone(), property.clone());
        }
        merged.required.extend(schema.required.iter().cloned());
        if let Some(schema_type) = schema.schema_type.as_ref().filter(|t| !t.is_empty()) {
            merged.schema_type = Some(schema_type.clone());
        }
    }

    Ok(Some(merged))
}

/// Replace every response content schema that carries an `allOf` with its
/// flattened form. Returns how many schemas were replaced.
pub fn merge_responses_inline(document: &mut Document) -> Result<usize, MergeError> {
    let Document {
        paths, components, ..
    } = document;

    let mut replaced = 0;
    for (path, item) in paths.iter_mut() {
        for method in HttpMethod::ALL {
            let Some(operation) = item.operation_mut(method) else {
                continue;
            };
            for response in operation.responses.values_mut() {
                for media in response.content.values_mut() {
                    let Some(schema) = media.schema.as_mut() else {
                        continue;
                    };
                    if schema.all_of.is_empty() {
                        continue;
                    }
                    if let Some(merged) = merge_all_of(&schema.all_of, components)? {
                        *schema = merged;
                        replaced += 1;
                    }
                }
            }
            debug!(path = %path, method = %method, "merged allOf response schemas");
        }
    }
    Ok(replaced)
}

fn deref<'s>(schema: &'s Schema, components: &'s Components) -> Result<&'s Schema, MergeError> {
    match schema.reference.as_deref() {
        Some(reference) => components
            .schema(reference)
            .ok_or_else(|| MergeError::UnresolvedReference(reference.to_string())),
        None => Ok(schema),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn object(props: &[(&str, &str)], required: &[&str]) -> Schema {
        Schema {
            schema_type: Some("object".into()),
            properties: props
                .iter()
                .map(|(name, ty)| (name.to_string(), Schema::typed(*ty)))
                .collect(),
            required: required.iter().map(|r| r.to_string()).collect(),
            ..Schema::default()
        }
    }

    #[test]
    fn empty_list_is_noop() {
        let merged = merge_all_of(&[], &Components::default()).unwrap();
        assert!(merged.is_none());
    }

    #[test]
    fn later_properties_win_and_required_concatenates() {
        let base = object(&[("id", "string")], &["id"]);
        let extra = object(&[("id", "integer"), ("name", "string")], &["id", "name"]);

        let merged = merge_all_of(&[base, extra], &Components::default())
            .unwrap()
            .unwrap();

        assert_eq!(
            merged.properties["id"].schema_type.as_deref(),
            Some("integer")
        );
        assert_eq!(
            merged.properties["name"].schema_type.as_deref(),
            Some("string")
        );
        assert_eq!(merged.required, vec!["id", "id", "name"]);
    }

    #[test]
    fn last_declared_type_wins() {
        let base = object(&[], &[]);
        let untyped = Schema::default();
        let typed = Schema::typed("array");

        let merged = merge_all_of(&[base.clone(), untyped], &Components::default())
            .unwrap()
            .unwrap();
        assert_eq!(merged.schema_type.as_deref(), Some("object"));

        let merged = merge_all_of(&[base, typed], &Components::default())
            .unwrap()
            .unwrap();
        assert_eq!(merged.schema_type.as_deref(), Some("array"));
    }

    #[test]
    fn references_are_dereferenced_through_components() {
        let mut components = Components::default();
        components.schemas.insert(
            "Base".into(),
            Schema {
                description: Some("base entity".into()),
                ..object(&[("id", "string")], &["id"])
            },
        );

        let merged = merge_all_of(
            &[
                Schema::reference("#/components/schemas/Base"),
                object(&[("name", "string")], &[]),
            ],
            &components,
        )
        .unwrap()
        .unwrap();

        assert_eq!(merged.description.as_deref(), Some("base entity"));
        assert!(merged.properties.contains_key("id"));
        assert!(merged.properties.contains_key("name"));
        assert!(merged.reference.is_none());
    }

    #[test]
    fn dangling_reference_is_an_error() {
        let err = merge_all_of(
            &[Schema::reference("#/components/schemas/Missing")],
            &Components::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("#/components/schemas/Missing"));
    }

    #[test]
    fn response_schemas_are_replaced_in_place() {
        let doc_yaml = r##"
components:
  schemas:
    Base:
      type: object
      properties:
        id:
          type: string
paths:
  /pets:
    get:
      operationId: listPets
      responses:
        "200":
          content:
            application/json:
              schema:
                allOf:
                  - $ref: "#/components/schemas/Base"
                  - properties:
                      name:
                        type: string
        "404":
          content:
            application/json:
              schema:
                type: object
"##;
        let mut doc = Document::from_yaml(doc_yaml).unwrap();

        let replaced = merge_responses_inline(&mut doc).unwrap();
        assert_eq!(replaced, 1);

        let responses: &BTreeMap<_, _> = &doc.paths["/pets"].get.as_ref().unwrap().responses;
        let merged = responses["200"].content["application/json"]
            .schema
            .as_ref()
            .unwrap();
        assert!(merged.all_of.is_empty());
        assert_eq!(merged.schema_type.as_deref(), Some("object"));
        assert_eq!(merged.properties.len(), 2);
    }
}
