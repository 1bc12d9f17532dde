//! Required-field and documentation checks on a resolved document.

use std::path::Path;

use crate::error::{ValidationError, ValidationErrorKind};
use crate::model::{Document, PathItem};

/// Facts derived while validating, consumed by the emitters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    /// First path segment shared by every path, or empty when paths disagree.
    pub common_prefix: String,
}

/// Check `document` (read from `file`), stopping at the first violation.
pub fn validate(document: &Document, file: &Path) -> Result<ValidationSummary, ValidationError> {
    check(document).map_err(|kind| ValidationError {
        file: file.to_path_buf(),
        kind,
    })?;

    Ok(ValidationSummary {
        common_prefix: common_prefix(document.paths.keys().map(String::as_str)),
    })
}

fn check(document: &Document) -> Result<(), ValidationErrorKind> {
    let info = document
        .info
        .as_ref()
        .ok_or(ValidationErrorKind::MissingInfo)?;
    if info.title.is_empty() {
        return Err(ValidationErrorKind::MissingField("info.title"));
    }
    if info.description.is_empty() {
        return Err(ValidationErrorKind::MissingField("info.description"));
    }
    if info.version.is_empty() {
        return Err(ValidationErrorKind::MissingField("info.version"));
    }

    let server = document
        .servers
        .first()
        .ok_or(ValidationErrorKind::MissingServers)?;
    if server.url.is_empty() {
        return Err(ValidationErrorKind::MissingServerUrl);
    }

    if document.paths.is_empty() {
        return Err(ValidationErrorKind::NoPaths);
    }

    for (path, item) in &document.paths {
        check_path(path, item)?;
    }
    Ok(())
}

fn check_path(path: &str, item: &PathItem) -> Result<(), ValidationErrorKind> {
    if path.is_empty() {
        return Err(ValidationErrorKind::EmptyPath);
    }
    if !path.starts_with('/') {
        return Err(ValidationErrorKind::PathMissingSlash(path.to_string()));
    }
    if path.split('/').all(str::is_empty) {
        return Err(ValidationErrorKind::PathWithoutSegment(path.to_string()));
    }

    let documented = item.is_documented() || item.operations().any(|(_, op)| op.is_documented());
    if !documented {
        return Err(ValidationErrorKind::MissingPathDocumentation(
            path.to_string(),
        ));
    }

    for (method, operation) in item.operations() {
        let has_id = operation
            .operation_id
            .as_deref()
            .is_some_and(|id| !id.is_empty());
        if !has_id {
            return Err(ValidationErrorKind::MissingOperationId {
                path: path.to_string(),
                method,
            });
        }
    }
    Ok(())
}

/// First segment of the first path, kept only if every other path starts with it.
pub fn common_prefix<'a>(mut paths: impl Iterator<Item = &'a str>) -> String {
    let Some(first) = paths.next() else {
        return String::new();
    };
    let prefix = first_segment(first);
    if paths.all(|p| first_segment(p) == prefix) {
        prefix.to_string()
    } else {
        String::new()
    }
}

fn first_segment(path: &str) -> &str {
    path.trim_start_matches('/').split('/').next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
openapi: 3.0.3
info:
  title: Users
  description: User management
  version: 1.0.0
servers:
  - url: http://users.internal:8080
paths:
  /v1/users:
    get:
      operationId: listUsers
      summary: List users
      description: Returns every user
  /v1/orders:
    summary: Orders
    description: Order endpoints
    get:
      operationId: listOrders
"#;

    fn doc(yaml: &str) -> Document {
        Document::from_yaml(yaml).unwrap()
    }

    fn kind_of(yaml: &str) -> ValidationErrorKind {
        validate(&doc(yaml), Path::new("users.yaml")).unwrap_err().kind
    }

    #[test]
    fn accepts_a_complete_document() {
        let summary = validate(&doc(VALID), Path::new("users.yaml")).unwrap();
        assert_eq!(summary.common_prefix, "v1");
    }

    #[test]
    fn rejects_empty_description() {
        let yaml = VALID.replace("description: User management", "description: \"\"");
        let err = validate(&doc(&yaml), Path::new("specs/users.yaml")).unwrap_err();
        assert_eq!(err.field(), "info.description");
        assert!(err.to_string().contains("specs/users.yaml"));
    }

    #[test]
    fn rejects_missing_info_and_servers() {
        assert_eq!(
            kind_of("paths:\n  /a:\n    summary: a\n"),
            ValidationErrorKind::MissingInfo
        );

        let no_servers = VALID.replace("servers:\n  - url: http://users.internal:8080\n", "");
        assert_eq!(kind_of(&no_servers), ValidationErrorKind::MissingServers);

        let blank_url = VALID.replace("http://users.internal:8080", "\"\"");
        assert_eq!(kind_of(&blank_url), ValidationErrorKind::MissingServerUrl);
    }

    #[test]
    fn rejects_document_without_paths() {
        let yaml = "info:\n  title: t\n  description: d\n  version: '1'\nservers:\n  - url: http://x\n";
        assert_eq!(kind_of(yaml), ValidationErrorKind::NoPaths);
    }

    #[test]
    fn rejects_malformed_path_keys() {
        let bare = VALID.replace("/v1/orders:", "v1/orders:");
        assert_eq!(
            kind_of(&bare),
            ValidationErrorKind::PathMissingSlash("v1/orders".into())
        );

        let root = VALID.replace("/v1/orders:", "/:");
        assert_eq!(
            kind_of(&root),
            ValidationErrorKind::PathWithoutSegment("/".into())
        );
    }

    #[test]
    fn path_level_documentation_is_enough() {
        let yaml = VALID.replace(
            "      summary: List users\n      description: Returns every user\n",
            "",
        );
        let yaml = yaml.replace(
            "  /v1/users:\n",
            "  /v1/users:\n    summary: Users\n    description: User endpoints\n",
        );
        assert!(validate(&doc(&yaml), Path::new("users.yaml")).is_ok());
    }

    #[test]
    fn undocumented_path_is_rejected() {
        let yaml = VALID.replace(
            "      summary: List users\n      description: Returns every user\n",
            "      summary: List users\n",
        );
        assert_eq!(
            kind_of(&yaml),
            ValidationErrorKind::MissingPathDocumentation("/v1/users".into())
        );
    }

    #[test]
    fn every_operation_needs_an_id() {
        let yaml = VALID.replace("      operationId: listOrders\n", "      summary: no id\n");
        let err = validate(&doc(&yaml), Path::new("users.yaml")).unwrap_err();
        assert_eq!(err.field(), "paths./v1/orders.get.operationId");
    }

    #[test]
    fn common_prefix_requires_agreement() {
        assert_eq!(
            common_prefix(["/v1/users", "/v1/orders"].into_iter()),
            "v1"
        );
        assert_eq!(common_prefix(["/v1/users", "/v2/orders"].into_iter()), "");
        assert_eq!(common_prefix(std::iter::empty()), "");
    }
}
