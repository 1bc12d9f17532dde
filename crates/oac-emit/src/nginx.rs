//! Nginx `location` blocks, one per path.

use std::fmt::Write as _;

use oac_spec::{Document, HttpMethod, PathItem};

/// Directives shared by every location, after `proxy_pass`.
const PROXY_DIRECTIVES: &str = r#"
    # Basic proxy headers
    proxy_set_header Host $host;
    proxy_set_header X-Real-IP $remote_addr;
    proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
    proxy_set_header X-Forwarded-Proto $scheme;
    proxy_set_header X-Original-URI $request_uri;

    # Caller identity
    proxy_set_header X-User-Token $http_authorization;
    proxy_set_header X-CSRF-TOKEN $http_x_csrf_token;
    proxy_set_header X-Client-IP $http_x_client_ip;

    # Timeouts
    proxy_connect_timeout 60s;
    proxy_send_timeout 60s;
    proxy_read_timeout 60s;

    # Buffer settings
    proxy_buffering on;
    proxy_buffer_size 16k;
    proxy_buffers 8 16k;
    proxy_busy_buffers_size 32k;

    # HTTP/1.1 support
    proxy_http_version 1.1;
    proxy_set_header Connection "";

    # Error handling
    proxy_intercept_errors on;
    proxy_next_upstream error timeout http_500 http_502 http_503 http_504;

    # Security headers
    add_header Cache-Control "private, no-cache, no-store, must-revalidate";
    add_header Pragma no-cache;
    add_header X-Content-Type-Options nosniff;
    add_header X-XSS-Protection "1; mode=block";
    add_header Strict-Transport-Security "max-age=31536000; includeSubDomains" always;

    # Remove Server header
    proxy_hide_header Server;
    proxy_hide_header X-Powered-By;
"#;

/// Everything needed to render one `location` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub path: String,
    pub methods: Vec<HttpMethod>,
    /// `METHOD: summary` lines, in method order.
    pub summaries: Vec<String>,
    /// `METHOD: description` lines, in method order.
    pub descriptions: Vec<String>,
    pub server_url: String,
    /// Stripped from the request URI before proxying, e.g. `/v1`. May be empty.
    pub prefix: String,
}

impl RouteDescriptor {
    pub fn new(path: &str, item: &PathItem, server_url: &str, common_prefix: &str) -> Self {
        let mut methods = Vec::new();
        let mut summaries = Vec::new();
        let mut descriptions = Vec::new();

        for (method, operation) in item.operations() {
            methods.push(method);
            if let Some(summary) = &operation.summary {
                summaries.push(format!("{method}: {summary}"));
            }
            if let Some(description) = &operation.description {
                descriptions.push(format!("{method}: {description}"));
            }
        }

        Self {
            path: path.to_string(),
            methods,
            summaries,
            descriptions,
            server_url: server_url.to_string(),
            prefix: route_prefix(common_prefix),
        }
    }

    /// Methods as listed by `limit_except`.
    pub fn allow_methods(&self) -> String {
        self.methods
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// `v1`, `/v1` and `/v1/` all become `/v1`; empty stays empty.
pub fn route_prefix(common_prefix: &str) -> String {
    let trimmed = common_prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

pub fn render_location(route: &RouteDescriptor) -> String {
    let mut out = String::new();
    for summary in &route.summaries {
        let _ = writeln!(out, "# Summary: {summary}");
    }
    for description in &route.descriptions {
        let _ = writeln!(out, "# Description: {}", single_line(description));
    }

    let _ = writeln!(out, "location {} {{", route.path);
    if !route.methods.is_empty() {
        let _ = writeln!(out, "    limit_except {} {{", route.allow_methods());
        out.push_str("        deny all;\n    }\n");
    }
    out.push('\n');
    let _ = writeln!(out, "    rewrite ^{}/(.*) /$1 break;", route.prefix);
    let _ = writeln!(out, "    proxy_pass {};", route.server_url);
    out.push_str(PROXY_DIRECTIVES);
    out.push('}');
    out
}

/// All location blocks for `document`, in path order, separated by a blank line.
pub fn nginx_configuration(document: &Document, common_prefix: &str) -> String {
    let server_url = document.server_url().unwrap_or_default();
    document
        .paths
        .iter()
        .map(|(path, item)| render_location(&RouteDescriptor::new(path, item, server_url, common_prefix)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Multi-line descriptions would break out of the comment.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
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
      description: |
        Returns every user,
        paginated.
    post:
      operationId: createUser
      summary: Create a user
  /v1/users/{id}:
    delete:
      operationId: deleteUser
"#;

    fn doc() -> Document {
        Document::from_yaml(DOC).unwrap()
    }

    #[test]
    fn descriptor_collects_methods_in_order() {
        let doc = doc();
        let route = RouteDescriptor::new(
            "/v1/users",
            &doc.paths["/v1/users"],
            "http://users.internal:8080",
            "v1",
        );
        assert_eq!(route.methods, vec![HttpMethod::Get, HttpMethod::Post]);
        assert_eq!(route.allow_methods(), "GET POST");
        assert_eq!(
            route.summaries,
            vec!["GET: List users", "POST: Create a user"]
        );
        assert_eq!(route.descriptions.len(), 1);
        assert_eq!(route.prefix, "/v1");
    }

    #[test]
    fn location_block_has_routing_directives() {
        let doc = doc();
        let route = RouteDescriptor::new(
            "/v1/users",
            &doc.paths["/v1/users"],
            "http://users.internal:8080",
            "/v1/",
        );
        let block = render_location(&route);

        assert!(block.starts_with("# Summary: GET: List users\n# Summary: POST: Create a user\n"));
        assert!(block.contains("# Description: GET: Returns every user, paginated.\n"));
        assert!(block.contains("location /v1/users {\n    limit_except GET POST {\n        deny all;\n    }\n"));
        assert!(block.contains("    rewrite ^/v1/(.*) /$1 break;\n"));
        assert!(block.contains("    proxy_pass http://users.internal:8080;\n"));
        assert!(block.contains("proxy_hide_header X-Powered-By;"));
        assert!(block.ends_with("proxy_hide_header X-Powered-By;\n}"));
    }

    #[test]
    fn empty_prefix_rewrites_from_root() {
        let route = RouteDescriptor::new("/health", &PathItem::default(), "http://x", "");
        let block = render_location(&route);
        assert!(block.contains("rewrite ^/(.*) /$1 break;"));
        assert!(!block.contains("limit_except"));
    }

    #[test]
    fn configuration_joins_blocks_in_path_order() {
        let config = nginx_configuration(&doc(), "v1");
        assert_eq!(config.matches("location ").count(), 2);
        assert!(config.contains("proxy_hide_header X-Powered-By;\n}\n\nlocation /v1/users/{id} {"));

        let first = config.find("location /v1/users {").unwrap();
        let second = config.find("location /v1/users/{id} {").unwrap();
        assert!(first < second);
        assert!(config.contains("limit_except DELETE {"));
    }
}
