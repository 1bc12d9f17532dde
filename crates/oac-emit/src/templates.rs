//! Page templates for the VitePress output.
//!
//! Titles are written as JSON strings, which YAML front matter accepts as
//! double-quoted scalars.

/// Values substituted into every page.
#[derive(Debug, Clone)]
pub struct PageContext<'a> {
    pub title: &'a str,
    pub file_prefix: &'a str,
}

impl PageContext<'_> {
    fn quoted_title(&self) -> String {
        serde_json::to_string(self.title).unwrap_or_else(|_| String::from("\"\""))
    }

    fn spec_file(&self) -> String {
        format!("{}spec.json", self.file_prefix)
    }
}

/// `[tag].md`: one page per tag, rendered by `vitepress-openapi`.
pub fn tag_page(ctx: &PageContext<'_>) -> String {
    format!(
        r#"---
aside: false
outline: false
title: {title}
---

<script setup lang="ts">
import {{ useRoute, useData }} from 'vitepress';
import spec from './{spec}';

const route = useRoute();
const {{ isDark }} = useData();

const tag = route.data.params.tag
</script>

<OASpec :spec="spec" :tags="[tag]" :isDark="isDark" hide-info hide-servers hide-paths-summary />
"#,
        title = ctx.quoted_title(),
        spec = ctx.spec_file(),
    )
}

/// `[tag].paths.js`: enumerates the tag pages at build time.
pub fn tag_paths_loader(ctx: &PageContext<'_>) -> String {
    format!(
        r#"import {{ usePaths }} from 'vitepress-openapi'
import spec from './{spec}' assert {{ type: 'json' }}

export default {{
    paths() {{
        return usePaths({{ spec }})
            .getTags()
            .map(({{ name }}) => {{
                return {{
                    params: {{
                        tag: name,
                        pageTitle: name
                    }},
                }}
            }})
    }},
}}
"#,
        spec = ctx.spec_file(),
    )
}

pub fn introduction_page(ctx: &PageContext<'_>) -> String {
    format!(
        r#"---
layout: doc
title: {title}
---

<script setup lang="ts">
import spec from './{spec}';
</script>

<OAIntroduction :spec="spec" />
"#,
        title = ctx.quoted_title(),
        spec = ctx.spec_file(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_page_imports_prefixed_spec() {
        let page = tag_page(&PageContext {
            title: "Users API",
            file_prefix: "users-",
        });
        assert!(page.starts_with("---\naside: false\n"));
        assert!(page.contains("title: \"Users API\"\n"));
        assert!(page.contains("import spec from './users-spec.json';"));
        assert!(page.contains(":tags=\"[tag]\""));
    }

    #[test]
    fn titles_are_quoted_for_front_matter() {
        let page = introduction_page(&PageContext {
            title: "Orders: \"v2\"",
            file_prefix: "",
        });
        assert!(page.contains(r#"title: "Orders: \"v2\"""#));
        assert!(page.contains("<OAIntroduction :spec=\"spec\" />"));
    }

    #[test]
    fn paths_loader_keeps_braces() {
        let js = tag_paths_loader(&PageContext {
            title: "",
            file_prefix: "",
        });
        assert!(js.contains("import spec from './spec.json' assert { type: 'json' }"));
        assert!(js.contains("export default {\n    paths() {"));
    }
}
