use gray_matter::{engine::YAML, Matter};
use pulldown_cmark::{html, Options, Parser};
use serde_json::{Map, Value};

use crate::error::CompileError;

/// Frontmatter plus the rendered body of one post.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPost {
    pub frontmatter: Map<String, Value>,
    pub html: String,
}

/// Turns raw markdown with a frontmatter block into structured metadata and
/// rendered output. Implementations must be pure so posts can compile in
/// parallel.
pub trait FrontmatterCompiler: Send + Sync {
    fn compile(&self, raw: &str) -> Result<CompiledPost, CompileError>;
}

/// YAML frontmatter through `gray_matter`, CommonMark body through `pulldown-cmark`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GrayMatterCompiler;

impl FrontmatterCompiler for GrayMatterCompiler {
    fn compile(&self, raw: &str) -> Result<CompiledPost, CompileError> {
        let matter = Matter::<YAML>::new();
        let parsed = matter
            .parse::<Value>(raw)
            .map_err(|e| CompileError::Malformed(e.to_string()))?;

        let frontmatter = match parsed.data {
            Some(Value::Object(map)) => map,
            Some(Value::Null) | None => return Err(CompileError::MissingFrontmatter),
            Some(_) => return Err(CompileError::NotAMapping),
        };

        Ok(CompiledPost {
            frontmatter,
            html: render_markdown_to_html(&parsed.content),
        })
    }
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options
}

pub fn render_markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, markdown_options());
    let mut html_out = String::new();
    html::push_html(&mut html_out, parser);
    html_out
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST: &str = "---\ntitle: Hello\ndate: 2024-03-01\nmetaDesc: A first post\ntags:\n  - rust\n---\n\n# Heading\n\n~~old~~ text\n";

    #[test]
    fn extracts_frontmatter_fields() {
        let compiled = GrayMatterCompiler.compile(POST).unwrap();
        assert_eq!(compiled.frontmatter["title"], "Hello");
        assert_eq!(compiled.frontmatter["date"], "2024-03-01");
        assert_eq!(compiled.frontmatter["metaDesc"], "A first post");
        assert_eq!(compiled.frontmatter["tags"], serde_json::json!(["rust"]));
    }

    #[test]
    fn renders_body_without_frontmatter() {
        let compiled = GrayMatterCompiler.compile(POST).unwrap();
        assert!(compiled.html.contains("<h1>Heading</h1>"));
        assert!(compiled.html.contains("<del>old</del>"));
        assert!(!compiled.html.contains("metaDesc"));
    }

    #[test]
    fn post_without_frontmatter_is_rejected() {
        let err = GrayMatterCompiler.compile("# Just a heading\n").unwrap_err();
        assert!(matches!(err, CompileError::MissingFrontmatter));
    }

    #[test]
    fn renders_tables() {
        let output = render_markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(output.contains("<table>"));
    }
}
