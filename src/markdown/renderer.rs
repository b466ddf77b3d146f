//! Markdown to HTML conversion.

use anyhow::{Context, Result};
use comrak::nodes::{AstNode, NodeHeading, NodeValue};
use comrak::{Arena, Options, format_html, parse_document};
use std::path::Path;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use super::rewrite_cross_references;
use crate::xref::{DocLinkRewriter, RewritesInlineContent};

/// CSS class prefix of highlighted code spans.
pub(crate) const HIGHLIGHT_PREFIX: &str = "hljs-";

/// Opening of a fenced code block carrying a language.
const CODE_OPEN: &str = "<code class=\"language-";

/// Output of rendering one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    /// HTML fragment (no document wrapper)
    pub html: String,
    /// Plain text of the first level 1 heading
    pub title: Option<String>,
    /// Number of raw nodes replaced by the rewriter
    pub cross_references: usize,
}

/// Renders markdown to HTML with GitHub Flavored Markdown extensions.
///
/// Provides tables, strikethrough, autolinks, task lists, footnotes and
/// description lists. Raw HTML passes through. When configured with a
/// rewriter, raw inline content is offered to it while the document tree is
/// built, before serialization. Fenced code blocks are highlighted with
/// syntect using CSS classes.
pub struct MarkdownRenderer<'a> {
    options: Options<'a>,
    syntax_set: SyntaxSet,
    rewriter: Option<Box<dyn RewritesInlineContent + Send + Sync>>,
}

impl<'a> MarkdownRenderer<'a> {
    /// Creates renderer with GitHub Flavored Markdown options and no rewriter.
    pub fn new() -> Self {
        let mut options = Options::default();

        // Extension options (GFM features)
        options.extension.strikethrough = true;
        options.extension.table = true;
        options.extension.autolink = true;
        options.extension.tasklist = true;
        options.extension.footnotes = true;
        options.extension.description_lists = true;

        options.parse.smart = true;

        // Documentation sources are trusted and embed raw HTML
        options.render.unsafe_ = true;

        Self {
            options,
            syntax_set: SyntaxSet::load_defaults_newlines(),
            rewriter: None,
        }
    }

    /// Creates renderer that rewrites `<doc:Name>` markers into links.
    pub fn with_doc_links() -> Self {
        Self::with_rewriter(DocLinkRewriter)
    }

    /// Creates renderer with a custom raw content filter.
    ///
    /// # Arguments
    ///
    /// * `rewriter`: Filter invoked once per raw inline node
    pub fn with_rewriter(rewriter: impl RewritesInlineContent + Send + Sync + 'static) -> Self {
        let mut renderer = Self::new();
        renderer.rewriter = Some(Box::new(rewriter));
        renderer
    }

    /// Renders markdown content to an HTML fragment.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or syntax highlighting fails
    pub fn render(&self, content: &str) -> Result<String> {
        Ok(self.render_document(content)?.html)
    }

    /// Renders markdown content and reports document metadata.
    ///
    /// # Arguments
    ///
    /// * `content`: Markdown source
    ///
    /// # Returns
    ///
    /// Rendered fragment, document title and rewrite count
    ///
    /// # Errors
    ///
    /// Returns error if serialization or syntax highlighting fails
    pub fn render_document(&self, content: &str) -> Result<RenderedDocument> {
        let arena = Arena::new();
        let root = parse_document(&arena, content, &self.options);

        let cross_references = match &self.rewriter {
            Some(rewriter) => rewrite_cross_references(&arena, root, rewriter.as_ref()),
            None => 0,
        };

        let title = first_heading_text(root);

        let mut buffer = Vec::with_capacity(content.len() * 2);
        format_html(root, &self.options, &mut buffer).context("Failed to serialize HTML")?;
        let html = String::from_utf8(buffer).context("Rendered HTML is not valid UTF8")?;

        Ok(RenderedDocument {
            html: self.highlight_code_blocks(&html)?,
            title,
            cross_references,
        })
    }

    /// Reads and renders a markdown file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or rendering fails
    pub fn render_file(&self, path: impl AsRef<Path>) -> Result<RenderedDocument> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read markdown file {}", path.display()))?;
        self.render_document(&content)
    }

    /// Replaces the content of `<code class="language-X">` blocks with
    /// syntect output.
    ///
    /// comrak escapes block content, so it is decoded before highlighting.
    /// Blocks without a closing tag are copied unchanged.
    fn highlight_code_blocks(&self, html: &str) -> Result<String> {
        let mut result = String::with_capacity(html.len());
        let mut last_end = 0;
        let mut search_pos = 0;

        while let Some(found) = html[search_pos..].find(CODE_OPEN) {
            let code_start = search_pos + found;
            let lang_start = code_start + CODE_OPEN.len();

            let Some(lang_len) = html[lang_start..].find('"') else {
                search_pos = lang_start;
                continue;
            };
            let lang_end = lang_start + lang_len;
            let language = &html[lang_start..lang_end];

            let Some(tag_len) = html[lang_end..].find('>') else {
                search_pos = lang_end;
                continue;
            };
            let content_start = lang_end + tag_len + 1;

            let Some(content_len) = html[content_start..].find("</code>") else {
                search_pos = content_start;
                continue;
            };
            let content_end = content_start + content_len;

            let decoded = html_decode(&html[content_start..content_end]);
            let highlighted = self
                .highlight_code(&decoded, language)
                .with_context(|| format!("Failed to highlight {} code block", language))?;

            result.push_str(&html[last_end..code_start]);
            result.push_str(CODE_OPEN);
            result.push_str(language);
            result.push_str("\">");
            result.push_str(&highlighted);
            result.push_str("</code>");

            last_end = content_end + "</code>".len();
            search_pos = last_end;
        }

        result.push_str(&html[last_end..]);
        Ok(result)
    }

    /// Highlights code with CSS classes prefixed `hljs-`.
    ///
    /// Unknown languages fall back to escaped plain text.
    fn highlight_code(&self, code: &str, language: &str) -> Result<String> {
        if code.is_empty() {
            return Ok(String::new());
        }

        let syntax = self
            .syntax_set
            .find_syntax_by_token(language)
            .or_else(|| self.syntax_set.find_syntax_by_extension(language));

        let Some(syntax) = syntax else {
            return Ok(html_escape(code));
        };

        let mut generator = ClassedHTMLGenerator::new_with_class_style(
            syntax,
            &self.syntax_set,
            ClassStyle::SpacedPrefixed {
                prefix: HIGHLIGHT_PREFIX,
            },
        );

        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .context("Failed to parse line for syntax highlighting")?;
        }

        Ok(generator.finalize())
    }
}

impl<'a> Default for MarkdownRenderer<'a> {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain text of the first level 1 heading, if any.
fn first_heading_text<'a>(root: &'a AstNode<'a>) -> Option<String> {
    let heading = root.descendants().find(|node| {
        matches!(
            node.data.borrow().value,
            NodeValue::Heading(NodeHeading { level: 1, .. })
        )
    })?;

    let mut text = String::new();
    for node in heading.descendants() {
        match &node.data.borrow().value {
            NodeValue::Text(t) => text.push_str(t),
            NodeValue::Code(code) => text.push_str(&code.literal),
            NodeValue::SoftBreak | NodeValue::LineBreak => text.push(' '),
            _ => {}
        }
    }

    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn html_decode(html: &str) -> String {
    html.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xref::{LinkNode, RawInline};

    #[test]
    fn test_render_basic_markdown() {
        // Arrange
        let renderer = MarkdownRenderer::new();
        let markdown = "# Hello\n\nThis is **bold** text.";

        // Act
        let html = renderer.render(markdown).expect("Should render markdown");

        // Assert
        assert!(html.contains("<h1>"), "Should contain h1 tag");
        assert!(html.contains("Hello"), "Should contain heading text");
        assert!(html.contains("<strong>bold</strong>"), "Should contain bold text");
    }

    #[test]
    fn test_render_gfm_tables() {
        // Arrange
        let renderer = MarkdownRenderer::new();
        let markdown = "| Header 1 | Header 2 |\n|----------|----------|\n| Cell 1   | Cell 2   |\n";

        // Act
        let html = renderer.render(markdown).expect("Should render table");

        // Assert
        assert!(html.contains("<table>"), "Should contain table tag");
        assert!(html.contains("<th>Header 1</th>"), "Should contain header: {}", html);
        assert!(html.contains("<td>Cell 1</td>"), "Should contain cell: {}", html);
    }

    #[test]
    fn test_doc_marker_rewritten() {
        // Arrange
        let renderer = MarkdownRenderer::with_doc_links();

        // Act
        let doc = renderer
            .render_document("Start with <doc:GettingStarted>.")
            .expect("Should render");

        // Assert
        assert_eq!(doc.cross_references, 1);
        assert!(
            doc.html
                .contains("<a href=\"GettingStarted.html\">GettingStarted</a>"),
            "Should contain rewritten link: {}",
            doc.html
        );
    }

    #[test]
    fn test_doc_marker_nested_identifier() {
        // Arrange
        let renderer = MarkdownRenderer::with_doc_links();

        // Act
        let html = renderer
            .render("See <doc:Chapter1/Intro>")
            .expect("Should render");

        // Assert
        assert!(
            html.contains("<a href=\"Chapter1/Intro.html\">Chapter1/Intro</a>"),
            "Slashes should pass through: {}",
            html
        );
    }

    #[test]
    fn test_doc_marker_with_spaces() {
        // Arrange
        let renderer = MarkdownRenderer::with_doc_links();

        // Act
        let doc = renderer
            .render_document("See <doc:Getting Started> now.")
            .expect("Should render");

        // Assert
        assert_eq!(doc.cross_references, 1);
        assert!(
            doc.html
                .contains("<a href=\"Getting%20Started.html\">Getting Started</a> now."),
            "{}",
            doc.html
        );
        assert!(!doc.html.contains("&lt;doc:"), "{}", doc.html);
    }

    #[test]
    fn test_doc_marker_containing_angle_bracket() {
        // Arrange
        let renderer = MarkdownRenderer::with_doc_links();

        // Act
        let doc = renderer
            .render_document("Compare <doc:a<b> here")
            .expect("Should render");

        // Assert
        assert_eq!(doc.cross_references, 1);
        assert!(doc.html.contains(">a&lt;b</a> here"), "{}", doc.html);
        assert!(!doc.html.contains("<b>"), "No raw tag leaks: {}", doc.html);
    }

    #[test]
    fn test_doc_marker_without_rewriter() {
        // Arrange
        let renderer = MarkdownRenderer::new();

        // Act
        let doc = renderer
            .render_document("See <doc:GettingStarted>")
            .expect("Should render");

        // Assert
        assert_eq!(doc.cross_references, 0);
        assert!(
            !doc.html.contains("GettingStarted.html"),
            "Markers untouched without rewriter: {}",
            doc.html
        );
    }

    #[test]
    fn test_custom_rewriter() {
        // Arrange
        struct Keys;
        impl RewritesInlineContent for Keys {
            fn try_rewrite(&self, node: &RawInline<'_>) -> Option<LinkNode> {
                node.text.starts_with("<kbd>").then(|| LinkNode {
                    target: "keys.html".to_string(),
                    label: "KEYS".to_string(),
                })
            }
        }
        let renderer = MarkdownRenderer::with_rewriter(Keys);

        // Act
        let html = renderer.render("Press <kbd>Tab").expect("Should render");

        // Assert
        assert!(html.contains("<a href=\"keys.html\">KEYS</a>"), "{}", html);
    }

    #[test]
    fn test_render_document_title() {
        // Arrange
        let renderer = MarkdownRenderer::new();

        // Act
        let doc = renderer
            .render_document("Intro line\n\n# The `Swift` Language\n\n# Second")
            .expect("Should render");

        // Assert
        assert_eq!(doc.title.as_deref(), Some("The Swift Language"));
    }

    #[test]
    fn test_render_document_without_title() {
        // Arrange
        let renderer = MarkdownRenderer::new();

        // Act
        let doc = renderer
            .render_document("## Only a subheading")
            .expect("Should render");

        // Assert
        assert_eq!(doc.title, None);
    }

    #[test]
    fn test_render_code_blocks() {
        // Arrange
        let renderer = MarkdownRenderer::new();
        let markdown = "```rust\nfn main() {\n    println!(\"hello\");\n}\n```\n";

        // Act
        let html = renderer.render(markdown).expect("Should render code block");

        // Assert
        assert!(html.contains("<pre>"), "Should contain pre tag: {}", html);
        assert!(
            html.contains("<code class=\"language-rust\">"),
            "Should keep language class: {}",
            html
        );
        assert!(
            html.contains("<span class=\"hljs-"),
            "Should contain highlighting spans: {}",
            html
        );
        assert!(html.contains("println!"), "Should contain code");
    }

    #[test]
    fn test_highlight_unknown_language() {
        // Arrange
        let renderer = MarkdownRenderer::new();
        let markdown = "```unknownlang\nsome <code>\n```\n";

        // Act
        let html = renderer.render(markdown).expect("Should render");

        // Assert
        assert!(
            html.contains("<code class=\"language-unknownlang\">"),
            "Should preserve language class"
        );
        assert!(
            html.contains("some &lt;code&gt;"),
            "Should escape plain text: {}",
            html
        );
    }

    #[test]
    fn test_marker_inside_code_block_untouched() {
        // Arrange
        let renderer = MarkdownRenderer::with_doc_links();
        let markdown = "```\n<doc:Foo>\n```\n";

        // Act
        let doc = renderer.render_document(markdown).expect("Should render");

        // Assert
        assert_eq!(doc.cross_references, 0);
        assert!(doc.html.contains("&lt;doc:Foo&gt;"), "{}", doc.html);
    }

    #[test]
    fn test_render_html_passthrough() {
        // Arrange
        let renderer = MarkdownRenderer::with_doc_links();

        // Act
        let html = renderer
            .render("<div class=\"note\">\n\nKeep me\n\n</div>\n")
            .expect("Should render");

        // Assert
        assert!(html.contains("<div class=\"note\">"), "{}", html);
        assert!(html.contains("Keep me"), "{}", html);
    }

    #[test]
    fn test_render_empty_markdown() {
        // Arrange
        let renderer = MarkdownRenderer::default();

        // Act
        let doc = renderer.render_document("").expect("Should render");

        // Assert
        assert!(doc.html.is_empty());
        assert_eq!(doc.title, None);
    }

    #[test]
    fn test_html_decode_escape_inverse() {
        let text = "a < b && c > \"d\" 'e'";
        assert_eq!(html_decode(&html_escape(text)), text);
    }
}
