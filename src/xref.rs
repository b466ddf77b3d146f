//! Cross reference rewriting for `<doc:Identifier>` markers.
//!
//! Documentation sources link to sibling pages with a compact marker,
//! `<doc:GettingStarted>`, instead of spelling out the generated file name.
//! This module recognizes the marker inside raw inline content and turns it
//! into a link pointing at `GettingStarted.html`. It holds no state and
//! performs no I/O, so the same rewriter can serve any number of documents.

/// Prefix every marker starts with.
const MARKER_PREFIX: &str = "<doc:";

/// Suffix appended to identifiers to form the output file name.
const TARGET_SUFFIX: &str = ".html";

/// Format tag of raw inline content eligible for rewriting.
pub const HTML_FORMAT: &str = "html";

/// Raw inline content as seen by a document conversion engine.
///
/// Borrowed from the surrounding document tree. Rewriters only inspect it;
/// the engine keeps the original node when no replacement is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawInline<'a> {
    pub format: &'a str,
    pub text: &'a str,
}

impl<'a> RawInline<'a> {
    pub fn new(format: &'a str, text: &'a str) -> Self {
        Self { format, text }
    }

    /// Raw inline HTML, the only format markers are recognized in.
    pub fn html(text: &'a str) -> Self {
        Self::new(HTML_FORMAT, text)
    }
}

/// Hyperlink produced in place of a recognized marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkNode {
    /// Link target relative to the directory of the rendered page
    pub target: String,
    /// Visible link text
    pub label: String,
}

/// Per node filter invoked by a conversion engine during traversal.
///
/// Implementations receive each raw inline node once and return either a
/// replacement link or `None`, meaning the original node stays in the tree
/// untouched.
pub trait RewritesInlineContent {
    fn try_rewrite(&self, node: &RawInline<'_>) -> Option<LinkNode>;
}

/// Rewrites `<doc:Identifier>` markers into links to `Identifier.html`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocLinkRewriter;

impl RewritesInlineContent for DocLinkRewriter {
    fn try_rewrite(&self, node: &RawInline<'_>) -> Option<LinkNode> {
        let identifier = parse_marker(node)?;

        Some(LinkNode {
            target: link_target(identifier),
            label: identifier.to_string(),
        })
    }
}

/// Extracts the identifier of a cross reference marker.
///
/// Only nodes tagged `"html"` are inspected. The text must start with
/// `<doc:`; the identifier is everything up to the first `>`, so
/// `<doc:A><doc:B>` yields `A`. Text after that `>` does not influence the
/// result. An unterminated marker is not a match.
///
/// # Arguments
///
/// * `node`: Raw inline node to inspect
///
/// # Returns
///
/// Identifier borrowed from the node text, or None when the node holds no marker
pub fn parse_marker<'a>(node: &RawInline<'a>) -> Option<&'a str> {
    if node.format != HTML_FORMAT {
        return None;
    }

    let rest = node.text.strip_prefix(MARKER_PREFIX)?;
    let end = rest.find('>')?;

    Some(&rest[..end])
}

/// Maps an identifier to the output file it names.
///
/// No escaping or existence check happens here: identifiers mirror the
/// base names of generated pages, so `Chapter1/Intro` becomes
/// `Chapter1/Intro.html`.
pub fn link_target(identifier: &str) -> String {
    format!("{}{}", identifier, TARGET_SUFFIX)
}
