//! Markdown rendering with cross reference rewriting.
//!
//! Documents are parsed with comrak (GitHub Flavored Markdown extensions),
//! raw inline nodes are offered to a [`RewritesInlineContent`] filter, and
//! the resulting tree is serialized to HTML with syntect highlighted code
//! blocks.
//!
//! [`RewritesInlineContent`]: crate::xref::RewritesInlineContent

mod links;
mod renderer;

pub use links::rewrite_cross_references;
pub(crate) use renderer::HIGHLIGHT_PREFIX;
pub use renderer::{MarkdownRenderer, RenderedDocument};
