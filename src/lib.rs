//! Markdown documentation builder with `<doc:...>` cross references.

mod assets;
mod config;
pub mod fixer;
mod markdown;
mod page;
mod path;
mod site;
pub mod xref;

pub use assets::{copy_dir, highlight_css, write_css_assets};
pub use config::{BuildArgs, Command, Config, FixArgs, FixLinksArgs};
pub use fixer::{FixOptions, FixReport, HtmlIndex, ImageRule, MissingTarget, fix_links};
pub use markdown::{MarkdownRenderer, RenderedDocument, rewrite_cross_references};
pub use page::page_wrapper;
pub use path::{output_path, relative_href};
pub use site::{BuildOptions, BuildSummary, DEFAULT_THEME, build};
pub use xref::{DocLinkRewriter, LinkNode, RawInline, RewritesInlineContent};
