//! Landing page cleanup.
//!
//! The converted landing page of a documentation set carries converter
//! leftovers: citation spans, an empty "Topics" heading, section headings one
//! level too deep, and paragraphs holding nothing but scaffolding braces.

use anyhow::Result;

use super::dom::{self, Handle};

/// Paragraph bodies, whitespace removed, left behind by directive blocks.
const SCAFFOLD_PARAGRAPHS: &[&str] = &["{}", "(scope:global){(disabled)(disabled)(disabled)}"];

/// Applies landing page cleanup rules to a serialized page.
///
/// # Returns
///
/// Cleaned document and number of edits made
///
/// # Errors
///
/// Returns error if the cleaned tree cannot be serialized
pub fn clean_landing_page(html: &str) -> Result<(String, usize)> {
    let document = dom::parse_html(html);
    let edits = clean_document(&document);
    Ok((dom::serialize_html(&document)?, edits))
}

/// Applies landing page cleanup rules to a parsed page.
///
/// # Returns
///
/// Number of edits made
pub(super) fn clean_document(document: &Handle) -> usize {
    let citations = remove_where(document, "span", |span| {
        dom::attribute(span, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == "citation"))
    });

    let topics = remove_where(document, "h2", |heading| {
        dom::attribute(heading, "id").as_deref() == Some("topics")
            && dom::text_content(heading).trim() == "Topics"
    });

    let headings = dom::find_elements(document, "h3")
        .iter()
        .filter(|heading| dom::rename_element(heading, "h2").is_some())
        .count();

    let paragraphs = remove_where(document, "p", |paragraph| {
        let compact: String = dom::text_content(paragraph).split_whitespace().collect();
        SCAFFOLD_PARAGRAPHS.contains(&compact.as_str())
    });

    citations + topics + headings + paragraphs
}

/// Detaches matching elements, counting only those still in the tree.
fn remove_where<F>(document: &Handle, name: &str, matches: F) -> usize
where
    F: Fn(&Handle) -> bool,
{
    dom::find_elements(document, name)
        .iter()
        .filter(|element| matches(element) && dom::detach(element))
        .count()
}
