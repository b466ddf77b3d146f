//! Cross reference rewriting over the comrak syntax tree.

use comrak::Arena;
use comrak::nodes::{Ast, AstNode, NodeLink, NodeValue};
use std::cell::RefCell;
use std::ops::Range;

use crate::xref::{LinkNode, RawInline, RewritesInlineContent};

/// Scheme CommonMark sees in a `<doc:...>` marker.
const DOC_SCHEME: &str = "doc:";

/// Opening of a marker left in plain text.
const MARKER_START: &str = "<doc:";

/// Offers every raw inline node of a document to the rewriter.
///
/// Walks the tree once. Inline HTML nodes are offered as is. CommonMark
/// parses `<doc:Name>` as a URI autolink, so an autolink whose url starts
/// with `doc:` is offered as the raw text it was written as. Explicit links
/// like `[text](doc:Name)` are never offered.
///
/// Markers CommonMark cannot read as an autolink, such as
/// `<doc:Getting Started>` or `<doc:a<b>`, end up split across text and
/// inline HTML nodes. Each run of such sibling nodes is scanned as one
/// string; a span from `<doc:` (starting in text) to the first `>` is
/// offered as a raw element and, when accepted, the run is rebuilt around
/// the new link.
///
/// Nodes the rewriter declines are left untouched. Replaced nodes become
/// links with a single text child carrying the label and keep their
/// original source position.
///
/// # Arguments
///
/// * `arena`: Arena owning the document nodes
/// * `root`: Document root returned by comrak
/// * `rewriter`: Filter deciding replacements
///
/// # Returns
///
/// Number of nodes replaced
pub fn rewrite_cross_references<'a>(
    arena: &'a Arena<AstNode<'a>>,
    root: &'a AstNode<'a>,
    rewriter: &dyn RewritesInlineContent,
) -> usize {
    // Collect first: replacement appends children while we walk
    let nodes: Vec<&'a AstNode<'a>> = root.descendants().collect();
    let mut replaced = 0;

    for &node in &nodes {
        let Some(raw) = raw_inline_text(node) else {
            continue;
        };

        if let Some(link) = rewriter.try_rewrite(&RawInline::html(&raw)) {
            replace_with_link(arena, node, link);
            replaced += 1;
        }
    }

    for parent in nodes.into_iter().filter(|node| accepts_links(node)) {
        let children: Vec<&'a AstNode<'a>> = parent.children().collect();
        for run in children.split(|child| literal_piece(child).is_none()) {
            replaced += rewrite_run(arena, run, rewriter);
        }
    }

    replaced
}

/// Literal source of a node that may hold part of a marker.
struct Piece {
    text: String,
    /// Inline HTML rather than text
    raw: bool,
}

fn literal_piece(node: &AstNode<'_>) -> Option<Piece> {
    match &node.data.borrow().value {
        NodeValue::Text(text) => Some(Piece {
            text: text.clone(),
            raw: false,
        }),
        NodeValue::HtmlInline(html) => Some(Piece {
            text: html.clone(),
            raw: true,
        }),
        _ => None,
    }
}

/// Links never nest, so link and image contents are not scanned.
fn accepts_links(node: &AstNode<'_>) -> bool {
    !matches!(
        node.data.borrow().value,
        NodeValue::Link(_) | NodeValue::Image(_)
    )
}

/// Replaces markers inside a run of adjacent text and inline HTML nodes.
///
/// # Returns
///
/// Number of markers replaced
fn rewrite_run<'a>(
    arena: &'a Arena<AstNode<'a>>,
    run: &[&'a AstNode<'a>],
    rewriter: &dyn RewritesInlineContent,
) -> usize {
    let Some(&first) = run.first() else {
        return 0;
    };

    let pieces: Vec<Piece> = run.iter().filter_map(|node| literal_piece(node)).collect();
    let mut combined = String::new();
    let mut bounds = Vec::with_capacity(pieces.len());
    for piece in &pieces {
        let start = combined.len();
        combined.push_str(&piece.text);
        bounds.push(start..combined.len());
    }

    let starts_in_text = |offset: usize| {
        bounds
            .iter()
            .zip(&pieces)
            .any(|(range, piece)| !piece.raw && range.contains(&offset))
    };

    let mut markers = Vec::new();
    let mut pos = 0;
    while let Some(found) = combined[pos..].find(MARKER_START) {
        let start = pos + found;
        let Some(len) = combined[start..].find('>') else {
            break;
        };
        let end = start + len + 1;

        let link = starts_in_text(start)
            .then(|| rewriter.try_rewrite(&RawInline::html(&combined[start..end])))
            .flatten();
        match link {
            Some(link) => {
                markers.push((start..end, link));
                pos = end;
            }
            None => pos = start + MARKER_START.len(),
        }
    }

    if markers.is_empty() {
        return 0;
    }

    let position = first.data.borrow().sourcepos.start;
    let insert = |value: NodeValue| {
        let node: &'a AstNode<'a> = arena.alloc(AstNode::new(RefCell::new(Ast::new(value, position))));
        first.insert_before(node);
        node
    };

    // Pieces outside markers keep their kind only when left whole
    let emit_literal = |range: Range<usize>| {
        for (bound, piece) in bounds.iter().zip(&pieces) {
            let start = range.start.max(bound.start);
            let end = range.end.min(bound.end);
            if start >= end {
                continue;
            }

            let text = combined[start..end].to_string();
            if piece.raw && start == bound.start && end == bound.end {
                insert(NodeValue::HtmlInline(text));
            } else {
                insert(NodeValue::Text(text));
            }
        }
    };

    let count = markers.len();
    let mut cursor = 0;
    for (range, link) in markers {
        emit_literal(cursor..range.start);
        let node = insert(NodeValue::Link(NodeLink {
            url: link.target,
            title: String::new(),
        }));
        node.append(arena.alloc(AstNode::new(RefCell::new(Ast::new(
            NodeValue::Text(link.label),
            position,
        )))));
        cursor = range.end;
    }
    emit_literal(cursor..combined.len());

    for node in run {
        node.detach();
    }

    count
}

/// Returns the raw HTML text a node was written as, if it is raw inline content.
fn raw_inline_text(node: &AstNode<'_>) -> Option<String> {
    let ast = node.data.borrow();

    match &ast.value {
        NodeValue::HtmlInline(html) => Some(html.clone()),
        NodeValue::Link(link) if is_doc_autolink(node, &link.url) => {
            Some(format!("<{}>", link.url))
        }
        _ => None,
    }
}

/// Autolinks render their url verbatim as the only child.
fn is_doc_autolink(node: &AstNode<'_>, url: &str) -> bool {
    if !url.starts_with(DOC_SCHEME) {
        return false;
    }

    let Some(child) = node.first_child() else {
        return false;
    };

    if child.next_sibling().is_some() {
        return false;
    }

    matches!(&child.data.borrow().value, NodeValue::Text(text) if text == url)
}

fn replace_with_link<'a>(arena: &'a Arena<AstNode<'a>>, node: &'a AstNode<'a>, link: LinkNode) {
    let start = node.data.borrow().sourcepos.start;

    let children: Vec<_> = node.children().collect();
    for child in children {
        child.detach();
    }

    node.data.borrow_mut().value = NodeValue::Link(NodeLink {
        url: link.target,
        title: String::new(),
    });

    let label = arena.alloc(AstNode::new(RefCell::new(Ast::new(
        NodeValue::Text(link.label),
        start,
    ))));
    node.append(label);
}
