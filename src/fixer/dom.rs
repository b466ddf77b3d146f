//! Reference counted HTML tree built by html5ever.
//!
//! Pages are parsed the way a browser would read them, so quoting style,
//! attribute case and character references in the source do not matter.
//! The tree supports the few edits the fixer makes: attribute updates,
//! element removal and renaming. It serializes back with html5ever.

use anyhow::{Context, Result};
use html5ever::serialize::{Serialize, SerializeOpts, Serializer, TraversalScope, serialize};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, LocalName, ParseOpts, QualName, ns, parse_document};
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::io;
use std::rc::{Rc, Weak};

/// Shared reference to a tree node.
pub type Handle = Rc<Node>;

pub enum NodeData {
    Document,
    Doctype {
        name: String,
    },
    Text {
        contents: RefCell<String>,
    },
    Comment {
        contents: String,
    },
    Element {
        name: QualName,
        attrs: RefCell<Vec<Attribute>>,
    },
    ProcessingInstruction {
        target: String,
        contents: String,
    },
}

pub struct Node {
    pub data: NodeData,
    parent: Cell<Option<Weak<Node>>>,
    pub children: RefCell<Vec<Handle>>,
}

impl Node {
    fn new(data: NodeData) -> Handle {
        Rc::new(Self {
            data,
            parent: Cell::new(None),
            children: RefCell::new(Vec::new()),
        })
    }

    /// Local name of an element node.
    pub fn local_name(&self) -> Option<&str> {
        match &self.data {
            NodeData::Element { name, .. } => Some(name.local.as_ref()),
            _ => None,
        }
    }
}

/// Parses a complete HTML document.
///
/// Parsing never fails: malformed markup is repaired the way browsers
/// repair it.
pub fn parse_html(html: &str) -> Handle {
    parse_document(DomSink::new(), ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
}

/// Serializes a document back to HTML.
///
/// # Errors
///
/// Returns error if the serializer produces invalid UTF-8
pub fn serialize_html(document: &Handle) -> Result<String> {
    let mut bytes = Vec::new();
    serialize(
        &mut bytes,
        &SerializableNode(document.clone()),
        SerializeOpts::default(),
    )
    .context("Failed to serialize HTML")?;

    String::from_utf8(bytes).context("Serialized HTML is not UTF-8")
}

/// Every element with the given local name, in document order.
pub fn find_elements(handle: &Handle, name: &str) -> Vec<Handle> {
    let mut found = Vec::new();
    collect_elements(handle, name, &mut found);
    found
}

fn collect_elements(handle: &Handle, name: &str, found: &mut Vec<Handle>) {
    if handle.local_name() == Some(name) {
        found.push(handle.clone());
    }

    for child in handle.children.borrow().iter() {
        collect_elements(child, name, found);
    }
}

/// Decoded value of an attribute.
pub fn attribute(handle: &Handle, name: &str) -> Option<String> {
    let NodeData::Element { attrs, .. } = &handle.data else {
        return None;
    };

    attrs
        .borrow()
        .iter()
        .find(|attr| attr.name.local.as_ref() == name)
        .map(|attr| attr.value.to_string())
}

/// Replaces the value of an existing attribute, or adds it.
pub fn set_attribute(handle: &Handle, name: &str, value: &str) {
    let NodeData::Element { attrs, .. } = &handle.data else {
        return;
    };

    let mut attrs = attrs.borrow_mut();
    if let Some(attr) = attrs.iter_mut().find(|attr| attr.name.local.as_ref() == name) {
        attr.value = StrTendril::from(value);
        return;
    }

    attrs.push(Attribute {
        name: QualName::new(None, ns!(), LocalName::from(name)),
        value: StrTendril::from(value),
    });
}

/// Concatenated text of a node and its descendants, references decoded.
pub fn text_content(handle: &Handle) -> String {
    let mut text = String::new();
    collect_text(handle, &mut text);
    text
}

fn collect_text(handle: &Handle, text: &mut String) {
    match &handle.data {
        NodeData::Text { contents } => text.push_str(&contents.borrow()),
        NodeData::Element { .. } | NodeData::Document => {
            for child in handle.children.borrow().iter() {
                collect_text(child, text);
            }
        }
        _ => {}
    }
}

/// Removes a node and its subtree from its parent.
///
/// # Returns
///
/// Whether the node was attached
pub fn detach(target: &Handle) -> bool {
    let Some((parent, index)) = parent_and_index(target) else {
        return false;
    };

    parent.children.borrow_mut().remove(index);
    target.parent.set(None);
    true
}

/// Swaps an element for one with a different local name.
///
/// Attributes and children move to the new element, which takes the old
/// one's place in its parent.
///
/// # Returns
///
/// The new element, or None for detached nodes and non-elements
pub fn rename_element(target: &Handle, local: &str) -> Option<Handle> {
    let NodeData::Element { name, attrs } = &target.data else {
        return None;
    };
    let (parent, index) = parent_and_index(target)?;

    let renamed = Node::new(NodeData::Element {
        name: QualName::new(name.prefix.clone(), name.ns.clone(), LocalName::from(local)),
        attrs: RefCell::new(attrs.borrow().clone()),
    });

    for child in target.children.take() {
        child.parent.set(Some(Rc::downgrade(&renamed)));
        renamed.children.borrow_mut().push(child);
    }

    renamed.parent.set(Some(Rc::downgrade(&parent)));
    parent.children.borrow_mut()[index] = renamed.clone();
    target.parent.set(None);

    Some(renamed)
}

fn parent_of(target: &Handle) -> Option<Handle> {
    let weak = target.parent.take()?;
    let parent = weak.upgrade();
    target.parent.set(Some(weak));
    parent
}

fn parent_and_index(target: &Handle) -> Option<(Handle, usize)> {
    let parent = parent_of(target)?;
    let index = parent
        .children
        .borrow()
        .iter()
        .position(|child| Rc::ptr_eq(child, target))?;
    Some((parent, index))
}

fn append(parent: &Handle, child: Handle) {
    detach(&child);
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

fn append_text(parent: &Handle, text: &str) {
    if let Some(last) = parent.children.borrow().last()
        && let NodeData::Text { contents } = &last.data
    {
        contents.borrow_mut().push_str(text);
        return;
    }

    append(parent, new_text(text));
}

fn new_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(text.to_string()),
    })
}

/// Tree builder target for html5ever.
///
/// Nodes carry their own interior mutability, so the sink only tracks the
/// document root.
struct DomSink {
    document: Handle,
    unnamed: QualName,
}

impl DomSink {
    fn new() -> Self {
        Self {
            document: Node::new(NodeData::Document),
            unnamed: QualName::new(None, ns!(), LocalName::from("")),
        }
    }
}

impl TreeSink for DomSink {
    type Handle = Handle;
    type Output = Handle;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self.document
    }

    // Browsers recover from every error, and so do we
    fn parse_error(&self, _msg: Cow<'static, str>) {}

    fn get_document(&self) -> Self::Handle {
        self.document.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        match &target.data {
            NodeData::Element { name, .. } => name,
            _ => &self.unnamed,
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        Node::new(NodeData::Element {
            name,
            attrs: RefCell::new(attrs),
        })
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        Node::new(NodeData::Comment {
            contents: text.to_string(),
        })
    }

    fn create_pi(&self, target: StrTendril, data: StrTendril) -> Self::Handle {
        Node::new(NodeData::ProcessingInstruction {
            target: target.to_string(),
            contents: data.to_string(),
        })
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        match child {
            NodeOrText::AppendNode(node) => append(parent, node),
            NodeOrText::AppendText(text) => append_text(parent, &text),
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if parent_of(element).is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        append(
            &self.document,
            Node::new(NodeData::Doctype {
                name: name.to_string(),
            }),
        );
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    // Serialization does not depend on the quirks mode
    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let node = match new_node {
            NodeOrText::AppendNode(node) => {
                detach(&node);
                node
            }
            NodeOrText::AppendText(text) => {
                if let Some((parent, index)) = parent_and_index(sibling)
                    && index > 0
                    && let NodeData::Text { contents } = &parent.children.borrow()[index - 1].data
                {
                    contents.borrow_mut().push_str(&text);
                    return;
                }
                new_text(&text)
            }
        };

        let Some((parent, index)) = parent_and_index(sibling) else {
            return;
        };
        node.parent.set(Some(Rc::downgrade(&parent)));
        parent.children.borrow_mut().insert(index, node);
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let NodeData::Element {
            attrs: existing, ..
        } = &target.data
        else {
            return;
        };

        let mut existing = existing.borrow_mut();
        for attr in attrs {
            if !existing.iter().any(|a| a.name == attr.name) {
                existing.push(attr);
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        detach(target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        for child in node.children.take() {
            child.parent.set(Some(Rc::downgrade(new_parent)));
            new_parent.children.borrow_mut().push(child);
        }
    }
}

struct SerializableNode(Handle);

impl Serialize for SerializableNode {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        match traversal_scope {
            TraversalScope::IncludeNode => serialize_node(&self.0, serializer),
            TraversalScope::ChildrenOnly(_) => serialize_children(&self.0, serializer),
        }
    }
}

fn serialize_children<S: Serializer>(handle: &Handle, serializer: &mut S) -> io::Result<()> {
    for child in handle.children.borrow().iter() {
        serialize_node(child, serializer)?;
    }
    Ok(())
}

fn serialize_node<S: Serializer>(handle: &Handle, serializer: &mut S) -> io::Result<()> {
    match &handle.data {
        NodeData::Document => serialize_children(handle, serializer),
        NodeData::Doctype { name } => serializer.write_doctype(name),
        NodeData::Text { contents } => serializer.write_text(&contents.borrow()),
        NodeData::Comment { contents } => serializer.write_comment(contents),
        NodeData::ProcessingInstruction { target, contents } => {
            serializer.write_processing_instruction(target, contents)
        }
        NodeData::Element { name, attrs } => {
            {
                let attrs = attrs.borrow();
                serializer.start_elem(
                    name.clone(),
                    attrs.iter().map(|attr| (&attr.name, &*attr.value)),
                )?;
            }
            serialize_children(handle, serializer)?;
            serializer.end_elem(name.clone())
        }
    }
}
