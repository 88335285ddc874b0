//! Queryable element tree projected from a response body.
//!
//! Nodes live in an arena owned by [`Document`]; a [`NodeId`] is an index into
//! it. Handles stay valid for the lifetime of the document they came from.

pub mod selector;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::ParseOpts;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

pub use selector::SelectorList;

/// Index of a node inside its [`Document`].
pub type NodeId = usize;

/// A node in the element tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub node_type: NodeType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeType {
    Element,
    Text,
    Document,
}

impl Node {
    fn new(node_type: NodeType, parent: Option<NodeId>) -> Self {
        Self {
            tag: String::new(),
            attributes: Vec::new(),
            text: String::new(),
            parent,
            children: Vec::new(),
            node_type,
        }
    }

    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A parsed HTML document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    nodes: Vec<Node>,
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

impl Document {
    /// Parse an HTML string into a document.
    pub fn parse(html: &str) -> Self {
        let opts = ParseOpts {
            tree_builder: TreeBuilderOpts {
                drop_doctype: true,
                ..Default::default()
            },
            ..Default::default()
        };

        let dom = parse_document(RcDom::default(), opts).one(html);

        let mut document = Document {
            nodes: vec![Node::new(NodeType::Document, None)],
        };
        for child in dom.document.children.borrow().iter() {
            document.convert_node(child, Self::ROOT);
        }
        document
    }

    pub const ROOT: NodeId = 0;

    fn push(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len();
        if let Some(parent) = node.parent {
            self.nodes[parent].children.push(id);
        }
        self.nodes.push(node);
        id
    }

    fn convert_node(&mut self, handle: &Handle, parent: NodeId) {
        match &handle.data {
            NodeData::Element { name, attrs, .. } => {
                let mut node = Node::new(NodeType::Element, Some(parent));
                node.tag = name.local.to_string();
                for attr in attrs.borrow().iter() {
                    node.attributes
                        .push((attr.name.local.to_string(), attr.value.to_string()));
                }
                let id = self.push(node);
                for child in handle.children.borrow().iter() {
                    self.convert_node(child, id);
                }
            }
            NodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                // Skip whitespace-only runs between elements
                if text.trim().is_empty() && !matches!(self.tag(parent), "textarea" | "pre") {
                    return;
                }
                let mut node = Node::new(NodeType::Text, Some(parent));
                node.text = text;
                self.push(node);
            }
            _ => {} // Comments, PIs, doctypes → ignored
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn tag(&self, id: NodeId) -> &str {
        self.nodes.get(id).map(|n| n.tag.as_str()).unwrap_or("")
    }

    pub fn get_attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes.get(id)?.get_attr(name)
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.get_attr(id, name).is_some()
    }

    /// Set an attribute, creating it when missing.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        match node
            .attributes
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value.to_string(),
            None => node
                .attributes
                .push((name.to_ascii_lowercase(), value.to_string())),
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.attributes.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get(id)?.parent?;
        self.nodes[parent].is_element().then_some(parent)
    }

    /// Element children, in document order.
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(id)
            .map(|node| {
                node.children
                    .iter()
                    .copied()
                    .filter(|child| self.nodes[*child].is_element())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.element_children(self.nodes.get(id)?.parent?);
        let position = siblings.iter().position(|s| *s == id)?;
        siblings.get(position + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.element_children(self.nodes.get(id)?.parent?);
        let position = siblings.iter().position(|s| *s == id)?;
        position.checked_sub(1).map(|p| siblings[p])
    }

    /// Every element of the document, in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(Self::ROOT)
    }

    /// Element descendants of `id` (excluding `id`), in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(id, &mut out);
        out
    }

    fn collect_descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        for &child in &node.children {
            if self.nodes[child].is_element() {
                out.push(child);
                self.collect_descendants(child, out);
            }
        }
    }

    /// Get the visible text content of a node and all of its children.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut result = String::new();
        self.collect_text(id, &mut result);
        result.trim().to_string()
    }

    /// Concatenated text of `id`'s subtree, whitespace kept as-is.
    pub fn raw_text(&self, id: NodeId) -> String {
        let Some(node) = self.nodes.get(id) else {
            return String::new();
        };
        match node.node_type {
            NodeType::Text => node.text.clone(),
            _ => node.children.iter().map(|&c| self.raw_text(c)).collect(),
        }
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        match node.node_type {
            NodeType::Text => {
                let trimmed = node.text.trim();
                if !trimmed.is_empty() {
                    if !out.is_empty() && !out.ends_with(' ') {
                        out.push(' ');
                    }
                    out.push_str(trimmed);
                }
            }
            _ => {
                for &child in &node.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Replace the children of `id` with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if id >= self.nodes.len() {
            return;
        }
        for child in std::mem::take(&mut self.nodes[id].children) {
            self.nodes[child].parent = None;
        }
        if !text.is_empty() {
            let mut node = Node::new(NodeType::Text, Some(id));
            node.text = text.to_string();
            self.push(node);
        }
    }

    /// Serialized markup of the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(node) = self.nodes.get(id) {
            for &child in &node.children {
                self.write_html(child, &mut out);
            }
        }
        out
    }

    /// Serialized markup of `id` itself.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        match node.node_type {
            NodeType::Text => out.push_str(&escape(&node.text, false)),
            NodeType::Document => {
                for &child in &node.children {
                    self.write_html(child, out);
                }
            }
            NodeType::Element => {
                out.push('<');
                out.push_str(&node.tag);
                for (name, value) in &node.attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape(value, true));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&node.tag.as_str()) {
                    return;
                }
                for &child in &node.children {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(&node.tag);
                out.push('>');
            }
        }
    }

    /// Run a CSS selector against the whole document.
    pub fn query(&self, selectors: &SelectorList) -> Vec<NodeId> {
        self.elements()
            .into_iter()
            .filter(|id| selectors.matches(self, *id))
            .collect()
    }

    /// Run a CSS selector against the descendants of `scope`.
    pub fn query_within(&self, scope: NodeId, selectors: &SelectorList) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| selectors.matches(self, *id))
            .collect()
    }

    /// The `<title>` text, if any.
    pub fn title(&self) -> Option<String> {
        self.elements()
            .into_iter()
            .find(|id| self.tag(*id) == "title")
            .map(|id| self.text_content(id))
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
