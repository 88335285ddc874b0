use crate::dom::{Document, NodeId, SelectorList};
use crate::error::Result;

use super::Selection;

impl<'a> Selection<'a> {
    /// Descendants of the selected elements matching `css_selector`.
    pub fn select(self, css_selector: &str) -> Result<Self> {
        let selectors = SelectorList::parse(css_selector)?;
        let selector = format!("{} {}", self.selector, css_selector);
        let nodes = match self.document() {
            Some(doc) => self
                .nodes
                .iter()
                .flat_map(|&id| doc.query_within(id, &selectors))
                .collect(),
            None => Vec::new(),
        };
        Ok(self.with_nodes(nodes, selector))
    }

    /// The selected elements that also match `css_selector`.
    pub fn filter(self, css_selector: &str) -> Result<Self> {
        let selectors = SelectorList::parse(css_selector)?;
        let selector = format!("{}:is({})", self.selector, css_selector);
        let nodes = match self.document() {
            Some(doc) => self
                .nodes
                .iter()
                .copied()
                .filter(|&id| selectors.matches(doc, id))
                .collect(),
            None => Vec::new(),
        };
        Ok(self.with_nodes(nodes, selector))
    }

    pub fn first(self) -> Self {
        self.at(0)
    }

    /// The element at `index`; empty when out of bounds.
    pub fn at(self, index: usize) -> Self {
        let nodes = self.nodes.get(index).copied().into_iter().collect();
        let selector = format!("{}[{index}]", self.selector);
        self.with_nodes(nodes, selector)
    }

    /// Next element sibling of each element.
    pub fn next(self) -> Self {
        let selector = format!("{} + *", self.selector);
        self.map(selector, Document::next_sibling)
    }

    /// Previous element sibling of each element.
    pub fn previous(self) -> Self {
        let selector = format!("{} (previous)", self.selector);
        self.map(selector, Document::previous_sibling)
    }

    pub fn parent(self) -> Self {
        let selector = format!("{} (parent)", self.selector);
        self.map(selector, Document::parent)
    }

    /// A selector path to the first element, rooted at the nearest ancestor
    /// with an id.
    pub fn css_path(&self) -> Option<String> {
        let doc = self.document()?;
        let &first = self.nodes.first()?;

        let mut parts = Vec::new();
        let mut current = Some(first);
        while let Some(id) = current {
            let tag = doc.tag(id);
            if let Some(element_id) = doc.get_attr(id, "id").filter(|v| !v.trim().is_empty()) {
                parts.push(format!("{tag}#{}", element_id.trim()));
                break;
            }
            let classes: Vec<&str> = doc
                .get_attr(id, "class")
                .map(|c| c.split_whitespace().collect())
                .unwrap_or_default();
            let part = if !classes.is_empty() {
                format!("{tag}.{}", classes.join("."))
            } else if let Some(name) = doc.get_attr(id, "name").filter(|v| !v.is_empty()) {
                format!("{tag}[name='{name}']")
            } else if let Some(kind) = doc.get_attr(id, "type").filter(|v| !v.is_empty()) {
                format!("{tag}[type='{kind}']")
            } else {
                tag.to_string()
            };
            parts.push(part);
            current = doc.parent(id);
        }
        parts.reverse();
        Some(parts.join(" > "))
    }

    fn map(self, selector: String, step: impl Fn(&Document, NodeId) -> Option<NodeId>) -> Self {
        let nodes = match self.document() {
            Some(doc) => self.nodes.iter().filter_map(|&id| step(doc, id)).collect(),
            None => Vec::new(),
        };
        self.with_nodes(nodes, selector)
    }

    /// Replace the nodes, keeping document order without duplicates.
    fn with_nodes(mut self, mut nodes: Vec<NodeId>, selector: String) -> Self {
        // Arena ids are assigned in document order
        nodes.sort_unstable();
        nodes.dedup();
        self.nodes = nodes;
        self.selector = selector;
        self
    }
}
