//! A live handle on a set of elements of the engine's current document.
//!
//! Mutations go straight to the document, so a later submit or selection
//! observes them. A [`Selection`] borrows its [`Engine`] mutably; following a
//! link or submitting a form consumes the selection and hands the engine back.

mod actions;
mod attributes;
mod follow;
mod submit;
mod traversal;

use std::fmt;

use crate::dom::{Document, NodeId};
use crate::engine::Engine;
use crate::error::{Error, Result};

pub(crate) use attributes::FieldKind;

pub struct Selection<'a> {
    engine: &'a mut Engine,
    nodes: Vec<NodeId>,
    selector: String,
}

impl<'a> Selection<'a> {
    pub(crate) fn new(engine: &'a mut Engine, nodes: Vec<NodeId>, selector: &str) -> Self {
        Self {
            engine,
            nodes,
            selector: selector.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Element handles in document order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The selector this selection was produced by.
    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn engine(&self) -> &Engine {
        &*self.engine
    }

    /// Tag of the first element.
    pub fn tag_name(&self) -> Option<String> {
        let doc = self.engine.document()?;
        self.nodes.first().map(|&id| doc.tag(id).to_string())
    }

    /// Text content of every element, one per line.
    pub fn inner_text(&self) -> String {
        self.join(|doc, id| doc.text_content(id))
    }

    pub fn inner_html(&self) -> String {
        self.join(|doc, id| doc.inner_html(id))
    }

    pub fn outer_html(&self) -> String {
        self.join(|doc, id| doc.outer_html(id))
    }

    /// Replace the content of every element with `text`.
    pub fn set_text(mut self, text: &str) -> Result<Self> {
        self.ensure_not_empty()?;
        let nodes = self.nodes.clone();
        if let Some(doc) = self.engine.document_mut() {
            for id in nodes {
                doc.set_text(id, text);
            }
        }
        Ok(self)
    }

    pub(crate) fn document(&self) -> Option<&Document> {
        self.engine.document()
    }

    pub(crate) fn document_mut(&mut self) -> Option<&mut Document> {
        self.engine.document_mut()
    }

    fn join(&self, render: impl Fn(&Document, NodeId) -> String) -> String {
        let Some(doc) = self.engine.document() else {
            return String::new();
        };
        self.nodes
            .iter()
            .map(|&id| render(doc, id))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    fn ensure_not_empty(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(Error::invalid_operation(format!(
                "No elements were selected with '{}'.",
                self.selector
            )));
        }
        Ok(())
    }

    /// Narrow to elements with one of `tags`, failing if nothing remains.
    pub(crate) fn require(mut self, tags: &[&str]) -> Result<Self> {
        self.ensure_not_empty()?;
        let kept: Vec<NodeId> = match self.engine.document() {
            Some(doc) => self
                .nodes
                .iter()
                .copied()
                .filter(|&id| tags.iter().any(|tag| *tag == doc.tag(id)))
                .collect(),
            None => Vec::new(),
        };
        if kept.is_empty() {
            return Err(Error::invalid_operation(format!(
                "None of the elements selected with '{}' is a {} element.",
                self.selector,
                tags.join(" or ")
            )));
        }
        self.nodes = kept;
        Ok(self)
    }
}

impl fmt::Debug for Selection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("selector", &self.selector)
            .field("nodes", &self.nodes)
            .finish()
    }
}

impl fmt::Display for Selection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.css_path() {
            Some(path) => write!(f, "{path}"),
            None => write!(f, "{}", self.selector),
        }
    }
}
