use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};

use super::attributes::{input_type, options, select_option};
use super::{FieldKind, Selection};

impl<'a> Selection<'a> {
    /// Check the selected checkboxes and radios. Checking a radio unchecks
    /// the other radios of its group.
    pub fn check(self) -> Result<Self> {
        let mut selection = self.checkables()?;
        let nodes = selection.nodes.clone();
        if let Some(doc) = selection.document_mut() {
            for id in nodes {
                if input_type(doc, id) == "radio" {
                    for other in radio_group(doc, id) {
                        doc.remove_attr(other, "checked");
                    }
                }
                doc.set_attr(id, "checked", "checked");
            }
        }
        Ok(selection)
    }

    pub fn uncheck(self) -> Result<Self> {
        let mut selection = self.checkables()?;
        let nodes = selection.nodes.clone();
        if let Some(doc) = selection.document_mut() {
            for id in nodes {
                doc.remove_attr(id, "checked");
            }
        }
        Ok(selection)
    }

    /// Select the option at `index` (zero-based) of every selected `<select>`.
    pub fn choose(self, index: usize) -> Result<Self> {
        let mut selection = self.require(&["select"])?;
        let nodes = selection.nodes.clone();
        let Some(doc) = selection.document_mut() else {
            return Ok(selection);
        };

        let mut choices = Vec::with_capacity(nodes.len());
        for id in nodes {
            let options = options(doc, id);
            let Some(&chosen) = options.get(index) else {
                return Err(Error::IndexOutOfRange {
                    index,
                    count: options.len(),
                });
            };
            choices.push((options, chosen));
        }
        for (options, chosen) in choices {
            select_option(doc, &options, chosen);
        }
        Ok(selection)
    }

    fn checkables(self) -> Result<Self> {
        let selection = self.require(&["input"])?;
        if let Some(doc) = selection.document() {
            if let Some(&id) = selection
                .nodes
                .iter()
                .find(|&&id| FieldKind::of(doc, id) != FieldKind::Checkable)
            {
                return Err(Error::invalid_operation(format!(
                    "Only checkbox and radio inputs can be checked, but '{}' selected an input of type '{}'.",
                    selection.selector,
                    input_type(doc, id)
                )));
            }
        }
        Ok(selection)
    }
}

/// Other radios sharing `radio`'s name within its form (or the document).
fn radio_group(doc: &Document, radio: NodeId) -> Vec<NodeId> {
    let Some(name) = doc.get_attr(radio, "name").filter(|n| !n.is_empty()) else {
        return Vec::new();
    };
    let scope = enclosing_form(doc, radio).unwrap_or(Document::ROOT);
    doc.descendants(scope)
        .into_iter()
        .filter(|&id| {
            id != radio
                && doc.tag(id) == "input"
                && input_type(doc, id) == "radio"
                && doc.get_attr(id, "name") == Some(name)
        })
        .collect()
}

pub(crate) fn enclosing_form(doc: &Document, id: NodeId) -> Option<NodeId> {
    let mut current = doc.parent(id);
    while let Some(node) = current {
        if doc.tag(node) == "form" {
            return Some(node);
        }
        current = doc.parent(node);
    }
    None
}
