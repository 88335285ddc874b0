use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};

use super::Selection;

/// How an element stores the value it submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind {
    /// `<select>`: the selected option.
    Select,
    /// `<textarea>`: its text content.
    TextArea,
    /// Checkbox or radio input.
    Checkable,
    /// Any other `<input>`.
    Input,
    Button,
    /// Not a form control.
    Other,
}

impl FieldKind {
    pub(crate) fn of(doc: &Document, id: NodeId) -> Self {
        match doc.tag(id) {
            "select" => FieldKind::Select,
            "textarea" => FieldKind::TextArea,
            "button" => FieldKind::Button,
            "input" => match input_type(doc, id).as_str() {
                "checkbox" | "radio" => FieldKind::Checkable,
                "submit" | "image" | "button" | "reset" => FieldKind::Button,
                _ => FieldKind::Input,
            },
            _ => FieldKind::Other,
        }
    }

    pub(crate) fn is_form_control(&self) -> bool {
        *self != FieldKind::Other
    }

    /// The value submitted for `id`. `None` for a select without options.
    pub(crate) fn value(&self, doc: &Document, id: NodeId) -> Option<String> {
        match self {
            FieldKind::Select => {
                let options = options(doc, id);
                let chosen = options
                    .iter()
                    .copied()
                    .find(|&option| doc.has_attr(option, "selected"))
                    .or_else(|| options.first().copied())?;
                Some(option_value(doc, chosen))
            }
            FieldKind::TextArea => Some(doc.raw_text(id)),
            FieldKind::Checkable => Some(doc.get_attr(id, "value").unwrap_or("on").to_string()),
            FieldKind::Input | FieldKind::Button | FieldKind::Other => {
                Some(doc.get_attr(id, "value").unwrap_or_default().to_string())
            }
        }
    }

    pub(crate) fn set_value(&self, doc: &mut Document, id: NodeId, value: &str) -> Result<()> {
        match self {
            FieldKind::Select => {
                let options = options(doc, id);
                let Some(&chosen) = options.iter().find(|&&o| option_value(doc, o) == value) else {
                    return Err(Error::invalid_operation(format!(
                        "The 'select' element has no option with the value '{value}'."
                    )));
                };
                select_option(doc, &options, chosen);
            }
            FieldKind::TextArea => doc.set_text(id, value),
            _ => doc.set_attr(id, "value", value),
        }
        Ok(())
    }
}

pub(crate) fn input_type(doc: &Document, id: NodeId) -> String {
    doc.get_attr(id, "type")
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "text".to_string())
}

/// Every `<option>` of a select, including those inside optgroups.
pub(crate) fn options(doc: &Document, select: NodeId) -> Vec<NodeId> {
    doc.descendants(select)
        .into_iter()
        .filter(|&id| doc.tag(id) == "option")
        .collect()
}

/// An option's value attribute, or its text when it has none.
fn option_value(doc: &Document, option: NodeId) -> String {
    match doc.get_attr(option, "value") {
        Some(value) => value.to_string(),
        None => doc.text_content(option),
    }
}

pub(crate) fn select_option(doc: &mut Document, options: &[NodeId], chosen: NodeId) {
    for &option in options {
        doc.remove_attr(option, "selected");
    }
    doc.set_attr(chosen, "selected", "selected");
}

impl<'a> Selection<'a> {
    /// Value of `name` on every element, one per line. `value` reads what the
    /// control would submit; missing attributes read as empty.
    pub fn attribute(&self, name: &str) -> String {
        let Some(doc) = self.document() else {
            return String::new();
        };
        self.nodes
            .iter()
            .map(|&id| {
                if name.eq_ignore_ascii_case("value") {
                    FieldKind::of(doc, id).value(doc, id).unwrap_or_default()
                } else {
                    doc.get_attr(id, name).unwrap_or_default().to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.document()
            .is_some_and(|doc| self.nodes.iter().any(|&id| doc.has_attr(id, name)))
    }

    /// Set `name` on every element, creating it when missing. Setting
    /// `value` on a select chooses the matching option; on a textarea it
    /// replaces the content.
    pub fn set_attribute(mut self, name: &str, value: &str) -> Result<Self> {
        self.ensure_not_empty()?;
        let nodes = self.nodes.clone();
        if let Some(doc) = self.document_mut() {
            for id in nodes {
                if name.eq_ignore_ascii_case("value") {
                    FieldKind::of(doc, id).set_value(doc, id, value)?;
                } else {
                    doc.set_attr(id, name, value);
                }
            }
        }
        Ok(self)
    }

    pub fn remove_attribute(mut self, name: &str) -> Result<Self> {
        self.ensure_not_empty()?;
        let nodes = self.nodes.clone();
        if let Some(doc) = self.document_mut() {
            for id in nodes {
                doc.remove_attr(id, name);
            }
        }
        Ok(self)
    }

    pub fn class(&self) -> String {
        self.attribute("class")
    }

    pub fn set_class(self, class: &str) -> Result<Self> {
        self.set_attribute("class", class)
    }

    pub fn id(&self) -> String {
        self.attribute("id")
    }

    pub fn set_id(self, id: &str) -> Result<Self> {
        self.set_attribute("id", id)
    }

    pub fn name(&self) -> String {
        self.attribute("name")
    }

    pub fn set_name(self, name: &str) -> Result<Self> {
        self.set_attribute("name", name)
    }

    /// The value the selected form controls would submit.
    pub fn value(&self) -> Result<String> {
        self.ensure_not_empty()?;
        self.ensure_form_controls()?;
        Ok(self.attribute("value"))
    }

    /// Set the value of text-like controls. Selects take
    /// [`choose`](Self::choose) and radios take [`check`](Self::check).
    pub fn set_value(self, value: &str) -> Result<Self> {
        self.ensure_not_empty()?;
        self.ensure_form_controls()?;
        if let Some(doc) = self.document() {
            for &id in &self.nodes {
                if doc.tag(id) == "select" {
                    return Err(Error::invalid_operation(format!(
                        "Can't set the value of the 'select' element selected with '{}'; choose an option instead.",
                        self.selector
                    )));
                }
                if doc.tag(id) == "input" && input_type(doc, id) == "radio" {
                    return Err(Error::invalid_operation(format!(
                        "Can't set the value of the radio button selected with '{}'; check it instead.",
                        self.selector
                    )));
                }
            }
        }
        self.set_attribute("value", value)
    }

    /// Whether any selected element carries `checked`.
    pub fn is_checked(&self) -> bool {
        self.has_attribute("checked")
    }

    /// `(name, value)` for each named element, as it would merge into a form
    /// payload. `None` marks an unchecked checkbox or radio.
    pub(crate) fn fields(&self) -> Vec<(String, Option<String>)> {
        let Some(doc) = self.document() else {
            return Vec::new();
        };
        self.nodes
            .iter()
            .filter_map(|&id| {
                let name = doc.get_attr(id, "name")?.trim();
                if name.is_empty() {
                    return None;
                }
                let kind = FieldKind::of(doc, id);
                let value = if kind == FieldKind::Checkable && !doc.has_attr(id, "checked") {
                    None
                } else {
                    kind.value(doc, id)
                };
                Some((name.to_string(), value))
            })
            .collect()
    }

    fn ensure_form_controls(&self) -> Result<()> {
        let Some(doc) = self.document() else {
            return Ok(());
        };
        match self
            .nodes
            .iter()
            .find(|&&id| !FieldKind::of(doc, id).is_form_control())
        {
            Some(&id) => Err(Error::invalid_operation(format!(
                "The '{}' element selected with '{}' is not a form control.",
                doc.tag(id),
                self.selector
            ))),
            None => Ok(()),
        }
    }
}
