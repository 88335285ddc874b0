use crate::dom::{Document, NodeId};
use crate::engine::{Engine, Navigation};
use crate::error::{Error, Result};
use crate::http::RequestDictionary;
use crate::preselection::Preselection;

use super::attributes::input_type;
use super::{FieldKind, Selection};

impl<'a> Selection<'a> {
    /// Submit the single selected form with its current field values.
    pub fn submit(self) -> Result<&'a mut Engine> {
        let follow_redirect = self.engine.config().follow_redirects;
        self.submit_with(follow_redirect, None, Preselection::new())
    }

    /// Submit the single selected form.
    ///
    /// `submit_button` selects the button whose name/value is sent along.
    /// `overrides` are applied after the form is scraped, in order; each
    /// selector must match something both before and after its transform.
    pub fn submit_with(
        self,
        follow_redirect: bool,
        submit_button: Option<&str>,
        overrides: Preselection,
    ) -> Result<&'a mut Engine> {
        let forms = self.require(&["form"])?;
        if forms.len() != 1 {
            return Err(Error::invalid_operation(format!(
                "The selector '{}' matched {} forms; only one can be submitted.",
                forms.selector,
                forms.len()
            )));
        }
        let form = forms.nodes[0];
        let engine = forms.engine;

        let (method, action) = {
            let doc = engine
                .document()
                .ok_or_else(|| Error::invalid_operation("No document has been loaded."))?;
            let method = doc
                .get_attr(form, "method")
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or("GET")
                .to_ascii_uppercase();
            let action = doc
                .get_attr(form, "action")
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .or_else(|| engine.uri().map(|uri| uri.to_string()))
                .ok_or_else(|| Error::invalid_operation("No valid 'action' to perform."))?;
            (method, action)
        };

        let buttons = match submit_button {
            Some(css_selector) => engine.select(css_selector)?.into_buttons()?,
            None => Vec::new(),
        };

        let mut payload = match engine.document() {
            Some(doc) => scrape(doc, form, &buttons),
            None => RequestDictionary::new(),
        };

        let (transforms, fields) = overrides.into_parts();
        for (css_selector, transform) in transforms {
            let selection = engine.select(&css_selector)?;
            if selection.is_empty() {
                return Err(Error::invalid_operation(format!(
                    "The CSS selector '{css_selector}' returned nothing."
                )));
            }
            let selection = transform(selection)?;
            if selection.is_empty() {
                return Err(Error::invalid_operation(format!(
                    "Transforming the selection '{css_selector}' left nothing selected."
                )));
            }
            for (name, value) in selection.fields() {
                match value {
                    Some(value) => payload.set(name, value),
                    None => {
                        payload.remove(&name);
                    }
                }
            }
        }

        for (name, value) in fields.iter() {
            if name.trim().is_empty() {
                return Err(Error::InvalidArgument(
                    "An override field name can't be empty.".to_string(),
                ));
            }
            payload.set(name, value);
        }

        tracing::debug!(%method, %action, fields = payload.len(), "submitting form");
        engine.navigate_with(
            Navigation::to(action)
                .method(method)
                .payload(payload)
                .follow_redirect(follow_redirect),
        )?;
        Ok(engine)
    }

    /// The selected submit buttons; anything else is an error.
    fn into_buttons(self) -> Result<Vec<NodeId>> {
        let selection = self.require(&["input", "button"])?;
        if let Some(doc) = selection.document() {
            if let Some(&id) = selection
                .nodes
                .iter()
                .find(|&&id| FieldKind::of(doc, id) != FieldKind::Button)
            {
                return Err(Error::invalid_operation(format!(
                    "The element selected with '{}' is not a button (type '{}').",
                    selection.selector,
                    input_type(doc, id)
                )));
            }
        }
        Ok(selection.nodes)
    }
}

/// Name/value pairs a browser would send for `form`, in document order.
/// Only the buttons in `clicked` contribute.
fn scrape(doc: &Document, form: NodeId, clicked: &[NodeId]) -> RequestDictionary {
    let mut payload = RequestDictionary::new();
    for id in doc.descendants(form) {
        if !matches!(doc.tag(id), "input" | "select" | "textarea" | "button") {
            continue;
        }
        let Some(name) = doc.get_attr(id, "name").map(str::trim).filter(|n| !n.is_empty()) else {
            continue;
        };
        if doc.has_attr(id, "disabled") {
            continue;
        }
        if doc.tag(id) == "input" && matches!(input_type(doc, id).as_str(), "file" | "reset") {
            continue;
        }

        let kind = FieldKind::of(doc, id);
        match kind {
            FieldKind::Button if !clicked.contains(&id) => continue,
            FieldKind::Checkable if !doc.has_attr(id, "checked") => continue,
            _ => {}
        }
        if let Some(value) = kind.value(doc, id) {
            payload.set(name, value);
        }
    }
    payload
}
