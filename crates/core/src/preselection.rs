//! Ordered selector → transform overrides applied to a form before submission.

use std::fmt;

use crate::error::Result;
use crate::http::RequestDictionary;
use crate::selection::Selection;

/// A transform run on the selection matched by its selector.
pub type Transform = Box<dyn for<'a> Fn(Selection<'a>) -> Result<Selection<'a>> + Send>;

/// Overrides for [`Selection::submit_with`].
///
/// Each selector runs against the whole document, its transform is applied,
/// and the resulting elements' `name`/`value` pairs are merged into the
/// scraped form payload. Entries apply in insertion order; adding an existing
/// selector replaces its transform in place. Raw `field` pairs are merged
/// last.
///
/// ```ignore
/// let overrides = Preselection::new()
///     .add("input[name=q]", |s| s.set_value("rust"))
///     .add("#remember", |s| s.check())
///     .field("token", "abc");
/// ```
#[derive(Default)]
pub struct Preselection {
    entries: Vec<(String, Transform)>,
    fields: RequestDictionary,
}

impl Preselection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(mut self, css_selector: impl Into<String>, transform: F) -> Self
    where
        F: for<'a> Fn(Selection<'a>) -> Result<Selection<'a>> + Send + 'static,
    {
        self.insert(css_selector, transform);
        self
    }

    pub fn insert<F>(&mut self, css_selector: impl Into<String>, transform: F)
    where
        F: for<'a> Fn(Selection<'a>) -> Result<Selection<'a>> + Send + 'static,
    {
        let css_selector = css_selector.into();
        let transform: Transform = Box::new(transform);
        match self.entries.iter_mut().find(|(key, _)| *key == css_selector) {
            Some((_, existing)) => *existing = transform,
            None => self.entries.push((css_selector, transform)),
        }
    }

    /// Send `name=value` regardless of what the form holds.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.set(name, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len() + self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.fields.is_empty()
    }

    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(selector, _)| selector.as_str())
    }

    pub(crate) fn into_parts(self) -> (Vec<(String, Transform)>, RequestDictionary) {
        (self.entries, self.fields)
    }
}

impl fmt::Debug for Preselection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preselection")
            .field("selectors", &self.selectors().collect::<Vec<_>>())
            .field("fields", &self.fields)
            .finish()
    }
}
