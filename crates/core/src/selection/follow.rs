use crate::engine::{Engine, Navigation};
use crate::error::{Error, Result};

use super::Selection;

impl<'a> Selection<'a> {
    /// Navigate to the `href` of the single selected anchor.
    pub fn follow(self) -> Result<&'a mut Engine> {
        let follow_redirect = self.engine.config().follow_redirects;
        self.follow_with(follow_redirect)
    }

    pub fn follow_with(self, follow_redirect: bool) -> Result<&'a mut Engine> {
        let anchors = self.require(&["a", "area"])?;
        if anchors.len() != 1 {
            return Err(Error::invalid_operation(format!(
                "The selector '{}' matched {} anchors; only one can be followed.",
                anchors.selector,
                anchors.len()
            )));
        }

        let href = anchors.attribute("href");
        if href.is_empty() {
            return Err(Error::invalid_operation(format!(
                "The anchor selected with '{}' has an empty 'href' attribute.",
                anchors.selector
            )));
        }

        let engine = anchors.engine;
        // A fragment stays on the current page
        let target = if href.starts_with('#') {
            engine
                .uri()
                .map(|uri| uri.path().to_string())
                .unwrap_or_else(|| "/".to_string())
        } else {
            href
        };

        tracing::debug!(href = %target, "following anchor");
        engine.navigate_with(Navigation::to(target).follow_redirect(follow_redirect))?;
        Ok(engine)
    }
}
