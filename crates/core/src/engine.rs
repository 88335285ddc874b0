//! The session facade: navigation state for one browsing sequence.

use std::fmt;
use std::io::Write;

use url::Url;

use crate::config::{Credentials, EngineConfig, Proxy};
use crate::dom::{Document, SelectorList};
use crate::error::{Direction, Error, Result};
use crate::history::{Entry, History};
use crate::http::request::RequestContext;
use crate::http::{build_request, CookieJar, RequestDictionary, Response, Transport};
use crate::selection::Selection;

/// One navigation request.
#[derive(Debug, Clone, Default)]
pub struct Navigation {
    uri: String,
    method: Option<String>,
    payload: RequestDictionary,
    follow_redirect: Option<bool>,
    credentials: Option<Credentials>,
    proxy: Option<Proxy>,
}

impl Navigation {
    pub fn to(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    /// HTTP method; GET when unset.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn payload(mut self, payload: RequestDictionary) -> Self {
        self.payload = payload;
        self
    }

    /// Overrides [`EngineConfig::follow_redirects`] for this navigation.
    pub fn follow_redirect(mut self, follow: bool) -> Self {
        self.follow_redirect = Some(follow);
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn proxy(mut self, proxy: Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }
}

/// A browsing session.
///
/// Every navigation is a blocking round-trip that either fully updates the
/// session (history, cookies, document) or leaves it exactly as it was.
/// [`Selection`]s borrow the engine mutably, so none can outlive the
/// document they were taken from.
pub struct Engine {
    transport: Box<dyn Transport>,
    config: EngineConfig,
    history: History,
    cookies: CookieJar,
    document: Option<Document>,
    output: Option<Box<dyn Write + Send>>,
}

impl Engine {
    /// Open a session on `uri` over HTTP with the default configuration.
    #[cfg(feature = "fetch")]
    pub fn new(uri: &str) -> Result<Self> {
        Self::with_config(uri, EngineConfig::default())
    }

    /// Open a session on `uri` over HTTP.
    #[cfg(feature = "fetch")]
    pub fn with_config(uri: &str, config: EngineConfig) -> Result<Self> {
        let transport = crate::http::HttpTransport::new(config.timeout_secs);
        let mut engine = Self::with_transport(config, Box::new(transport));
        engine.navigate(uri)?;
        Ok(engine)
    }

    /// A session over a custom transport. No request is made until the
    /// first `navigate`.
    pub fn with_transport(config: EngineConfig, transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            config,
            history: History::new(),
            cookies: CookieJar::new(),
            document: None,
            output: None,
        }
    }

    /// Route diagnostic trace lines to `output`.
    pub fn set_output(&mut self, output: impl Write + Send + 'static) {
        self.output = Some(Box::new(output));
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// URI of the current entry.
    pub fn uri(&self) -> Option<&Url> {
        self.history.current().map(|entry| &entry.uri)
    }

    /// Response of the current entry.
    pub fn response(&self) -> Option<&Response> {
        self.history.current().map(|entry| &entry.response)
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub(crate) fn document_mut(&mut self) -> Option<&mut Document> {
        self.document.as_mut()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// Select the elements of the current document matching `css_selector`,
    /// in document order. Without a document the selection is empty.
    pub fn select(&mut self, css_selector: &str) -> Result<Selection<'_>> {
        let selectors = SelectorList::parse(css_selector)?;
        let nodes = self
            .document
            .as_ref()
            .map(|doc| doc.query(&selectors))
            .unwrap_or_default();
        Ok(Selection::new(self, nodes, css_selector))
    }

    /// GET `uri`, following redirects per configuration.
    pub fn navigate(&mut self, uri: &str) -> Result<&mut Self> {
        self.navigate_with(Navigation::to(uri))
    }

    /// Perform `navigation`. On failure nothing about the session changes.
    pub fn navigate_with(&mut self, navigation: Navigation) -> Result<&mut Self> {
        let follow = navigation
            .follow_redirect
            .unwrap_or(self.config.follow_redirects);
        let mut cookies = self.cookies.clone();
        let mut staged: Vec<Entry> = Vec::new();

        let mut uri = navigation.uri.clone();
        let mut method = navigation.method.clone();
        let mut payload = navigation.payload.clone();
        let mut redirects = 0usize;

        loop {
            let (previous, previous_index) = match staged.last() {
                Some(entry) => (Some(entry), Some(self.history.len() + staged.len() - 1)),
                None => (self.history.current(), self.history.index()),
            };
            let first_hop = staged.is_empty();
            let credentials = if first_hop {
                navigation.credentials.as_ref()
            } else {
                None
            }
            .or_else(|| {
                previous
                    .is_none()
                    .then_some(self.config.credentials.as_ref())
                    .flatten()
            });
            let proxy = if first_hop {
                navigation.proxy.as_ref()
            } else {
                None
            }
            .or_else(|| {
                previous
                    .is_none()
                    .then_some(self.config.proxy.as_ref())
                    .flatten()
            });

            let ctx = RequestContext {
                previous,
                cookies: &cookies,
                user_agent: &self.config.user_agent,
                accept_language: &self.config.accept_language,
                credentials,
                proxy,
            };
            let request = build_request(&ctx, &uri, method.as_deref(), &payload)?;

            tracing::debug!(method = %request.method, url = %request.url, "sending request");
            self.trace("Request", &request.to_string());

            let raw = self.transport.send(&request).map_err(|e| Error::InvalidUri {
                uri: request.url.to_string(),
                reason: "the request failed without a response".to_string(),
                source: Some(e),
            })?;
            let response = Response::from_raw(raw);

            tracing::debug!(status = response.status, url = %request.url, "received response");
            self.trace("Response", &response.to_string());

            cookies.store_all(&request.url, response.header_values("Set-Cookie"));

            let location = response.location.clone();
            let is_redirect = response.is_redirect();
            staged.push(Entry {
                uri: request.url,
                method: request.method,
                payload: payload.clone(),
                response,
                previous: previous_index,
                credentials: request.credentials,
                proxy: request.proxy,
            });

            match location {
                Some(location) if follow && is_redirect => {
                    if redirects >= self.config.max_redirects {
                        tracing::warn!(
                            max_redirects = self.config.max_redirects,
                            "redirect limit reached, not following '{location}'"
                        );
                        break;
                    }
                    redirects += 1;
                    uri = location;
                    method = None;
                    payload = RequestDictionary::new();
                }
                _ => break,
            }
        }

        let document = match staged.last() {
            Some(last) if last.response.status == 304 && last.response.body().is_empty() => {
                self.document.take()
            }
            Some(last) => project(&last.response),
            None => None,
        };

        for entry in staged {
            self.history.add(entry);
        }
        self.cookies = cookies;
        self.document = document;

        Ok(self)
    }

    /// Move `steps` through history (negative is back), skipping redirect
    /// entries, and re-project the landed entry's document.
    pub fn navigate_steps(&mut self, steps: isize) -> Result<&mut Self> {
        let hop = match self.history.navigate(steps) {
            Ok(hop) => hop,
            Err(e) => {
                if let Error::OutOfRange { direction, .. } = &e {
                    let category = match direction {
                        Direction::Back => "Back",
                        Direction::Forward => "Forward",
                    };
                    self.trace(category, &e.to_string());
                }
                return Err(e);
            }
        };

        let from = self.history.get(hop.from).map(|e| e.uri.to_string());
        let to = self.history.get(hop.to).map(|e| e.uri.to_string());
        let message = format!(
            "Navigating {} step{} {} from {} to {}.",
            hop.steps,
            if hop.steps > 1 { "s" } else { "" },
            hop.direction,
            from.unwrap_or_default(),
            to.unwrap_or_default()
        );
        tracing::info!(from = hop.from, to = hop.to, "{message}");
        self.trace("Navigate", &message);

        self.document = self.history.current().and_then(|e| project(&e.response));
        Ok(self)
    }

    pub fn back(&mut self) -> Result<&mut Self> {
        self.navigate_steps(-1)
    }

    pub fn forward(&mut self) -> Result<&mut Self> {
        self.navigate_steps(1)
    }

    fn trace(&mut self, category: &str, message: &str) {
        if let Some(output) = self.output.as_mut() {
            // Diagnostics never fail a navigation
            let _ = writeln!(output, "[{category}] {message}");
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("uri", &self.uri().map(Url::as_str))
            .field("history", &self.history.len())
            .field("cookies", &self.cookies)
            .finish_non_exhaustive()
    }
}

fn project(response: &Response) -> Option<Document> {
    response
        .body
        .as_deref()
        .filter(|body| !body.trim().is_empty())
        .map(Document::parse)
}
