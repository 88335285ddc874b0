//! Construction of one outbound request from the previous history entry.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use super::{CookieJar, Method, OutboundRequest};
use crate::config::{Credentials, Proxy};
use crate::error::{Error, Result};
use crate::history::Entry;

/// Weighted content types sent in the Accept header.
const ACCEPT: &[(&str, Option<f32>)] = &[
    ("text/html", None),
    ("application/xhtml+xml", None),
    ("application/xml", Some(0.9)),
    ("*/*", Some(0.8)),
];

const ACCEPT_CHARSET: &str = "utf-8, iso-8859-1;q=0.5";
const ACCEPT_ENCODING: &str = "gzip,deflate";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Ordered name → value payload of a request.
///
/// Setting an existing name overwrites its value in place, so the wire order
/// is the order in which names were first inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDictionary {
    entries: Vec<(String, String)>,
}

impl RequestDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or overwrite `name`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let position = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(position).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `application/x-www-form-urlencoded` rendering, pairs joined by `&`.
    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.entries.iter())
            .finish()
    }
}

impl fmt::Display for RequestDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestDictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dictionary = Self::new();
        for (name, value) in iter {
            dictionary.set(name, value);
        }
        dictionary
    }
}

/// Everything besides the target that goes into building a request.
pub struct RequestContext<'a> {
    /// The entry the session is currently on, if any.
    pub previous: Option<&'a Entry>,
    pub cookies: &'a CookieJar,
    pub user_agent: &'a str,
    pub accept_language: &'a str,
    /// Credentials for this call; falls through to the previous entry's.
    pub credentials: Option<&'a Credentials>,
    /// Proxy for this call; falls through to the previous entry's.
    pub proxy: Option<&'a Proxy>,
}

/// Build the request for `uri` with `method` (GET when `None`).
///
/// Read-style methods carry a non-empty payload in the query string; write
/// style methods carry it as a form-encoded body.
pub fn build_request(
    ctx: &RequestContext<'_>,
    uri: &str,
    method: Option<&str>,
    payload: &RequestDictionary,
) -> Result<OutboundRequest> {
    let mut url = resolve_uri(uri, ctx.previous)?;
    let method = Method::parse(method)?;

    let mut headers: Vec<(String, String)> = Vec::new();
    let mut body = None;

    if method.is_read_style() {
        if !payload.is_empty() {
            let query = match url.query() {
                Some(existing) if !existing.is_empty() => {
                    format!("{existing}&{}", payload.encode())
                }
                _ => payload.encode(),
            };
            url.set_query(Some(&query));
        }
    } else {
        let encoded = payload.encode();
        headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
        headers.push(("Content-Length".to_string(), encoded.len().to_string()));
        body = Some(encoded);
    }

    headers.push(("User-Agent".to_string(), ctx.user_agent.to_string()));
    headers.push(("Accept".to_string(), accept_header()));
    headers.push(("Accept-Charset".to_string(), ACCEPT_CHARSET.to_string()));
    headers.push(("Accept-Encoding".to_string(), ACCEPT_ENCODING.to_string()));
    headers.push(("Accept-Language".to_string(), ctx.accept_language.to_string()));

    if let Some(previous) = ctx.previous {
        if let Some(etag) = &previous.response.etag {
            headers.push(("If-None-Match".to_string(), etag.clone()));
        }
        if let Some(last_modified) = &previous.response.last_modified {
            headers.push(("If-Modified-Since".to_string(), last_modified.clone()));
        }
        headers.push(("Referer".to_string(), previous.uri.to_string()));
    }

    if let Some(cookie) = ctx.cookies.header_for(&url) {
        headers.push(("Cookie".to_string(), cookie));
    }

    let credentials = ctx
        .credentials
        .cloned()
        .or_else(|| ctx.previous.and_then(|p| p.credentials.clone()));
    let proxy = ctx
        .proxy
        .cloned()
        .or_else(|| ctx.previous.and_then(|p| p.proxy.clone()));

    Ok(OutboundRequest {
        method,
        url,
        headers,
        body,
        credentials,
        proxy,
    })
}

/// Resolve `uri` to an absolute http(s) URL.
///
/// Relative references resolve against the authority (scheme, host, port)
/// of the previous entry, not against its path.
pub fn resolve_uri(uri: &str, previous: Option<&Entry>) -> Result<Url> {
    let uri = uri.trim();
    if uri.is_empty() {
        return Err(Error::InvalidArgument("The URI can't be empty.".to_string()));
    }

    let url = match Url::parse(uri) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let previous = previous.ok_or_else(|| {
                Error::invalid_uri(uri, "relative URI with no previous request to resolve against")
            })?;
            let mut base = previous.uri.clone();
            base.set_path("/");
            base.set_query(None);
            base.set_fragment(None);
            base.join(uri).map_err(|e| Error::InvalidUri {
                uri: uri.to_string(),
                reason: format!("can't create a URI relative to '{base}'"),
                source: Some(Box::new(e)),
            })?
        }
        Err(e) => {
            return Err(Error::InvalidUri {
                uri: uri.to_string(),
                reason: "can't create a URI".to_string(),
                source: Some(Box::new(e)),
            })
        }
    };

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::invalid_uri(
            uri,
            format!("unsupported protocol '{scheme}'"),
        )),
    }
}

fn accept_header() -> String {
    ACCEPT
        .iter()
        .map(|(content_type, weight)| match weight {
            Some(q) => format!("{content_type};q={q:.1}"),
            None => content_type.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
