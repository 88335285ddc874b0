//! HTTP plumbing: the transport seam, request construction, response
//! decoding and the session cookie jar.

pub mod cookies;
pub mod request;
pub mod response;
#[cfg(feature = "fetch")]
pub mod client;

use std::fmt;
use std::io::Read;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{Credentials, Proxy};
use crate::error::{Error, Result};

pub use cookies::{Cookie, CookieJar};
pub use request::{build_request, RequestDictionary};
pub use response::Response;
#[cfg(feature = "fetch")]
pub use client::HttpTransport;

/// The HTTP methods a session can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl Method {
    /// Parse a method name case-insensitively; `None` and `""` mean GET.
    pub fn parse(method: Option<&str>) -> Result<Self> {
        let method = method.map(str::trim).filter(|m| !m.is_empty());
        match method.map(str::to_uppercase).as_deref() {
            None | Some("GET") => Ok(Method::Get),
            Some("POST") => Ok(Method::Post),
            Some("PUT") => Ok(Method::Put),
            Some("DELETE") => Ok(Method::Delete),
            Some("HEAD") => Ok(Method::Head),
            Some(other) => Err(Error::UnsupportedMethod(other.to_string())),
        }
    }

    /// Read-style methods carry their payload in the query string.
    pub fn is_read_style(&self) -> bool {
        matches!(self, Method::Get | Method::Head)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully-built request handed to the [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub credentials: Option<Credentials>,
    pub proxy: Option<Proxy>,
}

impl OutboundRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for OutboundRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut target = self.url.path().to_string();
        if let Some(query) = self.url.query() {
            target.push('?');
            target.push_str(query);
        }
        writeln!(f, "{} {} HTTP/1.1", self.method, target)?;
        if let Some(host) = self.url.host_str() {
            writeln!(f, "Host: {host}")?;
        }
        for (name, value) in &self.headers {
            writeln!(f, "{name}: {value}")?;
        }
        writeln!(f)?;
        if let Some(body) = &self.body {
            write!(f, "{body}")?;
        }
        Ok(())
    }
}

/// An undecoded response as produced by a [`Transport`].
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// `None` when the transport has no readable body stream.
    pub body: Option<Box<dyn Read + Send>>,
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|_| ".."))
            .finish()
    }
}

pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// The low-level HTTP collaborator.
///
/// Implementations must not follow redirects on their own and must not keep
/// cookies; the engine inspects every hop and owns the cookie jar.
pub trait Transport: Send {
    fn send(&mut self, request: &OutboundRequest) -> std::result::Result<RawResponse, TransportError>;
}
