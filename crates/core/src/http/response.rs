//! Normalisation of a raw transport response.

use std::fmt;
use std::io::Read;

use encoding_rs::{Encoding, UTF_8};
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use serde::{Deserialize, Serialize};

use super::RawResponse;

/// The charset label of a Content-Type value, if any.
fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').map(str::trim).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

/// Resolve the body encoding from the Content-Type header; UTF-8 when absent
/// or unknown.
fn encoding_for(content_type: Option<&str>) -> &'static Encoding {
    let Some(label) = content_type.and_then(charset_label) else {
        return UTF_8;
    };
    Encoding::for_label(label.as_bytes()).unwrap_or_else(|| {
        tracing::debug!(charset = label, "unknown charset, decoding as UTF-8");
        UTF_8
    })
}

/// A decoded response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Decoded body text; `None` when the body stream was missing or unreadable.
    pub body: Option<String>,
    /// Location, falling back to Content-Location.
    pub location: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    /// Canonical name of the encoding the body was decoded with.
    pub charset: String,
}

impl Response {
    /// Decode a raw response: status class, metadata headers, and the body
    /// after Content-Encoding decompression and charset decoding.
    pub fn from_raw(raw: RawResponse) -> Self {
        let header = |name: &str| {
            raw.headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let location = header("Location").or_else(|| header("Content-Location"));
        let etag = header("ETag");
        let last_modified = header("Last-Modified");
        let encoding = encoding_for(header("Content-Type").as_deref());
        let content_encoding = header("Content-Encoding").unwrap_or_default().to_ascii_lowercase();

        let body = raw.body.and_then(|mut stream| {
            let mut bytes = Vec::new();
            if let Err(e) = stream.read_to_end(&mut bytes) {
                tracing::warn!(error = %e, "response body is not readable");
                return None;
            }
            let bytes = decompress(&content_encoding, bytes)?;
            let (text, _, malformed) = encoding.decode(&bytes);
            if malformed {
                tracing::debug!(encoding = encoding.name(), "response body has malformed sequences");
            }
            Some(text.into_owned())
        });

        Self {
            status: raw.status,
            headers: raw.headers,
            body,
            location,
            etag,
            last_modified,
            charset: encoding.name().to_string(),
        }
    }

    /// The status class: 100, 200, 300, 400 or 500.
    pub fn status_base(&self) -> u16 {
        (self.status / 100) * 100
    }

    pub fn is_redirect(&self) -> bool {
        self.status_base() == 300
    }

    /// Case-insensitive header lookup; the first value wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Every value of a repeatable header such as Set-Cookie.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "HTTP/1.1 {}", self.status)?;
        for (name, value) in &self.headers {
            writeln!(f, "{name}: {value}")?;
        }
        writeln!(f)?;
        write!(f, "{}", self.body())
    }
}

fn decompress(content_encoding: &str, bytes: Vec<u8>) -> Option<Vec<u8>> {
    if content_encoding.contains("gzip") {
        let mut out = Vec::new();
        match GzDecoder::new(bytes.as_slice()).read_to_end(&mut out) {
            Ok(_) => Some(out),
            Err(e) => {
                tracing::warn!(error = %e, "failed to gunzip response body");
                None
            }
        }
    } else if content_encoding.contains("deflate") {
        // Servers disagree on whether "deflate" means zlib-wrapped or raw
        let mut out = Vec::new();
        if ZlibDecoder::new(bytes.as_slice()).read_to_end(&mut out).is_ok() {
            return Some(out);
        }
        out.clear();
        match DeflateDecoder::new(bytes.as_slice()).read_to_end(&mut out) {
            Ok(_) => Some(out),
            Err(e) => {
                tracing::warn!(error = %e, "failed to inflate response body");
                None
            }
        }
    } else {
        Some(bytes)
    }
}
