//! Session configuration.

use serde::{Deserialize, Serialize};

/// HTTP Basic credentials attached to every request of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Some(password.into()),
        }
    }
}

/// A proxy server all traffic of a session is routed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    pub url: String,
}

impl Proxy {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Configuration for an [`Engine`](crate::Engine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// User-Agent header.
    pub user_agent: String,
    /// Accept-Language header.
    pub accept_language: String,
    /// Request timeout in seconds, enforced by the transport.
    pub timeout_secs: u64,
    /// Whether `navigate` follows redirect responses by default.
    pub follow_redirects: bool,
    /// Upper bound on redirect hops followed for one navigation.
    pub max_redirects: usize,
    pub credentials: Option<Credentials>,
    pub proxy: Option<Proxy>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept_language: "en-US,en;q=0.5".to_string(),
            timeout_secs: 30,
            follow_redirects: true,
            max_redirects: 10,
            credentials: None,
            proxy: None,
        }
    }
}

/// `strider/<version> (<os>; <arch>)`
pub fn default_user_agent() -> String {
    format!(
        "strider/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
