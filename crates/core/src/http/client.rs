//! `reqwest`-backed transport.
//! Gated behind the "fetch" feature flag.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use reqwest::header::CONTENT_LENGTH;

use super::{Method, OutboundRequest, RawResponse, Transport, TransportError};

/// Blocking HTTP transport. Redirects are never followed and no cookie store
/// is attached; one client is kept per proxy.
pub struct HttpTransport {
    timeout_secs: u64,
    clients: HashMap<Option<String>, Client>,
}

impl HttpTransport {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout_secs,
            clients: HashMap::new(),
        }
    }

    fn client(&mut self, proxy: Option<&str>) -> Result<&Client, TransportError> {
        let key = proxy.map(str::to_string);
        if !self.clients.contains_key(&key) {
            let mut builder = Client::builder()
                .timeout(Duration::from_secs(self.timeout_secs))
                .redirect(Policy::none());
            builder = match proxy {
                Some(url) => builder.proxy(reqwest::Proxy::all(url)?),
                None => builder.no_proxy(),
            };
            let client = builder.build()?;
            tracing::debug!(proxy = ?proxy, "built HTTP client");
            self.clients.insert(key.clone(), client);
        }
        self.clients
            .get(&key)
            .ok_or_else(|| "HTTP client cache is inconsistent".into())
    }
}

impl Transport for HttpTransport {
    fn send(&mut self, request: &OutboundRequest) -> Result<RawResponse, TransportError> {
        let proxy = request.proxy.as_ref().map(|p| p.url.clone());
        let client = self.client(proxy.as_deref())?;

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
        };

        let mut builder = client.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            // The body sets its own length
            if name.eq_ignore_ascii_case(CONTENT_LENGTH.as_str()) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(credentials) = &request.credentials {
            builder = builder.basic_auth(&credentials.username, credentials.password.as_ref());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send()?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Ok(RawResponse {
            status,
            headers,
            body: Some(Box::new(response)),
        })
    }
}
