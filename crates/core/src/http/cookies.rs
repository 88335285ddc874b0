//! Session-owned cookie jar.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// Domain as given by the server, possibly with a leading dot.
    pub domain: String,
    /// Set when no Domain attribute was sent; the cookie then goes back
    /// to the exact host only.
    pub host_only: bool,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
}

impl Cookie {
    /// Parse one Set-Cookie header value received for `url`.
    ///
    /// Returns the cookie and whether it asks to be deleted (`Max-Age<=0`,
    /// or an `Expires` date in the past when no Max-Age is given). A cookie
    /// whose Domain does not cover the request host is rejected.
    pub fn parse(set_cookie: &str, url: &Url) -> Option<(Self, bool)> {
        let mut segments = set_cookie.split(';');
        let (name, value) = segments.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let host = url.host_str()?.to_ascii_lowercase();

        let mut cookie = Cookie {
            name: name.to_string(),
            value: value.trim().trim_matches('"').to_string(),
            domain: host.clone(),
            host_only: true,
            path: "/".to_string(),
            secure: false,
            http_only: false,
        };
        let mut max_age: Option<i64> = None;
        let mut expires: Option<DateTime<Utc>> = None;

        for attribute in segments {
            let (key, val) = match attribute.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (attribute.trim(), ""),
            };
            match key.to_ascii_lowercase().as_str() {
                "domain" if !val.trim_start_matches('.').is_empty() => {
                    cookie.domain = val.to_ascii_lowercase();
                    cookie.host_only = false;
                }
                "path" if val.starts_with('/') => cookie.path = val.to_string(),
                "max-age" => max_age = val.parse::<i64>().ok().or(max_age),
                "expires" => expires = parse_cookie_date(val).or(expires),
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                _ => {}
            }
        }

        if !cookie.host_only && !domain_matches(&host, &cookie.domain) {
            tracing::debug!(host = %host, domain = %cookie.domain, "rejecting cookie for a foreign domain");
            return None;
        }

        let expired = match max_age {
            Some(age) => age <= 0,
            None => expires.is_some_and(|at| at <= Utc::now()),
        };
        Some((cookie, expired))
    }

    fn matches(&self, host: &str, path: &str, https: bool) -> bool {
        if self.secure && !https {
            return false;
        }
        let domain_ok = if self.host_only {
            host == self.domain
        } else {
            domain_matches(host, &self.domain)
        };
        domain_ok && path_matches(&self.path, path)
    }
}

/// Whether `host` is `domain` or one of its subdomains. A leading dot on
/// `domain` is ignored.
fn domain_matches(host: &str, domain: &str) -> bool {
    let bare = domain.trim_start_matches('.');
    host == bare
        || host
            .strip_suffix(bare)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Parse an Expires value: RFC 1123 (`Thu, 01 Jan 1970 00:00:00 GMT`) or the
/// older dashed form (`Thursday, 01-Jan-70 00:00:00 GMT`).
fn parse_cookie_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc2822(value) {
        return Some(at.with_timezone(&Utc));
    }
    let (_, rest) = value.split_once(',')?;
    let rest = rest.trim().trim_end_matches("GMT").trim();
    ["%d-%b-%y %H:%M:%S", "%d-%b-%Y %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(rest, format).ok())
        .map(|naive| naive.and_utc())
}

fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    request_path == cookie_path
        || (request_path.starts_with(cookie_path)
            && (cookie_path.ends_with('/')
                || request_path[cookie_path.len()..].starts_with('/')))
}

/// Cookies keyed by domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieJar {
    domains: BTreeMap<String, Vec<Cookie>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store every Set-Cookie header received for `url`, then fix domains.
    pub fn store_all<'a>(&mut self, url: &Url, set_cookies: impl IntoIterator<Item = &'a str>) {
        for header in set_cookies {
            match Cookie::parse(header, url) {
                Some((cookie, expired)) => {
                    tracing::debug!(name = %cookie.name, domain = %cookie.domain, expired, "storing cookie");
                    self.store(cookie, expired);
                }
                None => tracing::debug!(header, "ignoring malformed Set-Cookie"),
            }
        }
        self.fix_domains();
    }

    fn store(&mut self, cookie: Cookie, expired: bool) {
        let key = cookie.domain.clone();
        self.remove_matching(&key, &cookie.name, &cookie.path);
        // A deletion also clears the copy made by fix_domains
        if let Some(bare) = key.strip_prefix('.') {
            self.remove_matching(bare, &cookie.name, &cookie.path);
        }
        if !expired {
            self.domains.entry(key).or_default().push(cookie);
        }
    }

    fn remove_matching(&mut self, key: &str, name: &str, path: &str) {
        if let Some(cookies) = self.domains.get_mut(key) {
            cookies.retain(|c| !(c.name == name && c.path == path));
            if cookies.is_empty() {
                self.domains.remove(key);
            }
        }
    }

    /// Re-add every cookie stored under a leading-dot domain under the bare
    /// domain as well, so exact-host lookups find it.
    pub fn fix_domains(&mut self) {
        let dotted: Vec<(String, Vec<Cookie>)> = self
            .domains
            .iter()
            .filter_map(|(key, cookies)| {
                key.strip_prefix('.')
                    .map(|bare| (bare.to_string(), cookies.clone()))
            })
            .collect();

        for (bare, cookies) in dotted {
            let slot = self.domains.entry(bare).or_default();
            for cookie in cookies {
                slot.retain(|c| !(c.name == cookie.name && c.path == cookie.path));
                slot.push(cookie);
            }
        }
    }

    /// Cookies sent to `url`, in a stable order, without duplicate names.
    pub fn cookies_for(&self, url: &Url) -> Vec<&Cookie> {
        let Some(host) = url.host_str() else {
            return Vec::new();
        };
        let host = host.to_ascii_lowercase();
        let https = url.scheme() == "https";

        let mut selected: Vec<&Cookie> = Vec::new();
        for cookies in self.domains.values() {
            for cookie in cookies {
                if cookie.matches(&host, url.path(), https)
                    && !selected.iter().any(|c| c.name == cookie.name && c.path == cookie.path)
                {
                    selected.push(cookie);
                }
            }
        }
        selected
    }

    /// Value of the Cookie request header for `url`.
    pub fn header_for(&self, url: &Url) -> Option<String> {
        let cookies = self.cookies_for(url);
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Look up a cookie value by name across all domains.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.domains
            .values()
            .flatten()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    /// Domain keys currently holding cookies.
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn clear(&mut self) {
        self.domains.clear();
    }
}
