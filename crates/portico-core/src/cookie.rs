//! Cookie parsing and response helpers.
//!
//! [`Cookies`] reads the request `Cookie` header; [`SetCookie`] builds
//! `Set-Cookie` header values for session creation and removal.

use http::header;
use http::HeaderMap;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Parsed request cookies.
///
/// # Example
///
/// ```
/// use portico_core::Cookies;
/// use http::{header, HeaderMap, HeaderValue};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(
///     header::COOKIE,
///     HeaderValue::from_static("session=abc123; theme=dark"),
/// );
///
/// let cookies = Cookies::from_headers(&headers);
/// assert_eq!(cookies.get("session"), Some("abc123"));
/// assert_eq!(cookies.get("theme"), Some("dark"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Cookies {
    cookies: HashMap<String, String>,
}

impl Cookies {
    /// Creates an empty cookie jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses cookies from the `Cookie` header of a header map.
    ///
    /// A missing or non-UTF-8 header yields an empty jar.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .map_or_else(Self::new, Self::parse)
    }

    /// Parses a raw `Cookie` header value.
    #[must_use]
    pub fn parse(header_value: &str) -> Self {
        let mut cookies = HashMap::new();

        for cookie in header_value.split(';') {
            let cookie = cookie.trim();
            if let Some((name, value)) = cookie.split_once('=') {
                let name = name.trim();
                let value = value.trim().trim_matches('"');
                cookies.insert(name.to_string(), value.to_string());
            }
        }

        Self { cookies }
    }

    /// Gets a cookie value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Checks if a cookie exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    /// Returns the number of cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Checks if there are no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    /// Cookie only sent in first-party contexts.
    Strict,
    /// Cookie sent on top-level navigation (default for browsers).
    Lax,
    /// Cookie sent in all contexts; requires `Secure`.
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "Strict"),
            Self::Lax => write!(f, "Lax"),
            Self::None => write!(f, "None"),
        }
    }
}

/// Builder for a `Set-Cookie` header value.
///
/// # Example
///
/// ```
/// use portico_core::{SameSite, SetCookie};
/// use std::time::Duration;
///
/// let cookie = SetCookie::new("sid", "abc123")
///     .http_only(true)
///     .secure(true)
///     .same_site(SameSite::Lax)
///     .max_age(Duration::from_secs(3600));
///
/// let value = cookie.to_header_value();
/// assert!(value.starts_with("sid=abc123"));
/// assert!(value.contains("HttpOnly"));
/// assert!(value.contains("Max-Age=3600"));
/// ```
#[derive(Debug, Clone)]
pub struct SetCookie {
    name: String,
    value: String,
    path: Option<String>,
    max_age: Option<Duration>,
    secure: bool,
    http_only: bool,
    same_site: Option<SameSite>,
}

impl SetCookie {
    /// Creates a cookie with the given name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: Some("/".to_string()),
            max_age: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    /// Creates an expired cookie that removes the named cookie.
    pub fn removal(name: impl Into<String>) -> Self {
        Self::new(name, "").max_age(Duration::ZERO)
    }

    /// Returns the cookie name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the cookie value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Sets the cookie path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the cookie lifetime.
    #[must_use]
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Sets the `Secure` attribute.
    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets the `HttpOnly` attribute.
    #[must_use]
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Sets the `SameSite` attribute.
    #[must_use]
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// Whether the `Secure` attribute is set.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Renders the `Set-Cookie` header value.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);

        if let Some(path) = &self.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if let Some(max_age) = self.max_age {
            out.push_str(&format!("; Max-Age={}", max_age.as_secs()));
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if let Some(same_site) = self.same_site {
            out.push_str(&format!("; SameSite={same_site}"));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_parse_multiple_cookies() {
        let cookies = Cookies::parse("a=1; b=2; c=\"quoted\"");
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies.get("a"), Some("1"));
        assert_eq!(cookies.get("c"), Some("quoted"));
    }

    #[test]
    fn test_missing_header_is_empty() {
        let headers = HeaderMap::new();
        let cookies = Cookies::from_headers(&headers);
        assert!(cookies.is_empty());
    }

    #[test]
    fn test_malformed_fragment_skipped() {
        let cookies = Cookies::parse("valid=yes; novalue; also=ok");
        assert_eq!(cookies.len(), 2);
        assert!(!cookies.contains("novalue"));
    }

    #[test]
    fn test_set_cookie_attributes() {
        let value = SetCookie::new("sid", "tok")
            .secure(true)
            .http_only(true)
            .same_site(SameSite::Strict)
            .max_age(Duration::from_secs(60))
            .to_header_value();

        assert!(value.contains("Secure"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Strict"));
        assert!(value.contains("Max-Age=60"));
        assert!(value.contains("Path=/"));
    }

    #[test]
    fn test_removal_cookie_expires_immediately() {
        let value = SetCookie::removal("sid").to_header_value();
        assert!(value.starts_with("sid="));
        assert!(value.contains("Max-Age=0"));
    }

    #[test]
    fn test_header_value_is_valid() {
        let value = SetCookie::new("sid", "abc").to_header_value();
        assert!(HeaderValue::from_str(&value).is_ok());
    }
}
