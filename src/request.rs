//! Incoming HTTP request type.

use std::net::SocketAddr;

use bytes::Bytes;
use percent_encoding::percent_decode_str;

/// An incoming HTTP request with its body fully buffered.
///
/// The server builds one per hyper request after collecting the body; tests
/// and embedders build them directly:
///
/// ```rust
/// use switchboard::Request;
///
/// let req = Request::new("POST", "/items?draft=1")
///     .with_header("content-type", "application/json")
///     .with_body(r#"{"name":"widget"}"#);
///
/// assert_eq!(req.path(), "/items");
/// assert_eq!(req.query(), Some("draft=1"));
/// ```
#[derive(Clone, Debug)]
pub struct Request {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
    pub(crate) remote_addr: Option<SocketAddr>,
}

impl Request {
    /// Creates a request from a verb and a request target (`path[?query]`).
    ///
    /// The path is percent-decoded; the query is kept as sent.
    pub fn new(method: impl Into<String>, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (decode_path(path), Some(query.to_owned())),
            None => (decode_path(target), None),
        };
        Self {
            method: method.into(),
            path,
            query,
            headers: Vec::new(),
            body: Bytes::new(),
            remote_addr: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub(crate) fn from_parts(parts: &http::request::Parts, body: Bytes, remote_addr: SocketAddr) -> Self {
        let headers = parts.headers.iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_owned(), v.to_owned())))
            .collect();
        Self {
            method: parts.method.as_str().to_owned(),
            path: decode_path(parts.uri.path()),
            query: parts.uri.query().map(str::to_owned),
            headers,
            body,
            remote_addr: Some(remote_addr),
        }
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The raw `Content-Type` header, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Value of the named cookie from the `Cookie` header.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.header("cookie")?
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }
}

/// Percent-decodes a request path. Invalid UTF-8 is replaced, not rejected.
fn decode_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_query_from_target() {
        let req = Request::new("GET", "/items/list?limit=10&offset=0");
        assert_eq!(req.path(), "/items/list");
        assert_eq!(req.query(), Some("limit=10&offset=0"));

        let req = Request::new("GET", "/items");
        assert_eq!(req.query(), None);
    }

    #[test]
    fn path_is_percent_decoded() {
        let req = Request::new("GET", "/files/My%20Report.csv?q=a%20b");
        assert_eq!(req.path(), "/files/My Report.csv");
        assert_eq!(req.query(), Some("q=a%20b"));

        let req = Request::new("GET", "/%69tems/%E2%82%AC");
        assert_eq!(req.path(), "/items/\u{20ac}");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::new("POST", "/").with_header("Content-Type", "text/csv");
        assert_eq!(req.content_type(), Some("text/csv"));
    }

    #[test]
    fn reads_cookie() {
        let req = Request::new("GET", "/").with_header("cookie", "theme=dark; SESSION=abc123");
        assert_eq!(req.cookie("SESSION"), Some("abc123"));
        assert_eq!(req.cookie("missing"), None);
    }
}
