//! Session check for secured routes.

use crate::request::Request;

/// Decides whether a request carries a valid session.
///
/// Only consulted for secured routes. The dispatcher treats it as opaque:
/// a store lookup, a signed token check, anything that answers synchronously.
pub trait SessionValidator: Send + Sync + 'static {
    fn is_valid(&self, request: &Request) -> bool;
}

impl<F> SessionValidator for F
where
    F: Fn(&Request) -> bool + Send + Sync + 'static,
{
    fn is_valid(&self, request: &Request) -> bool {
        self(request)
    }
}

/// Rejects every request. The dispatcher's default.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSession;

impl SessionValidator for NoSession {
    fn is_valid(&self, _: &Request) -> bool {
        false
    }
}

/// Accepts any request carrying a non-empty session cookie.
#[derive(Clone, Debug)]
pub struct CookieSession {
    name: String,
}

impl CookieSession {
    pub fn new(cookie: &str) -> Self {
        Self { name: cookie.to_owned() }
    }
}

impl SessionValidator for CookieSession {
    fn is_valid(&self, request: &Request) -> bool {
        request.cookie(&self.name).is_some_and(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_session_needs_a_value() {
        let sessions = CookieSession::new("JSESSIONID");
        assert!(sessions.is_valid(&Request::new("GET", "/").with_header("cookie", "JSESSIONID=abc")));
        assert!(!sessions.is_valid(&Request::new("GET", "/").with_header("cookie", "JSESSIONID=")));
        assert!(!sessions.is_valid(&Request::new("GET", "/")));
    }

    #[test]
    fn closures_and_default() {
        let by_header = |req: &Request| req.header("x-session").is_some();
        assert!(by_header.is_valid(&Request::new("GET", "/").with_header("X-Session", "1")));
        assert!(!NoSession.is_valid(&Request::new("GET", "/")));
    }
}
