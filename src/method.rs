//! HTTP method as a typed enum.
//!
//! Only the three verbs a route can be registered under exist here. Anything
//! else a client sends still reaches the dispatcher as a raw string, so the
//! mismatch can be reported against the route that was matched.

use std::fmt;
use std::str::FromStr;

/// A verb a route can be registered under.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Delete,
    Get,
    Post,
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Get    => "GET",
            Self::Post   => "POST",
        }
    }

    /// Normalises a raw request verb: trimmed, uppercased, `GET` when absent.
    pub fn normalize(raw: Option<&str>) -> String {
        match raw.map(str::trim) {
            Some(verb) if !verb.is_empty() => verb.to_ascii_uppercase(),
            _ => Self::Get.as_str().to_owned(),
        }
    }
}

/// Parses a method string, ignoring ASCII case.
impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DELETE" => Ok(Self::Delete),
            "GET"    => Ok(Self::Get),
            "POST"   => Ok(Self::Post),
            _        => Err(()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
