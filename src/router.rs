//! Route table.
//!
//! Two maps, no tree: exact routes keyed by their lower-cased path, pattern
//! routes keyed by their lower-cased prefix. Lookup tries the exact map once,
//! then walks the path back one segment at a time through the pattern map,
//! so an exact route always beats a pattern and a longer prefix beats a
//! shorter one.
//!
//! Routes are declared in [`Service`]s (a shared prefix and security flag)
//! or one at a time with [`RouteTableBuilder::register`]. Every declaration
//! is validated when the table is built; a bad path or handler signature is
//! a [`ConfigError`] and the table is never constructed.
//!
//! ```rust
//! use switchboard::{JsonObject, PathSuffix, RouteTable, ServletReply, Service};
//!
//! async fn create(_: JsonObject) -> ServletReply { ServletReply::success("created") }
//! async fn fetch(id: PathSuffix) -> ServletReply { ServletReply::success(id.as_str()) }
//!
//! let table = RouteTable::builder()
//!     .service(
//!         Service::new("/items")
//!             .secured(true)
//!             .post("/create", create)
//!             .get("/get/*", fetch),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let hit = table.resolve("/Items/Get/42").unwrap();
//! assert!(hit.route.is_pattern());
//! assert_eq!(hit.suffix.as_deref(), Some("42"));
//! ```

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::error::ConfigError;
use crate::extract::ParamKind;
use crate::handler::{BoxedHandler, Handler, Signature};
use crate::method::Method;

/// Suffix that turns a route into a pattern route.
const WILDCARD: &str = "/*";

/// A registered route.
pub struct Route {
    path: String,
    method: Method,
    pattern: bool,
    secured: bool,
    signature: Signature,
    handler: BoxedHandler,
}

impl Route {
    /// Path as declared (prefix only, for a pattern route).
    pub fn path(&self) -> &str { &self.path }
    pub fn method(&self) -> Method { self.method }
    pub fn is_pattern(&self) -> bool { self.pattern }
    pub fn is_secured(&self) -> bool { self.secured }
    pub fn signature(&self) -> &Signature { &self.signature }

    pub(crate) fn handler(&self) -> &BoxedHandler { &self.handler }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("secured", &self.secured)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<6} {}", self.method, self.path)?;
        if self.pattern {
            f.write_str(WILDCARD)?;
        }
        if self.secured {
            f.write_str(" [secured]")?;
        }
        Ok(())
    }
}

/// A resolved route plus, for a pattern route, the unmatched path suffix.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub suffix: Option<String>,
}

// ── Declaration ───────────────────────────────────────────────────────────────

struct Declared {
    method: Method,
    path: String,
    secured: bool,
    signature: Signature,
    handler: BoxedHandler,
}

/// A group of routes under one path prefix.
///
/// Security escalates: a secured service secures every route in it, and a
/// route can be secured on its own inside an open service.
pub struct Service {
    prefix: String,
    secured: bool,
    routes: Vec<Declared>,
}

impl Service {
    pub fn new(prefix: &str) -> Self {
        Self { prefix: prefix.to_owned(), secured: false, routes: Vec::new() }
    }

    pub fn secured(mut self, secured: bool) -> Self {
        self.secured = secured;
        self
    }

    pub fn get<A>(self, path: &str, handler: impl Handler<A>) -> Self {
        self.route(Method::Get, path, false, handler)
    }

    pub fn post<A>(self, path: &str, handler: impl Handler<A>) -> Self {
        self.route(Method::Post, path, false, handler)
    }

    pub fn delete<A>(self, path: &str, handler: impl Handler<A>) -> Self {
        self.route(Method::Delete, path, false, handler)
    }

    /// Declares a route. A `path` ending in `/*` is a pattern route.
    pub fn route<A>(mut self, method: Method, path: &str, secured: bool, handler: impl Handler<A>) -> Self {
        self.routes.push(Declared {
            method,
            path: path.to_owned(),
            secured,
            signature: handler.signature(),
            handler: handler.into_boxed_handler(),
        });
        self
    }
}

/// Collects services and routes, then validates them all in [`build`](Self::build).
#[derive(Default)]
pub struct RouteTableBuilder {
    services: Vec<Service>,
    loose: Vec<Declared>,
}

impl RouteTableBuilder {
    pub fn service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    /// Declares a single route outside any service.
    pub fn register<A>(mut self, path: &str, method: Method, secured: bool, handler: impl Handler<A>) -> Self {
        self.loose.push(Declared {
            method,
            path: path.to_owned(),
            secured,
            signature: handler.signature(),
            handler: handler.into_boxed_handler(),
        });
        self
    }

    /// Validates every declaration and builds the table.
    ///
    /// # Errors
    ///
    /// The first [`ConfigError`] found, in declaration order.
    pub fn build(self) -> Result<RouteTable, ConfigError> {
        let mut table = RouteTable::default();

        for service in self.services {
            let owner = format!("service {}", service.prefix);
            check_path(&owner, &service.prefix)?;
            if service.routes.is_empty() {
                return Err(ConfigError::EmptyService { prefix: service.prefix });
            }
            for declared in service.routes {
                table.insert(&service.prefix, service.secured, declared)?;
            }
        }
        for declared in self.loose {
            table.insert("", false, declared)?;
        }

        debug!(routes = table.len(), "route table built\n{table}");
        Ok(table)
    }
}

fn check_path(owner: &str, path: &str) -> Result<(), ConfigError> {
    let reason = if !path.starts_with('/') {
        "must start with '/'"
    } else if path.ends_with('/') {
        "must not end with '/'"
    } else {
        return Ok(());
    };
    Err(ConfigError::InvalidPath { owner: owner.to_owned(), path: path.to_owned(), reason })
}

fn check_signature(method: Method, path: &str, pattern: bool, signature: &Signature) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidSignature { method, path: path.to_owned(), reason };

    let limit = if pattern { 3 } else { 2 };
    if signature.params.len() > limit {
        return Err(invalid(if pattern {
            "takes more than three parameters"
        } else {
            "takes more than two parameters; three are allowed on pattern routes only"
        }));
    }
    if !pattern && signature.count(ParamKind::PathSuffix) > 0 {
        return Err(ConfigError::UnsupportedParameterType {
            method,
            path: path.to_owned(),
            param: ParamKind::PathSuffix.name(),
        });
    }
    match (signature.carries_result, signature.count(ParamKind::ResponseHandle)) {
        (true, 0) | (false, 1) => Ok(()),
        (false, 0) if signature.params.is_empty() => Err(invalid("takes no parameters and returns nothing")),
        (false, 0) => Err(invalid("returns nothing and takes no ResponseHandle to write to")),
        (true, _) => Err(invalid("returns a result and also takes a ResponseHandle")),
        (false, _) => Err(invalid("takes more than one ResponseHandle")),
    }
}

// ── Table ─────────────────────────────────────────────────────────────────────

/// Immutable `path → route` table. Built once, shared read-only.
#[derive(Default)]
pub struct RouteTable {
    exact: HashMap<String, Route>,
    patterns: HashMap<String, Route>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    fn insert(&mut self, prefix: &str, service_secured: bool, declared: Declared) -> Result<(), ConfigError> {
        let owner = format!("{} {}{}", declared.method, prefix, declared.path);
        let (suffix, pattern) = match declared.path.strip_suffix(WILDCARD) {
            Some(stripped) => (stripped, true),
            None => (declared.path.as_str(), false),
        };
        // `/*` alone makes the service prefix itself a pattern
        if !(pattern && suffix.is_empty() && !prefix.is_empty()) {
            check_path(&owner, suffix)?;
        }

        let path = format!("{prefix}{suffix}");
        check_signature(declared.method, &path, pattern, &declared.signature)?;

        let key = path.to_lowercase();
        let map = if pattern { &mut self.patterns } else { &mut self.exact };
        if map.contains_key(&key) {
            return Err(ConfigError::DuplicateRoute { path });
        }
        map.insert(key, Route {
            path,
            method: declared.method,
            pattern,
            secured: service_secured || declared.secured,
            signature: declared.signature,
            handler: declared.handler,
        });
        Ok(())
    }

    /// Finds the route for a normalised request path, ignoring case.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        let key = path.to_lowercase();
        if let Some(route) = self.exact.get(&key) {
            return Some(RouteMatch { route, suffix: None });
        }

        let mut prefix = key.as_str();
        while let Some(cut) = prefix.rfind('/') {
            prefix = &prefix[..cut];
            if let Some(route) = self.patterns.get(prefix) {
                let depth = prefix.matches('/').count();
                return Some(RouteMatch { route, suffix: Some(suffix_after(path, depth).to_owned()) });
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every route, sorted by path.
    pub fn routes(&self) -> Vec<&Route> {
        let mut routes: Vec<_> = self.exact.values().chain(self.patterns.values()).collect();
        routes.sort_by(|a, b| a.path.cmp(&b.path).then(a.pattern.cmp(&b.pattern)));
        routes
    }
}

/// The rest of `path` after its first `depth` segments, without the slash.
///
/// Counted in segments rather than bytes so the client's spelling survives
/// case folding.
fn suffix_after(path: &str, depth: usize) -> &str {
    match path.match_indices('/').nth(depth) {
        Some((index, _)) => &path[index + 1..],
        None => "",
    }
}

impl fmt::Display for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for route in self.routes() {
            writeln!(f, "  {route}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.routes()).finish()
    }
}
