//! Error types.
//!
//! Three layers, matching when they can happen:
//!
//! - [`ConfigError`]: raised while the route table is built. Fatal; the
//!   process must not start serving with a misconfigured handler.
//! - [`DispatchError`]: raised while one request is handled. Always turned
//!   into a `400`/`401` response at the dispatcher boundary.
//! - [`Error`]: infrastructure: binding, I/O, settings, logging.

use std::fmt;

use crate::localize::Localizer;
use crate::method::Method;
use crate::status::Status;

/// The error type returned by switchboard's fallible setup and serving calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid bind address `{addr}`: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("settings: {0}")]
    Settings(#[from] toml::de::Error),

    #[error("route table: {0}")]
    Config(#[from] ConfigError),

    #[error("logging: {0}")]
    Logging(String),
}

// ── Startup ───────────────────────────────────────────────────────────────────

/// A route or handler declaration the route table refuses to accept.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{owner} >> path `{path}` {reason}")]
    InvalidPath {
        owner: String,
        path: String,
        reason: &'static str,
    },

    #[error("service `{prefix}` >> at least one GET, POST or DELETE route is required")]
    EmptyService { prefix: String },

    #[error("{method} {path} >> {reason}")]
    InvalidSignature {
        method: Method,
        path: String,
        reason: &'static str,
    },

    #[error("{method} {path} >> parameter type {param} is not supported here")]
    UnsupportedParameterType {
        method: Method,
        path: String,
        param: &'static str,
    },

    #[error("{path} >> route already registered")]
    DuplicateRoute { path: String },
}

// ── Per request ───────────────────────────────────────────────────────────────

/// Message codes understood by the built-in catalogue.
pub mod codes {
    pub const PATH: &str = "application.path.error";
    pub const HTTP_METHOD: &str = "application.httpMethod.error";
    pub const UNAUTHORIZED: &str = "application.unauthorized.error";
    pub const CONTENT: &str = "application.content.error";
    pub const JSON: &str = "application.json.error";
    pub const JSON_TYPE: &str = "application.json.type.error";
    pub const JSON_OBJECT: &str = "application.json.object.error";
    pub const RESPONSE_TYPE: &str = "application.response.type.error";
    pub const METHOD: &str = "application.method.error";

    /// Every code a [`DispatchError`](super::DispatchError) can report.
    pub const ALL: &[&str] = &[
        PATH, HTTP_METHOD, UNAUTHORIZED, CONTENT, JSON, JSON_TYPE, JSON_OBJECT, RESPONSE_TYPE, METHOD,
    ];
}

/// A failure while handling one request.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no route for {path}")]
    RouteNotFound { path: String },

    #[error("{path} expects {expected}, got {actual}")]
    VerbMismatch {
        path: String,
        actual: String,
        expected: Method,
    },

    #[error("unauthorized access to {path}")]
    Unauthorized { path: String },

    #[error("{path}: method {method} is not supported")]
    UnsupportedMethod { path: String, method: String },

    #[error("{path}: content type {content_type} is not supported")]
    UnsupportedContentType { path: String, content_type: String },

    #[error("{path}: invalid request body: {reason}")]
    InvalidBodyFormat { path: String, reason: String },

    /// The body is not the JSON shape the handler takes. `object_only` is set
    /// for [`JsonObject`](crate::JsonObject) parameters.
    #[error("{path}: request body is not {}", json_shape(.object_only))]
    JsonTypeMismatch { path: String, object_only: bool },

    #[error("{path}: response type is not implemented")]
    UnimplementedResponseType { path: String },

    #[error("{path}: {reason}")]
    Render { path: String, reason: String },

    #[error("{0}")]
    Handler(HandlerError),
}

impl DispatchError {
    /// HTTP status the error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::Unauthorized { .. } => Status::Unauthorized,
            _ => Status::BadRequest,
        }
    }

    /// Localisation code plus positional arguments, when the error has one.
    pub fn message_code(&self) -> Option<(&'static str, Vec<String>)> {
        let coded = match self {
            Self::RouteNotFound { path } => (codes::PATH, vec![path.clone()]),
            Self::VerbMismatch { path, actual, expected } => (
                codes::HTTP_METHOD,
                vec![path.clone(), actual.clone(), expected.to_string()],
            ),
            Self::Unauthorized { path } => (codes::UNAUTHORIZED, vec![path.clone()]),
            Self::UnsupportedMethod { path, method } => {
                (codes::METHOD, vec![path.clone(), method.clone()])
            }
            Self::UnsupportedContentType { path, content_type } => {
                (codes::CONTENT, vec![path.clone(), content_type.clone()])
            }
            Self::InvalidBodyFormat { path, reason } => {
                (codes::JSON, vec![path.clone(), reason.clone()])
            }
            Self::JsonTypeMismatch { path, object_only: false } => (codes::JSON_TYPE, vec![path.clone()]),
            Self::JsonTypeMismatch { path, object_only: true } => (codes::JSON_OBJECT, vec![path.clone()]),
            Self::UnimplementedResponseType { path } => {
                (codes::RESPONSE_TYPE, vec![path.clone()])
            }
            Self::Render { .. } | Self::Handler(_) => return None,
        };
        Some(coded)
    }

    /// The text written to the response body.
    pub fn describe(&self, localizer: &dyn Localizer) -> String {
        match self {
            Self::Handler(err) => err.describe(localizer),
            other => match other.message_code() {
                Some((code, args)) => localizer.message(code, &args),
                None => other.to_string(),
            },
        }
    }
}

fn json_shape(object_only: &bool) -> &'static str {
    if *object_only { "a JSON object" } else { "a JSON object or array" }
}

impl From<HandlerError> for DispatchError {
    fn from(err: HandlerError) -> Self {
        Self::Handler(err)
    }
}

// ── Handler failures ──────────────────────────────────────────────────────────

/// A failure raised by handler business logic.
///
/// Handlers usually return `anyhow::Result<Reply>`; the dispatcher converts
/// the error into this. Only the innermost cause is ever shown to the client.
pub struct HandlerError(anyhow::Error);

impl HandlerError {
    pub fn new(err: impl Into<anyhow::Error>) -> Self {
        Self(err.into())
    }

    /// Shorthand for a localised failure: `HandlerError::coded("item.missing", [id])`.
    pub fn coded<A: Into<String>>(code: impl Into<String>, args: impl IntoIterator<Item = A>) -> Self {
        Self(anyhow::Error::new(MessageError::new(code, args)))
    }

    /// Message of the innermost cause.
    pub fn root_message(&self) -> String {
        self.0.root_cause().to_string()
    }

    /// Innermost cause, localised when it is a [`MessageError`].
    pub fn describe(&self, localizer: &dyn Localizer) -> String {
        match self.0.root_cause().downcast_ref::<MessageError>() {
            Some(coded) => localizer.message(&coded.code, &coded.args),
            None => self.root_message(),
        }
    }
}

impl From<MessageError> for HandlerError {
    fn from(err: MessageError) -> Self {
        Self(anyhow::Error::new(err))
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root_message())
    }
}

/// An error carrying a localisation code instead of display text.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{code}")]
pub struct MessageError {
    pub code: String,
    pub args: Vec<String>,
}

impl MessageError {
    pub fn new<A: Into<String>>(code: impl Into<String>, args: impl IntoIterator<Item = A>) -> Self {
        Self {
            code: code.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}
