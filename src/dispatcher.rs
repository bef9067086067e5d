//! Per-request orchestration.
//!
//! ```text
//! normalise → resolve route → check verb → check session
//!           → negotiate body → bind + invoke → render
//! ```
//!
//! Strictly in that order, each step either passing or ending the request
//! with an error response. Nothing a handler or a client does escapes
//! [`Dispatcher::dispatch`] as an error: every [`DispatchError`] becomes a
//! `400` (or `401`) carrying its localised message.

use std::sync::Arc;

use tracing::{Instrument, debug, error, info_span};

use crate::codec::Formats;
use crate::error::DispatchError;
use crate::extract::{RequestContext, ResponseHandle};
use crate::handler::Outcome;
use crate::localize::{Localizer, Messages};
use crate::method::Method;
use crate::negotiate::{self, MediaType};
use crate::record::Schema;
use crate::render::Renderer;
use crate::request::Request;
use crate::response::Response;
use crate::router::RouteTable;
use crate::session::{NoSession, SessionValidator};
use crate::status::Status;

/// Routes requests to handlers and renders what they return.
///
/// ```rust
/// use switchboard::{Dispatcher, Request, RouteTable, ServletReply, Service};
///
/// async fn ping() -> ServletReply { ServletReply::success("pong") }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let routes = RouteTable::builder()
///     .service(Service::new("/health").get("/ping", ping))
///     .build()
///     .unwrap();
/// let dispatcher = Dispatcher::new(routes);
///
/// let res = dispatcher.dispatch(Request::new("GET", "/health/ping")).await;
/// assert_eq!(res.status_code(), 200);
/// assert_eq!(res.text(), "pong");
/// # }
/// ```
pub struct Dispatcher {
    routes: RouteTable,
    localizer: Arc<dyn Localizer>,
    sessions: Arc<dyn SessionValidator>,
    schema: Arc<Schema>,
    formats: Arc<Formats>,
}

impl Dispatcher {
    /// English messages, no valid sessions, an empty schema.
    pub fn new(routes: RouteTable) -> Self {
        Self {
            routes,
            localizer: Arc::new(Messages::english()),
            sessions: Arc::new(NoSession),
            schema: Arc::new(Schema::new()),
            formats: Arc::new(Formats::default()),
        }
    }

    pub fn localizer(mut self, localizer: impl Localizer) -> Self {
        self.localizer = Arc::new(localizer);
        self
    }

    pub fn sessions(mut self, sessions: impl SessionValidator) -> Self {
        self.sessions = Arc::new(sessions);
        self
    }

    /// Tables used to render and decode typed records.
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Arc::new(schema);
        self
    }

    pub fn formats(mut self, formats: Formats) -> Self {
        self.formats = Arc::new(formats);
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Handles one request. Never fails; errors become responses.
    pub async fn dispatch(&self, request: Request) -> Response {
        let path = negotiate::normalize_path(request.path());
        let method = Method::normalize(Some(request.method()));
        let span = info_span!("dispatch", method = %method, path = %path);

        async move {
            match self.run(request, path, method).await {
                Ok(response) => {
                    debug!(status = response.status_code(), "dispatched");
                    response
                }
                Err(err) => self.fail(err),
            }
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request: Request, path: String, method: String) -> Result<Response, DispatchError> {
        let Some(hit) = self.routes.resolve(&path) else {
            return Err(DispatchError::RouteNotFound { path });
        };
        let route = hit.route;
        if method != route.method().as_str() {
            return Err(DispatchError::VerbMismatch { path, actual: method, expected: route.method() });
        }
        if route.is_secured() && !self.sessions.is_valid(&request) {
            return Err(DispatchError::Unauthorized { path });
        }

        let media = MediaType::from_header(request.content_type());
        let body = negotiate::negotiate(&method, media, &request, &path)?;

        let response = ResponseHandle::new();
        let cx = RequestContext {
            path,
            method,
            media,
            body,
            suffix: hit.suffix,
            request: Arc::new(request),
            response: response.clone(),
            schema: Arc::clone(&self.schema),
            formats: Arc::clone(&self.formats),
        };

        match route.handler().call(&cx)?.await {
            Outcome::Reply(reply) => {
                Renderer::new(&self.schema, &self.formats, &*self.localizer).render(&cx.path, reply)
            }
            // the handler wrote (or chose not to write) the response itself
            Outcome::Void => Ok(response.take().unwrap_or_else(|| Response::status(Status::Ok))),
            Outcome::Missing => Err(DispatchError::UnimplementedResponseType { path: cx.path }),
            Outcome::Failed(err) => Err(err.into()),
        }
    }

    fn fail(&self, err: DispatchError) -> Response {
        match &err {
            DispatchError::Handler(cause) => error!(error = %cause, "handler failed"),
            other => debug!(error = %other, "request rejected"),
        }
        Response::html(err.status(), err.describe(&*self.localizer))
    }
}
