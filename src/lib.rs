//! # switchboard
//!
//! Typed HTTP dispatch for services whose handlers speak in records, not
//! bytes.
//!
//! A handler is a plain `async fn`. Its parameter types say what it wants
//! from the request: a parsed JSON body, CSV rows, form fields, the raw
//! text, the path beyond a pattern prefix. Its return type says what goes
//! back: a JSON document, a CSV export, or a status line. The route table
//! checks every signature once, at startup; a handler that could not be
//! served is a [`ConfigError`], never a runtime surprise.
//!
//! What happens per request:
//!
//! - Route lookup, case-insensitive, exact paths before `/*` pattern prefixes
//! - Verb and session checks for the matched route
//! - Body negotiation by `Content-Type`: JSON, CSV, url-encoded form, text
//! - Argument binding and invocation
//! - Rendering, including typed defaults for `NULL` columns, paging
//!   envelopes and timestamped attachment names
//!
//! Any failure along the way becomes a `400` (or `401`) with a localised
//! message. Nothing reaches the transport as an error.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use switchboard::{
//!     Dispatcher, JsonObject, JsonReply, PathSuffix, Record, RouteTable, Server, ServletReply,
//!     Service,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), switchboard::Error> {
//!     let routes = RouteTable::builder()
//!         .service(
//!             Service::new("/items")
//!                 .get("/get/*", get_item)
//!                 .post("/create", create_item),
//!         )
//!         .build()?;
//!
//!     Server::bind("0.0.0.0:8080")?.serve(Dispatcher::new(routes)).await
//! }
//!
//! async fn get_item(id: PathSuffix) -> JsonReply {
//!     JsonReply::record("item", Record::new().with("id", id.as_str()))
//! }
//!
//! async fn create_item(body: JsonObject) -> anyhow::Result<ServletReply> {
//!     let name = body.get_str("name").ok_or_else(|| anyhow::anyhow!("name is required"))?;
//!     Ok(ServletReply::accepted(format!("created {name}")))
//! }
//! ```

mod dispatcher;
mod error;
mod handler;
mod method;
mod reply;
mod request;
mod response;
mod router;
mod server;
mod session;
mod status;

pub mod codec;
pub mod config;
pub mod extract;
pub mod localize;
pub mod logging;
pub mod negotiate;
pub mod record;
pub mod render;

pub use codec::{CodecError, Formats};
pub use config::{LogSettings, Settings};
pub use dispatcher::Dispatcher;
pub use error::{ConfigError, DispatchError, Error, HandlerError, MessageError, codes};
pub use extract::{
    CsvRequest, FormRequest, FromContext, JsonObject, JsonRequest, ParamKind, PathSuffix, RawRequest,
    RequestContext, ResponseHandle, TextRequest,
};
pub use handler::{Handler, IntoOutcome, Outcome, Signature};
pub use localize::{Localizer, Messages};
pub use method::Method;
pub use record::{Column, Page, QueryResult, Record, Schema, SqlType, SqlValue, Table};
pub use reply::{CsvPayload, CsvReply, JsonPayload, JsonReply, Message, Reply, ServletReply};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::{Route, RouteMatch, RouteTable, RouteTableBuilder, Service};
pub use server::Server;
pub use session::{CookieSession, NoSession, SessionValidator};
pub use status::Status;
