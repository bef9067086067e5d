//! Handler parameters.
//!
//! A handler declares what it needs by parameter type. The set is closed:
//! only the wrappers in this module implement [`FromContext`], and each one
//! reports a [`ParamKind`] so the route table can check a signature once, at
//! build time, instead of on every request.
//!
//! | Parameter | Bound from |
//! |---|---|
//! | [`JsonRequest`] | a JSON object or array body |
//! | [`JsonObject`] | a JSON object body |
//! | [`CsvRequest`] | CSV rows and header (empty when the body was not CSV) |
//! | [`FormRequest`] | query parameters (`GET`) or a url-encoded form |
//! | [`TextRequest`] | the raw text body |
//! | [`RawRequest`] | the inbound request itself |
//! | [`ResponseHandle`] | the outbound response; the handler writes it and returns `()` |
//! | [`PathSuffix`] | the path beyond a pattern route's prefix |

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::codec::{self, CodecError, Formats};
use crate::error::DispatchError;
use crate::negotiate::{Body, CsvTable, MediaType, Params};
use crate::record::{Record, Schema};
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::status::Status;

/// Per-request state the binder draws parameters from.
///
/// Created by the dispatcher after negotiation and dropped with the request.
pub struct RequestContext {
    pub(crate) path: String,
    pub(crate) method: String,
    pub(crate) media: MediaType,
    pub(crate) body: Body,
    pub(crate) suffix: Option<String>,
    pub(crate) request: Arc<Request>,
    pub(crate) response: ResponseHandle,
    pub(crate) schema: Arc<Schema>,
    pub(crate) formats: Arc<Formats>,
}

impl RequestContext {
    /// Normalised request path, in the client's case.
    pub fn path(&self) -> &str { &self.path }
    /// Normalised (upper-case) verb.
    pub fn method(&self) -> &str { &self.method }
    pub fn media(&self) -> MediaType { self.media }
    pub fn body(&self) -> &Body { &self.body }
    pub fn request(&self) -> &Request { &self.request }
}

/// Kind of a handler parameter, checked against the route at build time.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ParamKind {
    Json,
    JsonObject,
    Csv,
    Form,
    Text,
    RawRequest,
    ResponseHandle,
    PathSuffix,
}

impl ParamKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Json           => "JsonRequest",
            Self::JsonObject     => "JsonObject",
            Self::Csv            => "CsvRequest",
            Self::Form           => "FormRequest",
            Self::Text           => "TextRequest",
            Self::RawRequest     => "RawRequest",
            Self::ResponseHandle => "ResponseHandle",
            Self::PathSuffix     => "PathSuffix",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A type a handler may take as a parameter.
///
/// Sealed: the wrappers in this module are the whole set.
pub trait FromContext: private::Sealed + Sized + Send + 'static {
    const KIND: ParamKind;

    fn from_context(cx: &RequestContext) -> Result<Self, DispatchError>;
}

mod private {
    pub trait Sealed {}
}

// ── JSON ──────────────────────────────────────────────────────────────────────

/// A parsed JSON body: an object or an array.
#[derive(Clone, Debug)]
pub struct JsonRequest {
    value: Value,
    schema: Arc<Schema>,
    formats: Arc<Formats>,
}

impl JsonRequest {
    pub fn value(&self) -> &Value { &self.value }
    pub fn into_value(self) -> Value { self.value }

    pub fn as_object(&self) -> Option<&Map<String, Value>> { self.value.as_object() }
    pub fn as_array(&self) -> Option<&Vec<Value>> { self.value.as_array() }

    fn field(&self, key: &str) -> Option<&Value> {
        self.value.as_object()?.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.field(key)?.as_str()
    }

    pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_str(key).unwrap_or(default)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.field(key)?.as_i64()
    }

    pub fn get_i64_or(&self, key: &str, default: i64) -> i64 {
        self.get_i64(key).unwrap_or(default)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.field(key)?.as_f64()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.field(key)?.as_bool()
    }

    pub fn get_object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.field(key)?.as_object()
    }

    /// Decodes the body object as a record of `table`.
    pub fn record(&self, table: &str) -> Result<Record, CodecError> {
        let table = self.schema.get(table).ok_or_else(|| CodecError::UnknownTable(table.to_owned()))?;
        codec::decode_record(&self.value, table, &self.schema, &self.formats)
    }

    /// Decodes every element of the body array; an object body yields one record.
    pub fn records(&self, table: &str) -> Result<Vec<Record>, CodecError> {
        let meta = self.schema.get(table).ok_or_else(|| CodecError::UnknownTable(table.to_owned()))?;
        match &self.value {
            Value::Array(items) => items.iter()
                .map(|item| codec::decode_record(item, meta, &self.schema, &self.formats))
                .collect(),
            other => Ok(vec![codec::decode_record(other, meta, &self.schema, &self.formats)?]),
        }
    }
}

impl private::Sealed for JsonRequest {}

impl FromContext for JsonRequest {
    const KIND: ParamKind = ParamKind::Json;

    fn from_context(cx: &RequestContext) -> Result<Self, DispatchError> {
        match &cx.body {
            Body::Json(value) if value.is_object() || value.is_array() => Ok(Self {
                value: value.clone(),
                schema: Arc::clone(&cx.schema),
                formats: Arc::clone(&cx.formats),
            }),
            _ => Err(DispatchError::JsonTypeMismatch { path: cx.path.clone(), object_only: false }),
        }
    }
}

/// A JSON body that must be an object.
#[derive(Clone, Debug)]
pub struct JsonObject(JsonRequest);

impl JsonObject {
    pub fn into_inner(self) -> JsonRequest { self.0 }
}

impl Deref for JsonObject {
    type Target = JsonRequest;

    fn deref(&self) -> &JsonRequest {
        &self.0
    }
}

impl private::Sealed for JsonObject {}

impl FromContext for JsonObject {
    const KIND: ParamKind = ParamKind::JsonObject;

    fn from_context(cx: &RequestContext) -> Result<Self, DispatchError> {
        let json = JsonRequest::from_context(cx)?;
        if json.value.is_object() {
            Ok(Self(json))
        } else {
            Err(DispatchError::JsonTypeMismatch { path: cx.path.clone(), object_only: true })
        }
    }
}

// ── CSV / form / text ─────────────────────────────────────────────────────────

/// CSV rows plus the header index.
#[derive(Clone, Debug, Default)]
pub struct CsvRequest {
    table: CsvTable,
}

impl CsvRequest {
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.table.headers().keys().map(String::as_str)
    }

    /// Column index of a header name.
    pub fn index(&self, header: &str) -> Option<usize> {
        self.table.headers().get(header).copied()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        self.table.rows()
    }

    /// Field of row `row` under `header`.
    pub fn field(&self, row: usize, header: &str) -> Option<&str> {
        let index = self.index(header)?;
        self.table.rows().get(row)?.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize { self.table.rows().len() }
    pub fn is_empty(&self) -> bool { self.table.rows().is_empty() }
}

impl private::Sealed for CsvRequest {}

impl FromContext for CsvRequest {
    const KIND: ParamKind = ParamKind::Csv;

    fn from_context(cx: &RequestContext) -> Result<Self, DispatchError> {
        let table = match &cx.body {
            Body::Csv(table) => table.clone(),
            _ => CsvTable::default(),
        };
        Ok(Self { table })
    }
}

/// Query or form parameters.
#[derive(Clone, Debug, Default)]
pub struct FormRequest {
    params: Params,
}

impl FormRequest {
    pub fn get(&self, name: &str) -> Option<&str> { self.params.get(name) }
    pub fn get_all(&self, name: &str) -> &[String] { self.params.get_all(name) }
    pub fn params(&self) -> &Params { &self.params }
}

impl private::Sealed for FormRequest {}

impl FromContext for FormRequest {
    const KIND: ParamKind = ParamKind::Form;

    fn from_context(cx: &RequestContext) -> Result<Self, DispatchError> {
        let params = match &cx.body {
            Body::Params(params) => params.clone(),
            _ => Params::default(),
        };
        Ok(Self { params })
    }
}

/// The body as text. Empty unless the request carried a text body.
#[derive(Clone, Debug, Default)]
pub struct TextRequest {
    text: String,
}

impl TextRequest {
    pub fn text(&self) -> &str { &self.text }
    pub fn into_string(self) -> String { self.text }
}

impl private::Sealed for TextRequest {}

impl FromContext for TextRequest {
    const KIND: ParamKind = ParamKind::Text;

    fn from_context(cx: &RequestContext) -> Result<Self, DispatchError> {
        let text = match &cx.body {
            Body::Text(text) => text.clone(),
            _ => String::new(),
        };
        Ok(Self { text })
    }
}

// ── Raw handles ───────────────────────────────────────────────────────────────

/// The inbound request, headers and all.
#[derive(Clone, Debug)]
pub struct RawRequest(Arc<Request>);

impl Deref for RawRequest {
    type Target = Request;

    fn deref(&self) -> &Request {
        &self.0
    }
}

impl private::Sealed for RawRequest {}

impl FromContext for RawRequest {
    const KIND: ParamKind = ParamKind::RawRequest;

    fn from_context(cx: &RequestContext) -> Result<Self, DispatchError> {
        Ok(Self(Arc::clone(&cx.request)))
    }
}

/// The outbound response, for handlers that write it themselves.
///
/// A handler taking this must return `()` (or `Result<(), E>`). When it
/// returns without writing anything the client gets an empty `200`.
#[derive(Clone, Debug, Default)]
pub struct ResponseHandle {
    slot: Arc<Mutex<Option<Response>>>,
}

impl ResponseHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Writes the response. A second write replaces the first.
    pub fn send(&self, response: impl IntoResponse) {
        let mut slot = self.slot.lock();
        if slot.is_some() {
            tracing::warn!("response written twice, keeping the last one");
        }
        *slot = Some(response.into_response());
    }

    pub fn success(&self, text: &str) { self.send(Response::html(Status::Ok, text)) }
    pub fn accepted(&self, text: &str) { self.send(Response::html(Status::Accepted, text)) }
    pub fn no_content(&self) { self.send(Status::NoContent) }
    pub fn forbidden(&self, text: &str) { self.send(Response::html(Status::Forbidden, text)) }
    pub fn error(&self, text: &str) { self.send(Response::html(Status::BadRequest, text)) }
    pub fn unauthorized(&self, text: &str) { self.send(Response::html(Status::Unauthorized, text)) }
    pub fn unavailable(&self, text: &str) { self.send(Response::html(Status::ServiceUnavailable, text)) }

    pub fn is_written(&self) -> bool {
        self.slot.lock().is_some()
    }

    pub(crate) fn take(&self) -> Option<Response> {
        self.slot.lock().take()
    }
}

impl private::Sealed for ResponseHandle {}

impl FromContext for ResponseHandle {
    const KIND: ParamKind = ParamKind::ResponseHandle;

    fn from_context(cx: &RequestContext) -> Result<Self, DispatchError> {
        Ok(cx.response.clone())
    }
}

/// The part of the path beyond a pattern route's prefix, without the leading
/// slash. Only valid on pattern routes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PathSuffix(String);

impl PathSuffix {
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_string(self) -> String { self.0 }
}

impl Deref for PathSuffix {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl private::Sealed for PathSuffix {}

impl FromContext for PathSuffix {
    const KIND: ParamKind = ParamKind::PathSuffix;

    fn from_context(cx: &RequestContext) -> Result<Self, DispatchError> {
        Ok(Self(cx.suffix.clone().unwrap_or_default()))
    }
}
