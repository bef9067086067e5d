//! What a handler hands back to the renderer.
//!
//! [`Reply`] is a closed sum: JSON, CSV, or a plain status line. Each variant
//! carries its payload plus the metadata the renderer needs (table name for
//! typed encoding, a column projection, an attachment name).

use serde_json::Value;

use crate::record::{Page, QueryResult, Record};
use crate::status::Status;

/// A handler's result.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Json(JsonReply),
    Csv(CsvReply),
    Servlet(ServletReply),
}

impl From<JsonReply> for Reply {
    fn from(reply: JsonReply) -> Self {
        Self::Json(reply)
    }
}

impl From<CsvReply> for Reply {
    fn from(reply: CsvReply) -> Self {
        Self::Csv(reply)
    }
}

impl From<ServletReply> for Reply {
    fn from(reply: ServletReply) -> Self {
        Self::Servlet(reply)
    }
}

// ── JSON ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum JsonPayload {
    Record(Record),
    Records(Vec<Record>),
    Page(Page),
    /// Passed through as is; must be an object or an array.
    Value(Value),
    QueryResult(QueryResult),
}

/// A JSON document.
///
/// ```rust
/// use switchboard::{JsonReply, Record};
///
/// let rows = vec![Record::new().with("id", 1i64).with("name", "widget")];
/// let reply = JsonReply::records("item", rows)
///     .columns(["id", "name"])
///     .attachment("items");
/// assert_eq!(reply.attachment_name(), Some("items"));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct JsonReply {
    pub(crate) payload: JsonPayload,
    pub(crate) table: Option<String>,
    pub(crate) columns: Vec<String>,
    pub(crate) attachment: Option<String>,
}

impl JsonReply {
    fn with_payload(payload: JsonPayload, table: Option<&str>) -> Self {
        Self {
            payload,
            table: table.map(str::to_owned),
            columns: Vec::new(),
            attachment: None,
        }
    }

    /// One record of `table`, rendered as an object.
    pub fn record(table: &str, record: Record) -> Self {
        Self::with_payload(JsonPayload::Record(record), Some(table))
    }

    /// Records of `table`, rendered as an array of objects.
    pub fn records(table: &str, rows: Vec<Record>) -> Self {
        Self::with_payload(JsonPayload::Records(rows), Some(table))
    }

    /// A page of `table` rows plus its paging fields.
    pub fn page(table: &str, page: Page) -> Self {
        Self::with_payload(JsonPayload::Page(page), Some(table))
    }

    pub fn value(value: Value) -> Self {
        Self::with_payload(JsonPayload::Value(value), None)
    }

    pub fn query(result: QueryResult) -> Self {
        Self::with_payload(JsonPayload::QueryResult(result), None)
    }

    /// Restricts record rendering to these columns, in this order.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sends the document as a download named `<name>-<timestamp>.json`.
    pub fn attachment(mut self, name: &str) -> Self {
        self.attachment = Some(name.to_owned());
        self
    }

    pub fn payload(&self) -> &JsonPayload { &self.payload }
    pub fn table(&self) -> Option<&str> { self.table.as_deref() }
    pub fn attachment_name(&self) -> Option<&str> { self.attachment.as_deref() }
}

// ── CSV ───────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum CsvPayload {
    QueryResult(QueryResult),
    Records(Vec<Record>),
}

/// A CSV document with a header row.
#[derive(Clone, Debug, PartialEq)]
pub struct CsvReply {
    pub(crate) payload: CsvPayload,
    pub(crate) header: Option<Vec<String>>,
    pub(crate) columns: Vec<String>,
    pub(crate) attachment: Option<String>,
}

impl CsvReply {
    /// Query rows under a `table.column` header.
    pub fn query(result: QueryResult) -> Self {
        Self { payload: CsvPayload::QueryResult(result), header: None, columns: Vec::new(), attachment: None }
    }

    /// Typed rows, one CSV column per entry of `columns`.
    pub fn records<I, S>(columns: I, rows: Vec<Record>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            payload: CsvPayload::Records(rows),
            header: None,
            columns: columns.into_iter().map(Into::into).collect(),
            attachment: None,
        }
    }

    /// The rows of one page; the paging fields are not exported.
    pub fn page<I, S>(columns: I, page: Page) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::records(columns, page.rows)
    }

    /// A single record as a one-row document.
    pub fn record<I, S>(columns: I, record: Record) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::records(columns, vec![record])
    }

    /// Replaces the derived header row.
    pub fn header<I, S>(mut self, header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header = Some(header.into_iter().map(Into::into).collect());
        self
    }

    /// Sends the document as a download named `<name>-<timestamp>.csv`.
    pub fn attachment(mut self, name: &str) -> Self {
        self.attachment = Some(name.to_owned());
        self
    }

    pub fn payload(&self) -> &CsvPayload { &self.payload }
    pub fn attachment_name(&self) -> Option<&str> { self.attachment.as_deref() }
}

// ── Status line ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Message {
    Literal(String),
    /// Resolved through the localiser at render time.
    Coded { code: String, args: Vec<String> },
}

/// A status code plus a `text/html` message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServletReply {
    pub(crate) status: Status,
    pub(crate) message: Message,
}

impl ServletReply {
    pub fn new(status: Status, text: impl Into<String>) -> Self {
        Self { status, message: Message::Literal(text.into()) }
    }

    /// A message looked up by code, `{0}`… filled from `args`.
    pub fn coded<A: Into<String>>(status: Status, code: &str, args: impl IntoIterator<Item = A>) -> Self {
        Self {
            status,
            message: Message::Coded {
                code: code.to_owned(),
                args: args.into_iter().map(Into::into).collect(),
            },
        }
    }

    pub fn success(text: impl Into<String>) -> Self { Self::new(Status::Ok, text) }
    pub fn accepted(text: impl Into<String>) -> Self { Self::new(Status::Accepted, text) }
    pub fn no_content() -> Self { Self::new(Status::NoContent, "") }
    pub fn forbidden(text: impl Into<String>) -> Self { Self::new(Status::Forbidden, text) }
    pub fn error(text: impl Into<String>) -> Self { Self::new(Status::BadRequest, text) }
    pub fn unauthorized(text: impl Into<String>) -> Self { Self::new(Status::Unauthorized, text) }
    pub fn unavailable(text: impl Into<String>) -> Self { Self::new(Status::ServiceUnavailable, text) }

    pub fn status(&self) -> Status { self.status }
    pub fn message(&self) -> &Message { &self.message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_pick_status() {
        assert_eq!(ServletReply::success("ok").status(), Status::Ok);
        assert_eq!(ServletReply::error("bad").status(), Status::BadRequest);
        assert_eq!(ServletReply::unavailable("later").status(), Status::ServiceUnavailable);
        assert_eq!(ServletReply::no_content().message(), &Message::Literal(String::new()));
    }

    #[test]
    fn coded_keeps_arguments() {
        let reply = ServletReply::coded(Status::BadRequest, "item.name.missing", ["widget"]);
        assert_eq!(
            reply.message(),
            &Message::Coded { code: "item.name.missing".into(), args: vec!["widget".into()] }
        );
    }

    #[test]
    fn page_and_record_export_as_rows() {
        let rows = vec![Record::new().with("id", 1i64), Record::new().with("id", 2i64)];
        let page = Page::new("items", rows.clone()).limit(2).total_records(9);
        assert_eq!(CsvReply::page(["id"], page).payload(), &CsvPayload::Records(rows.clone()));

        let single = CsvReply::record(["id"], rows[0].clone());
        assert_eq!(single.payload(), &CsvPayload::Records(vec![rows[0].clone()]));
        assert_eq!(single.columns, ["id"]);
    }

    #[test]
    fn variants_convert_into_reply() {
        let reply: Reply = CsvReply::records(["id"], Vec::new()).attachment("ids").into();
        let Reply::Csv(csv) = reply else { panic!("expected csv") };
        assert_eq!(csv.attachment_name(), Some("ids"));
        assert_eq!(csv.columns, ["id"]);
    }
}
