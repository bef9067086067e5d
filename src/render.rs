//! Result renderer: [`Reply`] to wire bytes.

use chrono::{Local, NaiveDateTime};
use serde_json::{Map, Value};

use crate::codec::{self, CodecError, Formats};
use crate::error::DispatchError;
use crate::localize::Localizer;
use crate::record::{QueryResult, Record, Schema};
use crate::reply::{CsvPayload, CsvReply, JsonPayload, JsonReply, Message, Reply, ServletReply};
use crate::response::{ContentType, Response};

/// Renders replies for one dispatcher.
pub struct Renderer<'a> {
    schema: &'a Schema,
    formats: &'a Formats,
    localizer: &'a dyn Localizer,
}

impl<'a> Renderer<'a> {
    pub fn new(schema: &'a Schema, formats: &'a Formats, localizer: &'a dyn Localizer) -> Self {
        Self { schema, formats, localizer }
    }

    /// Renders `reply` for the request at `path`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnimplementedResponseType`] for a JSON scalar payload,
    /// [`DispatchError::Render`] when a record does not fit its table.
    pub fn render(&self, path: &str, reply: Reply) -> Result<Response, DispatchError> {
        match reply {
            Reply::Json(json) => self.json(path, json),
            Reply::Csv(csv) => self.csv(path, csv),
            Reply::Servlet(servlet) => Ok(self.servlet(servlet)),
        }
    }

    fn json(&self, path: &str, reply: JsonReply) -> Result<Response, DispatchError> {
        let failed = |e: CodecError| DispatchError::Render { path: path.to_owned(), reason: e.to_string() };
        let table = reply.table.as_deref();
        let columns = reply.columns.as_slice();

        let document = match reply.payload {
            JsonPayload::Record(record) => self.encode(&record, table, columns).map_err(failed)?,
            JsonPayload::Records(rows) => Value::Array(
                rows.iter()
                    .map(|row| self.encode(row, table, columns))
                    .collect::<Result<_, _>>()
                    .map_err(failed)?,
            ),
            JsonPayload::Page(page) => {
                let rows = page.rows.iter()
                    .map(|row| self.encode(row, table, columns))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(failed)?;
                let size = rows.len();
                let mut out = Map::new();
                out.insert("limit".to_owned(), page.limit.into());
                out.insert("offset".to_owned(), page.offset.into());
                out.insert("orderBy".to_owned(), page.order_by.unwrap_or_default().into());
                out.insert("totalRecords".to_owned(), page.total_records.into());
                out.insert(page.name, Value::Array(rows));
                out.insert("size".to_owned(), size.into());
                Value::Object(out)
            }
            JsonPayload::Value(value @ (Value::Object(_) | Value::Array(_))) => value,
            JsonPayload::Value(_) => {
                return Err(DispatchError::UnimplementedResponseType { path: path.to_owned() });
            }
            JsonPayload::QueryResult(result) => Value::Array(
                result.records()
                    .iter()
                    .map(|row| codec::encode_untyped(row, None, self.formats))
                    .collect(),
            ),
        };

        let body = serde_json::to_vec(&document)
            .map_err(|e| DispatchError::Render { path: path.to_owned(), reason: e.to_string() })?;
        Ok(Response::builder()
            .header_opt("content-disposition", attachment(reply.attachment.as_deref(), "json").as_deref())
            .json(body))
    }

    fn encode(&self, record: &Record, table: Option<&str>, columns: &[String]) -> Result<Value, CodecError> {
        let projection = (!columns.is_empty()).then_some(columns);
        match table.and_then(|name| self.schema.get(name)) {
            Some(meta) => codec::encode_record(record, meta, projection, self.schema, self.formats),
            None => Ok(codec::encode_untyped(record, projection, self.formats)),
        }
    }

    fn csv(&self, path: &str, reply: CsvReply) -> Result<Response, DispatchError> {
        let failed = |reason: String| DispatchError::Render { path: path.to_owned(), reason };

        let (header, rows) = match &reply.payload {
            CsvPayload::QueryResult(result) => (
                reply.header.clone().unwrap_or_else(|| qualified_header(result)),
                result.rows.iter()
                    .map(|row| row.iter().map(|v| codec::value_text(v, self.formats)).collect::<Vec<_>>())
                    .collect::<Vec<_>>(),
            ),
            CsvPayload::Records(records) => {
                let columns = if reply.columns.is_empty() {
                    reply.header.clone().unwrap_or_default()
                } else {
                    reply.columns.clone()
                };
                let rows = records.iter()
                    .map(|record| {
                        columns.iter()
                            .map(|column| codec::value_text(record.value(column), self.formats))
                            .collect::<Vec<_>>()
                    })
                    .collect();
                (reply.header.clone().unwrap_or(columns), rows)
            }
        };

        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer.write_record(&header).map_err(|e| failed(e.to_string()))?;
        for row in &rows {
            writer.write_record(row).map_err(|e| failed(e.to_string()))?;
        }
        let body = writer.into_inner().map_err(|e| failed(e.to_string()))?;

        Ok(Response::builder()
            .header_opt("content-disposition", attachment(reply.attachment.as_deref(), "csv").as_deref())
            .bytes(ContentType::Csv, body))
    }

    fn servlet(&self, reply: ServletReply) -> Response {
        let text = match reply.message {
            Message::Literal(text) => text,
            Message::Coded { code, args } => self.localizer.message(&code, &args),
        };
        Response::html(reply.status, text)
    }
}

/// `table.column` for each result column.
fn qualified_header(result: &QueryResult) -> Vec<String> {
    result.columns.iter().map(|c| format!("{}.{}", c.table, c.column)).collect()
}

fn attachment(name: Option<&str>, extension: &str) -> Option<String> {
    name.map(|name| attachment_value(name, extension, Local::now().naive_local()))
}

/// `attachment; filename=<name>-<yyyyMMddhh>.<ext>`, hour on the 12-hour clock.
fn attachment_value(name: &str, extension: &str, now: NaiveDateTime) -> String {
    let stamp: String = now.format("%Y %m %d %I")
        .to_string()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    format!("attachment; filename={name}-{stamp}.{extension}")
}
