//! JSON and text encoding of records against column metadata.
//!
//! Typed encoding walks a [`Table`]'s columns, so every column appears in the
//! output even when the record holds `NULL` for it: a null scalar becomes the
//! type's zero (`""`, `0`, `0.0`, `false`), a null temporal becomes `""`, and
//! a null foreign key becomes `{}`. A non-null foreign key is rendered with
//! the referenced table's columns, one level deep.
//!
//! [`decode_record`] is the inverse: feeding it the output of
//! [`encode_record`] with the same table yields the defaulted record back.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Map, Number, Value};

use crate::record::{Record, Schema, SqlType, SqlValue, Table};

/// Text formats for temporal values (chrono `strftime` syntax).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Formats {
    pub date: String,
    pub date_time: String,
    pub time: String,
}

impl Default for Formats {
    fn default() -> Self {
        Self {
            date: "%Y-%m-%d".to_owned(),
            date_time: "%Y-%m-%d %H:%M".to_owned(),
            time: "%H:%M".to_owned(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CodecError {
    #[error("table {0} is not part of the schema")]
    UnknownTable(String),

    #[error("column {column} holds a record but references no known table")]
    MissingReference { column: String },

    #[error("column {column}: expected {expected:?}, found {found}")]
    TypeMismatch {
        column: String,
        expected: SqlType,
        found: String,
    },
}

/// Encodes `record` against `table`.
///
/// With a non-empty `projection` only those columns are written, in that
/// order; names the table does not know are written untyped.
pub fn encode_record(
    record: &Record,
    table: &Table,
    projection: Option<&[String]>,
    schema: &Schema,
    formats: &Formats,
) -> Result<Value, CodecError> {
    let mut out = Map::new();
    match projection.filter(|p| !p.is_empty()) {
        Some(columns) => {
            for name in columns {
                let value = record.value(name);
                let encoded = match table.find(name) {
                    Some(column) => encode_typed(&column.name, column.sql_type, column.reference.as_deref(), value, schema, formats, 0)?,
                    None => encode_value(value, formats),
                };
                out.insert(name.clone(), encoded);
            }
        }
        None => {
            for column in &table.columns {
                let value = record.value(&column.name);
                let encoded = encode_typed(&column.name, column.sql_type, column.reference.as_deref(), value, schema, formats, 0)?;
                out.insert(column.name.clone(), encoded);
            }
        }
    }
    Ok(Value::Object(out))
}

fn encode_typed(
    name: &str,
    sql_type: SqlType,
    reference: Option<&str>,
    value: &SqlValue,
    schema: &Schema,
    formats: &Formats,
    depth: usize,
) -> Result<Value, CodecError> {
    match value {
        SqlValue::Null if reference.is_some() => Ok(Value::Object(Map::new())),
        SqlValue::Null => Ok(match sql_type.null_default() {
            SqlValue::Null => Value::String(String::new()),
            zero => encode_value(&zero, formats),
        }),
        SqlValue::Record(nested) => {
            let ref_table = reference
                .and_then(|t| schema.get(t))
                .ok_or_else(|| CodecError::MissingReference { column: name.to_owned() })?;
            if depth > 0 {
                return Ok(encode_value(value, formats));
            }
            let mut out = Map::new();
            for column in &ref_table.columns {
                let encoded = encode_typed(
                    &column.name,
                    column.sql_type,
                    column.reference.as_deref(),
                    nested.value(&column.name),
                    schema,
                    formats,
                    depth + 1,
                )?;
                out.insert(column.name.clone(), encoded);
            }
            Ok(Value::Object(out))
        }
        other => Ok(encode_value(other, formats)),
    }
}

/// Name-based encoding for records without table metadata.
pub fn encode_untyped(record: &Record, projection: Option<&[String]>, formats: &Formats) -> Value {
    let out = match projection.filter(|p| !p.is_empty()) {
        Some(columns) => columns.iter()
            .map(|name| (name.clone(), encode_value(record.value(name), formats)))
            .collect(),
        None => record.iter()
            .map(|(name, value)| (name.to_owned(), encode_value(value, formats)))
            .collect(),
    };
    Value::Object(out)
}

/// A single value by its own variant; `Null` stays `null`.
pub fn encode_value(value: &SqlValue, formats: &Formats) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Text(s) => Value::String(s.clone()),
        SqlValue::Int(n) => Value::from(*n),
        SqlValue::BigInt(n) => Value::from(*n),
        SqlValue::Double(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
        SqlValue::Bool(b) => Value::Bool(*b),
        SqlValue::Date(d) => Value::String(d.format(&formats.date).to_string()),
        SqlValue::DateTime(d) => Value::String(d.format(&formats.date_time).to_string()),
        SqlValue::Time(t) => Value::String(t.format(&formats.time).to_string()),
        SqlValue::Record(r) => encode_untyped(r, None, formats),
    }
}

/// Plain-text form used for CSV cells. `Null` is the empty string.
pub fn value_text(value: &SqlValue, formats: &Formats) -> String {
    match value {
        SqlValue::Null => String::new(),
        SqlValue::Text(s) => s.clone(),
        SqlValue::Int(n) => n.to_string(),
        SqlValue::BigInt(n) => n.to_string(),
        SqlValue::Double(n) => n.to_string(),
        SqlValue::Bool(b) => b.to_string(),
        SqlValue::Date(d) => d.format(&formats.date).to_string(),
        SqlValue::DateTime(d) => d.format(&formats.date_time).to_string(),
        SqlValue::Time(t) => t.format(&formats.time).to_string(),
        SqlValue::Record(r) => encode_untyped(r, None, formats).to_string(),
    }
}

/// Decodes a JSON object into a record of `table`'s columns.
///
/// Missing keys and JSON `null` decode to the column type's null default;
/// `""` in a temporal column and `{}` in a foreign-key column decode to `Null`.
pub fn decode_record(
    json: &Value,
    table: &Table,
    schema: &Schema,
    formats: &Formats,
) -> Result<Record, CodecError> {
    let object = json.as_object().ok_or_else(|| CodecError::TypeMismatch {
        column: table.name.clone(),
        expected: SqlType::Varchar,
        found: kind_of(json).to_owned(),
    })?;
    let mut record = Record::new();
    for column in &table.columns {
        let raw = object.get(&column.name).unwrap_or(&Value::Null);
        let value = match column.reference.as_deref() {
            Some(ref_name) => decode_reference(&column.name, ref_name, raw, schema, formats)?,
            None => decode_value(&column.name, column.sql_type, raw, formats)?,
        };
        record.set(&column.name, value);
    }
    Ok(record)
}

fn decode_reference(
    column: &str,
    ref_name: &str,
    raw: &Value,
    schema: &Schema,
    formats: &Formats,
) -> Result<SqlValue, CodecError> {
    match raw {
        Value::Null => Ok(SqlValue::Null),
        Value::Object(map) if map.is_empty() => Ok(SqlValue::Null),
        Value::Object(_) => {
            let table = schema
                .get(ref_name)
                .ok_or_else(|| CodecError::MissingReference { column: column.to_owned() })?;
            Ok(decode_record(raw, table, schema, formats)?.into())
        }
        other => Err(mismatch(column, SqlType::BigInt, other)),
    }
}

fn decode_value(column: &str, sql_type: SqlType, raw: &Value, formats: &Formats) -> Result<SqlValue, CodecError> {
    if raw.is_null() {
        return Ok(sql_type.null_default());
    }
    let err = || mismatch(column, sql_type, raw);
    let value = match sql_type {
        SqlType::Varchar => SqlValue::Text(raw.as_str().ok_or_else(err)?.to_owned()),
        SqlType::Integer => {
            let n = raw.as_i64().ok_or_else(err)?;
            SqlValue::Int(i32::try_from(n).map_err(|_| err())?)
        }
        SqlType::BigInt => SqlValue::BigInt(raw.as_i64().ok_or_else(err)?),
        SqlType::Double | SqlType::Decimal => SqlValue::Double(raw.as_f64().ok_or_else(err)?),
        SqlType::Boolean => SqlValue::Bool(raw.as_bool().ok_or_else(err)?),
        SqlType::Date | SqlType::Time | SqlType::Timestamp => {
            let text = raw.as_str().ok_or_else(err)?.trim();
            if text.is_empty() {
                SqlValue::Null
            } else {
                parse_temporal(sql_type, text, formats).ok_or_else(err)?
            }
        }
    };
    Ok(value)
}

fn parse_temporal(sql_type: SqlType, text: &str, formats: &Formats) -> Option<SqlValue> {
    match sql_type {
        SqlType::Date => NaiveDate::parse_from_str(text, &formats.date).ok().map(SqlValue::Date),
        SqlType::Timestamp => NaiveDateTime::parse_from_str(text, &formats.date_time)
            .ok()
            .map(SqlValue::DateTime),
        SqlType::Time => NaiveTime::parse_from_str(text, &formats.time).ok().map(SqlValue::Time),
        _ => None,
    }
}

fn mismatch(column: &str, expected: SqlType, found: &Value) -> CodecError {
    CodecError::TypeMismatch {
        column: column.to_owned(),
        expected,
        found: kind_of(found).to_owned(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::record::Column;

    fn schema() -> Schema {
        Schema::new()
            .table(
                Table::new("category")
                    .column(Column::new("id", SqlType::BigInt))
                    .column(Column::new("title", SqlType::Varchar)),
            )
            .table(item_table())
    }

    fn item_table() -> Table {
        Table::new("item")
            .column(Column::new("id", SqlType::BigInt))
            .column(Column::new("name", SqlType::Varchar))
            .column(Column::new("qty", SqlType::Integer))
            .column(Column::new("price", SqlType::Decimal))
            .column(Column::new("active", SqlType::Boolean))
            .column(Column::new("added", SqlType::Date))
            .column(Column::reference("category", SqlType::BigInt, "category"))
    }

    #[test]
    fn nulls_render_as_typed_defaults() {
        let record = Record::new().with("id", 7i64);
        let json = encode_record(&record, &item_table(), None, &schema(), &Formats::default()).unwrap();
        assert_eq!(
            json,
            json!({
                "id": 7, "name": "", "qty": 0, "price": 0.0,
                "active": false, "added": "", "category": {}
            })
        );
    }

    #[test]
    fn foreign_key_uses_referenced_columns() {
        let category = Record::new().with("id", 3i64).with("title", "tools").with("extra", "dropped");
        let record = Record::new().with("id", 1i64).with("category", category);
        let json = encode_record(&record, &item_table(), None, &schema(), &Formats::default()).unwrap();
        assert_eq!(json["category"], json!({"id": 3, "title": "tools"}));
    }

    #[test]
    fn record_in_plain_column_is_an_error() {
        let record = Record::new().with("name", Record::new());
        let err = encode_record(&record, &item_table(), None, &schema(), &Formats::default()).unwrap_err();
        assert_eq!(err, CodecError::MissingReference { column: "name".into() });
    }

    #[test]
    fn projection_limits_and_orders_columns() {
        let record = Record::new().with("id", 1i64).with("name", "widget");
        let projection = vec!["name".to_owned(), "id".to_owned()];
        let json = encode_record(&record, &item_table(), Some(&projection), &schema(), &Formats::default()).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["name", "id"]);
    }

    #[test]
    fn decode_inverts_encode() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let record = Record::new()
            .with("id", 1i64)
            .with("name", None::<String>)
            .with("qty", 4)
            .with("price", 2.5)
            .with("active", true)
            .with("added", date)
            .with("category", Record::new().with("id", 3i64).with("title", "tools"));
        let formats = Formats::default();
        let json = encode_record(&record, &item_table(), None, &schema(), &formats).unwrap();
        let back = decode_record(&json, &item_table(), &schema(), &formats).unwrap();
        assert_eq!(back.value("name"), &SqlValue::Text(String::new()));
        assert_eq!(back.value("added"), &SqlValue::Date(date));
        assert_eq!(back.value("qty"), &SqlValue::Int(4));
        assert_eq!(
            back.value("category"),
            &SqlValue::from(Record::new().with("id", 3i64).with("title", "tools"))
        );
    }

    #[test]
    fn decimals_survive_json_text() {
        let formats = Formats::default();
        let table = item_table();
        for price in [127312048.16540599, 0.1 + 0.2, -987654321.1234567, 1e-7] {
            let record = Record::new().with("price", price);
            let text = encode_record(&record, &table, None, &schema(), &formats).unwrap().to_string();
            let parsed: Value = serde_json::from_str(&text).unwrap();
            let back = decode_record(&parsed, &table, &schema(), &formats).unwrap();
            assert_eq!(back.value("price"), &SqlValue::Double(price), "{text}");
        }
    }

    #[test]
    fn decode_rejects_wrong_json_type() {
        let err = decode_record(&json!({"qty": "four"}), &item_table(), &schema(), &Formats::default()).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { ref column, .. } if column == "qty"));
    }

    #[test]
    fn value_text_formats_temporal_values() {
        let formats = Formats::default();
        let at = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(15, 4, 0).unwrap();
        assert_eq!(value_text(&SqlValue::DateTime(at), &formats), "2024-01-02 15:04");
        assert_eq!(value_text(&SqlValue::Null, &formats), "");
        assert_eq!(value_text(&SqlValue::Int(5), &formats), "5");
    }
}
