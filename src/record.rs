//! Typed rows and the column metadata that describes them.
//!
//! A [`Record`] is one row of named [`SqlValue`]s, as fetched from a
//! relational query. A [`Table`] says what SQL type each column has and which
//! columns reference another table; a [`Schema`] is the set of tables the
//! renderer and the JSON request wrapper look records up against.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;

/// Column types the codec knows how to default and decode.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SqlType {
    Varchar,
    Integer,
    BigInt,
    Double,
    Decimal,
    Boolean,
    Date,
    Time,
    Timestamp,
}

impl SqlType {
    /// Value a `NULL` of this type is rendered as.
    ///
    /// Temporal columns have no typed zero; they stay `Null` and render as `""`.
    pub fn null_default(self) -> SqlValue {
        match self {
            Self::Varchar => SqlValue::Text(String::new()),
            Self::Integer => SqlValue::Int(0),
            Self::BigInt => SqlValue::BigInt(0),
            Self::Double | Self::Decimal => SqlValue::Double(0.0),
            Self::Boolean => SqlValue::Bool(false),
            Self::Date | Self::Time | Self::Timestamp => SqlValue::Null,
        }
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, Self::Date | Self::Time | Self::Timestamp)
    }
}

/// One column value.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Int(i32),
    BigInt(i64),
    Double(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    /// A row of the table a foreign-key column references.
    Record(Box<Record>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

macro_rules! sql_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for SqlValue {
            fn from(v: $ty) -> Self { Self::$variant(v.into()) }
        })*
    };
}

sql_value_from! {
    String => Text,
    &str => Text,
    i32 => Int,
    i64 => BigInt,
    f64 => Double,
    bool => Bool,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    NaiveTime => Time,
}

impl From<Record> for SqlValue {
    fn from(v: Record) -> Self {
        Self::Record(Box::new(v))
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// A typed row of named column values, in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    values: IndexMap<String, SqlValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &str, value: impl Into<SqlValue>) {
        self.values.insert(column.to_owned(), value.into());
    }

    /// The stored value; `None` when the column was never set.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.values.get(column)
    }

    /// The stored value, treating an unset column as `Null`.
    pub fn value(&self, column: &str) -> &SqlValue {
        self.values.get(column).unwrap_or(&SqlValue::Null)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Column metadata.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Column {
    pub name: String,
    pub sql_type: SqlType,
    /// Table this column is a foreign key into.
    pub reference: Option<String>,
}

impl Column {
    pub fn new(name: &str, sql_type: SqlType) -> Self {
        Self { name: name.to_owned(), sql_type, reference: None }
    }

    /// A foreign-key column holding rows of `table`.
    pub fn reference(name: &str, sql_type: SqlType, table: &str) -> Self {
        Self { name: name.to_owned(), sql_type, reference: Some(table.to_owned()) }
    }
}

/// A table: its name and ordered column set.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_owned(), columns: Vec::new() }
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn find(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Every table known to the renderer, keyed case-insensitively.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    tables: HashMap<String, Table>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: Table) -> Self {
        self.tables.insert(table.name.to_lowercase(), table);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(&name.to_lowercase())
    }
}

/// One page of rows plus the paging parameters that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    /// Key the rows are rendered under.
    pub name: String,
    pub limit: i64,
    pub offset: i64,
    pub order_by: Option<String>,
    pub total_records: i64,
    pub rows: Vec<Record>,
}

impl Page {
    pub fn new(name: &str, rows: Vec<Record>) -> Self {
        Self {
            name: name.to_owned(),
            limit: 0,
            offset: 0,
            order_by: None,
            total_records: 0,
            rows,
        }
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    pub fn order_by(mut self, order_by: &str) -> Self {
        self.order_by = Some(order_by.to_owned());
        self
    }

    pub fn total_records(mut self, total: i64) -> Self {
        self.total_records = total;
        self
    }
}

/// Column of an untyped query result.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResultColumn {
    pub table: String,
    pub column: String,
}

/// An opaque query result: positional rows under column metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<ResultColumn>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl QueryResult {
    pub fn new(columns: &[(&str, &str)]) -> Self {
        Self {
            columns: columns.iter()
                .map(|(table, column)| ResultColumn { table: (*table).to_owned(), column: (*column).to_owned() })
                .collect(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, values: Vec<SqlValue>) -> Self {
        self.rows.push(values);
        self
    }

    /// Rows as records keyed by column name.
    pub fn records(&self) -> Vec<Record> {
        self.rows.iter()
            .map(|row| {
                let mut record = Record::new();
                for (meta, value) in self.columns.iter().zip(row) {
                    record.set(&meta.column, value.clone());
                }
                record
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keeps_insertion_order() {
        let record = Record::new().with("b", 1).with("a", "x").with("c", None::<i32>);
        assert_eq!(record.columns().collect::<Vec<_>>(), ["b", "a", "c"]);
        assert_eq!(record.value("c"), &SqlValue::Null);
        assert_eq!(record.value("missing"), &SqlValue::Null);
        assert!(record.get("missing").is_none());
    }

    #[test]
    fn null_defaults_per_type() {
        assert_eq!(SqlType::Varchar.null_default(), SqlValue::Text(String::new()));
        assert_eq!(SqlType::Integer.null_default(), SqlValue::Int(0));
        assert_eq!(SqlType::Decimal.null_default(), SqlValue::Double(0.0));
        assert_eq!(SqlType::Boolean.null_default(), SqlValue::Bool(false));
        assert_eq!(SqlType::Timestamp.null_default(), SqlValue::Null);
    }

    #[test]
    fn schema_lookup_ignores_case() {
        let schema = Schema::new().table(Table::new("Item"));
        assert!(schema.get("item").is_some());
        assert!(schema.get("ITEM").is_some());
        assert!(schema.get("other").is_none());
    }

    #[test]
    fn query_result_rows_become_records() {
        let result = QueryResult::new(&[("item", "id"), ("item", "name")])
            .row(vec![1.into(), "widget".into()]);
        let records = result.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value("name"), &SqlValue::Text("widget".into()));
    }
}
