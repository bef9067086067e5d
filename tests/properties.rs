//! Property tests for lookup and the record codec.

use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use switchboard::codec::{self, Formats};
use switchboard::negotiate::normalize_path;
use switchboard::{
    Column, PathSuffix, Record, RouteTable, Schema, ServletReply, Service, SqlType, SqlValue, Table,
};

async fn exact() -> ServletReply {
    ServletReply::success("exact")
}

async fn pattern(rest: PathSuffix) -> ServletReply {
    ServletReply::success(rest.into_string())
}

fn table() -> RouteTable {
    RouteTable::builder()
        .service(
            Service::new("/catalog")
                .get("/items/list", exact)
                .get("/items/*", pattern)
                .get("/files/*", pattern),
        )
        .build()
        .unwrap()
}

fn recase(path: &str, upper: &[bool]) -> String {
    path.chars()
        .zip(upper.iter().cycle())
        .map(|(c, up)| if *up { c.to_ascii_uppercase() } else { c })
        .collect()
}

fn segment() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_.-]{1,8}"
}

fn suffix() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..4).prop_map(|segments| segments.join("/"))
}

proptest! {
    #[test]
    fn exact_routes_ignore_case_and_trailing_slash(
        upper in prop::collection::vec(any::<bool>(), 1..16),
        slash in any::<bool>(),
    ) {
        let table = table();
        let mut path = recase("/catalog/items/list", &upper);
        if slash {
            path.push('/');
        }
        let hit = table.resolve(&normalize_path(&path)).unwrap();
        prop_assert!(!hit.route.is_pattern());
        prop_assert_eq!(hit.route.path(), "/catalog/items/list");
        prop_assert!(hit.suffix.is_none());
    }

    #[test]
    fn pattern_routes_bind_the_suffix(
        prefix in prop::sample::select(vec!["/catalog/items", "/catalog/files"]),
        rest in suffix(),
    ) {
        // the one exact route under a pattern prefix is covered above
        prop_assume!(!(prefix == "/catalog/items" && rest.eq_ignore_ascii_case("list")));

        let table = table();
        let hit = table.resolve(&format!("{prefix}/{rest}")).unwrap();
        prop_assert!(hit.route.is_pattern());
        prop_assert_eq!(hit.route.path(), prefix);
        prop_assert_eq!(hit.suffix.as_deref(), Some(rest.as_str()));
    }
}

fn item_table() -> Table {
    Table::new("item")
        .column(Column::new("id", SqlType::BigInt))
        .column(Column::new("qty", SqlType::Integer))
        .column(Column::new("name", SqlType::Varchar))
        .column(Column::new("price", SqlType::Decimal))
        .column(Column::new("active", SqlType::Boolean))
        .column(Column::new("added", SqlType::Date))
        .column(Column::new("updated", SqlType::Timestamp))
}

fn date() -> impl Strategy<Value = NaiveDate> {
    (1970i32..2100, 1u32..=365).prop_map(|(year, day)| NaiveDate::from_yo_opt(year, day).unwrap())
}

fn date_time() -> impl Strategy<Value = NaiveDateTime> {
    (date(), 0u32..24, 0u32..60).prop_map(|(day, hour, minute)| day.and_hms_opt(hour, minute, 0).unwrap())
}

prop_compose! {
    fn item()(
        id in proptest::option::of(any::<i64>()),
        qty in proptest::option::of(any::<i32>()),
        name in proptest::option::of(".{0,12}"),
        price in proptest::option::of(-1.0e9f64..1.0e9),
        active in proptest::option::of(any::<bool>()),
        added in proptest::option::of(date()),
        updated in proptest::option::of(date_time()),
    ) -> Record {
        Record::new()
            .with("id", id)
            .with("qty", qty)
            .with("name", name)
            .with("price", price)
            .with("active", active)
            .with("added", added)
            .with("updated", updated)
    }
}

/// What a record is expected to look like after a round trip.
fn defaulted(record: &Record, table: &Table) -> Record {
    let mut out = Record::new();
    for column in &table.columns {
        let value = match record.value(&column.name) {
            SqlValue::Null => column.sql_type.null_default(),
            other => other.clone(),
        };
        out.set(&column.name, value);
    }
    out
}

proptest! {
    #[test]
    fn records_survive_encode_and_decode(record in item()) {
        let table = item_table();
        let schema = Schema::new().table(item_table());
        let formats = Formats::default();

        // through text, as a client posting the rendered record back would
        let json = codec::encode_record(&record, &table, None, &schema, &formats).unwrap();
        let text = serde_json::to_string(&json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        let decoded = codec::decode_record(&parsed, &table, &schema, &formats).unwrap();

        prop_assert_eq!(decoded, defaulted(&record, &table));
    }
}
