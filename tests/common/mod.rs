//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use switchboard::{
    Column, CookieSession, CsvReply, Dispatcher, FormRequest, JsonObject, JsonReply, Method, Page,
    PathSuffix, Record, Request, ResponseHandle, RouteTable, Schema, ServletReply, Service, SqlType,
    Table,
};

pub const SESSION_COOKIE: &str = "SESSION";

pub fn schema() -> Schema {
    Schema::new().table(
        Table::new("item")
            .column(Column::new("id", SqlType::BigInt))
            .column(Column::new("name", SqlType::Varchar))
            .column(Column::new("price", SqlType::Double))
            .column(Column::new("active", SqlType::Boolean)),
    )
}

pub fn items(count: i64) -> Vec<Record> {
    (1..=count)
        .map(|id| Record::new().with("id", id).with("name", format!("item-{id}")).with("price", 1.5 * id as f64))
        .collect()
}

async fn create(body: JsonObject) -> ServletReply {
    ServletReply::accepted(body.get_str_or("name", "?"))
}

async fn page(query: FormRequest) -> JsonReply {
    let limit: i64 = query.get("limit").and_then(|v| v.parse().ok()).unwrap_or(10);
    let offset: i64 = query.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    JsonReply::page(
        "item",
        Page::new("items", items(3)).limit(limit).offset(offset).order_by("id").total_records(37),
    )
}

async fn export() -> CsvReply {
    let rows = vec![
        Record::new().with("id", 3i64).with("name", "gamma"),
        Record::new().with("id", 1i64).with("name", "alpha"),
        Record::new().with("id", 2i64).with("name", "beta"),
    ];
    CsvReply::records(["id", "name"], rows)
}

async fn fetch(id: PathSuffix) -> JsonReply {
    JsonReply::record("item", Record::new().with("id", id.parse::<i64>().unwrap_or(0)))
}

async fn fetch_latest() -> ServletReply {
    ServletReply::success("latest")
}

async fn file(name: PathSuffix) -> ServletReply {
    ServletReply::success(name.into_string())
}

async fn remove(_: PathSuffix, res: ResponseHandle) {
    res.accepted("removed");
}

/// Catalogue service used by most dispatch tests.
pub fn dispatcher() -> Dispatcher {
    let routes = RouteTable::builder()
        .register("/items", Method::Post, true, create)
        .service(
            Service::new("/items")
                .get("/page", page)
                .get("/export", export)
                .get("/get/*", fetch)
                .get("/get/latest", fetch_latest),
        )
        .service(Service::new("/files").get("/*", file))
        .service(Service::new("/admin").secured(true).delete("/items/*", remove))
        .build()
        .unwrap();
    Dispatcher::new(routes)
        .schema(schema())
        .sessions(CookieSession::new(SESSION_COOKIE))
}

pub fn json_post(path: &str, body: &str) -> Request {
    Request::new("POST", path)
        .with_header("content-type", "application/json")
        .with_body(body.to_owned())
}
