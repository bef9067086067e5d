//! Minimal switchboard example: an item catalogue over JSON and CSV.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic [settings.toml]
//!
//! Try:
//!   curl http://localhost:8080/items/list
//!   curl http://localhost:8080/items/get/2
//!   curl http://localhost:8080/items/export
//!   curl -X POST http://localhost:8080/items/create \
//!        -H 'content-type: application/json' \
//!        -H 'cookie: SESSION=demo' \
//!        -d '{"id":4,"name":"sprocket","price":2.5}'
//!   curl -X DELETE http://localhost:8080/items/remove/4 -H 'cookie: SESSION=demo'

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use parking_lot::RwLock;
use switchboard::{
    Column, CookieSession, CsvReply, Dispatcher, FormRequest, HandlerError, JsonObject, JsonReply,
    Messages, Page, PathSuffix, Record, ResponseHandle, RouteTable, Schema, Server, ServletReply,
    Service, Settings, SqlType, SqlValue, Status, Table, logging,
};

type Store = Arc<RwLock<Vec<Record>>>;

fn schema() -> Schema {
    Schema::new()
        .table(
            Table::new("category")
                .column(Column::new("id", SqlType::BigInt))
                .column(Column::new("title", SqlType::Varchar)),
        )
        .table(
            Table::new("item")
                .column(Column::new("id", SqlType::BigInt))
                .column(Column::new("name", SqlType::Varchar))
                .column(Column::new("price", SqlType::Decimal))
                .column(Column::reference("category", SqlType::BigInt, "category")),
        )
}

fn seed() -> Vec<Record> {
    let tools = Record::new().with("id", 1i64).with("title", "tools");
    vec![
        Record::new().with("id", 1i64).with("name", "widget").with("price", 4.0).with("category", tools.clone()),
        Record::new().with("id", 2i64).with("name", "gadget").with("price", None::<f64>).with("category", tools),
        Record::new().with("id", 3i64).with("name", "gizmo").with("price", 9.5),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load(Path::new(&path))?,
        None => Settings::default(),
    };
    logging::init(&settings.log)?;

    let store: Store = Arc::new(RwLock::new(seed()));

    let list = {
        let store = Arc::clone(&store);
        move |query: FormRequest| {
            let store = Arc::clone(&store);
            async move {
                let limit: usize = query.get("limit").and_then(|v| v.parse().ok()).unwrap_or(10);
                let offset: usize = query.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
                let rows = store.read();
                let page: Vec<Record> = rows.iter().skip(offset).take(limit).cloned().collect();
                JsonReply::page(
                    "item",
                    Page::new("items", page)
                        .limit(limit as i64)
                        .offset(offset as i64)
                        .order_by("id")
                        .total_records(rows.len() as i64),
                )
            }
        }
    };

    let get = {
        let store = Arc::clone(&store);
        move |id: PathSuffix| {
            let store = Arc::clone(&store);
            async move {
                let id: i64 = id.parse().context("item id must be a number")?;
                let found = store.read().iter().find(|r| r.value("id") == &SqlValue::BigInt(id)).cloned();
                match found {
                    Some(record) => Ok(JsonReply::record("item", record)),
                    None => Err(HandlerError::coded("item.missing", [id.to_string()])),
                }
            }
        }
    };

    let export = {
        let store = Arc::clone(&store);
        move || {
            let store = Arc::clone(&store);
            async move { CsvReply::records(["id", "name", "price"], store.read().clone()).attachment("items") }
        }
    };

    let create = {
        let store = Arc::clone(&store);
        move |body: JsonObject| {
            let store = Arc::clone(&store);
            async move {
                let name = body.get_str_or("name", "item").to_owned();
                let record = body.record("item")?;
                store.write().push(record);
                anyhow::Ok(ServletReply::coded(Status::Accepted, "item.created", [name]))
            }
        }
    };

    let remove = {
        let store = Arc::clone(&store);
        move |id: PathSuffix, res: ResponseHandle| {
            let store = Arc::clone(&store);
            async move {
                let Ok(id) = id.parse::<i64>() else {
                    res.error("item id must be a number");
                    return;
                };
                let mut rows = store.write();
                let before = rows.len();
                rows.retain(|r| r.value("id") != &SqlValue::BigInt(id));
                if rows.len() == before {
                    res.forbidden("no such item");
                } else {
                    res.no_content();
                }
            }
        }
    };

    let routes = RouteTable::builder()
        .service(
            Service::new("/items")
                .get("/list", list)
                .get("/get/*", get)
                .get("/export", export),
        )
        .service(
            Service::new("/items")
                .secured(true)
                .post("/create", create)
                .delete("/remove/*", remove),
        )
        .build()?;

    let messages = Messages::from_settings(&settings)
        .with_message("item.missing", "Item {0} does not exist")
        .with_message("item.created", "Created {0}");

    let dispatcher = Dispatcher::new(routes)
        .localizer(messages)
        .sessions(CookieSession::new("SESSION"))
        .schema(schema());

    Server::bind(&settings.bind)?.serve(dispatcher).await?;
    Ok(())
}
