//! The dispatcher behind a real socket.

use std::time::Duration;

use switchboard::Server;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

mod common;

async fn roundtrip(addr: &str, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn serves_dispatcher_over_http1() {
    let server = Server::bind("127.0.0.1:28471").unwrap();
    let addr = server.addr().to_string();
    let task = tokio::spawn(server.serve(common::dispatcher()));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let csv = roundtrip(&addr, "GET /items/export HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n").await;
    assert!(csv.starts_with("HTTP/1.1 200"), "{csv}");
    assert!(csv.contains("content-type: text/csv"), "{csv}");
    assert!(csv.ends_with("id,name\n3,gamma\n1,alpha\n2,beta\n"), "{csv}");

    let body = r#"{"name":"widget"}"#;
    let denied = roundtrip(
        &addr,
        &format!(
            "POST /items HTTP/1.1\r\nHost: test\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ),
    )
    .await;
    assert!(denied.starts_with("HTTP/1.1 401"), "{denied}");
    assert!(denied.ends_with("Unauthorized access : /items"), "{denied}");

    task.abort();
}

#[tokio::test]
async fn wire_paths_are_percent_decoded() {
    let server = Server::bind("127.0.0.1:28472").unwrap();
    let addr = server.addr().to_string();
    let task = tokio::spawn(server.serve(common::dispatcher()));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let file = roundtrip(
        &addr,
        "GET /files/My%20Report.csv HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(file.starts_with("HTTP/1.1 200"), "{file}");
    assert!(file.ends_with("\r\n\r\nMy Report.csv"), "{file}");

    // an escaped letter still finds the exact route
    let csv = roundtrip(
        &addr,
        "GET /items/%65xport HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(csv.starts_with("HTTP/1.1 200"), "{csv}");
    assert!(csv.ends_with("id,name\n3,gamma\n1,alpha\n2,beta\n"), "{csv}");

    task.abort();
}
