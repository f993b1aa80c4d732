//! Shared utilities for integration testing.

use std::net::SocketAddr;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use trie_dispatch::config::ServerConfig;
use trie_dispatch::http::{HttpServer, Response};
use trie_dispatch::lifecycle::Shutdown;
use trie_dispatch::net::{Listener, ListenerError};
use trie_dispatch::routing::{BodySchema, FieldKind, Param, Router};

/// A server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), ListenerError>>,
}

/// Routes used across the integration tests.
pub fn test_router() -> Router {
    let item = BodySchema::new("Item")
        .field("name", FieldKind::String)
        .optional("qty", FieldKind::Integer)
        .optional("tag", FieldKind::List);

    let mut router = Router::new();
    router
        .get("/health", vec![], |_| Ok(Response::json(json!({"status": "ok"}))))
        .unwrap()
        .get("/users/{id}", vec![Param::path("id")], |args| {
            Ok(Response::json(json!({ "id": args.path("id")? })))
        })
        .unwrap()
        .post("/items", vec![Param::body("item", item.clone())], |args| {
            Ok(Response::json(json!({ "item": args.body("item")?.to_value() })))
        })
        .unwrap()
        .put(
            "/items/{id}",
            vec![Param::path("id"), Param::body("item", item), Param::headers("headers")],
            |args| {
                Ok(Response::json(json!({
                    "id": args.path("id")?,
                    "item": args.body("item")?.to_value(),
                    "headers": args.headers("headers")?,
                })))
            },
        )
        .unwrap();
    router
}

/// Start a server with `config` on 127.0.0.1 and an OS-assigned port.
pub async fn start_server(mut config: ServerConfig) -> TestServer {
    config.listener.bind_address = "127.0.0.1:0".to_string();
    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, test_router().into_dispatcher());
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        shutdown,
        handle,
    }
}

/// Send raw request bytes and read until the server closes the connection.
pub async fn send_raw(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8(buf).unwrap()
}

/// A response split into its header lines and JSON body.
#[allow(dead_code)]
pub struct WireResponse {
    pub head: Vec<String>,
    pub body: Value,
    pub raw_body: String,
}

#[allow(dead_code)]
impl WireResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.iter().find_map(|line| {
            let (k, v) = line.split_once(": ")?;
            k.eq_ignore_ascii_case(name).then_some(v)
        })
    }
}

pub fn parse_wire(raw: &str) -> WireResponse {
    let (head, body) = raw
        .split_once("\r\n\r\n")
        .expect("response has a header terminator");
    WireResponse {
        head: head.split("\r\n").map(str::to_string).collect(),
        body: serde_json::from_str(body).expect("response body is JSON"),
        raw_body: body.to_string(),
    }
}
