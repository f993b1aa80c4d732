//! trie-dispatch server binary.
//!
//! # Architecture Overview
//!
//! ```text
//!   raw bytes ─▶ net::listener ─▶ net::connection ─▶ http::request ─▶ routing::dispatcher
//!                                     (read)            (parse)          │
//!                                                                         ▼
//!   raw bytes ◀──────────── http::response ◀──── handler ◀──── routing::trie (search)
//! ```
//!
//! The routes registered here are a small demonstration application; the
//! library does not depend on them.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::json;

use trie_dispatch::config::{load_config, ServerConfig};
use trie_dispatch::http::{HttpServer, Response, StatusCode};
use trie_dispatch::lifecycle::{wait_for_signal, Shutdown};
use trie_dispatch::net::Listener;
use trie_dispatch::observability::{logging, metrics};
use trie_dispatch::routing::{BodySchema, FieldKind, Param, RegistrationError, Router};

#[derive(Parser)]
#[command(name = "trie-dispatch")]
#[command(about = "Trie-routed HTTP request dispatcher", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NewUser {
    name: String,
    email: String,
    age: Option<u32>,
}

fn user_schema() -> BodySchema {
    BodySchema::new("NewUser")
        .field("name", FieldKind::String)
        .field("email", FieldKind::String)
        .optional("age", FieldKind::Integer)
}

fn demo_routes() -> Result<Router, RegistrationError> {
    let mut router = Router::new();
    router
        .get("/health", vec![], |_| Ok(Response::json(json!({"status": "ok"}))))?
        .get("/users/{id}", vec![Param::path("id")], |args| {
            Ok(Response::json(json!({ "id": args.path("id")? })))
        })?
        .post("/users", vec![Param::body("user", user_schema())], |args| {
            let user: NewUser = args.body_as("user")?;
            Ok(Response::json(json!({ "created": user })).with_status(StatusCode::CREATED))
        })?
        .put(
            "/users/{id}",
            vec![
                Param::path("id"),
                Param::body("user", user_schema()),
                Param::headers("headers"),
            ],
            |args| {
                let user: NewUser = args.body_as("user")?;
                Ok(Response::json(json!({
                    "id": args.path("id")?,
                    "updated": user,
                    "headers": args.headers("headers")?,
                })))
            },
        )?;
    Ok(router)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability.log_filter)?;
    tracing::info!("trie-dispatch v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        max_request_bytes = config.listener.max_request_bytes,
        reject_unknown_headers = config.parser.reject_unknown_headers,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let router = demo_routes()?;
    tracing::debug!("Route table:\n{}", router.routes().render());
    let dispatcher = router.into_dispatcher();

    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, dispatcher);
    let server_shutdown = shutdown.subscribe();
    let server_task = tokio::spawn(server.run(listener, server_shutdown));

    wait_for_signal().await;
    shutdown.trigger();
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
