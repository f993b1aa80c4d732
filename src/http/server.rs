//! HTTP server: owns connections and drives the request cycle.
//!
//! # Responsibilities
//! - Accept connections through the bounded listener
//! - Read one request per connection, parse and dispatch it
//! - Turn every outcome into a complete response, success or structured error
//! - Write the response in a single write and close the connection
//! - Stop accepting on shutdown and drain in-flight connections

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{ResponseConfig, ServerConfig};
use crate::http::error::HttpError;
use crate::http::method::Method;
use crate::http::request::RequestParser;
use crate::http::response::Response;
use crate::net::{read_request, ConnectionId, ConnectionTracker, Listener, ListenerError};
use crate::observability::metrics;
use crate::routing::Dispatcher;

/// Protocol version used for error responses when the request line never parsed.
const DEFAULT_PROTOCOL_VERSION: &str = "HTTP/1.1";

/// Metrics label for requests whose method never parsed.
const UNPARSED_METHOD: &str = "-";
/// Metrics label for method tokens outside the supported set.
const INVALID_METHOD: &str = "invalid";

/// State shared by all connection tasks. Read-only while serving.
struct ServerState {
    dispatcher: Arc<Dispatcher>,
    parser: RequestParser,
    response: ResponseConfig,
    max_request_bytes: usize,
    read_timeout: Duration,
}

/// HTTP server over a frozen dispatcher.
pub struct HttpServer {
    state: Arc<ServerState>,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        let state = ServerState {
            dispatcher: Arc::new(dispatcher),
            parser: RequestParser::new(config.parser.clone()),
            response: config.response.clone(),
            max_request_bytes: config.listener.max_request_bytes,
            read_timeout: Duration::from_secs(config.listener.read_timeout_secs),
        };
        Self {
            state: Arc::new(state),
            config,
        }
    }

    /// Run the accept loop until `shutdown` fires, then drain connections.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        let addr = listener.local_addr().map_err(ListenerError::Accept)?;
        tracing::info!(
            address = %addr,
            routes = self.state.dispatcher.routes().len(),
            "HTTP server starting"
        );

        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown requested, no longer accepting");
                    break;
                }
                accepted = listener.accept() => {
                    let (stream, peer, permit) = match accepted {
                        Ok(conn) => conn,
                        Err(ListenerError::Closed) => return Err(ListenerError::Closed),
                        Err(e) => {
                            tracing::warn!(error = %e, "Accept failed");
                            continue;
                        }
                    };

                    let guard = tracker.track();
                    let state = Arc::clone(&self.state);
                    let span = tracing::info_span!(
                        "connection",
                        connection_id = %guard.id(),
                        request_id = %Uuid::new_v4(),
                        peer = %peer
                    );
                    tokio::spawn(
                        async move {
                            let _permit = permit;
                            serve_connection(state, stream, guard.id()).await;
                            drop(guard);
                        }
                        .instrument(span),
                    );
                }
            }
        }

        tracker.wait_for_drain().await;
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Handle exactly one request on `stream`, then close it.
async fn serve_connection(state: Arc<ServerState>, mut stream: TcpStream, id: ConnectionId) {
    let start = Instant::now();

    let raw = match read_request(&mut stream, state.max_request_bytes, state.read_timeout).await {
        Ok(raw) if raw.is_empty() => {
            tracing::debug!(connection_id = %id, "Peer closed before sending a request");
            return;
        }
        result => result,
    };

    let (method, version, outcome) = match raw.and_then(|raw| state.parser.parse_bytes(&raw)) {
        Ok(request) => {
            let method = metrics_method_label(&request.method);
            let version = request.protocol_version.clone();
            tracing::debug!(method = %request.method, path = %request.path, "Request parsed");
            let dispatcher = Arc::clone(&state.dispatcher);
            let outcome = match tokio::task::spawn_blocking(move || dispatcher.dispatch(request)).await {
                Ok(outcome) => outcome,
                Err(e) => Err(HttpError::Handler(if e.is_panic() {
                    "handler panicked".to_string()
                } else {
                    e.to_string()
                })),
            };
            (method, version, outcome)
        }
        Err(e) => (UNPARSED_METHOD, DEFAULT_PROTOCOL_VERSION.to_string(), Err(e)),
    };

    let mut response = outcome.unwrap_or_else(|err| {
        tracing::warn!(kind = %err.kind(), error = %err, "Request failed");
        err.into_response()
    });
    let status = response.status();

    if let Err(e) = write_response(&state.response, &mut stream, &mut response, &version).await {
        tracing::warn!(error = %e, "Failed to write response");
    }

    metrics::record_request(method, status.as_u16(), start);
    tracing::info!(
        method = %method,
        status = status.as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );
}

/// Bounded label set for the request counter; client tokens never become labels.
fn metrics_method_label(token: &str) -> &'static str {
    token
        .parse::<Method>()
        .map(|m| m.as_str())
        .unwrap_or(INVALID_METHOD)
}

async fn write_response(
    config: &ResponseConfig,
    stream: &mut TcpStream,
    response: &mut Response,
    version: &str,
) -> std::io::Result<()> {
    response.finalize(Some(&config.default_content_type));
    let bytes = response.to_wire(version, config.emit_status_line);
    stream.write_all(&bytes).await?;
    stream.shutdown().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_label_is_bounded() {
        assert_eq!(metrics_method_label("GET"), "GET");
        assert_eq!(metrics_method_label("PUT"), "PUT");
        assert_eq!(metrics_method_label("DELETE"), INVALID_METHOD);
        assert_eq!(metrics_method_label("get"), INVALID_METHOD);
        assert_eq!(metrics_method_label(&"X".repeat(500)), INVALID_METHOD);
    }
}
