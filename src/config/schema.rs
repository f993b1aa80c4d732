//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the dispatch server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, limits).
    pub listener: ListenerConfig,

    /// Request parsing policy.
    pub parser: ParserConfig,

    /// Response defaults.
    pub response: ResponseConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections. 1 serves strictly one at a time.
    pub max_connections: usize,

    /// Upper bound on a single request message, headers and body included.
    pub max_request_bytes: usize,

    /// Time allowed to receive a full request.
    pub read_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 1,
            max_request_bytes: 8192,
            read_timeout_secs: 30,
        }
    }
}

/// Request parsing policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Fail requests that carry a header outside the supported set.
    /// When false those header lines are dropped.
    pub reject_unknown_headers: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            reject_unknown_headers: true,
        }
    }
}

/// Response defaults applied by the server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Content type copied into responses that set none.
    pub default_content_type: String,

    /// Prefix responses with `HTTP/1.1 <code> <reason>`.
    pub emit_status_line: bool,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            default_content_type: "application/json".to_string(),
            emit_status_line: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Fallback filter when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "trie_dispatch=info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
