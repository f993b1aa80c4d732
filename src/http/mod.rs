//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (read one message, own the connection)
//!     → request.rs (request line, headers.rs validation, body decoding)
//!     → routing::Dispatcher (method check, trie lookup, binding, handler)
//!     → response.rs (finalize headers, serialize)
//!     → Send to client, close
//!
//! Failures at any step:
//!     → error.rs (HttpError kind + status)
//!     → structured error response
//! ```

pub mod error;
pub mod headers;
pub mod method;
pub mod request;
pub mod response;
pub mod server;

pub use error::{ErrorKind, HttpError};
pub use headers::{Headers, SupportedHeader};
pub use method::Method;
pub use request::{Body, ParsedRequest, RequestParser};
pub use ::http::StatusCode;
pub use response::Response;
pub use server::HttpServer;
