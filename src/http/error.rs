//! Request-level error taxonomy.
//!
//! # Responsibilities
//! - Name every way a single request can fail
//! - Expose a stable kind and a status code so the connection owner can
//!   choose the wire representation
//! - Build the structured error body sent back to the client
//!
//! # Design Decisions
//! - One variant per failure kind; no catch-all string errors
//! - Every error is request-fatal, never process-fatal

use serde_json::json;
use thiserror::Error;

use crate::http::response::Response;
use crate::http::StatusCode;

/// Errors raised while parsing, routing, binding or invoking a request.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request line did not split into exactly three tokens.
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    /// A header line has no colon separator.
    #[error("malformed header line: {0:?}")]
    MalformedHeaderLine(String),

    /// Header name outside the supported set.
    #[error("unsupported header: {0}")]
    UnsupportedHeader(String),

    /// Declared content type is neither JSON nor form-urlencoded.
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// Body does not decode under the declared content type.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// Content-Length value is not a non-negative integer.
    #[error("invalid content length: {0:?}")]
    InvalidContentLength(String),

    /// Declared Content-Length differs from the received body.
    #[error("content length mismatch: declared {declared}, received {actual}")]
    ContentLengthMismatch { declared: usize, actual: usize },

    /// Method token outside GET, POST and PUT.
    #[error("invalid method: {0}")]
    InvalidMethod(String),

    /// No route matched, or the route has no handler for the method.
    #[error("no route for {method} {path}")]
    RouteNotFound { method: String, path: String },

    /// Handler inputs could not be built from the request.
    #[error("binding failed for parameter `{param}`: {reason}")]
    Binding { param: String, reason: String },

    /// Message exceeded the configured read limit.
    #[error("request exceeds {limit} bytes")]
    RequestTooLarge { limit: usize },

    /// The request did not arrive before the read deadline.
    #[error("timed out waiting for the request")]
    RequestTimeout,

    /// Request bytes are not valid UTF-8.
    #[error("request is not valid UTF-8")]
    InvalidEncoding,

    /// The handler reported a failure of its own.
    #[error("handler failed: {0}")]
    Handler(String),

    /// Socket failure while reading the request.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stable, serializable names for [`HttpError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedRequestLine,
    MalformedHeaderLine,
    UnsupportedHeader,
    UnsupportedContentType,
    InvalidBody,
    InvalidContentLength,
    ContentLengthMismatch,
    InvalidMethod,
    RouteNotFound,
    BindingError,
    RequestTooLarge,
    RequestTimeout,
    InvalidEncoding,
    HandlerError,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedRequestLine => "MalformedRequestLine",
            ErrorKind::MalformedHeaderLine => "MalformedHeaderLine",
            ErrorKind::UnsupportedHeader => "UnsupportedHeader",
            ErrorKind::UnsupportedContentType => "UnsupportedContentType",
            ErrorKind::InvalidBody => "InvalidBody",
            ErrorKind::InvalidContentLength => "InvalidContentLength",
            ErrorKind::ContentLengthMismatch => "ContentLengthMismatch",
            ErrorKind::InvalidMethod => "InvalidMethod",
            ErrorKind::RouteNotFound => "RouteNotFound",
            ErrorKind::BindingError => "BindingError",
            ErrorKind::RequestTooLarge => "RequestTooLarge",
            ErrorKind::RequestTimeout => "RequestTimeout",
            ErrorKind::InvalidEncoding => "InvalidEncoding",
            ErrorKind::HandlerError => "HandlerError",
            ErrorKind::Io => "Io",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl HttpError {
    /// Shorthand for a binding failure.
    pub fn binding(param: impl Into<String>, reason: impl Into<String>) -> Self {
        HttpError::Binding {
            param: param.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            HttpError::MalformedRequestLine(_) => ErrorKind::MalformedRequestLine,
            HttpError::MalformedHeaderLine(_) => ErrorKind::MalformedHeaderLine,
            HttpError::UnsupportedHeader(_) => ErrorKind::UnsupportedHeader,
            HttpError::UnsupportedContentType(_) => ErrorKind::UnsupportedContentType,
            HttpError::InvalidBody(_) => ErrorKind::InvalidBody,
            HttpError::InvalidContentLength(_) => ErrorKind::InvalidContentLength,
            HttpError::ContentLengthMismatch { .. } => ErrorKind::ContentLengthMismatch,
            HttpError::InvalidMethod(_) => ErrorKind::InvalidMethod,
            HttpError::RouteNotFound { .. } => ErrorKind::RouteNotFound,
            HttpError::Binding { .. } => ErrorKind::BindingError,
            HttpError::RequestTooLarge { .. } => ErrorKind::RequestTooLarge,
            HttpError::RequestTimeout => ErrorKind::RequestTimeout,
            HttpError::InvalidEncoding => ErrorKind::InvalidEncoding,
            HttpError::Handler(_) => ErrorKind::HandlerError,
            HttpError::Io(_) => ErrorKind::Io,
        }
    }

    /// Status code used when this error is written back to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::MalformedRequestLine(_)
            | HttpError::MalformedHeaderLine(_)
            | HttpError::UnsupportedHeader(_)
            | HttpError::InvalidBody(_)
            | HttpError::InvalidContentLength(_)
            | HttpError::ContentLengthMismatch { .. }
            | HttpError::InvalidMethod(_)
            | HttpError::InvalidEncoding => StatusCode::BAD_REQUEST,
            HttpError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            HttpError::RequestTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            HttpError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            HttpError::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            HttpError::Binding { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            HttpError::Handler(_) | HttpError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Structured error response: `{"error": {"kind": .., "message": ..}}`.
    pub fn into_response(self) -> Response {
        let status = self.status();
        Response::json(json!({
            "error": {
                "kind": self.kind().as_str(),
                "message": self.to_string(),
            }
        }))
        .with_status(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_not_found_maps_to_404() {
        let err = HttpError::RouteNotFound {
            method: "GET".into(),
            path: "/missing".into(),
        };
        assert_eq!(err.kind(), ErrorKind::RouteNotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn error_response_carries_kind_and_message() {
        let resp = HttpError::UnsupportedHeader("X-Custom".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.body()["error"]["kind"], "UnsupportedHeader");
        assert_eq!(resp.body()["error"]["message"], "unsupported header: X-Custom");
    }

    #[test]
    fn binding_errors_are_unprocessable() {
        let err = HttpError::binding("user", "missing field `name`");
        assert_eq!(err.kind(), ErrorKind::BindingError);
        assert_eq!(err.status().as_u16(), 422);
    }

    #[test]
    fn client_side_failures_are_not_server_errors() {
        assert_eq!(HttpError::RequestTimeout.status(), StatusCode::REQUEST_TIMEOUT);
        let mismatch = HttpError::ContentLengthMismatch {
            declared: 20,
            actual: 15,
        };
        assert!(mismatch.status().is_client_error());
    }
}
