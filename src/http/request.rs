//! Request parsing.
//!
//! # Responsibilities
//! - Split the raw message into request line, header block and body
//! - Validate header lines against the supported set
//! - Decode the body according to its declared content type
//! - Check the declared Content-Length against the received body
//!
//! # Design Decisions
//! - The method token is returned unvalidated; the dispatcher owns that check
//! - A missing body section yields an empty mapping
//! - Form values stay strings; typed coercion belongs to body-model binding

use serde_json::{Map, Value};

use crate::config::ParserConfig;
use crate::http::error::HttpError;
use crate::http::headers::{Headers, SupportedHeader};

/// Decoded request body.
pub type Body = Map<String, Value>;

const CRLF: &str = "\r\n";
const HEADER_TERMINATOR: &str = "\r\n\r\n";
const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// A single parsed request, consumed immediately by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub protocol_version: String,
    pub headers: Headers,
    pub body: Body,
}

/// Turns raw request text into a [`ParsedRequest`].
#[derive(Debug, Clone, Default)]
pub struct RequestParser {
    config: ParserConfig,
}

impl RequestParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse raw bytes, rejecting anything that is not UTF-8.
    pub fn parse_bytes(&self, raw: &[u8]) -> Result<ParsedRequest, HttpError> {
        let text = std::str::from_utf8(raw).map_err(|_| HttpError::InvalidEncoding)?;
        self.parse(text)
    }

    pub fn parse(&self, raw: &str) -> Result<ParsedRequest, HttpError> {
        let (head, raw_body) = match raw.find(HEADER_TERMINATOR) {
            Some(idx) => (&raw[..idx], &raw[idx + HEADER_TERMINATOR.len()..]),
            None => (raw, ""),
        };

        let mut lines = head.split(CRLF);
        let request_line = lines.next().unwrap_or_default();
        let (method, target, protocol_version) = parse_request_line(request_line)?;

        let headers = self.parse_headers(lines)?;

        if let Some(declared) = headers.content_length()? {
            if declared != raw_body.len() {
                return Err(HttpError::ContentLengthMismatch {
                    declared,
                    actual: raw_body.len(),
                });
            }
        }

        let body = decode_body(headers.content_type().as_deref(), raw_body)?;

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        };

        tracing::trace!(
            method = %method,
            path = %path,
            headers = headers.len(),
            body_fields = body.len(),
            "Request parsed"
        );

        Ok(ParsedRequest {
            method: method.to_string(),
            path,
            query,
            protocol_version: protocol_version.to_string(),
            headers,
            body,
        })
    }

    fn parse_headers<'a>(
        &self,
        lines: impl Iterator<Item = &'a str>,
    ) -> Result<Headers, HttpError> {
        let mut entries = Vec::new();
        for line in lines.filter(|l| !l.is_empty()) {
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| HttpError::MalformedHeaderLine(line.to_string()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(HttpError::MalformedHeaderLine(line.to_string()));
            }
            match name.parse::<SupportedHeader>() {
                Ok(header) => entries.push((header, value.trim().to_string())),
                Err(err) if self.config.reject_unknown_headers => return Err(err),
                Err(_) => {
                    tracing::debug!(header = %name, "Ignoring unsupported header");
                }
            }
        }
        Ok(entries.into_iter().collect())
    }
}

fn parse_request_line(line: &str) -> Result<(&str, &str, &str), HttpError> {
    let tokens: Vec<&str> = line.split(' ').collect();
    match tokens.as_slice() {
        [method, target, version] if !method.is_empty() && !target.is_empty() && !version.is_empty() => {
            Ok((*method, *target, *version))
        }
        _ => Err(HttpError::MalformedRequestLine(line.to_string())),
    }
}

/// Decode `raw` under the given media type. No declared type means JSON.
pub fn decode_body(content_type: Option<&str>, raw: &str) -> Result<Body, HttpError> {
    if raw.is_empty() {
        return Ok(Body::new());
    }
    match content_type.unwrap_or(JSON) {
        JSON => decode_json(raw),
        FORM => Ok(decode_form(raw)),
        other => Err(HttpError::UnsupportedContentType(other.to_string())),
    }
}

fn decode_json(raw: &str) -> Result<Body, HttpError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(HttpError::InvalidBody(format!(
            "expected a JSON object, found {}",
            json_type_name(&other)
        ))),
        Err(e) => Err(HttpError::InvalidBody(e.to_string())),
    }
}

/// Single-valued keys become strings, repeated keys an ordered list.
fn decode_form(raw: &str) -> Body {
    let mut body = Body::new();
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        let value = Value::String(value.into_owned());
        match body.get_mut(key.as_ref()) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                body.insert(key.into_owned(), value);
            }
        }
    }
    body
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
