//! Response assembly and wire serialization.
//!
//! # Responsibilities
//! - Accumulate response headers and a JSON body
//! - Fill in Content-Type and Content-Length before serialization
//! - Emit the header block, blank line and body bytes
//!
//! # Design Decisions
//! - Headers keep insertion order; setting an existing name replaces it in place
//! - Content-Length is always recomputed from the serialized body

use ::http::StatusCode;
use serde_json::Value;

const CRLF: &str = "\r\n";
const CONTENT_TYPE: &str = "Content-Type";
const CONTENT_LENGTH: &str = "Content-Length";

/// A JSON response produced by a handler or by an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Value,
}

impl Response {
    /// 200 response with the given JSON body.
    pub fn json(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            headers: Vec::new(),
            body,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Insert or replace a header, matching names case-insensitively.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name, value)),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    fn body_bytes(&self) -> Vec<u8> {
        // Serializing a `Value` cannot fail.
        serde_json::to_vec(&self.body).unwrap_or_default()
    }

    /// Copy in an externally supplied content type when the handler set none,
    /// then recompute Content-Length from the serialized body.
    pub fn finalize(&mut self, content_type: Option<&str>) {
        if let Some(ct) = content_type {
            if self.header(CONTENT_TYPE).is_none() {
                self.set_header(CONTENT_TYPE, ct);
            }
        }
        let len = self.body_bytes().len();
        self.set_header(CONTENT_LENGTH, len.to_string());
    }

    /// Header block, blank line, body bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let body = self.body_bytes();
        let mut out = Vec::with_capacity(body.len() + 64 * (self.headers.len() + 1));
        for (name, value) in &self.headers {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(CRLF.as_bytes());
        }
        out.extend_from_slice(CRLF.as_bytes());
        out.extend_from_slice(&body);
        out
    }

    /// Bytes to write on the socket, optionally led by a status line.
    pub fn to_wire(&self, protocol_version: &str, status_line: bool) -> Vec<u8> {
        if !status_line {
            return self.serialize();
        }
        let reason = self.status.canonical_reason().unwrap_or_default();
        let mut out = format!(
            "{} {} {}{}",
            protocol_version,
            self.status.as_u16(),
            reason,
            CRLF
        )
        .into_bytes();
        out.extend_from_slice(&self.serialize());
        out
    }
}
