//! Request headers restricted to a fixed supported set.
//!
//! # Design Decisions
//! - Names compare case-insensitively and are stored canonically
//! - `Headers` is immutable once the parser has built it

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;

use crate::http::error::HttpError;

/// Header names the parser accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SupportedHeader {
    #[serde(rename = "Content-Type")]
    ContentType,
    #[serde(rename = "Content-Length")]
    ContentLength,
    #[serde(rename = "Accept")]
    Accept,
    #[serde(rename = "Authorization")]
    Authorization,
    #[serde(rename = "User-Agent")]
    UserAgent,
    #[serde(rename = "Cache-Control")]
    CacheControl,
    #[serde(rename = "Accept-Encoding")]
    AcceptEncoding,
}

impl SupportedHeader {
    pub const ALL: [SupportedHeader; 7] = [
        SupportedHeader::ContentType,
        SupportedHeader::ContentLength,
        SupportedHeader::Accept,
        SupportedHeader::Authorization,
        SupportedHeader::UserAgent,
        SupportedHeader::CacheControl,
        SupportedHeader::AcceptEncoding,
    ];

    /// Canonical spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportedHeader::ContentType => "Content-Type",
            SupportedHeader::ContentLength => "Content-Length",
            SupportedHeader::Accept => "Accept",
            SupportedHeader::Authorization => "Authorization",
            SupportedHeader::UserAgent => "User-Agent",
            SupportedHeader::CacheControl => "Cache-Control",
            SupportedHeader::AcceptEncoding => "Accept-Encoding",
        }
    }
}

impl FromStr for SupportedHeader {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|h| h.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| HttpError::UnsupportedHeader(s.to_string()))
    }
}

impl std::fmt::Display for SupportedHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed request headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Headers {
    inner: BTreeMap<SupportedHeader, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: SupportedHeader) -> Option<&str> {
        self.inner.get(&name).map(String::as_str)
    }

    /// Lookup by raw name; unsupported names simply return `None`.
    pub fn get_by_name(&self, name: &str) -> Option<&str> {
        name.parse::<SupportedHeader>()
            .ok()
            .and_then(|h| self.get(h))
    }

    /// Media type without parameters, lowercased.
    pub fn content_type(&self) -> Option<String> {
        self.get(SupportedHeader::ContentType).map(|v| {
            v.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }

    /// Declared Content-Length, if present.
    pub fn content_length(&self) -> Result<Option<usize>, HttpError> {
        match self.get(SupportedHeader::ContentLength) {
            None => Ok(None),
            Some(raw) => parse_content_length(raw)
                .map(Some)
                .ok_or_else(|| HttpError::InvalidContentLength(raw.to_string())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SupportedHeader, &str)> {
        self.inner.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Content-Length is ASCII digits only; signs and whitespace are rejected.
pub(crate) fn parse_content_length(raw: &str) -> Option<usize> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

impl FromIterator<(SupportedHeader, String)> for Headers {
    /// Later entries for the same name replace earlier ones.
    fn from_iter<I: IntoIterator<Item = (SupportedHeader, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_case_insensitively() {
        assert_eq!(
            "content-type".parse::<SupportedHeader>().unwrap(),
            SupportedHeader::ContentType
        );
        assert_eq!(
            "USER-AGENT".parse::<SupportedHeader>().unwrap(),
            SupportedHeader::UserAgent
        );
        assert!("X-Forwarded-For".parse::<SupportedHeader>().is_err());
        assert!("Host".parse::<SupportedHeader>().is_err());
    }

    #[test]
    fn content_type_strips_parameters() {
        let headers: Headers = [(
            SupportedHeader::ContentType,
            "Application/JSON; charset=utf-8".to_string(),
        )]
        .into_iter()
        .collect();
        assert_eq!(headers.content_type().as_deref(), Some("application/json"));
    }

    #[test]
    fn content_length_must_be_numeric() {
        let headers: Headers = [(SupportedHeader::ContentLength, "ten".to_string())]
            .into_iter()
            .collect();
        assert!(matches!(
            headers.content_length(),
            Err(HttpError::InvalidContentLength(_))
        ));

        let headers: Headers = [(SupportedHeader::ContentLength, "10".to_string())]
            .into_iter()
            .collect();
        assert_eq!(headers.content_length().unwrap(), Some(10));
    }

    #[test]
    fn serializes_with_canonical_names() {
        let headers: Headers = [
            (SupportedHeader::Accept, "*/*".to_string()),
            (SupportedHeader::UserAgent, "curl/8".to_string()),
        ]
        .into_iter()
        .collect();
        let value = serde_json::to_value(&headers).unwrap();
        assert_eq!(value["Accept"], "*/*");
        assert_eq!(value["User-Agent"], "curl/8");
        assert_eq!(headers.get_by_name("accept"), Some("*/*"));
    }

    #[test]
    fn content_length_must_be_plain_digits() {
        for raw in ["+5", "-5", "5 ", "0x10", "", "1_000"] {
            let headers: Headers = [(SupportedHeader::ContentLength, raw.to_string())]
                .into_iter()
                .collect();
            let err = headers.content_length().unwrap_err();
            assert_eq!(err.kind(), crate::http::error::ErrorKind::InvalidContentLength, "{raw:?}");
        }

        let headers: Headers = [(SupportedHeader::ContentLength, "007".to_string())]
            .into_iter()
            .collect();
        assert_eq!(headers.content_length().unwrap(), Some(7));
    }
}
