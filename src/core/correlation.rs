//! Request correlation ids
//!
//! Extracts a client supplied request id from incoming headers, or mints a
//! fresh random version-4 UUID when none is usable.

use rand::RngCore;
use std::collections::HashMap;

/// Header carrying the request id
pub const CORRELATION_HEADER: &str = "x-request-id";

/// Capitalized spelling checked when the lower-case header is absent
pub const CORRELATION_HEADER_CAPITALIZED: &str = "X-Request-Id";

/// Metadata key under which loggers store the id
pub const CORRELATION_ID_KEY: &str = "correlationId";

/// A raw header value as delivered by the host HTTP layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Single(String),
    Multiple(Vec<String>),
}

impl From<&str> for HeaderValue {
    fn from(s: &str) -> Self {
        HeaderValue::Single(s.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(s: String) -> Self {
        HeaderValue::Single(s)
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(values: Vec<String>) -> Self {
        HeaderValue::Multiple(values)
    }
}

impl From<Vec<&str>> for HeaderValue {
    fn from(values: Vec<&str>) -> Self {
        HeaderValue::Multiple(values.into_iter().map(String::from).collect())
    }
}

pub type Headers = HashMap<String, HeaderValue>;

/// Correlation id extraction and generation
///
/// # Example
///
/// ```
/// use structured_log_pipeline::{CorrelationContext, HeaderValue};
/// use std::collections::HashMap;
///
/// let mut headers = HashMap::new();
/// headers.insert("x-request-id".to_string(), HeaderValue::from("abc"));
/// assert_eq!(CorrelationContext::extract(&headers), "abc");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationContext;

impl CorrelationContext {
    /// Return the request id carried by `headers`, or a fresh one
    pub fn extract(headers: &Headers) -> String {
        let value = headers
            .get(CORRELATION_HEADER)
            .or_else(|| headers.get(CORRELATION_HEADER_CAPITALIZED));

        match value {
            Some(HeaderValue::Single(id)) if !id.is_empty() => id.clone(),
            Some(HeaderValue::Multiple(ids)) => match ids.first() {
                Some(first) => first.clone(),
                None => Self::generate(),
            },
            _ => Self::generate(),
        }
    }

    /// Mint a random version-4 UUID in canonical lower-case form
    pub fn generate() -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .hyphenated()
            .to_string()
    }
}
