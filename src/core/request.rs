//! Completed-request summaries for HTTP middleware
//!
//! The middleware that times requests lives in the host application; it
//! fills in a `RequestSummary` and hands it to [`Logger::log_request`].
//!
//! [`Logger::log_request`]: crate::Logger::log_request

use super::config::PipelineConfig;
use super::correlation::CORRELATION_ID_KEY;
use super::log_level::LogLevel;
use super::masking::Masker;
use super::metadata::{LoggerMetadata, MetaValue};

/// Characters of the serialized body kept when it is truncated
pub const BODY_PREVIEW_CHARS: usize = 500;

/// One finished HTTP request
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestSummary {
    pub method: String,
    pub path: String,
    pub status: u16,
    pub duration_ms: u64,
    pub correlation_id: Option<String>,
    pub request_body: Option<MetaValue>,
    pub response_body: Option<MetaValue>,
}

impl RequestSummary {
    pub fn new(method: impl Into<String>, path: impl Into<String>, status: u16, duration_ms: u64) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            status,
            duration_ms,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_request_body(mut self, body: impl Into<MetaValue>) -> Self {
        self.request_body = Some(body.into());
        self
    }

    #[must_use]
    pub fn with_response_body(mut self, body: impl Into<MetaValue>) -> Self {
        self.response_body = Some(body.into());
        self
    }

    pub fn is_slow(&self, config: &PipelineConfig) -> bool {
        config.perf_enabled && self.duration_ms > config.perf_threshold_ms
    }

    /// `warn` for slow requests, `info` otherwise
    pub fn level(&self, config: &PipelineConfig) -> LogLevel {
        if self.is_slow(config) {
            LogLevel::Warn
        } else {
            LogLevel::Info
        }
    }

    pub fn message(&self) -> String {
        format!(
            "{} {} {} - {}ms",
            self.method, self.path, self.status, self.duration_ms
        )
    }

    /// Metadata describing the request; bodies are included only when the
    /// configuration asks for them.
    ///
    /// Bodies are masked before truncation so a `_preview` never carries
    /// sensitive values.
    pub fn to_metadata(&self, config: &PipelineConfig, masker: &Masker) -> LoggerMetadata {
        let mut meta = LoggerMetadata::new()
            .with_field("method", self.method.as_str())
            .with_field("path", self.path.as_str())
            .with_field("statusCode", u32::from(self.status))
            .with_field("durationMs", self.duration_ms);

        if let Some(id) = &self.correlation_id {
            meta.insert(CORRELATION_ID_KEY, id.as_str());
        }
        if self.is_slow(config) {
            meta.insert("slowRequest", true);
            meta.insert("thresholdMs", config.perf_threshold_ms);
        }
        let bodies = [
            ("requestBody", config.log_request_body, &self.request_body),
            ("responseBody", config.log_response_body, &self.response_body),
        ];
        for (key, enabled, body) in bodies {
            if let (true, Some(body)) = (enabled, body) {
                let masked = masker.mask(body);
                meta.insert(key, prepare_body(&masked, config.body_max_size));
            }
        }
        meta
    }
}

/// Replace bodies whose JSON form exceeds `max_size` bytes with a preview.
///
/// The preview record carries `_truncated`, `_originalSize`, `_maxSize` and
/// the first characters of the serialized body in `_preview`.
pub fn prepare_body(body: &MetaValue, max_size: usize) -> MetaValue {
    let serialized = body.to_json_value().to_string();
    if serialized.len() <= max_size {
        return body.clone();
    }

    let preview: String = serialized.chars().take(BODY_PREVIEW_CHARS).collect();
    MetaValue::Object(
        LoggerMetadata::new()
            .with_field("_truncated", true)
            .with_field("_originalSize", serialized.len())
            .with_field("_maxSize", max_size)
            .with_field("_preview", preview),
    )
}
