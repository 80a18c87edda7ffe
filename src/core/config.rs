//! Pipeline configuration
//!
//! `PipelineConfig` is an explicitly constructed, immutable value handed to
//! each component. It deserializes from the camelCase option names used by
//! host applications (`maskEnabled`, `samplingRate`, ...) so a host can build
//! it from whatever source it prefers.

use super::error::{LoggerError, Result};
use serde::{Deserialize, Serialize};

/// Field patterns masked when no explicit list is configured
pub const DEFAULT_MASK_FIELDS: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "token",
    "apikey",
    "api_key",
    "authorization",
    "auth",
    "bearer",
    "credential",
    "private",
    "ssn",
    "credit_card",
    "cvv",
    "pin",
    "otp",
    "access_token",
    "refresh_token",
    "id_token",
    "jwt",
];

/// Replacement text written over masked values
pub const DEFAULT_MASK_REPLACEMENT: &str = "[REDACTED]";

/// Default number of stack frames kept per error level
pub const DEFAULT_ERROR_STACK_LINES: usize = 10;

/// Default serialized body size (bytes) before truncation kicks in
pub const DEFAULT_BODY_MAX_SIZE: usize = 10 * 1024;

/// Default request duration (ms) above which a request is logged as slow
pub const DEFAULT_PERF_THRESHOLD_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    pub mask_enabled: bool,
    pub mask_fields: Vec<String>,
    pub mask_pattern: String,

    pub sampling_enabled: bool,
    /// Fraction of sampleable records kept; clamped to `[0, 1]` when used
    pub sampling_rate: f64,

    pub error_stack_enabled: bool,
    pub error_stack_lines: usize,

    pub log_request_body: bool,
    pub log_response_body: bool,
    pub body_max_size: usize,

    pub perf_enabled: bool,
    #[serde(alias = "perfThreshold")]
    pub perf_threshold_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mask_enabled: true,
            mask_fields: DEFAULT_MASK_FIELDS.iter().map(|s| s.to_string()).collect(),
            mask_pattern: DEFAULT_MASK_REPLACEMENT.to_string(),
            sampling_enabled: false,
            sampling_rate: 1.0,
            error_stack_enabled: true,
            error_stack_lines: DEFAULT_ERROR_STACK_LINES,
            log_request_body: false,
            log_response_body: false,
            body_max_size: DEFAULT_BODY_MAX_SIZE,
            perf_enabled: true,
            perf_threshold_ms: DEFAULT_PERF_THRESHOLD_MS,
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from JSON and validate it
    ///
    /// Missing options fall back to their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no component could act on.
    ///
    /// Finite sampling rates outside `[0, 1]` are accepted; the sampler
    /// clamps them.
    pub fn validate(&self) -> Result<()> {
        if !self.sampling_rate.is_finite() {
            return Err(LoggerError::config(
                "Sampler",
                format!("sampling rate must be finite, got {}", self.sampling_rate),
            ));
        }
        if self.error_stack_enabled && self.error_stack_lines == 0 {
            return Err(LoggerError::config(
                "ErrorParser",
                "error stack line budget must be at least 1",
            ));
        }
        if self.mask_enabled && self.mask_pattern.is_empty() {
            return Err(LoggerError::config("Masker", "replacement text is empty"));
        }
        Ok(())
    }

    #[must_use]
    pub fn with_masking(mut self, enabled: bool) -> Self {
        self.mask_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_mask_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mask_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_mask_pattern(mut self, replacement: impl Into<String>) -> Self {
        self.mask_pattern = replacement.into();
        self
    }

    /// Enable sampling with the given keep rate
    #[must_use]
    pub fn with_sampling(mut self, rate: f64) -> Self {
        self.sampling_enabled = true;
        self.sampling_rate = rate;
        self
    }

    #[must_use]
    pub fn with_error_stack(mut self, enabled: bool, lines: usize) -> Self {
        self.error_stack_enabled = enabled;
        self.error_stack_lines = lines;
        self
    }

    #[must_use]
    pub fn with_body_logging(mut self, request: bool, response: bool, max_size: usize) -> Self {
        self.log_request_body = request;
        self.log_response_body = response;
        self.body_max_size = max_size;
        self
    }

    #[must_use]
    pub fn with_perf_threshold(mut self, enabled: bool, threshold_ms: u64) -> Self {
        self.perf_enabled = enabled;
        self.perf_threshold_ms = threshold_ms;
        self
    }
}
