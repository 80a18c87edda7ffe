//! # Structured Log Pipeline
//!
//! A structured logging pipeline for services: every record passes through
//! level filtering, deterministic sampling, metadata merging and sensitive
//! field masking before it reaches the configured sinks.
//!
//! ## Features
//!
//! - **Correlation**: Request ids read from `x-request-id` or generated as UUID v4
//! - **Masking**: Recursive redaction of sensitive metadata keys
//! - **Sampling**: Hash-based, reproducible sampling of low-priority levels
//! - **Error Parsing**: Stack traces parsed into frames with library detection
//! - **Child Loggers**: Immutable metadata inherited along a logger family
//! - **Async Mode**: Optional batching worker thread with bounded queue
//!
//! ## Example
//!
//! ```
//! use structured_log_pipeline::prelude::*;
//!
//! let logger = Logger::builder()
//!     .config(PipelineConfig::default().with_sampling(0.25))
//!     .sink(MemorySink::new())
//!     .build();
//!
//! logger.info("service started");
//! logger
//!     .with_correlation_id(CorrelationContext::generate())
//!     .warn_with("retrying", LoggerMetadata::new().with_field("attempt", 2));
//! ```

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::sinks::ConsoleSink;
    #[cfg(feature = "file")]
    pub use crate::sinks::JsonSink;
    pub use crate::sinks::MemorySink;
    pub use crate::core::{
        CorrelationContext, ErrorInfo, ErrorParser, HeaderValue, Headers, LogLevel, LogRecord,
        Logger, LoggerBuilder, LoggerError, LoggerMetadata, LoggerMetrics, Masker, MetaValue,
        PipelineConfig, RequestSummary, Result, Sampler, SamplingConfig, SamplingStats, Sink,
        DEFAULT_SHUTDOWN_TIMEOUT,
    };
}

#[cfg(feature = "console")]
pub use sinks::ConsoleSink;
#[cfg(feature = "file")]
pub use sinks::JsonSink;
pub use sinks::{MemorySink, RecordBuffer};
pub use crate::core::{
    create_parser, create_sampler, format_error, parse_error, prepare_body, CorrelationContext,
    DispatchOutcome, ErrorInfo, ErrorParser, ErrorRecord, HeaderValue, Headers, LogLevel,
    LogRecord, Logger, LoggerBuilder, LoggerError, LoggerMetadata, LoggerMetrics, Masker,
    MetaValue, MetricsSnapshot, ParsedError, ParsedStackFrame, PipelineConfig, RequestSummary,
    Result, Sampler, SamplingConfig, SamplingDecision, SamplingStats, Sink, CORRELATION_HEADER,
    CORRELATION_ID_KEY, DEFAULT_SHUTDOWN_TIMEOUT,
};
