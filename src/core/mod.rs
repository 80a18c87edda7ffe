//! Core pipeline types and traits

pub mod config;
pub mod correlation;
pub mod error;
pub mod error_parser;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod masking;
pub mod metadata;
pub mod metrics;
pub mod request;
pub mod sampling;
pub mod sink;

pub use config::PipelineConfig;
pub use correlation::{
    CorrelationContext, HeaderValue, Headers, CORRELATION_HEADER, CORRELATION_ID_KEY,
};
pub use error::{LoggerError, Result};
pub use error_parser::{
    create_parser, format_error, parse_error, ErrorInfo, ErrorParser, ErrorRecord, ParsedError,
    ParsedStackFrame,
};
pub use log_level::LogLevel;
pub use log_record::LogRecord;
pub use logger::{Logger, LoggerBuilder, DEFAULT_SHUTDOWN_TIMEOUT};
pub use masking::Masker;
pub use metadata::{LoggerMetadata, MetaValue};
pub use metrics::{DispatchOutcome, LoggerMetrics, MetricsSnapshot};
pub use request::{prepare_body, RequestSummary};
pub use sampling::{create_sampler, Sampler, SamplingConfig, SamplingDecision, SamplingStats};
pub use sink::Sink;
