//! Logger pipeline
//!
//! Every log call runs the same steps: level threshold, sampling, metadata
//! merge, masking, dispatch. A `Logger` is a cheap handle; clones and child
//! loggers share one dispatcher (sinks, async worker, metrics) and one set of
//! configured components, but each owns its own immutable metadata snapshot.

use super::{
    config::PipelineConfig,
    correlation::{CorrelationContext, Headers, CORRELATION_ID_KEY},
    error::Result,
    error_parser::{ErrorInfo, ErrorParser},
    log_level::LogLevel,
    log_record::LogRecord,
    masking::Masker,
    metadata::LoggerMetadata,
    metrics::{DispatchOutcome, LoggerMetrics},
    request::RequestSummary,
    sampling::{Sampler, SamplingStats},
    sink::Sink,
};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::borrow::Cow;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default shutdown timeout for draining the async worker (5 seconds)
///
/// Used when the last logger handle is dropped. Call
/// [`Logger::shutdown`] for a different timeout.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Records collected by the async worker before each write pass
const BATCH_SIZE: usize = 50;

type SinkList = Arc<RwLock<Vec<Box<dyn Sink>>>>;

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Write one record to every sink with per-sink panic isolation
///
/// A failing or panicking sink is reported on stderr; the remaining sinks
/// still receive the record. Returns true when every sink succeeded.
fn write_to_sinks(sinks: &mut [Box<dyn Sink>], record: &LogRecord, metrics: &LoggerMetrics) -> bool {
    let mut has_error = false;

    for sink in sinks.iter_mut() {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sink.write(record)));

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                eprintln!("[LOGGER ERROR] Sink '{}' failed: {}", sink.name(), e);
                has_error = true;
            }
            Err(panic_info) => {
                eprintln!(
                    "[LOGGER CRITICAL] Sink '{}' panicked: {}. \
                     Other sinks continue to function.",
                    sink.name(),
                    panic_message(panic_info.as_ref())
                );
                has_error = true;
            }
        }
    }

    metrics.record(if has_error {
        DispatchOutcome::SinkFailed
    } else {
        DispatchOutcome::Delivered
    });
    !has_error
}

fn flush_sinks(sinks: &mut [Box<dyn Sink>]) {
    for sink in sinks.iter_mut() {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sink.flush()));

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                eprintln!("[LOGGER ERROR] Sink '{}' flush failed: {}", sink.name(), e);
            }
            Err(panic_info) => {
                eprintln!(
                    "[LOGGER CRITICAL] Sink '{}' panicked during flush: {}",
                    sink.name(),
                    panic_message(panic_info.as_ref())
                );
            }
        }
    }
}

/// Sinks plus the optional async worker feeding them
struct Dispatcher {
    sinks: SinkList,
    sender: RwLock<Option<Sender<LogRecord>>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    metrics: Arc<LoggerMetrics>,
}

impl Dispatcher {
    fn sync(sinks: Vec<Box<dyn Sink>>) -> Self {
        Self {
            sinks: Arc::new(RwLock::new(sinks)),
            sender: RwLock::new(None),
            worker: Mutex::new(None),
            metrics: Arc::new(LoggerMetrics::new()),
        }
    }

    fn with_async(sinks: Vec<Box<dyn Sink>>, buffer_size: usize) -> Self {
        let (sender, receiver) = bounded(buffer_size.max(1));
        let sinks: SinkList = Arc::new(RwLock::new(sinks));
        let metrics = Arc::new(LoggerMetrics::new());

        let worker_sinks = Arc::clone(&sinks);
        let worker_metrics = Arc::clone(&metrics);
        let handle = thread::spawn(move || Self::run_worker(receiver, worker_sinks, worker_metrics));

        Self {
            sinks,
            sender: RwLock::new(Some(sender)),
            worker: Mutex::new(Some(handle)),
            metrics,
        }
    }

    /// Drain the queue in batches until every sender is gone
    fn run_worker(receiver: Receiver<LogRecord>, sinks: SinkList, metrics: Arc<LoggerMetrics>) {
        let mut batch = Vec::with_capacity(BATCH_SIZE);

        while let Ok(record) = receiver.recv() {
            batch.push(record);
            while batch.len() < BATCH_SIZE {
                match receiver.try_recv() {
                    Ok(record) => batch.push(record),
                    Err(_) => break,
                }
            }

            let mut guard = sinks.write();
            for record in batch.drain(..) {
                write_to_sinks(&mut guard, &record, &metrics);
            }
            flush_sinks(&mut guard);
        }
    }

    fn dispatch(&self, record: LogRecord) {
        let sender = self.sender.read();
        match sender.as_ref() {
            Some(sender) => match sender.try_send(record) {
                Ok(()) => {}
                Err(TrySendError::Full(record)) => self.handle_overflow(record),
                Err(TrySendError::Disconnected(record)) => {
                    // worker is gone
                    let mut sinks = self.sinks.write();
                    write_to_sinks(&mut sinks, &record, &self.metrics);
                }
            },
            None => {
                let mut sinks = self.sinks.write();
                write_to_sinks(&mut sinks, &record, &self.metrics);
            }
        }
    }

    /// Error records are written synchronously; everything else is dropped
    fn handle_overflow(&self, record: LogRecord) {
        let forced = record.level == LogLevel::Error;
        self.metrics.record_queue_full(forced);

        if forced {
            let mut sinks = self.sinks.write();
            write_to_sinks(&mut sinks, &record, &self.metrics);
            return;
        }

        let dropped = self.metrics.record(DispatchOutcome::QueueDropped);
        if dropped == 1 || dropped % 1000 == 0 {
            eprintln!(
                "[LOGGER WARNING] Queue full, {} records dropped. \
                 Consider increasing the async buffer size.",
                dropped
            );
        }
    }

    fn add_sink(&self, sink: Box<dyn Sink>) {
        self.sinks.write().push(sink);
    }

    fn flush(&self) -> Result<()> {
        let mut sinks = self.sinks.write();
        for sink in sinks.iter_mut() {
            sink.flush()?;
        }
        Ok(())
    }

    fn shutdown(&self, timeout: Duration) -> bool {
        // Closing the channel lets the worker drain and exit
        drop(self.sender.write().take());

        if let Some(handle) = self.worker.lock().take() {
            let start = Instant::now();
            loop {
                if handle.is_finished() {
                    if let Err(e) = handle.join() {
                        eprintln!("[LOGGER ERROR] Async worker thread panicked during shutdown: {:?}", e);
                        return false;
                    }
                    break;
                }
                if start.elapsed() >= timeout {
                    eprintln!(
                        "[LOGGER WARNING] Async worker did not finish within {:?}. \
                         Some records may be lost.",
                        timeout
                    );
                    return false;
                }
                thread::sleep(Duration::from_millis(10));
            }
        }

        if let Err(e) = self.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
            return false;
        }
        true
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);

        let snapshot = self.metrics.snapshot();
        if snapshot.lost() > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shutting down with {} records lost \
                 ({} queue drops, {} sink failures, {:.2}% of dispatched)",
                snapshot.lost(),
                snapshot.queue_dropped,
                snapshot.sink_failures,
                snapshot.loss_ratio() * 100.0
            );
        }
    }
}

/// Logger pipeline handle
///
/// # Example
///
/// ```
/// use structured_log_pipeline::prelude::*;
///
/// let sink = MemorySink::new();
/// let records = sink.records();
///
/// let logger = Logger::builder()
///     .sink(sink)
///     .metadata(LoggerMetadata::new().with_field("service", "billing"))
///     .build();
///
/// let request_logger = logger.with_correlation_id("req-42");
/// request_logger.info_with(
///     "charge created",
///     LoggerMetadata::new().with_field("cardToken", "tok_123"),
/// );
///
/// let snapshot = records.snapshot();
/// let record = &snapshot[0];
/// assert_eq!(record.metadata.get("service").and_then(|v| v.as_str()), Some("billing"));
/// assert_eq!(record.metadata.get("correlationId").and_then(|v| v.as_str()), Some("req-42"));
/// assert_eq!(record.metadata.get("cardToken").and_then(|v| v.as_str()), Some("[REDACTED]"));
/// ```
#[derive(Clone)]
pub struct Logger {
    dispatcher: Arc<Dispatcher>,
    config: Arc<PipelineConfig>,
    masker: Arc<Masker>,
    sampler: Arc<Sampler>,
    error_parser: Arc<ErrorParser>,
    stats: Option<Arc<SamplingStats>>,
    metadata: Arc<LoggerMetadata>,
    min_level: LogLevel,
}

impl Logger {
    /// Synchronous logger with default configuration and no sinks
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for Logger
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        self.emit(level, message.as_ref(), None);
    }

    /// Log with call-site metadata; its keys win over the logger's own
    pub fn log_with(&self, level: LogLevel, message: impl AsRef<str>, meta: LoggerMetadata) {
        self.emit(level, message.as_ref(), Some(&meta));
    }

    fn emit(&self, level: LogLevel, message: &str, meta: Option<&LoggerMetadata>) {
        if level < self.min_level {
            return;
        }

        let decision = self.sampler.decide(level, message);
        if let Some(stats) = &self.stats {
            stats.record(&decision);
        }
        if !decision.should_log {
            return;
        }

        let merged = match meta {
            Some(meta) if !meta.is_empty() => Cow::Owned(self.metadata.merged(meta)),
            _ => Cow::Borrowed(self.metadata.as_ref()),
        };
        let masked = self.masker.mask_metadata(&merged).into_owned();

        self.dispatcher.dispatch(LogRecord::new(level, message, masked));
    }

    /// Derive a logger whose metadata is this logger's plus `meta`
    ///
    /// Keys in `meta` win. The parent is left untouched.
    #[must_use]
    pub fn child(&self, meta: LoggerMetadata) -> Logger {
        Logger {
            metadata: Arc::new(self.metadata.merged(&meta)),
            ..self.clone()
        }
    }

    /// Shorthand for `child({correlationId: id})`
    #[must_use]
    pub fn with_correlation_id(&self, id: impl Into<String>) -> Logger {
        self.child(LoggerMetadata::new().with_field(CORRELATION_ID_KEY, id.into()))
    }

    /// Child logger tagged with the request id carried by `headers`
    #[must_use]
    pub fn for_request(&self, headers: &Headers) -> Logger {
        self.with_correlation_id(CorrelationContext::extract(headers))
    }

    /// Log an error record with its parsed stack attached under `error`
    pub fn log_error(&self, message: impl AsRef<str>, error: &ErrorInfo) {
        let record = self.error_parser.parse_error(error);
        self.log_with(
            LogLevel::Error,
            message,
            LoggerMetadata::new().with_field("error", record),
        );
    }

    /// Log a completed request at `info`, or `warn` when it was slow
    pub fn log_request(&self, summary: &RequestSummary) {
        self.log_with(
            summary.level(&self.config),
            summary.message(),
            summary.to_metadata(&self.config, &self.masker),
        );
    }

    #[inline]
    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn http(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Http, message);
    }

    #[inline]
    pub fn verbose(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Verbose, message);
    }

    #[inline]
    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn silly(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Silly, message);
    }

    pub fn error_with(&self, message: impl AsRef<str>, meta: LoggerMetadata) {
        self.log_with(LogLevel::Error, message, meta);
    }

    pub fn warn_with(&self, message: impl AsRef<str>, meta: LoggerMetadata) {
        self.log_with(LogLevel::Warn, message, meta);
    }

    pub fn info_with(&self, message: impl AsRef<str>, meta: LoggerMetadata) {
        self.log_with(LogLevel::Info, message, meta);
    }

    pub fn http_with(&self, message: impl AsRef<str>, meta: LoggerMetadata) {
        self.log_with(LogLevel::Http, message, meta);
    }

    pub fn verbose_with(&self, message: impl AsRef<str>, meta: LoggerMetadata) {
        self.log_with(LogLevel::Verbose, message, meta);
    }

    pub fn debug_with(&self, message: impl AsRef<str>, meta: LoggerMetadata) {
        self.log_with(LogLevel::Debug, message, meta);
    }

    pub fn silly_with(&self, message: impl AsRef<str>, meta: LoggerMetadata) {
        self.log_with(LogLevel::Silly, message, meta);
    }

    /// Add a sink shared by this logger and every related logger
    pub fn add_sink(&self, sink: Box<dyn Sink>) {
        self.dispatcher.add_sink(sink);
    }

    pub fn flush(&self) -> Result<()> {
        self.dispatcher.flush()
    }

    /// Stop the async worker, waiting up to `timeout` for queued records
    ///
    /// Returns `true` if everything was drained and flushed in time. Later
    /// log calls through any related logger are written synchronously.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.dispatcher.shutdown(timeout)
    }

    /// This logger's own metadata snapshot
    pub fn metadata(&self) -> &LoggerMetadata {
        &self.metadata
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// Dispatch metrics shared by the whole logger family
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.dispatcher.metrics
    }

    pub fn sampling_stats(&self) -> Option<&SamplingStats> {
        self.stats.as_deref()
    }

    pub fn error_parser(&self) -> &ErrorParser {
        &self.error_parser
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.min_level)
            .field("metadata", &self.metadata)
            .field("sampler", &self.sampler)
            .finish()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use structured_log_pipeline::prelude::*;
///
/// let logger = Logger::builder()
///     .config(PipelineConfig::default().with_sampling(0.1))
///     .min_level(LogLevel::Debug)
///     .sink(MemorySink::new())
///     .async_mode(1000)
///     .build();
/// ```
pub struct LoggerBuilder {
    config: PipelineConfig,
    sinks: Vec<Box<dyn Sink>>,
    async_buffer: Option<usize>,
    min_level: LogLevel,
    metadata: LoggerMetadata,
    stats: Option<Arc<SamplingStats>>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            sinks: Vec::new(),
            async_buffer: None,
            min_level: LogLevel::Silly,
            metadata: LoggerMetadata::new(),
            stats: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set minimum log level; records below it are discarded before sampling
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Metadata carried by the root logger and inherited by its children
    #[must_use = "builder methods return a new value"]
    pub fn metadata(mut self, metadata: LoggerMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Enable async mode with specified buffer size
    ///
    /// If not called, records are written synchronously.
    #[must_use = "builder methods return a new value"]
    pub fn async_mode(mut self, buffer_size: usize) -> Self {
        self.async_buffer = Some(buffer_size);
        self
    }

    /// Record every sampling decision into `stats`
    #[must_use = "builder methods return a new value"]
    pub fn sampling_stats(mut self, stats: Arc<SamplingStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Validate the configuration, then build
    pub fn try_build(self) -> Result<Logger> {
        self.config.validate()?;
        Ok(self.build())
    }

    pub fn build(self) -> Logger {
        let dispatcher = match self.async_buffer {
            Some(size) => Dispatcher::with_async(self.sinks, size),
            None => Dispatcher::sync(self.sinks),
        };

        Logger {
            dispatcher: Arc::new(dispatcher),
            masker: Arc::new(Masker::from_config(&self.config)),
            sampler: Arc::new(Sampler::from_config(&self.config)),
            error_parser: Arc::new(ErrorParser::from_config(&self.config)),
            config: Arc::new(self.config),
            stats: self.stats,
            metadata: Arc::new(self.metadata),
            min_level: self.min_level,
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
