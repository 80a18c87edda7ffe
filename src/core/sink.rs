//! Sink trait for log output destinations

use super::{error::Result, log_record::LogRecord};

/// Destination for finished log records (console, file, network, ...)
///
/// Failures are reported back to the pipeline, which counts them but never
/// surfaces them to the code that logged.
pub trait Sink: Send + Sync {
    fn write(&mut self, record: &LogRecord) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
