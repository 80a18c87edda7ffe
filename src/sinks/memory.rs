//! In-memory sink for tests and embedding

use crate::core::{LogLevel, LogRecord, Result, Sink};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared handle to the records captured by a [`MemorySink`]
#[derive(Debug, Clone, Default)]
pub struct RecordBuffer {
    inner: Arc<Mutex<Vec<LogRecord>>>,
}

impl RecordBuffer {
    pub fn snapshot(&self) -> Vec<LogRecord> {
        self.inner.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.inner.lock().iter().map(|r| r.message.clone()).collect()
    }

    pub fn count_at(&self, level: LogLevel) -> usize {
        self.inner.lock().iter().filter(|r| r.level == level).count()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

/// Keeps every record it receives
///
/// # Example
///
/// ```
/// use structured_log_pipeline::prelude::*;
///
/// let sink = MemorySink::new();
/// let records = sink.records();
///
/// let logger = Logger::builder().sink(sink).build();
/// logger.info("captured");
///
/// assert_eq!(records.messages(), vec!["captured".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct MemorySink {
    buffer: RecordBuffer,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that stays valid after the sink moves into a logger
    pub fn records(&self) -> RecordBuffer {
        self.buffer.clone()
    }
}

impl Sink for MemorySink {
    fn write(&mut self, record: &LogRecord) -> Result<()> {
        self.buffer.inner.lock().push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
