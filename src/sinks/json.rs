//! JSON lines file sink

use crate::core::{LogRecord, LoggerError, Result, Sink};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// JSON file sink for structured logging
///
/// Writes each record as a single-line JSON object (JSONL format) with
/// metadata fields inlined next to `timestamp`, `level` and `message`.
pub struct JsonSink {
    writer: BufWriter<File>,
    pretty: bool,
}

impl JsonSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(path, false)
    }

    /// Multi-line pretty printed objects, for local debugging
    pub fn new_pretty<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(path, true)
    }

    fn open<P: AsRef<Path>>(path: P, pretty: bool) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::io_operation("opening log file", path.display().to_string(), e)
            })?;

        Ok(Self {
            writer: BufWriter::new(file),
            pretty,
        })
    }
}

impl Sink for JsonSink {
    fn name(&self) -> &str {
        "json"
    }

    fn write(&mut self, record: &LogRecord) -> Result<()> {
        let value = record.to_json_value();
        let json = if self.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };

        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, LoggerMetadata};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_json_sink() -> Result<()> {
        let dir = tempdir()?;
        let log_path = dir.path().join("test.jsonl");

        let mut sink = JsonSink::new(&log_path)?;

        let meta = LoggerMetadata::new()
            .with_field("userId", 123)
            .with_field("action", "login");
        sink.write(&LogRecord::new(LogLevel::Info, "User logged in", meta))?;
        sink.flush()?;

        let content = fs::read_to_string(&log_path)?;
        let parsed: serde_json::Value = serde_json::from_str(content.trim())?;
        assert_eq!(parsed["message"], "User logged in");
        assert_eq!(parsed["userId"], 123);
        assert_eq!(parsed["action"], "login");

        Ok(())
    }

    #[test]
    fn test_open_failure_names_the_path() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("no_such_dir").join("app.jsonl");

        let err = match JsonSink::new(&missing) {
            Err(err) => err,
            Ok(_) => panic!("opening inside a missing directory should fail"),
        };
        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("opening log file"));
        assert!(err.to_string().contains("no_such_dir"));
    }

    #[test]
    fn test_json_sink_multiple_records() -> Result<()> {
        let dir = tempdir()?;
        let log_path = dir.path().join("test_multiple.jsonl");

        let mut sink = JsonSink::new(&log_path)?;

        for i in 0..5 {
            let meta = LoggerMetadata::new().with_field("iteration", i);
            sink.write(&LogRecord::new(LogLevel::Debug, &format!("Iteration {}", i), meta))?;
        }
        sink.flush()?;

        let content = fs::read_to_string(&log_path)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 5);

        for line in lines {
            let parsed: serde_json::Value = serde_json::from_str(line)?;
            assert!(parsed["message"].is_string());
            assert_eq!(parsed["level"], "debug");
        }

        Ok(())
    }
}
