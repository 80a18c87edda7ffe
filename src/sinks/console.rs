//! Console sink implementation

use crate::core::{LogLevel, LogRecord, Result, Sink};
use chrono::SecondsFormat;
use colored::Colorize;

/// Writes records to stdout, and error records to stderr
///
/// Text mode renders `[timestamp] [level] message key=value ...`; JSON mode
/// writes one object per line with metadata inlined.
pub struct ConsoleSink {
    use_colors: bool,
    json: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            json: false,
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            json: false,
        }
    }

    /// Switch to single-line JSON output
    ///
    /// # Example
    ///
    /// ```
    /// use structured_log_pipeline::sinks::ConsoleSink;
    ///
    /// let sink = ConsoleSink::new().json();
    /// ```
    #[must_use]
    pub fn json(mut self) -> Self {
        self.json = true;
        self.use_colors = false;
        self
    }

    fn format_text(&self, record: &LogRecord) -> String {
        let level_str = if self.use_colors {
            format!("{:7}", record.level.to_str())
                .color(record.level.color_code())
                .to_string()
        } else {
            format!("{:7}", record.level.to_str())
        };

        let base = format!(
            "[{}] [{}] {}",
            record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            level_str,
            record.message
        );

        if record.metadata.is_empty() {
            base
        } else {
            format!("{} {}", base, record.metadata.format_fields())
        }
    }

    fn format(&self, record: &LogRecord) -> String {
        if self.json {
            record.to_json_value().to_string()
        } else {
            self.format_text(record)
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn write(&mut self, record: &LogRecord) -> Result<()> {
        let output = self.format(record);

        match record.level {
            LogLevel::Error => eprintln!("{}", output),
            _ => println!("{}", output),
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        use std::io::Write;
        // Flush both stdout and stderr since we write to both
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LoggerMetadata;

    #[test]
    fn test_text_format_without_colors() {
        let sink = ConsoleSink::with_colors(false);
        let record = LogRecord::new(
            LogLevel::Warn,
            "disk almost full",
            LoggerMetadata::new().with_field("freeMb", 12),
        );

        let line = sink.format(&record);
        assert!(line.contains("[warn   ] disk almost full"));
        assert!(line.ends_with("freeMb=12"));
    }

    #[test]
    fn test_json_format() {
        let sink = ConsoleSink::new().json();
        let record = LogRecord::new(LogLevel::Info, "ready", LoggerMetadata::new());

        let parsed: serde_json::Value = serde_json::from_str(&sink.format(&record)).unwrap();
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["message"], "ready");
    }
}
