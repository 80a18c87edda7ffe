//! Finished log record handed to sinks

use super::log_level::LogLevel;
use super::metadata::LoggerMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Merged and masked metadata
    #[serde(skip_serializing_if = "LoggerMetadata::is_empty", default)]
    pub metadata: LoggerMetadata,
}

impl LogRecord {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// to prevent attackers from injecting fake log entries.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: LogLevel, message: &str, metadata: LoggerMetadata) -> Self {
        Self {
            level,
            message: Self::sanitize_message(message),
            timestamp: Utc::now(),
            metadata,
        }
    }

    /// Render as a single JSON object with metadata fields inlined
    pub fn to_json_value(&self) -> serde_json::Value {
        let mut json_obj = serde_json::Map::new();
        json_obj.insert(
            "timestamp".to_string(),
            serde_json::Value::String(self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
        );
        json_obj.insert(
            "level".to_string(),
            serde_json::Value::String(self.level.to_str().to_string()),
        );
        json_obj.insert(
            "message".to_string(),
            serde_json::Value::String(self.message.clone()),
        );
        // Reserved keys are not overwritten by metadata
        for (key, value) in self.metadata.iter() {
            json_obj
                .entry(key.clone())
                .or_insert_with(|| value.to_json_value());
        }
        serde_json::Value::Object(json_obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_is_sanitized() {
        let record = LogRecord::new(
            LogLevel::Info,
            "login\nERROR forged line\r\tend",
            LoggerMetadata::new(),
        );
        assert_eq!(record.message, "login\\nERROR forged line\\r\\tend");
    }

    #[test]
    fn test_json_value_inlines_metadata() {
        let meta = LoggerMetadata::new()
            .with_field("correlationId", "abc")
            .with_field("level", "spoofed");
        let record = LogRecord::new(LogLevel::Http, "GET /health", meta);

        let json = record.to_json_value();
        assert_eq!(json["level"], "http");
        assert_eq!(json["message"], "GET /health");
        assert_eq!(json["correlationId"], "abc");
        assert!(json["timestamp"].is_string());
    }
}
