//! Integration tests for the logging pipeline
//!
//! These tests verify:
//! - Pipeline ordering (threshold, sampling, merge, masking, dispatch)
//! - Child logger metadata isolation
//! - Correlation id propagation
//! - Error and request records
//! - Sink failure isolation
//! - Async logging and thread safety

use serde_json::json;
use structured_log_pipeline::prelude::*;
use structured_log_pipeline::{RecordBuffer, CORRELATION_ID_KEY};
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn capturing(builder: LoggerBuilder) -> (Logger, RecordBuffer) {
    let sink = MemorySink::new();
    let records = sink.records();
    (builder.sink(sink).build(), records)
}

fn str_field<'a>(record: &'a LogRecord, key: &str) -> Option<&'a str> {
    record.metadata.get(key).and_then(MetaValue::as_str)
}

#[test]
fn test_masking_applies_to_merged_metadata() {
    let (logger, records) = capturing(
        Logger::builder().metadata(LoggerMetadata::new().with_field("apiKey", "root-secret")),
    );

    logger.info_with(
        "user signed in",
        LoggerMetadata::from_json_value(json!({
            "user": {"name": "ada", "password": "hunter2"},
            "sessions": [{"refresh_token": "r1"}, {"device": "phone"}]
        }))
        .unwrap(),
    );

    let snapshot = records.snapshot();
    let json = snapshot[0].to_json_value();
    assert_eq!(json["apiKey"], "[REDACTED]");
    assert_eq!(json["user"]["name"], "ada");
    assert_eq!(json["user"]["password"], "[REDACTED]");
    assert_eq!(json["sessions"][0]["refresh_token"], "[REDACTED]");
    assert_eq!(json["sessions"][1]["device"], "phone");

    // The logger's own snapshot is never masked in place
    assert_eq!(
        logger.metadata().get("apiKey").and_then(MetaValue::as_str),
        Some("root-secret")
    );
}

#[test]
fn test_custom_mask_configuration() {
    let config = PipelineConfig::default()
        .with_mask_fields(vec!["email".to_string()])
        .with_mask_pattern("***");
    let (logger, records) = capturing(Logger::builder().config(config));

    logger.info_with(
        "profile updated",
        LoggerMetadata::new()
            .with_field("Email", "a@b.c")
            .with_field("password", "visible"),
    );

    let snapshot = records.snapshot();
    assert_eq!(str_field(&snapshot[0], "Email"), Some("***"));
    assert_eq!(str_field(&snapshot[0], "password"), Some("visible"));
}

#[test]
fn test_masking_disabled_passes_values_through() {
    let (logger, records) =
        capturing(Logger::builder().config(PipelineConfig::default().with_masking(false)));

    logger.info_with("raw", LoggerMetadata::new().with_field("token", "abc"));
    assert_eq!(str_field(&records.snapshot()[0], "token"), Some("abc"));
}

#[test]
fn test_child_loggers_are_isolated() {
    let (root, records) = capturing(
        Logger::builder().metadata(LoggerMetadata::new().with_field("service", "orders")),
    );

    let child = root.child(LoggerMetadata::new().with_field("component", "db"));
    let grandchild = child.child(LoggerMetadata::new().with_field("component", "pool"));

    root.info("from root");
    child.info("from child");
    grandchild.info("from grandchild");

    let snapshot = records.snapshot();
    assert_eq!(snapshot.len(), 3);
    assert_eq!(str_field(&snapshot[0], "component"), None);
    assert_eq!(str_field(&snapshot[1], "component"), Some("db"));
    assert_eq!(str_field(&snapshot[2], "component"), Some("pool"));
    for record in &snapshot {
        assert_eq!(str_field(record, "service"), Some("orders"));
    }

    assert_eq!(root.metadata().len(), 1);
    assert_eq!(child.metadata().len(), 2);
}

#[test]
fn test_sibling_children_do_not_share_metadata() {
    let (parent, records) = capturing(Logger::builder());

    let first = parent.child(LoggerMetadata::new().with_field("a", 1));
    let second = parent.child(LoggerMetadata::new().with_field("a", 2));

    first.info("first");
    second.info("second");
    first.info("first again");

    let values: Vec<Option<MetaValue>> = records
        .snapshot()
        .iter()
        .map(|r| r.metadata.get("a").cloned())
        .collect();
    assert_eq!(
        values,
        vec![
            Some(MetaValue::Int(1)),
            Some(MetaValue::Int(2)),
            Some(MetaValue::Int(1)),
        ]
    );
    assert!(parent.metadata().is_empty());
}

#[test]
fn test_correlation_id_propagation() {
    let (logger, records) = capturing(Logger::builder());

    let mut headers: Headers = HashMap::new();
    headers.insert("x-request-id".to_string(), HeaderValue::from("req-abc"));

    let request_logger = logger.for_request(&headers);
    request_logger.info("handling");
    request_logger.with_correlation_id("req-override").info("nested");
    logger.info("outside");

    let snapshot = records.snapshot();
    assert_eq!(str_field(&snapshot[0], CORRELATION_ID_KEY), Some("req-abc"));
    assert_eq!(str_field(&snapshot[1], CORRELATION_ID_KEY), Some("req-override"));
    assert_eq!(str_field(&snapshot[2], CORRELATION_ID_KEY), None);
}

#[test]
fn test_generated_correlation_id_when_header_missing() {
    let (logger, records) = capturing(Logger::builder());

    logger.for_request(&Headers::new()).info("no header");

    let snapshot = records.snapshot();
    let id = str_field(&snapshot[0], CORRELATION_ID_KEY).unwrap();
    assert_eq!(id.len(), 36);
    assert_eq!(id.chars().nth(14), Some('4'));
}

#[test]
fn test_sampling_never_drops_important_levels() {
    let stats = Arc::new(SamplingStats::new());
    let (logger, records) = capturing(
        Logger::builder()
            .config(PipelineConfig::default().with_sampling(0.0))
            .sampling_stats(Arc::clone(&stats)),
    );

    logger.error("e");
    logger.warn("w");
    logger.info("i");
    logger.http("h");
    logger.verbose("v");
    logger.debug("d");
    logger.silly("s");

    assert_eq!(records.messages(), vec!["e", "w", "i", "h"]);
    assert_eq!(stats.total(), 7);
    assert_eq!(stats.sampled(), 3);
    assert_eq!(stats.dropped(), 3);
    assert_eq!(stats.drop_rate(), 1.0);
}

#[test]
fn test_sampling_is_deterministic_per_message() {
    let (logger, records) =
        capturing(Logger::builder().config(PipelineConfig::default().with_sampling(0.5)));

    let messages: Vec<String> = (0..200).map(|i| format!("cache miss {}", i)).collect();
    for message in &messages {
        logger.debug(message);
    }
    let first_pass = records.messages();
    records.clear();

    for message in &messages {
        logger.debug(message);
    }
    assert_eq!(records.messages(), first_pass);
    assert!(!first_pass.is_empty());
    assert!(first_pass.len() < messages.len());
}

#[test]
fn test_log_error_with_cause_chain() {
    let (logger, records) = capturing(Logger::builder());

    let cause = ErrorInfo::new("ConnectionError", "ECONNREFUSED")
        .with_stack("ConnectionError: ECONNREFUSED\n    at connect (/srv/app/db.js:10:5)");
    let error = ErrorInfo::new("QueryError", "query failed")
        .with_stack(
            "QueryError: query failed\n    \
             at runQuery (/srv/app/repo.js:22:9)\n    \
             at Pool.acquire (/srv/app/node_modules/pg/lib/pool.js:40:11)",
        )
        .with_cause(cause);

    logger.log_error("order lookup failed", &error);

    let snapshot = records.snapshot();
    assert_eq!(snapshot[0].level, LogLevel::Error);
    let json = snapshot[0].to_json_value();
    assert_eq!(json["error"]["name"], "QueryError");
    assert_eq!(json["error"]["parsedStack"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["error"]["fullStack"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["error"]["fullStack"][1]["isLibrary"], true);
    assert_eq!(json["error"]["cause"]["name"], "ConnectionError");
    let formatted = json["error"]["formatted"].as_str().unwrap();
    assert!(formatted.contains("Caused by: ConnectionError: ECONNREFUSED"));
    assert!(!formatted.contains("node_modules"));
}

#[test]
fn test_log_error_raw_when_parsing_disabled() {
    let (logger, records) = capturing(
        Logger::builder().config(PipelineConfig::default().with_error_stack(false, 10)),
    );

    let error = ErrorInfo::new("Error", "boom").with_stack("Error: boom\n    at x (/a.js:1:1)");
    logger.log_error("failed", &error);

    let json = records.snapshot()[0].to_json_value();
    assert_eq!(json["error"]["stack"], "Error: boom\n    at x (/a.js:1:1)");
    assert!(json["error"].get("parsedStack").is_none());
}

#[test]
fn test_log_error_from_rust_error() {
    let (logger, records) = capturing(Logger::builder());

    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml missing");
    logger.log_error("startup failed", &ErrorInfo::from_error(&io_error));

    let json = records.snapshot()[0].to_json_value();
    assert_eq!(json["error"]["message"], "config.toml missing");
}

#[test]
fn test_log_request_truncates_large_bodies() {
    let config = PipelineConfig::default().with_body_logging(false, true, 64);
    let (logger, records) = capturing(Logger::builder().config(config));

    let summary = RequestSummary::new("GET", "/reports", 200, 15)
        .with_correlation_id("req-9")
        .with_response_body(json!({"rows": vec!["row"; 100]}));
    logger.log_request(&summary);

    let snapshot = records.snapshot();
    assert_eq!(snapshot[0].level, LogLevel::Info);
    assert_eq!(snapshot[0].message, "GET /reports 200 - 15ms");
    let json = snapshot[0].to_json_value();
    assert_eq!(json["responseBody"]["_truncated"], true);
    assert_eq!(json["responseBody"]["_maxSize"], 64);
    assert_eq!(json[CORRELATION_ID_KEY], "req-9");
}

#[test]
fn test_truncated_bodies_never_leak_secrets() {
    let config = PipelineConfig::default().with_body_logging(true, true, 40);
    let (logger, records) = capturing(Logger::builder().config(config));

    let summary = RequestSummary::new("POST", "/login", 200, 8)
        .with_request_body(json!({
            "user": "alice",
            "password": "hunter2-super-secret",
            "note": "long enough to be truncated"
        }))
        .with_response_body(json!({"session": {"access_token": "tok-live-123456"}, "ok": true}));
    logger.log_request(&summary);

    let json = records.snapshot()[0].to_json_value();
    assert_eq!(json["requestBody"]["_truncated"], true);
    assert_eq!(json["responseBody"]["_truncated"], true);
    assert!(json["requestBody"]["_preview"].as_str().unwrap().contains("[REDACTED]"));

    let rendered = json.to_string();
    assert!(!rendered.contains("hunter2"));
    assert!(!rendered.contains("tok-live"));
}

#[test]
fn test_log_injection_prevention() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("injection_test.jsonl");

    let logger = Logger::builder()
        .sink(JsonSink::new(&log_file).expect("Failed to create sink"))
        .build();

    logger.info("User login\nERROR [2024-10-17] Fake error injected\nINFO Continuation");
    logger.flush().expect("Failed to flush");

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1, "Log should be a single line, not multiple");

    let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert!(parsed["message"].as_str().unwrap().contains("\\n"));
}

#[test]
fn test_async_logging() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("async_test.jsonl");

    let logger = Logger::builder()
        .async_mode(100)
        .sink(JsonSink::new(&log_file).expect("Failed to create sink"))
        .build();

    for i in 0..50 {
        logger.info(format!("Message {}", i));
    }

    assert!(logger.shutdown(Duration::from_secs(5)));

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    assert_eq!(content.lines().count(), 50, "Should have 50 log entries");
    assert_eq!(logger.metrics().delivered(), 50);
}

#[test]
fn test_concurrent_logging_from_children() {
    let (logger, records) = capturing(Logger::builder());

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let child = logger.child(LoggerMetadata::new().with_field("worker", worker));
            thread::spawn(move || {
                for i in 0..100 {
                    child.info(format!("worker {} message {}", worker, i));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert_eq!(records.len(), 800);
    for record in records.snapshot() {
        let worker = record.metadata.get("worker").cloned();
        assert!(matches!(worker, Some(MetaValue::Int(0..=7))));
    }
}

#[test]
fn test_config_from_json_drives_pipeline() {
    let config = PipelineConfig::from_json(
        r#"{"maskFields": ["card"], "samplingEnabled": true, "samplingRate": 0.0}"#,
    )
    .unwrap();
    let (logger, records) = capturing(Logger::builder().config(config));

    logger.debug("sampled away");
    logger.info_with("paid", LoggerMetadata::new().with_field("cardNumber", "4111"));

    let snapshot = records.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(str_field(&snapshot[0], "cardNumber"), Some("[REDACTED]"));
}
