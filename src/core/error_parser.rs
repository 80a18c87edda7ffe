//! Stack trace parsing and formatting
//!
//! Turns a raw error (name, message, stack text, optional cause) into
//! structured frames that can be filtered and rendered. Stack text follows
//! the common `    at function (file:line:column)` dialect; lines that do
//! not start with `at ` are ignored.

use super::config::PipelineConfig;
use super::metadata::MetaValue;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Frame marker every stack line must start with
const FRAME_MARKER: &str = "at ";

/// File name used for frames whose location could not be recovered
pub const UNKNOWN_FILE: &str = "unknown";

/// File name used for frames executing native code
pub const NATIVE_FILE: &str = "native";

/// Path segments identifying third-party library code
pub const LIBRARY_PATH_SEGMENTS: &[&str] = &["node_modules", ".cargo/registry"];

/// Function name for frames that carry only a location
pub const ANONYMOUS_FUNCTION: &str = "<anonymous>";

struct FramePatterns {
    native: Regex,
    with_column: Regex,
    with_line: Regex,
    bare_with_column: Regex,
    bare_with_line: Regex,
}

fn patterns() -> &'static FramePatterns {
    static PATTERNS: OnceLock<FramePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| FramePatterns {
        native: Regex::new(r"^(?:(.+?)\s+)?\(?native\)?$").expect("valid native frame pattern"),
        with_column: Regex::new(r"^(.+?)\s+\((.+):(\d+):(\d+)\)$")
            .expect("valid frame pattern"),
        with_line: Regex::new(r"^(.+?)\s+\((.+):(\d+)\)$").expect("valid frame pattern"),
        bare_with_column: Regex::new(r"^(.+):(\d+):(\d+)$").expect("valid frame pattern"),
        bare_with_line: Regex::new(r"^(.+):(\d+)$").expect("valid frame pattern"),
    })
}

/// Raw error handed to the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub name: String,
    pub message: String,
    /// Full stack text, header line included
    pub stack: Option<String>,
    pub cause: Option<Box<ErrorInfo>>,
}

impl ErrorInfo {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
            cause: None,
        }
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: ErrorInfo) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Capture a Rust error and its `source()` chain.
    ///
    /// The top-level name is the error's type name; sources, which are only
    /// known as trait objects, are named `Error`. No stack text is attached.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut info = ErrorInfo::new(short_type_name::<E>(), err.to_string());
        info.cause = err.source().map(|source| Box::new(Self::from_source(source)));
        info
    }

    fn from_source(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut info = ErrorInfo::new("Error", err.to_string());
        info.cause = err.source().map(|source| Box::new(Self::from_source(source)));
        info
    }
}

fn short_type_name<E: ?Sized>() -> String {
    let full = std::any::type_name::<E>();
    if full.starts_with("dyn ") {
        return "Error".to_string();
    }
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedStackFrame {
    pub function_name: String,
    pub file_name: String,
    pub line_number: Option<u32>,
    pub column_number: Option<u32>,
    pub is_native: bool,
    /// True when the frame lives in third-party library code
    pub is_library: bool,
    pub raw: String,
}

impl ParsedStackFrame {
    fn located(raw: &str, function: &str, file: &str, line: &str, column: Option<&str>) -> Self {
        Self {
            function_name: function.to_string(),
            file_name: file.to_string(),
            line_number: line.parse().ok(),
            column_number: column.and_then(|c| c.parse().ok()),
            is_native: false,
            is_library: is_library_path(file),
            raw: raw.to_string(),
        }
    }

    /// Parse the content of one stack line (frame marker already removed).
    ///
    /// Never fails: unrecognized content becomes a frame whose function name
    /// is the whole content and whose file is `unknown`.
    pub fn parse(content: &str, raw: &str) -> Self {
        let p = patterns();

        if let Some(caps) = p.native.captures(content) {
            return Self {
                function_name: caps
                    .get(1)
                    .map_or(ANONYMOUS_FUNCTION, |m| m.as_str())
                    .to_string(),
                file_name: NATIVE_FILE.to_string(),
                line_number: None,
                column_number: None,
                is_native: true,
                is_library: false,
                raw: raw.to_string(),
            };
        }
        if let Some(caps) = p.with_column.captures(content) {
            return Self::located(raw, &caps[1], &caps[2], &caps[3], Some(&caps[4]));
        }
        if let Some(caps) = p.with_line.captures(content) {
            return Self::located(raw, &caps[1], &caps[2], &caps[3], None);
        }
        if let Some(caps) = p.bare_with_column.captures(content) {
            return Self::located(raw, ANONYMOUS_FUNCTION, &caps[1], &caps[2], Some(&caps[3]));
        }
        if let Some(caps) = p.bare_with_line.captures(content) {
            return Self::located(raw, ANONYMOUS_FUNCTION, &caps[1], &caps[2], None);
        }

        Self {
            function_name: content.to_string(),
            file_name: UNKNOWN_FILE.to_string(),
            line_number: None,
            column_number: None,
            is_native: false,
            is_library: false,
            raw: raw.to_string(),
        }
    }

    fn has_location(&self) -> bool {
        self.file_name != UNKNOWN_FILE && self.file_name != NATIVE_FILE
    }

    fn render(&self) -> String {
        if !self.has_location() {
            return format!("    at {}", self.function_name);
        }
        let mut location = self.file_name.clone();
        if let Some(line) = self.line_number {
            location.push_str(&format!(":{}", line));
            if let Some(column) = self.column_number {
                location.push_str(&format!(":{}", column));
            }
        }
        format!("    at {} ({})", self.function_name, location)
    }
}

fn is_library_path(file: &str) -> bool {
    LIBRARY_PATH_SEGMENTS
        .iter()
        .any(|segment| file.contains(segment))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedError {
    pub name: String,
    pub message: String,
    pub stack: Vec<ParsedStackFrame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<ParsedError>>,
}

impl ParsedError {
    /// Frames outside third-party library code
    pub fn app_frames(&self) -> impl Iterator<Item = &ParsedStackFrame> {
        self.stack.iter().filter(|frame| !frame.is_library)
    }

    /// Render as text; see [`format_error`]
    pub fn format(&self, include_library_frames: bool) -> String {
        format_error(self, include_library_frames)
    }
}

/// Parse an error and its cause chain.
///
/// At most `max_lines` frames are kept per error; each cause gets its own
/// budget. Only extracted frames count toward it.
pub fn parse_error(error: &ErrorInfo, max_lines: usize) -> ParsedError {
    let stack = error
        .stack
        .as_deref()
        .map(|text| parse_stack(text, max_lines))
        .unwrap_or_default();

    ParsedError {
        name: if error.name.is_empty() {
            "Error".to_string()
        } else {
            error.name.clone()
        },
        message: error.message.clone(),
        stack,
        cause: error
            .cause
            .as_deref()
            .map(|cause| Box::new(parse_error(cause, max_lines))),
    }
}

fn parse_stack(text: &str, max_lines: usize) -> Vec<ParsedStackFrame> {
    text.lines()
        .skip(1)
        .filter_map(|line| {
            let trimmed = line.trim();
            trimmed
                .strip_prefix(FRAME_MARKER)
                .map(|content| ParsedStackFrame::parse(content.trim(), trimmed))
        })
        .take(max_lines)
        .collect()
}

/// Render a parsed error as multi-line text.
///
/// Library frames are skipped unless `include_library_frames` is set; each
/// cause is appended after a `Caused by: ` line.
pub fn format_error(parsed: &ParsedError, include_library_frames: bool) -> String {
    let mut lines = vec![format!("{}: {}", parsed.name, parsed.message)];
    lines.extend(
        parsed
            .stack
            .iter()
            .filter(|frame| include_library_frames || !frame.is_library)
            .map(ParsedStackFrame::render),
    );

    let mut out = lines.join("\n");
    if let Some(cause) = &parsed.cause {
        out.push_str("\nCaused by: ");
        out.push_str(&format_error(cause, include_library_frames));
    }
    out
}

/// Shape an error takes when attached to a log record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum ErrorRecord {
    /// Stack parsing disabled: the stack text is passed through
    Raw {
        name: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        stack: Option<String>,
    },
    Structured {
        name: String,
        message: String,
        /// Application frames only
        parsed_stack: Vec<ParsedStackFrame>,
        /// Every frame, library code included
        full_stack: Vec<ParsedStackFrame>,
        #[serde(skip_serializing_if = "Option::is_none")]
        cause: Option<Box<ParsedError>>,
        formatted: String,
    },
}

impl ErrorRecord {
    pub fn to_meta_value(&self) -> MetaValue {
        serde_json::to_value(self)
            .map(MetaValue::from)
            .unwrap_or(MetaValue::Null)
    }
}

impl From<ErrorRecord> for MetaValue {
    fn from(record: ErrorRecord) -> Self {
        record.to_meta_value()
    }
}

/// Configured error parser
///
/// # Example
///
/// ```
/// use structured_log_pipeline::{create_parser, ErrorInfo, ErrorRecord, PipelineConfig};
///
/// let parser = create_parser(&PipelineConfig::default());
/// let error = ErrorInfo::new("TypeError", "x is undefined")
///     .with_stack("TypeError: x is undefined\n    at run (/app/main.js:3:7)");
///
/// match parser.parse_error(&error) {
///     ErrorRecord::Structured { parsed_stack, .. } => assert_eq!(parsed_stack.len(), 1),
///     ErrorRecord::Raw { .. } => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ErrorParser {
    enabled: bool,
    max_lines: usize,
}

impl ErrorParser {
    pub fn new(enabled: bool, max_lines: usize) -> Self {
        Self { enabled, max_lines }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.error_stack_enabled, config.error_stack_lines)
    }

    pub fn parse_error(&self, error: &ErrorInfo) -> ErrorRecord {
        if !self.enabled {
            return ErrorRecord::Raw {
                name: error.name.clone(),
                message: error.message.clone(),
                stack: error.stack.clone(),
            };
        }

        let parsed = parse_error(error, self.max_lines);
        let formatted = format_error(&parsed, false);
        let parsed_stack = parsed.app_frames().cloned().collect();
        ErrorRecord::Structured {
            name: parsed.name,
            message: parsed.message,
            parsed_stack,
            full_stack: parsed.stack,
            cause: parsed.cause,
            formatted,
        }
    }
}

impl Default for ErrorParser {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

pub fn create_parser(config: &PipelineConfig) -> ErrorParser {
    ErrorParser::from_config(config)
}
