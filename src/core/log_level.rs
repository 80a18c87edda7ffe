//! Log level definitions
//!
//! Levels are ordered by severity: `Silly` is the most verbose and `Error`
//! the most severe, so `level >= threshold` means "at least as important".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Silly = 0,
    Debug = 1,
    Verbose = 2,
    Http = 3,
    #[default]
    Info = 4,
    Warn = 5,
    Error = 6,
}

impl LogLevel {
    /// Every level, most severe first
    pub const ALL: [LogLevel; 7] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Http,
        LogLevel::Verbose,
        LogLevel::Debug,
        LogLevel::Silly,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Http => "http",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
            LogLevel::Silly => "silly",
        }
    }

    /// Whether records at this level are candidates for sampling.
    ///
    /// Only the verbose tail (`verbose`, `debug`, `silly`) may be dropped;
    /// everything from `http` upward is always emitted.
    #[inline]
    pub fn is_sampleable(&self) -> bool {
        matches!(self, LogLevel::Verbose | LogLevel::Debug | LogLevel::Silly)
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Error => Red,
            LogLevel::Warn => Yellow,
            LogLevel::Info => Green,
            LogLevel::Http => Magenta,
            LogLevel::Verbose => Cyan,
            LogLevel::Debug => Blue,
            LogLevel::Silly => BrightBlack,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "http" => Ok(LogLevel::Http),
            "verbose" => Ok(LogLevel::Verbose),
            "debug" => Ok(LogLevel::Debug),
            "silly" => Ok(LogLevel::Silly),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}
