//! Deterministic log sampling for high-volume scenarios
//!
//! Reduces the volume of verbose records while guaranteeing that the same
//! message text always gets the same decision for a given rate, so a
//! repeated log statement never flickers in and out of the output.
//!
//! # Features
//!
//! - **Deterministic**: decisions are keyed on a 32-bit hash of the message
//! - **Level Bypass**: `error`, `warn`, `info` and `http` are never sampled
//! - **Clamped Rates**: rates outside `[0, 1]` are clamped, never rejected
//! - **Statistics**: `SamplingStats` counts kept and dropped records
//!
//! # Example
//!
//! ```
//! use structured_log_pipeline::prelude::*;
//!
//! let sampler = Sampler::new(SamplingConfig::new(0.0));
//!
//! // Levels above the verbose tail always pass
//! assert!(sampler.decide(LogLevel::Error, "disk full").should_log);
//! assert!(!sampler.decide(LogLevel::Debug, "cache miss").should_log);
//! ```

use super::config::PipelineConfig;
use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of hash buckets the rate is spread over
const BUCKETS: u32 = 1000;

/// Configuration for log sampling
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    /// Whether sampling is applied at all
    pub enabled: bool,

    /// Fraction of sampleable records kept
    ///
    /// - 1.0 = keep everything
    /// - 0.1 = keep roughly 10% of distinct messages
    /// - 0.0 = drop every sampleable record
    pub rate: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rate: 1.0,
        }
    }
}

impl SamplingConfig {
    /// Create an enabled sampling config with the specified rate
    ///
    /// # Example
    ///
    /// ```
    /// use structured_log_pipeline::SamplingConfig;
    ///
    /// let config = SamplingConfig::new(1.5);
    /// assert_eq!(config.rate, 1.0);
    /// ```
    pub fn new(rate: f64) -> Self {
        Self {
            enabled: true,
            rate: clamp_rate(rate),
        }
    }

    /// Create a config that always logs all messages
    pub fn no_sampling() -> Self {
        Self::default()
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            enabled: config.sampling_enabled,
            rate: clamp_rate(config.sampling_rate),
        }
    }
}

fn clamp_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        return 1.0;
    }
    rate.clamp(0.0, 1.0)
}

/// Outcome of a single sampling decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingDecision {
    pub should_log: bool,
    /// True when the record was subject to sampling at all
    pub was_sampled: bool,
    pub rate: f64,
}

impl SamplingDecision {
    const fn pass(rate: f64) -> Self {
        Self {
            should_log: true,
            was_sampled: false,
            rate,
        }
    }
}

/// Order-dependent 32-bit rolling hash (`h = h * 31 + c`) over UTF-16 units.
///
/// Returns the absolute value of the wrapped signed result.
pub fn message_hash(message: &str) -> u32 {
    message
        .encode_utf16()
        .fold(0i32, |hash, unit| {
            hash.wrapping_mul(31).wrapping_add(i32::from(unit))
        })
        .unsigned_abs()
}

/// Log sampler
///
/// Stateless and thread-safe: share it behind an `Arc` across loggers.
///
/// # Example
///
/// ```
/// use structured_log_pipeline::{LogLevel, Sampler, SamplingConfig};
///
/// let sampler = Sampler::new(SamplingConfig::new(0.5));
/// let first = sampler.should_log(LogLevel::Debug, "polling queue");
///
/// // Same message, same answer
/// for _ in 0..10 {
///     assert_eq!(sampler.should_log(LogLevel::Debug, "polling queue"), first);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Sampler {
    config: SamplingConfig,
}

impl Sampler {
    pub fn new(config: SamplingConfig) -> Self {
        Self {
            config: SamplingConfig {
                rate: clamp_rate(config.rate),
                ..config
            },
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(SamplingConfig::from_config(config))
    }

    /// Decide whether a record should be emitted
    pub fn decide(&self, level: LogLevel, message: &str) -> SamplingDecision {
        if !self.config.enabled {
            return SamplingDecision::pass(1.0);
        }

        let rate = self.config.rate;
        if !level.is_sampleable() {
            return SamplingDecision::pass(rate);
        }

        let threshold = (rate * f64::from(BUCKETS)).floor() as u32;
        SamplingDecision {
            should_log: message_hash(message) % BUCKETS < threshold,
            was_sampled: true,
            rate,
        }
    }

    /// Boolean shorthand for [`Sampler::decide`]
    #[inline]
    pub fn should_log(&self, level: LogLevel, message: &str) -> bool {
        self.decide(level, message).should_log
    }

    /// Get a reference to the sampling configuration
    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }
}

/// Build a boolean predicate for call sites that only need yes/no
pub fn create_sampler(config: &PipelineConfig) -> impl Fn(LogLevel, &str) -> bool + Send + Sync {
    let sampler = Sampler::from_config(config);
    move |level, message| sampler.should_log(level, message)
}

/// Counters for sampling observability
///
/// Safe to update from many threads at once.
///
/// # Example
///
/// ```
/// use structured_log_pipeline::SamplingStats;
///
/// let stats = SamplingStats::new();
/// assert_eq!(stats.total(), 0);
/// assert_eq!(stats.drop_rate(), 0.0);
/// ```
#[derive(Debug)]
pub struct SamplingStats {
    /// Every decision recorded
    total: AtomicU64,

    /// Decisions that were subject to sampling
    sampled: AtomicU64,

    /// Sampled decisions that dropped the record
    dropped: AtomicU64,
}

impl SamplingStats {
    /// Create new stats with all counters at zero
    pub const fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            sampled: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn record(&self, decision: &SamplingDecision) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if decision.was_sampled {
            self.sampled.fetch_add(1, Ordering::Relaxed);
            if !decision.should_log {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sampled(&self) -> u64 {
        self.sampled.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Share of sampled decisions that dropped the record
    ///
    /// Returns 0.0 if nothing has been sampled yet.
    pub fn drop_rate(&self) -> f64 {
        let sampled = self.sampled();
        if sampled == 0 {
            0.0
        } else {
            self.dropped() as f64 / sampled as f64
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.total.store(0, Ordering::Relaxed);
        self.sampled.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
    }
}

impl Default for SamplingStats {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SamplingStats {
    /// Create a snapshot of the current counter values
    fn clone(&self) -> Self {
        Self {
            total: AtomicU64::new(self.total()),
            sampled: AtomicU64::new(self.sampled()),
            dropped: AtomicU64::new(self.dropped()),
        }
    }
}
