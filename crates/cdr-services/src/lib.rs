//! Business logic services for CDR ingest
//!
//! This crate contains the decision logic of the pipeline. Everything here is
//! synchronous and free of I/O except the collaborator implementations
//! (`notifier`, `json_sink`) and [`batch::deliver`].
//!
//! # Services
//!
//! - `classifier` - Phone-number classification and normalization
//! - `StatsAccumulator` - Per-batch classification counts
//! - `RecordProcessor` - Raw row to cleaned record transformation
//! - `BatchReporter` - Summary, alert decision and quality warnings
//! - `BatchRunner` - Drives one batch end to end
//! - `LogNotifier` / `FileNotifier` - Alert delivery
//! - `JsonLinesSink` - Cleaned records as JSON Lines

pub mod batch;
pub mod classifier;
pub mod json_sink;
pub mod notifier;
pub mod processor;
pub mod reporter;
pub mod stats;

pub use batch::{deliver, BatchOutcome, BatchRunner, DeliveryResult};
pub use classifier::classify;
pub use json_sink::JsonLinesSink;
pub use notifier::{FileNotifier, LogNotifier};
pub use processor::{ProcessedRecord, RecordProcessor};
pub use reporter::{AlertPolicy, BatchReport, BatchReporter, BatchSummary, QualityWarning};
pub use stats::{BatchStatistics, InvalidSample, StatsAccumulator};

/// Business logic constants
pub mod constants {
    /// Length of a NANP number without country code
    pub const TEN_DIGIT_LEN: usize = 10;

    /// Ten-digit values used by switches as placeholders
    pub const PLACEHOLDER_NUMBERS: [&str; 2] = ["0000000000", "1111111111"];

    /// Maximum invalid samples kept per batch
    pub const MAX_INVALID_SAMPLES: usize = 10;

    /// Invalid samples shown in the batch summary
    pub const SUMMARY_SAMPLE_LIMIT: usize = 5;

    /// Alert floor, in invalid phone values
    pub const ALERT_MIN_THRESHOLD: usize = 5;

    /// Alert threshold as a share of the batch size
    pub const ALERT_RATIO: f64 = 0.10;

    /// Success rate (percent) under which a quality warning is logged
    pub const SUCCESS_RATE_WARNING_PERCENT: f64 = 95.0;

    /// Unique-number share under which a diversity warning is logged
    pub const DIVERSITY_WARNING_RATIO: f64 = 0.10;

    /// Source region offset from UTC during daylight saving (hours, west)
    pub const DST_UTC_OFFSET_HOURS: i64 = 7;

    /// Source region offset from UTC during standard time (hours, west)
    pub const STANDARD_UTC_OFFSET_HOURS: i64 = 8;
}
