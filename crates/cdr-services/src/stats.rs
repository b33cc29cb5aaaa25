//! Per-batch classification statistics
//!
//! One [`StatsAccumulator`] belongs to exactly one batch loop and is passed
//! around as `&mut`. Concurrent batches each own their own accumulator.

use cdr_core::models::{ClassificationOutcome, InvalidReason, ServiceCode};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::time::{Duration, Instant};

use crate::constants::MAX_INVALID_SAMPLES;

/// One rejected raw value kept for the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidSample {
    pub raw: String,
    pub reason: InvalidReason,
}

impl fmt::Display for InvalidSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" -> {}", self.raw, self.reason.description())
    }
}

/// Aggregated counts for one batch
#[derive(Debug, Clone)]
pub struct BatchStatistics {
    pub total_processed: u64,
    pub ten_digit_count: u64,
    pub service_number_count: u64,
    pub invalid_count: u64,
    /// Every service code is present, zero when unseen
    pub service_breakdown: BTreeMap<ServiceCode, u64>,
    /// Every invalid reason is present, zero when unseen
    pub invalid_breakdown: BTreeMap<InvalidReason, u64>,
    /// First rejected values, at most `MAX_INVALID_SAMPLES`
    pub invalid_samples: Vec<InvalidSample>,
    pub unique_numbers: HashSet<String>,
    pub started_at: DateTime<Utc>,
    started: Instant,
}

impl BatchStatistics {
    fn new() -> Self {
        Self {
            total_processed: 0,
            ten_digit_count: 0,
            service_number_count: 0,
            invalid_count: 0,
            service_breakdown: ServiceCode::ALL.iter().map(|c| (*c, 0)).collect(),
            invalid_breakdown: InvalidReason::ALL.iter().map(|r| (*r, 0)).collect(),
            invalid_samples: Vec::new(),
            unique_numbers: HashSet::new(),
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    /// Valid outcomes (service numbers plus ten-digit numbers)
    pub fn valid_count(&self) -> u64 {
        self.ten_digit_count + self.service_number_count
    }

    /// Wall-clock time since the batch started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Check `total_processed` against the three buckets
    pub fn is_consistent(&self) -> bool {
        self.total_processed == self.ten_digit_count + self.service_number_count + self.invalid_count
    }
}

/// Mutable accumulator fed with every classification of a batch
#[derive(Debug)]
pub struct StatsAccumulator {
    stats: BatchStatistics,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self {
            stats: BatchStatistics::new(),
        }
    }

    /// Record one classification outcome
    pub fn record(&mut self, outcome: &ClassificationOutcome, raw_input: &str) {
        let stats = &mut self.stats;
        stats.total_processed += 1;

        match outcome {
            ClassificationOutcome::ServiceNumber(code) => {
                stats.service_number_count += 1;
                *stats.service_breakdown.entry(*code).or_insert(0) += 1;
                stats.unique_numbers.insert(code.as_str().to_string());
            }
            ClassificationOutcome::TenDigit(number) => {
                stats.ten_digit_count += 1;
                if !stats.unique_numbers.contains(number) {
                    stats.unique_numbers.insert(number.clone());
                }
            }
            ClassificationOutcome::Invalid(reason) => {
                stats.invalid_count += 1;
                *stats.invalid_breakdown.entry(*reason).or_insert(0) += 1;
                if stats.invalid_samples.len() < MAX_INVALID_SAMPLES {
                    stats.invalid_samples.push(InvalidSample {
                        raw: raw_input.to_string(),
                        reason: *reason,
                    });
                }
            }
        }
    }

    /// Read access to the running statistics
    pub fn statistics(&self) -> &BatchStatistics {
        &self.stats
    }

    /// Consume the accumulator at the end of the batch
    pub fn finish(self) -> BatchStatistics {
        self.stats
    }
}

impl Default for StatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
