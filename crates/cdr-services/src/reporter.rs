//! Batch reporter
//!
//! Inspects the finished [`BatchStatistics`] of one batch and produces:
//! - a summary for the logs
//! - an optional alert payload when too many phone values were invalid
//! - informational quality warnings
//!
//! The reporter never delivers anything; the host hands the alert to an
//! [`AlertNotifier`](cdr_core::traits::AlertNotifier).

use cdr_core::models::{Alert, InvalidReason, ServiceCode};
use serde::Serialize;
use std::fmt::{self, Write as _};
use std::time::Duration;

use crate::constants::{
    ALERT_MIN_THRESHOLD, ALERT_RATIO, DIVERSITY_WARNING_RATIO, MAX_INVALID_SAMPLES,
    SUCCESS_RATE_WARNING_PERCENT, SUMMARY_SAMPLE_LIMIT,
};
use crate::stats::{BatchStatistics, InvalidSample};

/// Alert decision rule: `max(min_threshold, floor(batch_size * ratio))`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertPolicy {
    pub min_threshold: usize,
    pub ratio: f64,
}

impl AlertPolicy {
    pub fn new(min_threshold: usize, ratio: f64) -> Self {
        Self {
            min_threshold,
            ratio,
        }
    }

    /// Number of invalid phone values at which an alert fires
    pub fn threshold(&self, batch_size: usize) -> usize {
        let proportional = (batch_size as f64 * self.ratio).floor() as usize;
        self.min_threshold.max(proportional)
    }

    pub fn should_alert(&self, invalid_phone_count: usize, batch_size: usize) -> bool {
        invalid_phone_count >= self.threshold(batch_size)
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self::new(ALERT_MIN_THRESHOLD, ALERT_RATIO)
    }
}

/// Count plus share of `total_processed`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Share {
    pub count: u64,
    pub percent: f64,
}

impl Share {
    fn of(count: u64, total: u64) -> Self {
        Self {
            count,
            percent: percent(count, total),
        }
    }
}

impl fmt::Display for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1}%)", self.count, self.percent)
    }
}

/// Informational data-quality warning (logged, never alerted)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum QualityWarning {
    LowSuccessRate { success_percent: f64 },
    LowDiversity { unique: usize, total: u64 },
}

impl fmt::Display for QualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowSuccessRate { success_percent } => write!(
                f,
                "Low success rate: {:.1}% of phone values were valid (expected at least {:.0}%)",
                success_percent, SUCCESS_RATE_WARNING_PERCENT
            ),
            Self::LowDiversity { unique, total } => write!(
                f,
                "Low number diversity: {} unique numbers across {} phone values",
                unique, total
            ),
        }
    }
}

/// End-of-batch summary
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub batch_label: String,
    pub batch_size: usize,
    pub total_processed: u64,
    pub ten_digit: Share,
    pub service_numbers: Share,
    pub invalid: Share,
    pub service_breakdown: Vec<(ServiceCode, u64)>,
    pub invalid_breakdown: Vec<(InvalidReason, Share)>,
    /// First few rejected values
    pub samples: Vec<InvalidSample>,
    pub elapsed_ms: u64,
    pub throughput_per_sec: f64,
    pub unique_numbers: usize,
    pub diversity_ratio: f64,
    pub success_percent: f64,
    /// Size of the invalid-phone alert pool
    pub invalid_phone_count: usize,
    pub alert_threshold: usize,
}

impl BatchSummary {
    /// Multi-line text rendering used in logs and alert bodies
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Batch {} ({} records)", self.batch_label, self.batch_size);
        let _ = writeln!(out, "Phone values processed: {}", self.total_processed);
        let _ = writeln!(out, "  Ten-digit numbers: {}", self.ten_digit);
        let _ = writeln!(out, "  Service numbers:   {}", self.service_numbers);
        let _ = writeln!(out, "  Invalid:           {}", self.invalid);

        if self.service_numbers.count > 0 {
            let _ = writeln!(out, "Service numbers:");
            for (code, count) in self.service_breakdown.iter().filter(|(_, c)| *c > 0) {
                let _ = writeln!(out, "  {} ({}): {}", code, code.description(), count);
            }
        }

        if self.invalid.count > 0 {
            let _ = writeln!(out, "Invalid categories:");
            for (reason, share) in self.invalid_breakdown.iter().filter(|(_, s)| s.count > 0) {
                let _ = writeln!(out, "  {}: {}", reason.description(), share);
            }
        }

        if !self.samples.is_empty() {
            let _ = writeln!(out, "Sample invalid values:");
            for sample in &self.samples {
                let _ = writeln!(out, "  {}", sample);
            }
        }

        let _ = writeln!(
            out,
            "Throughput: {:.0} numbers/sec over {} ms",
            self.throughput_per_sec, self.elapsed_ms
        );
        let _ = write!(
            out,
            "Unique numbers: {} (diversity {:.1}%)",
            self.unique_numbers,
            self.diversity_ratio * 100.0
        );
        out
    }
}

/// Everything the reporter derives from one batch
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub alert: Option<Alert>,
    pub warnings: Vec<QualityWarning>,
}

impl BatchReport {
    pub fn has_alert(&self) -> bool {
        self.alert.is_some()
    }
}

/// Batch reporter
#[derive(Debug, Clone, Default)]
pub struct BatchReporter {
    policy: AlertPolicy,
}

impl BatchReporter {
    pub fn new(policy: AlertPolicy) -> Self {
        Self { policy }
    }

    /// Summarize a finished batch
    ///
    /// `invalid_phone_samples` is the alert pool: every ANI/DNIS value that
    /// classified as invalid. Service numbers never appear in it, so the
    /// decision is made against its length and not `stats.invalid_count`.
    pub fn summarize(
        &self,
        batch_label: &str,
        stats: &BatchStatistics,
        invalid_phone_samples: &[String],
        batch_size: usize,
    ) -> BatchReport {
        let summary = self.build_summary(
            batch_label,
            stats,
            stats.elapsed(),
            invalid_phone_samples.len(),
            batch_size,
        );
        let warnings = Self::quality_warnings(&summary);

        let alert = if self
            .policy
            .should_alert(invalid_phone_samples.len(), batch_size)
        {
            Some(Self::render_alert(&summary, stats, invalid_phone_samples))
        } else {
            None
        };

        BatchReport {
            summary,
            alert,
            warnings,
        }
    }

    fn build_summary(
        &self,
        batch_label: &str,
        stats: &BatchStatistics,
        elapsed: Duration,
        invalid_phone_count: usize,
        batch_size: usize,
    ) -> BatchSummary {
        let total = stats.total_processed;
        let secs = elapsed.as_secs_f64();
        let throughput_per_sec = if secs > 0.0 { total as f64 / secs } else { 0.0 };
        let unique_numbers = stats.unique_numbers.len();
        let diversity_ratio = if total > 0 {
            unique_numbers as f64 / total as f64
        } else {
            0.0
        };

        BatchSummary {
            batch_label: batch_label.to_string(),
            batch_size,
            total_processed: total,
            ten_digit: Share::of(stats.ten_digit_count, total),
            service_numbers: Share::of(stats.service_number_count, total),
            invalid: Share::of(stats.invalid_count, total),
            service_breakdown: stats
                .service_breakdown
                .iter()
                .map(|(code, count)| (*code, *count))
                .collect(),
            invalid_breakdown: stats
                .invalid_breakdown
                .iter()
                .map(|(reason, count)| (*reason, Share::of(*count, stats.invalid_count)))
                .collect(),
            samples: stats
                .invalid_samples
                .iter()
                .take(SUMMARY_SAMPLE_LIMIT)
                .cloned()
                .collect(),
            elapsed_ms: elapsed.as_millis() as u64,
            throughput_per_sec,
            unique_numbers,
            diversity_ratio,
            success_percent: percent(stats.valid_count(), total),
            invalid_phone_count,
            alert_threshold: self.policy.threshold(batch_size),
        }
    }

    /// Success rate under 95% and diversity under 10% of total processed
    ///
    /// Empty batches produce no warnings.
    fn quality_warnings(summary: &BatchSummary) -> Vec<QualityWarning> {
        let mut warnings = Vec::new();
        if summary.total_processed == 0 {
            return warnings;
        }

        if summary.success_percent < SUCCESS_RATE_WARNING_PERCENT {
            warnings.push(QualityWarning::LowSuccessRate {
                success_percent: summary.success_percent,
            });
        }
        if summary.diversity_ratio < DIVERSITY_WARNING_RATIO {
            warnings.push(QualityWarning::LowDiversity {
                unique: summary.unique_numbers,
                total: summary.total_processed,
            });
        }
        warnings
    }

    fn render_alert(
        summary: &BatchSummary,
        stats: &BatchStatistics,
        invalid_phone_samples: &[String],
    ) -> Alert {
        let subject = format!(
            "CDR alert: {} invalid phone numbers in {} (threshold {})",
            invalid_phone_samples.len(),
            summary.batch_label,
            summary.alert_threshold
        );

        let mut body = String::new();
        let _ = writeln!(
            body,
            "{} invalid ANI/DNIS values across {} records.",
            invalid_phone_samples.len(),
            summary.batch_size
        );
        let _ = writeln!(body);
        let _ = writeln!(body, "{}", summary.render());
        let _ = writeln!(body);

        let _ = writeln!(body, "Invalid categories:");
        for reason in InvalidReason::ALL {
            let count = stats.invalid_breakdown.get(&reason).copied().unwrap_or(0);
            let _ = writeln!(body, "  {:<22} {:>6}  {}", reason.as_str(), count, reason.description());
        }
        let _ = writeln!(body);

        let _ = writeln!(body, "Sample invalid values ({}):", stats.invalid_samples.len());
        for sample in &stats.invalid_samples {
            let _ = writeln!(body, "  {}", sample);
        }
        let _ = writeln!(body);

        let shown = invalid_phone_samples.len().min(MAX_INVALID_SAMPLES);
        let _ = writeln!(
            body,
            "Invalid phone values (first {} of {}):",
            shown,
            invalid_phone_samples.len()
        );
        for value in invalid_phone_samples.iter().take(shown) {
            let _ = writeln!(body, "  {}", value);
        }

        Alert::new(subject, body)
    }
}

fn percent(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}
