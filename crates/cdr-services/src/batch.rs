//! Batch runner
//!
//! One batch is one source file (or one explicit record stream). The runner
//! owns the batch's [`StatsAccumulator`], drives the [`RecordProcessor`]
//! over every row, keeps the invalid-phone alert pool and hands the result to
//! the [`BatchReporter`]. A row that fails is logged and dropped; nothing
//! aborts the batch.

use cdr_core::{
    config::{ProcessingConfig, Verbosity},
    models::{ClassificationOutcome, CleanedCdrRecord, RawCdrRecord},
    traits::{AlertNotifier, CdrSink},
    AppResult,
};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::processor::RecordProcessor;
use crate::reporter::{AlertPolicy, BatchReport, BatchReporter};
use crate::stats::{BatchStatistics, StatsAccumulator};

/// Everything one batch produced
#[derive(Debug)]
pub struct BatchOutcome {
    /// Time-ordered identifier, used by sinks to group records
    pub batch_id: String,
    pub label: String,
    /// Rows read from the feed, including dropped ones
    pub batch_size: usize,
    pub records: Vec<CleanedCdrRecord>,
    pub dropped: u64,
    /// ANI/DNIS values that classified as invalid, formatted for humans
    pub invalid_phone_samples: Vec<String>,
    pub statistics: BatchStatistics,
    pub report: BatchReport,
}

/// Drives one batch from raw rows to report
#[derive(Debug, Clone)]
pub struct BatchRunner {
    processor: RecordProcessor,
    reporter: BatchReporter,
}

impl BatchRunner {
    pub fn new(processor: RecordProcessor, reporter: BatchReporter) -> Self {
        Self {
            processor,
            reporter,
        }
    }

    /// Build a runner from the processing section of the configuration
    pub fn from_config(config: &ProcessingConfig) -> AppResult<Self> {
        let processor = RecordProcessor::from_zone_name(&config.source_timezone)?;
        let reporter = BatchReporter::new(AlertPolicy::new(
            config.alert_min_threshold,
            config.alert_ratio,
        ));
        Ok(Self::new(processor, reporter))
    }

    /// Process one batch
    ///
    /// `rows` yields one item per source row; feed-level failures arrive as
    /// `Err` and are dropped like processing failures.
    pub fn run<I>(&self, label: &str, rows: I, verbosity: Verbosity) -> BatchOutcome
    where
        I: IntoIterator<Item = AppResult<RawCdrRecord>>,
    {
        let batch_id = Uuid::now_v7().to_string();
        info!("Starting batch {} ({})", label, batch_id);

        let mut stats = StatsAccumulator::new();
        let mut records = Vec::new();
        let mut invalid_phone_samples = Vec::new();
        let mut batch_size = 0usize;
        let mut dropped = 0u64;

        for (index, row) in rows.into_iter().enumerate() {
            batch_size += 1;

            let processed = row.and_then(|raw| {
                let processed = self.processor.process(&raw, &mut stats)?;
                Ok((raw, processed))
            });

            match processed {
                Ok((raw, processed)) => {
                    if verbosity == Verbosity::Detailed {
                        info!(
                            "Row {}: ANI {:?} -> {}, DNIS {:?} -> {}",
                            index + 1,
                            raw.ani.as_deref().unwrap_or_default(),
                            processed.ani,
                            raw.dnis.as_deref().unwrap_or_default(),
                            processed.dnis
                        );
                    }

                    let pool = &mut invalid_phone_samples;
                    collect_invalid("ANI", raw.ani.as_deref(), &processed.ani, pool);
                    collect_invalid("DNIS", raw.dnis.as_deref(), &processed.dnis, pool);

                    records.push(processed.record);
                }
                Err(e) if e.is_record_scoped() => {
                    dropped += 1;
                    warn!(
                        "Dropping row {} of batch {}: [{}] {}",
                        index + 1,
                        label,
                        e.error_code(),
                        e
                    );
                }
                Err(e) => {
                    dropped += 1;
                    error!(
                        "Row {} of batch {} unreadable: [{}] {}",
                        index + 1,
                        label,
                        e.error_code(),
                        e
                    );
                }
            }
        }

        let statistics = stats.finish();
        if !statistics.is_consistent() {
            error!(
                "Batch {} statistics do not add up: {} processed",
                label, statistics.total_processed
            );
        }
        let report = self
            .reporter
            .summarize(label, &statistics, &invalid_phone_samples, batch_size);

        log_report(&report, records.len(), dropped, verbosity);

        BatchOutcome {
            batch_id,
            label: label.to_string(),
            batch_size,
            records,
            dropped,
            invalid_phone_samples,
            statistics,
            report,
        }
    }
}

fn collect_invalid(
    field: &str,
    raw: Option<&str>,
    outcome: &ClassificationOutcome,
    pool: &mut Vec<String>,
) {
    if let ClassificationOutcome::Invalid(reason) = outcome {
        pool.push(format!(
            "{} \"{}\" ({})",
            field,
            raw.unwrap_or_default(),
            reason
        ));
    }
}

fn log_report(report: &BatchReport, kept: usize, dropped: u64, verbosity: Verbosity) {
    let summary = &report.summary;

    info!(
        "Batch {} finished: {} records kept, {} dropped, {} phone values ({} valid, {} invalid)",
        summary.batch_label,
        kept,
        dropped,
        summary.total_processed,
        summary.ten_digit.count + summary.service_numbers.count,
        summary.invalid.count
    );

    if verbosity != Verbosity::Quiet {
        info!("\n{}", summary.render());
    }

    for warning in &report.warnings {
        warn!("Batch {}: {}", summary.batch_label, warning);
    }

    if report.has_alert() {
        warn!(
            "Batch {}: {} invalid phone values reached the alert threshold of {}",
            summary.batch_label, summary.invalid_phone_count, summary.alert_threshold
        );
    }
}

/// Result of handing one batch to its collaborators
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryResult {
    /// Records written per sink, in sink order
    pub stored: Vec<(String, u64)>,
    pub alert_sent: bool,
}

/// Send a finished batch to every sink and, if it fired, its alert to the notifier
///
/// A failing sink stops delivery and is returned as an error. A failing
/// notifier is logged and reported as `alert_sent = false`.
#[instrument(skip_all, fields(batch = %outcome.label))]
pub async fn deliver(
    outcome: &BatchOutcome,
    sinks: &[Arc<dyn CdrSink>],
    notifier: &dyn AlertNotifier,
) -> AppResult<DeliveryResult> {
    let mut result = DeliveryResult::default();

    for sink in sinks {
        let stored = sink
            .store(&outcome.batch_id, &outcome.records)
            .await
            .map_err(|e| {
                error!("Sink {} failed for batch {}: {}", sink.name(), outcome.label, e);
                e
            })?;

        info!(
            "Sink {} stored {} of {} records",
            sink.name(),
            stored,
            outcome.records.len()
        );
        result.stored.push((sink.name().to_string(), stored));
    }

    if let Some(alert) = &outcome.report.alert {
        match notifier.notify(alert).await {
            Ok(()) => result.alert_sent = true,
            Err(e) => error!("Alert for batch {} not delivered: {}", outcome.label, e),
        }
    }

    Ok(result)
}
