//! CDR Ingest
//!
//! Reads the provider's daily CDR files, normalizes and validates ANI/DNIS,
//! shifts call start times to the provider's clock, stores the cleaned
//! records and raises an alert when a file carries too many bad numbers.

mod cli;

use anyhow::{anyhow, Context, Result};
use cdr_core::{
    traits::{AlertNotifier, CdrSink},
    AppConfig,
};
use cdr_db::{create_pool, PgCdrRepository};
use cdr_feed::{archive, discover_files, CdrFileReader};
use cdr_services::{deliver, BatchRunner, FileNotifier, JsonLinesSink, LogNotifier};
use chrono::Local;
use clap::Parser;
use cli::{Cli, Selection};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
fn init_tracing(json: bool) {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "cdr_ingest={},cdr_services={},cdr_feed={},cdr_db={},sqlx=warn",
            log_level, log_level, log_level, log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }
}

/// Output sinks enabled by the configuration
async fn build_sinks(config: &AppConfig) -> Result<Vec<Arc<dyn CdrSink>>> {
    let mut sinks: Vec<Arc<dyn CdrSink>> = Vec::new();

    if let Some(db) = &config.database {
        info!("Connecting to database...");
        let pool = create_pool(&db.url, db.max_connections)
            .await
            .context("Failed to create database pool")?;

        let repo = PgCdrRepository::new(pool);
        repo.ensure_schema()
            .await
            .context("Failed to prepare cdr_records table")?;
        sinks.push(Arc::new(repo));
    }

    if let Some(dir) = &config.output.json_dir {
        info!("Writing cleaned records as JSON Lines to {}", dir.display());
        sinks.push(Arc::new(JsonLinesSink::new(dir)));
    }

    if sinks.is_empty() {
        warn!("No database or output directory configured; cleaned records will not be stored");
    }

    Ok(sinks)
}

/// Files to process, discovering them per date when none were given
fn resolve_files(selection: Selection, config: &AppConfig) -> Result<Vec<PathBuf>> {
    match selection {
        Selection::Files(files) => Ok(files),
        Selection::Dates(dates) => {
            let mut files = Vec::new();
            for date in dates {
                let found =
                    discover_files(&config.feed.input_dir, &config.feed.file_pattern, date)
                        .with_context(|| {
                            format!("Failed to scan {}", config.feed.input_dir.display())
                        })?;

                if found.is_empty() {
                    info!(
                        "No files for {} in {}",
                        date,
                        config.feed.input_dir.display()
                    );
                }
                files.extend(found);
            }
            Ok(files)
        }
    }
}

fn batch_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    info!("Starting cdr-ingest v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::load(),
    }
    .context("Failed to load configuration")?;

    let verbosity = cli.verbosity.unwrap_or(config.processing.verbosity);
    let runner = BatchRunner::from_config(&config.processing)
        .context("Invalid processing configuration")?;
    let reader = CdrFileReader::new(config.delimiter_byte()?);

    let sinks = if cli.dry_run {
        info!("Dry run: records will not be stored and files will not be archived");
        Vec::new()
    } else {
        build_sinks(&config).await?
    };

    let notifier: Box<dyn AlertNotifier> = match (&config.alerts.output_dir, cli.dry_run) {
        (Some(dir), false) => Box::new(FileNotifier::new(dir)),
        _ => Box::new(LogNotifier),
    };

    let selection = cli
        .selection(Local::now().date_naive())
        .map_err(|e| anyhow!(e))?;
    let files = resolve_files(selection, &config)?;

    let mut failed = 0usize;

    for path in &files {
        let label = batch_label(path);

        let rows = match reader.open(path) {
            Ok(rows) => rows,
            Err(e) => {
                error!("Skipping {}: {}", path.display(), e);
                failed += 1;
                continue;
            }
        };

        let outcome = runner.run(&label, rows, verbosity);

        if let Err(e) = deliver(&outcome, &sinks, notifier.as_ref()).await {
            error!("Batch {} not delivered: [{}] {}", label, e.error_code(), e);
            failed += 1;
            continue;
        }

        if let (Some(dir), false) = (&config.feed.archive_dir, cli.dry_run) {
            if let Err(e) = archive(path, dir) {
                error!("Failed to archive {}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    info!("Processed {} file(s), {} with errors", files.len(), failed);

    if failed > 0 {
        return Err(anyhow!("{} of {} file(s) failed", failed, files.len()));
    }

    Ok(())
}
