//! Alert notifiers
//!
//! `LogNotifier` writes the alert to the tracing output; `FileNotifier`
//! drops it as a text file for whatever mail/webhook relay watches the
//! directory.

use async_trait::async_trait;
use cdr_core::{models::Alert, traits::AlertNotifier, AppError, AppResult};
use chrono::Utc;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

/// Logs alerts at warn level
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl AlertNotifier for LogNotifier {
    async fn notify(&self, alert: &Alert) -> AppResult<()> {
        warn!("ALERT: {}\n{}", alert.subject, alert.body);
        Ok(())
    }
}

/// Writes each alert to `<dir>/alert_<timestamp>.txt`
#[derive(Debug, Clone)]
pub struct FileNotifier {
    dir: PathBuf,
}

impl FileNotifier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn alert_path(&self) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
        self.dir.join(format!("alert_{}.txt", stamp))
    }
}

#[async_trait]
impl AlertNotifier for FileNotifier {
    #[instrument(skip(self, alert), fields(dir = %self.dir.display()))]
    async fn notify(&self, alert: &Alert) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            AppError::Notification(format!(
                "Failed to create alert directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let path = self.alert_path();
        let contents = format!("Subject: {}\n\n{}", alert.subject, alert.body);

        tokio::fs::write(&path, contents).await.map_err(|e| {
            AppError::Notification(format!("Failed to write {}: {}", path.display(), e))
        })?;

        info!("Alert written to {}", path.display());
        Ok(())
    }
}
