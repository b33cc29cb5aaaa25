//! Collaborator traits
//!
//! The batch core never talks to a database or a mail server directly; the
//! host wires these traits to concrete implementations.

use crate::error::AppError;
use crate::models::{Alert, CleanedCdrRecord};
use async_trait::async_trait;

/// Destination for cleaned records
#[async_trait]
pub trait CdrSink: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Store a batch of cleaned records
    ///
    /// Returns the number of records actually written. Sinks that
    /// deduplicate may return fewer than `records.len()`.
    async fn store(&self, batch_id: &str, records: &[CleanedCdrRecord]) -> Result<u64, AppError>;
}

/// Notification collaborator for batch alerts
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    /// Deliver an alert
    async fn notify(&self, alert: &Alert) -> Result<(), AppError>;
}
