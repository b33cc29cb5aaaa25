//! Unified error handling for CDR ingest
//!
//! Phone-number classification never produces errors; everything here is
//! either a per-record failure (the record is dropped) or a host-level
//! failure raised by a collaborator.

use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Database Errors ====================
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    // ==================== Feed Errors ====================
    #[error("I/O error: {0}")]
    Io(String),

    #[error("CSV parse error: {0}")]
    Csv(String),

    #[error("Input directory not found: {0}")]
    InputDirNotFound(String),

    // ==================== Record Errors ====================
    #[error("Invalid record at row {row}: {reason}")]
    InvalidRecord { row: u64, reason: String },

    #[error("Timestamp out of range: {0}")]
    TimestampOutOfRange(String),

    // ==================== Notification Errors ====================
    #[error("Notification failed: {0}")]
    Notification(String),

    // ==================== Host Errors ====================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Returns the stable error code used in logs
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Pool(_) => "pool_error",
            AppError::Io(_) => "io_error",
            AppError::Csv(_) => "csv_error",
            AppError::InputDirNotFound(_) => "input_dir_not_found",
            AppError::InvalidRecord { .. } => "invalid_record",
            AppError::TimestampOutOfRange(_) => "timestamp_out_of_range",
            AppError::Notification(_) => "notification_error",
            AppError::Config(_) => "config_error",
            AppError::Serialization(_) => "serialization_error",
        }
    }

    /// Whether the error only affects a single record
    ///
    /// Record-scoped errors drop the offending row; everything else stops
    /// the current batch at the host.
    pub fn is_record_scoped(&self) -> bool {
        matches!(
            self,
            AppError::InvalidRecord { .. } | AppError::TimestampOutOfRange(_)
        )
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        match err.position() {
            Some(pos) => AppError::InvalidRecord {
                row: pos.line(),
                reason: err.to_string(),
            },
            None => AppError::Csv(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                AppError::Pool(err.to_string())
            }
            other => AppError::Database(other.to_string()),
        }
    }
}
