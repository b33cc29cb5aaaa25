//! CDR Ingest Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the CDR ingest pipeline. It includes:
//!
//! - Domain models (raw and cleaned CDRs, classification outcomes)
//! - Collaborator traits for record sinks and alert notifiers
//! - Unified error handling with stable error codes
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use config::AppConfig;
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
