//! Domain models for CDR ingest
//!
//! This module contains all the core domain models used throughout the pipeline.

pub mod alert;
pub mod cdr;
pub mod classification;

pub use alert::Alert;
pub use cdr::{CleanedCdrRecord, RawCdrRecord};
pub use classification::{ClassificationOutcome, InvalidReason, ServiceCode};
