//! CDR (Call Detail Record) models
//!
//! `RawCdrRecord` is one row of a provider file exactly as read; a
//! `CleanedCdrRecord` is what gets persisted for billing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raw CDR row from the provider feed
///
/// Every field is free text. A column missing from the file, or an empty
/// cell, is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCdrRecord {
    /// Call start (free-form timestamp)
    pub start_time: Option<String>,

    /// Billed seconds
    pub bill_duration: Option<String>,

    /// Call price
    pub call_price: Option<String>,

    /// Caller number (ANI), any formatting
    pub ani: Option<String>,

    /// Called number (DNIS), any formatting
    pub dnis: Option<String>,

    /// Customer trunk IP
    pub customer_ip: Option<String>,

    /// Provider call type label
    pub call_type: Option<String>,

    /// Location Routing Number, informational only
    pub lrn: Option<String>,
}

impl RawCdrRecord {
    /// Build a record from the ANI/DNIS pair, leaving everything else empty
    pub fn with_numbers(ani: impl Into<String>, dnis: impl Into<String>) -> Self {
        Self {
            ani: Some(ani.into()),
            dnis: Some(dnis.into()),
            ..Default::default()
        }
    }
}

/// Cleaned CDR ready for the persistence collaborator
///
/// Built once per raw row and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedCdrRecord {
    /// Start time shifted to the source region's wall clock, if parseable
    pub start_time: Option<DateTime<Utc>>,

    /// Billed seconds, never negative
    pub bill_duration: i64,

    /// Call price, never negative
    pub call_price: Decimal,

    /// Normalized caller number (None if it did not classify as valid)
    pub ani: Option<String>,

    /// Normalized called number (None if it did not classify as valid)
    pub dnis: Option<String>,

    pub customer_ip: String,

    pub call_type: String,

    pub lrn: String,
}

impl Default for CleanedCdrRecord {
    fn default() -> Self {
        Self {
            start_time: None,
            bill_duration: 0,
            call_price: Decimal::ZERO,
            ani: None,
            dnis: None,
            customer_ip: String::new(),
            call_type: String::new(),
            lrn: String::new(),
        }
    }
}
