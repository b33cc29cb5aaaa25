//! Record processor
//!
//! Turns one [`RawCdrRecord`] into a [`CleanedCdrRecord`]:
//! - parses and shifts the start time to the source region's wall clock
//! - classifies ANI and DNIS and records both outcomes
//! - parses duration and price, falling back to zero
//!
//! Phone values that do not classify as valid become `None`; the record is
//! kept. Only transformation failures (see [`RecordProcessor::process`])
//! drop a row.

use cdr_core::{
    models::{ClassificationOutcome, CleanedCdrRecord, RawCdrRecord},
    AppError, AppResult,
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::classifier::classify;
use crate::constants::{DST_UTC_OFFSET_HOURS, STANDARD_UTC_OFFSET_HOURS};
use crate::stats::StatsAccumulator;

/// Naive timestamp layouts accepted after RFC 3339 / RFC 2822, read as UTC
const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Output of processing one row
///
/// The outcomes are returned next to the record so the batch loop can build
/// the invalid-phone alert pool without classifying twice.
#[derive(Debug, Clone)]
pub struct ProcessedRecord {
    pub record: CleanedCdrRecord,
    pub ani: ClassificationOutcome,
    pub dnis: ClassificationOutcome,
}

/// Per-row transformation
#[derive(Debug, Clone)]
pub struct RecordProcessor {
    source_tz: Tz,
}

impl RecordProcessor {
    /// Create a processor for CDRs produced in `source_tz`
    pub fn new(source_tz: Tz) -> Self {
        Self { source_tz }
    }

    /// Create a processor from an IANA zone name
    pub fn from_zone_name(name: &str) -> AppResult<Self> {
        let tz = Tz::from_str(name)
            .map_err(|e| AppError::Config(format!("Unknown source timezone {}: {}", name, e)))?;
        Ok(Self::new(tz))
    }

    /// Process one raw row
    ///
    /// # Errors
    ///
    /// Returns `AppError::TimestampOutOfRange` when shifting the start time
    /// leaves chrono's representable range. Nothing is recorded into
    /// `stats` for a failed row.
    pub fn process(
        &self,
        raw: &RawCdrRecord,
        stats: &mut StatsAccumulator,
    ) -> AppResult<ProcessedRecord> {
        let start_time = match raw.start_time.as_deref().and_then(parse_start_time) {
            Some(instant) => Some(self.adjust_to_source_clock(instant)?),
            None => None,
        };

        let ani = classify(raw.ani.as_deref());
        let dnis = classify(raw.dnis.as_deref());
        stats.record(&ani, raw.ani.as_deref().unwrap_or_default());
        stats.record(&dnis, raw.dnis.as_deref().unwrap_or_default());

        let record = CleanedCdrRecord {
            start_time,
            bill_duration: parse_bill_duration(raw.bill_duration.as_deref()),
            call_price: parse_call_price(raw.call_price.as_deref()),
            ani: ani.normalized(),
            dnis: dnis.normalized(),
            customer_ip: raw.customer_ip.clone().unwrap_or_default(),
            call_type: raw.call_type.clone().unwrap_or_default(),
            lrn: raw.lrn.clone().unwrap_or_default(),
        };

        Ok(ProcessedRecord { record, ani, dnis })
    }

    /// Whether `instant` falls in the source region's daylight-saving period
    ///
    /// Compares the zone's UTC offset at `instant` with its offset at
    /// midnight UTC on January 1 of the same year. Instants within a few
    /// hours of a transition can land on the wrong side of it.
    pub fn is_daylight_saving(&self, instant: DateTime<Utc>) -> bool {
        let offset_at = self.utc_offset_seconds(instant.naive_utc());
        let january_first = NaiveDate::from_ymd_opt(instant.year(), 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0));

        match january_first {
            Some(jan) => offset_at != self.utc_offset_seconds(jan),
            None => false,
        }
    }

    /// Shift a UTC instant by -7h (daylight saving) or -8h (standard time)
    pub fn adjust_to_source_clock(&self, instant: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
        let hours = if self.is_daylight_saving(instant) {
            DST_UTC_OFFSET_HOURS
        } else {
            STANDARD_UTC_OFFSET_HOURS
        };

        instant
            .checked_sub_signed(Duration::hours(hours))
            .ok_or_else(|| {
                AppError::TimestampOutOfRange(format!("{} minus {} hours", instant, hours))
            })
    }

    fn utc_offset_seconds(&self, utc: NaiveDateTime) -> i32 {
        self.source_tz
            .offset_from_utc_datetime(&utc)
            .fix()
            .local_minus_utc()
    }
}

/// Parse a free-form start time as an absolute instant
///
/// Strings with an explicit offset keep it; naive strings are read as UTC.
pub fn parse_start_time(raw: &str) -> Option<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Billed seconds, `0` when absent, unparseable or negative
///
/// Fractional values are truncated.
pub fn parse_bill_duration(raw: Option<&str>) -> i64 {
    let value = match raw.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => return 0,
    };

    value
        .parse::<i64>()
        .ok()
        .or_else(|| {
            Decimal::from_str(value)
                .ok()
                .and_then(|d| d.trunc().to_i64())
        })
        .filter(|secs| *secs >= 0)
        .unwrap_or(0)
}

/// Call price, `0` when absent, unparseable or negative
pub fn parse_call_price(raw: Option<&str>) -> Decimal {
    let value = match raw.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => return Decimal::ZERO,
    };

    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
        .filter(|price| !price.is_sign_negative())
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdr_core::models::{InvalidReason, ServiceCode};
    use rust_decimal_macros::dec;

    fn pacific() -> RecordProcessor {
        RecordProcessor::new(chrono_tz::America::Los_Angeles)
    }

    fn raw(start: &str, ani: &str, dnis: &str, duration: &str, price: &str) -> RawCdrRecord {
        RawCdrRecord {
            start_time: Some(start.to_string()),
            bill_duration: Some(duration.to_string()),
            call_price: Some(price.to_string()),
            ani: Some(ani.to_string()),
            dnis: Some(dnis.to_string()),
            customer_ip: Some("10.0.0.1".to_string()),
            call_type: Some("LD".to_string()),
            lrn: Some("5550000000".to_string()),
        }
    }

    #[test]
    fn test_end_to_end_record() {
        let processor = pacific();
        let mut stats = StatsAccumulator::new();

        let processed = processor
            .process(
                &raw("2025-01-13T10:00:00Z", "(555) 123-4567", "911", "60", "0.05"),
                &mut stats,
            )
            .unwrap();

        let record = processed.record;
        assert_eq!(record.ani.as_deref(), Some("5551234567"));
        assert_eq!(record.dnis.as_deref(), Some("911"));
        assert_eq!(record.bill_duration, 60);
        assert_eq!(record.call_price, dec!(0.05));
        // January is standard time: -8h
        assert_eq!(
            record.start_time,
            Some(Utc.with_ymd_and_hms(2025, 1, 13, 2, 0, 0).unwrap())
        );
        assert_eq!(record.customer_ip, "10.0.0.1");
        assert_eq!(record.lrn, "5550000000");

        assert_eq!(
            processed.dnis,
            ClassificationOutcome::ServiceNumber(ServiceCode::Emergency)
        );

        let stats = stats.finish();
        assert_eq!(stats.service_number_count, 1);
        assert_eq!(stats.ten_digit_count, 1);
        assert_eq!(stats.invalid_count, 0);
    }

    #[test]
    fn test_summer_timestamp_uses_dst_offset() {
        let processor = pacific();
        let instant = Utc.with_ymd_and_hms(2025, 7, 4, 18, 30, 0).unwrap();

        assert!(processor.is_daylight_saving(instant));
        assert_eq!(
            processor.adjust_to_source_clock(instant).unwrap(),
            Utc.with_ymd_and_hms(2025, 7, 4, 11, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_winter_timestamp_uses_standard_offset() {
        let processor = pacific();
        let instant = Utc.with_ymd_and_hms(2025, 12, 1, 8, 0, 0).unwrap();
        assert!(!processor.is_daylight_saving(instant));
        assert_eq!(
            processor.adjust_to_source_clock(instant).unwrap(),
            Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_offset_switches_at_spring_forward() {
        // Los Angeles springs forward at 2025-03-09 10:00 UTC
        let processor = pacific();
        let before = Utc.with_ymd_and_hms(2025, 3, 9, 9, 30, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 3, 9, 10, 30, 0).unwrap();

        assert!(!processor.is_daylight_saving(before));
        assert_eq!(
            processor.adjust_to_source_clock(before).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 9, 1, 30, 0).unwrap()
        );

        assert!(processor.is_daylight_saving(after));
        assert_eq!(
            processor.adjust_to_source_clock(after).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 9, 3, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_offset_switches_at_fall_back() {
        // Los Angeles falls back at 2025-11-02 09:00 UTC; both sides read 01:30
        let processor = pacific();
        let before = Utc.with_ymd_and_hms(2025, 11, 2, 8, 30, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 11, 2, 9, 30, 0).unwrap();

        assert!(processor.is_daylight_saving(before));
        assert!(!processor.is_daylight_saving(after));
        assert_eq!(
            processor.adjust_to_source_clock(before).unwrap(),
            processor.adjust_to_source_clock(after).unwrap()
        );
    }

    #[test]
    fn test_zone_without_dst_is_always_standard() {
        let processor = RecordProcessor::new(chrono_tz::America::Phoenix);
        let summer = Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap();
        assert!(!processor.is_daylight_saving(summer));
    }

    #[test]
    fn test_unknown_zone_name() {
        let err = RecordProcessor::from_zone_name("Mars/Olympus_Mons").unwrap_err();
        assert_eq!(err.error_code(), "config_error");
        assert!(RecordProcessor::from_zone_name("America/Los_Angeles").is_ok());
    }

    #[test]
    fn test_invalid_phone_keeps_record() {
        let processor = pacific();
        let mut stats = StatsAccumulator::new();

        let processed = processor
            .process(&raw("garbage", "123", "", "abc", "-1.50"), &mut stats)
            .unwrap();

        assert!(processed.record.ani.is_none());
        assert!(processed.record.dnis.is_none());
        assert!(processed.record.start_time.is_none());
        assert_eq!(processed.record.bill_duration, 0);
        assert_eq!(processed.record.call_price, Decimal::ZERO);
        assert_eq!(
            processed.ani,
            ClassificationOutcome::Invalid(InvalidReason::ShortCode)
        );

        let stats = stats.statistics();
        assert_eq!(stats.invalid_count, 2);
        assert!(stats.is_consistent());
    }

    #[test]
    fn test_missing_fields_default() {
        let processor = pacific();
        let mut stats = StatsAccumulator::new();

        let processed = processor
            .process(&RawCdrRecord::default(), &mut stats)
            .unwrap();

        assert_eq!(processed.record, CleanedCdrRecord::default());
        assert_eq!(stats.statistics().total_processed, 2);
    }

    #[test]
    fn test_timestamp_overflow_is_record_scoped() {
        let processor = pacific();

        let err = processor
            .adjust_to_source_clock(DateTime::<Utc>::MIN_UTC)
            .unwrap_err();

        assert!(err.is_record_scoped());
        assert_eq!(err.error_code(), "timestamp_out_of_range");
    }

    #[test]
    fn test_parse_start_time_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 5, 14, 7, 9).unwrap();

        assert_eq!(parse_start_time("2025-03-05T14:07:09Z"), Some(expected));
        assert_eq!(parse_start_time("2025-03-05T09:07:09-05:00"), Some(expected));
        assert_eq!(parse_start_time("2025-03-05 14:07:09"), Some(expected));
        assert_eq!(parse_start_time("2025-03-05 14:07:09.000"), Some(expected));
        assert_eq!(parse_start_time("03/05/2025 14:07:09"), Some(expected));
        assert_eq!(
            parse_start_time("2025-03-05"),
            Some(Utc.with_ymd_and_hms(2025, 3, 5, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_start_time(""), None);
        assert_eq!(parse_start_time("not a date"), None);
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_bill_duration(Some("60")), 60);
        assert_eq!(parse_bill_duration(Some(" 61.9 ")), 61);
        assert_eq!(parse_bill_duration(Some("-5")), 0);
        assert_eq!(parse_bill_duration(Some("1m")), 0);
        assert_eq!(parse_bill_duration(None), 0);

        assert_eq!(parse_call_price(Some("0.05")), dec!(0.05));
        assert_eq!(parse_call_price(Some("1e-2")), dec!(0.01));
        assert_eq!(parse_call_price(Some("free")), Decimal::ZERO);
        assert_eq!(parse_call_price(Some("-0.10")), Decimal::ZERO);
        assert_eq!(parse_call_price(Some("")), Decimal::ZERO);
    }
}
