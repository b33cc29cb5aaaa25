//! Phone-number classification outcomes
//!
//! Human-readable descriptions live in two static tables keyed by the
//! outcome tag, so every caller renders the same wording.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-digit N11 service codes accepted as valid numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ServiceCode {
    #[serde(rename = "911")]
    Emergency,
    #[serde(rename = "411")]
    DirectoryAssistance,
    #[serde(rename = "511")]
    TrafficInformation,
    #[serde(rename = "611")]
    RepairService,
    #[serde(rename = "711")]
    TelecomRelay,
    #[serde(rename = "811")]
    CallBeforeYouDig,
}

/// Code, dialed digits and description for every service code
const SERVICE_CODES: [(ServiceCode, &str, &str); 6] = [
    (ServiceCode::Emergency, "911", "Emergency services"),
    (ServiceCode::DirectoryAssistance, "411", "Directory assistance"),
    (ServiceCode::TrafficInformation, "511", "Traffic and transportation information"),
    (ServiceCode::RepairService, "611", "Telephone repair service"),
    (ServiceCode::TelecomRelay, "711", "Telecommunications relay service"),
    (ServiceCode::CallBeforeYouDig, "811", "Call before you dig"),
];

impl ServiceCode {
    /// All service codes in whitelist order
    pub const ALL: [ServiceCode; 6] = [
        ServiceCode::Emergency,
        ServiceCode::DirectoryAssistance,
        ServiceCode::TrafficInformation,
        ServiceCode::RepairService,
        ServiceCode::TelecomRelay,
        ServiceCode::CallBeforeYouDig,
    ];

    /// Look up a service code by its dialed digits
    pub fn from_digits(digits: &str) -> Option<Self> {
        SERVICE_CODES
            .iter()
            .find(|(_, d, _)| *d == digits)
            .map(|(code, _, _)| *code)
    }

    /// The dialed digits, e.g. `"911"`
    pub fn as_str(&self) -> &'static str {
        self.entry().1
    }

    pub fn description(&self) -> &'static str {
        self.entry().2
    }

    fn entry(&self) -> &'static (ServiceCode, &'static str, &'static str) {
        // The table covers every variant
        &SERVICE_CODES[*self as usize]
    }
}

impl fmt::Display for ServiceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a phone value was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    InternationalLength,
    ShortCode,
    OtherLength,
    AllZerosOrOnes,
    BadAreaCodeDigit,
    EmptyOrNonNumeric,
}

const INVALID_REASONS: [(InvalidReason, &str, &str); 6] = [
    (
        InvalidReason::InternationalLength,
        "international_length",
        "International or over-length number (more than 10 digits)",
    ),
    (
        InvalidReason::ShortCode,
        "short_code",
        "Short code (3-6 digits, not a recognised service number)",
    ),
    (
        InvalidReason::OtherLength,
        "other_length",
        "Unexpected length (1-2 or 7-9 digits)",
    ),
    (
        InvalidReason::AllZerosOrOnes,
        "all_zeros_or_ones",
        "Placeholder number (all zeros or all ones)",
    ),
    (
        InvalidReason::BadAreaCodeDigit,
        "bad_area_code_digit",
        "Area code starts with 0 or 1",
    ),
    (
        InvalidReason::EmptyOrNonNumeric,
        "empty_or_non_numeric",
        "Empty or contains no digits",
    ),
];

impl InvalidReason {
    /// All reasons in reporting order
    pub const ALL: [InvalidReason; 6] = [
        InvalidReason::InternationalLength,
        InvalidReason::ShortCode,
        InvalidReason::OtherLength,
        InvalidReason::AllZerosOrOnes,
        InvalidReason::BadAreaCodeDigit,
        InvalidReason::EmptyOrNonNumeric,
    ];

    pub fn as_str(&self) -> &'static str {
        INVALID_REASONS[*self as usize].1
    }

    pub fn description(&self) -> &'static str {
        INVALID_REASONS[*self as usize].2
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one phone value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ClassificationOutcome {
    /// N11 service code
    ServiceNumber(ServiceCode),
    /// Valid NANP ten-digit number (leading country code removed)
    TenDigit(String),
    /// Rejected value
    Invalid(InvalidReason),
}

impl ClassificationOutcome {
    /// Normalized number for valid outcomes
    pub fn normalized(&self) -> Option<String> {
        match self {
            Self::ServiceNumber(code) => Some(code.as_str().to_string()),
            Self::TenDigit(number) => Some(number.clone()),
            Self::Invalid(_) => None,
        }
    }
}

impl fmt::Display for ClassificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServiceNumber(code) => write!(f, "service_number({})", code),
            Self::TenDigit(number) => write!(f, "ten_digit({})", number),
            Self::Invalid(reason) => write!(f, "invalid({})", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_code_table_matches_variants() {
        for code in ServiceCode::ALL {
            assert_eq!(ServiceCode::from_digits(code.as_str()), Some(code));
        }
        assert_eq!(ServiceCode::Emergency.as_str(), "911");
        assert_eq!(ServiceCode::CallBeforeYouDig.as_str(), "811");
        assert_eq!(ServiceCode::from_digits("123"), None);
    }

    #[test]
    fn test_invalid_reason_table_matches_variants() {
        assert_eq!(InvalidReason::ALL.len(), INVALID_REASONS.len());
        for (i, reason) in InvalidReason::ALL.iter().enumerate() {
            assert_eq!(INVALID_REASONS[i].0, *reason);
        }
        assert_eq!(InvalidReason::ShortCode.as_str(), "short_code");
    }

    #[test]
    fn test_normalized() {
        assert_eq!(
            ClassificationOutcome::ServiceNumber(ServiceCode::DirectoryAssistance).normalized(),
            Some("411".to_string())
        );
        assert_eq!(
            ClassificationOutcome::TenDigit("5551234567".to_string()).normalized(),
            Some("5551234567".to_string())
        );
        assert_eq!(
            ClassificationOutcome::Invalid(InvalidReason::ShortCode).normalized(),
            None
        );
    }

    #[test]
    fn test_outcome_serialization() {
        let json =
            serde_json::to_value(ClassificationOutcome::ServiceNumber(ServiceCode::Emergency))
                .unwrap();
        assert_eq!(json["kind"], "service_number");
        assert_eq!(json["value"], "911");
    }
}
