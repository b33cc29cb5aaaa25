//! Phone-number classifier
//!
//! Maps any raw ANI/DNIS string to exactly one [`ClassificationOutcome`].
//! The classifier is pure: it never logs and never touches statistics, so it
//! can be called from anywhere, including benchmarks and property tests.

use cdr_core::models::{ClassificationOutcome, InvalidReason, ServiceCode};

use crate::constants::{PLACEHOLDER_NUMBERS, TEN_DIGIT_LEN};

/// Strip every character that is not an ASCII digit
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Classify and normalize a raw phone value
///
/// Accepts `&str`, `Option<&str>` or `None`:
///
/// ```
/// use cdr_core::models::{ClassificationOutcome, ServiceCode};
/// use cdr_services::classifier::classify;
///
/// assert_eq!(
///     classify("+1-555-123-4567"),
///     ClassificationOutcome::TenDigit("5551234567".to_string())
/// );
/// assert_eq!(
///     classify("9-1-1"),
///     ClassificationOutcome::ServiceNumber(ServiceCode::Emergency)
/// );
/// ```
pub fn classify<'a>(raw: impl Into<Option<&'a str>>) -> ClassificationOutcome {
    let raw = match raw.into() {
        Some(value) if !value.is_empty() => value,
        _ => return ClassificationOutcome::Invalid(InvalidReason::EmptyOrNonNumeric),
    };

    let digits = digits_only(raw);
    if digits.is_empty() {
        return ClassificationOutcome::Invalid(InvalidReason::EmptyOrNonNumeric);
    }

    if digits.len() == 3 {
        return match ServiceCode::from_digits(&digits) {
            Some(code) => ClassificationOutcome::ServiceNumber(code),
            None => ClassificationOutcome::Invalid(InvalidReason::ShortCode),
        };
    }

    // NANP country code
    let number = match digits.strip_prefix('1') {
        Some(rest) if digits.len() == TEN_DIGIT_LEN + 1 => rest,
        _ => digits.as_str(),
    };

    if number.len() == TEN_DIGIT_LEN {
        return classify_ten_digit(number);
    }

    ClassificationOutcome::Invalid(reason_for_length(number.len()))
}

fn classify_ten_digit(number: &str) -> ClassificationOutcome {
    if PLACEHOLDER_NUMBERS.contains(&number) {
        return ClassificationOutcome::Invalid(InvalidReason::AllZerosOrOnes);
    }

    match number.as_bytes()[0] {
        b'2'..=b'9' => ClassificationOutcome::TenDigit(number.to_string()),
        _ => ClassificationOutcome::Invalid(InvalidReason::BadAreaCodeDigit),
    }
}

fn reason_for_length(len: usize) -> InvalidReason {
    match len {
        n if n > TEN_DIGIT_LEN => InvalidReason::InternationalLength,
        4..=6 => InvalidReason::ShortCode,
        _ => InvalidReason::OtherLength,
    }
}
