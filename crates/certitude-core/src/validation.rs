//! Temporal sanity checks on normalised certificate dates.

use crate::dates::{Clock, parse_iso_date};
use crate::verdict::{ExpiryStatus, ValidationResult};

/// Validate issue and expiry dates against `clock`'s today.
///
/// Never fails: a missing or non-ISO date yields an `invalid_format` result
/// with a diagnostic in `error`.
pub fn validate_dates(
    issued: Option<&str>,
    expiry: Option<&str>,
    clock: &dyn Clock,
) -> ValidationResult {
    let (Some(issued), Some(expiry)) = (
        issued.filter(|s| !s.is_empty()),
        expiry.filter(|s| !s.is_empty()),
    ) else {
        return ValidationResult::invalid("Missing date values");
    };

    let (Some(issued), Some(expiry)) = (parse_iso_date(issued), parse_iso_date(expiry)) else {
        return ValidationResult::invalid("Could not parse dates. Expected YYYY-MM-DD");
    };

    let today = clock.today();
    ValidationResult {
        issued_date_valid: issued <= today,
        expiry_status: if expiry < today {
            ExpiryStatus::Expired
        } else {
            ExpiryStatus::Valid
        },
        dates_consistent: issued <= expiry,
        error: None,
    }
}
