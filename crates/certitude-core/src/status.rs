//! Final status assignment and the external-verification override.
//!
//! [`assign_status`] is an ordered decision list; the first matching rule
//! wins. Trust and completeness dominate expiry, and expiry dominates the
//! issue-date flag, so an expired certificate from an untrusted issuer
//! reports `Untrusted Issuer`.

use crate::field::{ConfidenceMap, FieldMap, TargetField};
use crate::verdict::{
    ExpiryStatus, ExternalVerification, FinalStatus, IssuerStatus, IssuerValidation,
    ValidationResult,
};

/// Average confidence below this routes to manual review.
pub const MIN_AVERAGE_CONFIDENCE: f64 = 0.70;

/// Fields that must be non-empty for an automatic verdict.
pub const CRITICAL_FIELDS: [TargetField; 3] = [
    TargetField::Issuer,
    TargetField::IssuedDate,
    TargetField::Subject,
];

pub fn assign_status(
    confidence: &ConfidenceMap,
    fields: &FieldMap,
    validation: &ValidationResult,
    issuer: &IssuerValidation,
) -> FinalStatus {
    if confidence.is_empty() {
        return FinalStatus::ManualReviewRequired;
    }

    let average = confidence.values().sum::<f64>() / confidence.len() as f64;
    if average < MIN_AVERAGE_CONFIDENCE {
        return FinalStatus::ManualReviewRequired;
    }

    if !issuer.is_trusted {
        return FinalStatus::UntrustedIssuer;
    }

    if validation.expiry_status == ExpiryStatus::Expired {
        return FinalStatus::Expired;
    }

    let missing_critical = CRITICAL_FIELDS.iter().any(|f| {
        fields
            .get(f)
            .and_then(|v| v.as_deref())
            .is_none_or(str::is_empty)
    });
    if missing_critical {
        return FinalStatus::ManualReviewRequired;
    }

    if !validation.issued_date_valid {
        return FinalStatus::VerificationFailed;
    }

    FinalStatus::Verified
}

/// Whether the external fallback should run for this document.
pub fn needs_external_check(status: FinalStatus, issuer: &IssuerValidation) -> bool {
    status == FinalStatus::UntrustedIssuer || issuer.status == IssuerStatus::Untrusted
}

/// Fold a fallback outcome into the verdict.
///
/// "Verified" promotes the document and rewrites the issuer status once;
/// either manual outcome forces manual review; anything else leaves the
/// status as assigned.
pub fn apply_external(
    status: FinalStatus,
    issuer: &mut IssuerValidation,
    external: &ExternalVerification,
) -> FinalStatus {
    if external.status.is_verified() {
        issuer.mark_externally_verified();
        FinalStatus::Verified
    } else if external.status.is_manual() {
        FinalStatus::ManualReviewRequired
    } else {
        status
    }
}
