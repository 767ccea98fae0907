//! Per-document results.

use std::path::PathBuf;

use certitude_core::{
    ConfidenceMap, ExternalVerification, FieldMap, FinalStatus, GuardError, IssuerValidation,
    ValidationResult, VotingLog,
};
use certitude_store::redact;
use serde::Serialize;
use thiserror::Error;

use crate::source::TextError;

/// Everything decided about one processed document.
///
/// Serialises to the batch output schema. The vote trail and degradation
/// notes stay in memory only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    pub doc_id: String,
    pub fields: FieldMap,
    pub confidence: ConfidenceMap,
    pub confidence_flags: Vec<String>,
    pub validation: ValidationResult,
    pub issuer_validation: IssuerValidation,
    pub external_verification: Option<ExternalVerification>,
    pub final_status: FinalStatus,
    #[serde(skip)]
    pub voting_log: VotingLog,
    /// Reasons any best-effort stage fell back to a degraded result.
    #[serde(skip)]
    pub diagnostics: Vec<String>,
}

impl VerificationReport {
    /// Copy with PII in `fields` masked, for anything written outside the audit log.
    pub fn redacted(&self) -> Self {
        Self {
            fields: redact(&self.fields),
            ..self.clone()
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Why a document produced no report.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error(transparent)]
    Text(#[from] TextError),

    #[error("document is not classified as a certificate")]
    NotCertificate,

    #[error("text acquisition task did not finish: {0}")]
    Interrupted(String),
}

/// Either a report or an explicit "not processed".
///
/// A rejected certificate is still `Processed`; `NotProcessed` means no
/// verdict was reached at all.
#[derive(Debug)]
pub enum DocumentOutcome {
    Processed(Box<VerificationReport>),
    NotProcessed { path: PathBuf, reason: SkipReason },
}

impl DocumentOutcome {
    pub fn report(&self) -> Option<&VerificationReport> {
        match self {
            Self::Processed(report) => Some(&**report),
            Self::NotProcessed { .. } => None,
        }
    }

    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Processed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certitude_core::{IssuerStatus, TargetField};

    fn report() -> VerificationReport {
        VerificationReport {
            doc_id: "cert".into(),
            fields: FieldMap::from([
                (TargetField::Issuer, Some("ISO Authority".into())),
                (TargetField::CertificateNumber, Some("ISO-9001-2024-098".into())),
            ]),
            confidence: ConfidenceMap::new(),
            confidence_flags: vec![],
            validation: ValidationResult::invalid("Missing date values"),
            issuer_validation: IssuerValidation {
                issuer: Some("ISO Authority".into()),
                is_trusted: true,
                status: IssuerStatus::Valid,
            },
            external_verification: None,
            final_status: FinalStatus::VerificationFailed,
            voting_log: VotingLog::default(),
            diagnostics: vec!["x".into()],
        }
    }

    #[test]
    fn redaction_only_touches_fields() {
        let r = report().redacted();
        assert_eq!(
            r.fields[&TargetField::CertificateNumber].as_deref(),
            Some("IS***REDACTED***")
        );
        assert_eq!(r.fields[&TargetField::Issuer].as_deref(), Some("ISO Authority"));
        assert_eq!(r.issuer_validation.issuer.as_deref(), Some("ISO Authority"));
    }

    #[test]
    fn serialised_schema() {
        let v = serde_json::to_value(report()).unwrap();
        assert_eq!(v["final_status"], "Verification Failed");
        assert_eq!(v["issuer_validation"]["status"], "Valid Issuer");
        assert!(v["external_verification"].is_null());
        assert!(v.get("voting_log").is_none());
        assert!(v.get("diagnostics").is_none());
    }
}
