//! Validation outcomes and the final trust verdict.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Valid,
    Expired,
    InvalidFormat,
}

impl ExpiryStatus {
    /// Same spelling as the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Expired => "expired",
            Self::InvalidFormat => "invalid_format",
        }
    }
}

impl fmt::Display for ExpiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Date sanity checks for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub issued_date_valid: bool,
    pub expiry_status: ExpiryStatus,
    pub dates_consistent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    /// A soft failure: both flags false, status `invalid_format`.
    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            issued_date_valid: false,
            expiry_status: ExpiryStatus::InvalidFormat,
            dates_consistent: false,
            error: Some(error.into()),
        }
    }

    pub fn passed(&self) -> bool {
        self.dates_consistent && self.expiry_status == ExpiryStatus::Valid
    }
}

/// Trust-list verdict for an issuer, serialized as its display string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuerStatus {
    Valid,
    Untrusted,
    /// Set only by the external verification fallback.
    VerifiedExternally,
    /// The trust list could not be consulted.
    Unavailable(String),
}

const VALID_ISSUER: &str = "Valid Issuer";
const UNTRUSTED_ISSUER: &str = "Untrusted Issuer";
const VERIFIED_EXTERNALLY: &str = "Verified via External API";
const UNAVAILABLE_PREFIX: &str = "Unable to validate: ";

impl fmt::Display for IssuerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => f.write_str(VALID_ISSUER),
            Self::Untrusted => f.write_str(UNTRUSTED_ISSUER),
            Self::VerifiedExternally => f.write_str(VERIFIED_EXTERNALLY),
            Self::Unavailable(reason) => write!(f, "{UNAVAILABLE_PREFIX}{reason}"),
        }
    }
}

impl Serialize for IssuerStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IssuerStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            VALID_ISSUER => Self::Valid,
            UNTRUSTED_ISSUER => Self::Untrusted,
            VERIFIED_EXTERNALLY => Self::VerifiedExternally,
            other => match other.strip_prefix(UNAVAILABLE_PREFIX) {
                Some(reason) => Self::Unavailable(reason.to_string()),
                None => {
                    return Err(serde::de::Error::custom(format!(
                        "unknown issuer status: {other}"
                    )));
                }
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerValidation {
    pub issuer: Option<String>,
    pub is_trusted: bool,
    pub status: IssuerStatus,
}

impl IssuerValidation {
    /// Record a decisive external verification.
    pub fn mark_externally_verified(&mut self) {
        self.status = IssuerStatus::VerifiedExternally;
    }
}

/// The three-way (plus missing-issuer) outcome of the fallback check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExternalStatus {
    #[serde(rename = "Manual Review Required")]
    ManualReviewRequired,
    #[serde(rename = "Verified (External API)")]
    Verified,
    #[serde(rename = "Failed (External API)")]
    Failed,
    #[serde(rename = "Manual Verification Required")]
    ManualVerificationRequired,
}

impl ExternalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManualReviewRequired => "Manual Review Required",
            Self::Verified => "Verified (External API)",
            Self::Failed => "Failed (External API)",
            Self::ManualVerificationRequired => "Manual Verification Required",
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }

    /// Both manual variants route the document to a human.
    pub fn is_manual(&self) -> bool {
        matches!(
            self,
            Self::ManualReviewRequired | Self::ManualVerificationRequired
        )
    }
}

impl fmt::Display for ExternalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalVerification {
    pub status: ExternalStatus,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_used: Option<String>,
}

/// The single terminal verdict for a processed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalStatus {
    Verified,
    Expired,
    #[serde(rename = "Untrusted Issuer")]
    UntrustedIssuer,
    #[serde(rename = "Verification Failed")]
    VerificationFailed,
    #[serde(rename = "Manual Review Required")]
    ManualReviewRequired,
}

impl FinalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "Verified",
            Self::Expired => "Expired",
            Self::UntrustedIssuer => "Untrusted Issuer",
            Self::VerificationFailed => "Verification Failed",
            Self::ManualReviewRequired => "Manual Review Required",
        }
    }
}

impl fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuer_status_wire_strings() {
        let cases = [
            (IssuerStatus::Valid, "\"Valid Issuer\""),
            (IssuerStatus::Untrusted, "\"Untrusted Issuer\""),
            (
                IssuerStatus::VerifiedExternally,
                "\"Verified via External API\"",
            ),
            (
                IssuerStatus::Unavailable("no such file".into()),
                "\"Unable to validate: no such file\"",
            ),
        ];
        for (status, json) in cases {
            assert_eq!(serde_json::to_string(&status).unwrap(), json);
            let parsed: IssuerStatus = serde_json::from_str(json).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn unknown_issuer_status_rejected() {
        assert!(serde_json::from_str::<IssuerStatus>("\"Maybe\"").is_err());
    }

    #[test]
    fn external_status_classes() {
        assert!(ExternalStatus::Verified.is_verified());
        assert!(ExternalStatus::ManualReviewRequired.is_manual());
        assert!(ExternalStatus::ManualVerificationRequired.is_manual());
        assert!(!ExternalStatus::Failed.is_manual());
        assert!(!ExternalStatus::Failed.is_verified());
    }

    #[test]
    fn final_status_serializes_as_display() {
        for status in [
            FinalStatus::Verified,
            FinalStatus::Expired,
            FinalStatus::UntrustedIssuer,
            FinalStatus::VerificationFailed,
            FinalStatus::ManualReviewRequired,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }

    #[test]
    fn expiry_status_display_matches_json() {
        for status in [
            ExpiryStatus::Valid,
            ExpiryStatus::Expired,
            ExpiryStatus::InvalidFormat,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }

    #[test]
    fn validation_result_omits_absent_error() {
        let ok = ValidationResult {
            issued_date_valid: true,
            expiry_status: ExpiryStatus::Valid,
            dates_consistent: true,
            error: None,
        };
        let json = serde_json::to_string(&ok).unwrap();
        assert!(!json.contains("error"));
        assert!(json.contains("\"expiry_status\":\"valid\""));

        let bad = ValidationResult::invalid("Missing date values");
        let json = serde_json::to_string(&bad).unwrap();
        assert!(json.contains("\"invalid_format\""));
        assert!(json.contains("Missing date values"));
    }
}
