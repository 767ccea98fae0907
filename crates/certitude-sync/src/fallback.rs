//! Fallback issuer verification through the API registry.
//!
//! Runs only after the trust-list check has failed. Every path ends in one
//! of three outcomes the pipeline understands: verified, failed, or manual.

use async_trait::async_trait;
use certitude_core::{
    ApiRegistry, ExternalStatus, ExternalVerification, FieldMap, RegistryEntry, TargetField,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Certificate numbers must be longer than this to pass the simulated check.
pub const MIN_CERTIFICATE_NUMBER_LEN: usize = 5;

pub const REASON_ISSUER_MISSING: &str = "Issuer name missing";
pub const REASON_NUMBER_MISSING: &str = "Certificate Number missing for API check";
pub const REASON_NO_API: &str = "No verification API available for this issuer";

#[derive(Error, Debug)]
pub enum ProbeError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("registry returned {status} for {url}")]
    Server { status: u16, url: String },
}

/// What a registry endpoint said about a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeVerdict {
    Confirmed,
    Rejected { reason: String },
}

/// Checks one certificate against one registry endpoint.
#[async_trait]
pub trait RegistryProbe: Send + Sync {
    async fn probe(
        &self,
        entry: &RegistryEntry,
        certificate_number: Option<&str>,
    ) -> Result<ProbeVerdict, ProbeError>;
}

/// Offline stand-in: accepts any certificate number longer than
/// [`MIN_CERTIFICATE_NUMBER_LEN`] characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedProbe;

#[async_trait]
impl RegistryProbe for SimulatedProbe {
    async fn probe(
        &self,
        entry: &RegistryEntry,
        certificate_number: Option<&str>,
    ) -> Result<ProbeVerdict, ProbeError> {
        debug!(issuer = %entry.issuer, "simulated registry check");
        Ok(match certificate_number {
            Some(n) if n.chars().count() > MIN_CERTIFICATE_NUMBER_LEN => ProbeVerdict::Confirmed,
            _ => ProbeVerdict::Rejected {
                reason: REASON_NUMBER_MISSING.to_string(),
            },
        })
    }
}

/// Second-chance verification for issuers missing from the trust list.
#[async_trait]
pub trait ExternalVerifier: Send + Sync {
    async fn verify(&self, issuer: Option<&str>, fields: &FieldMap) -> ExternalVerification;
}

/// Looks the issuer up in an [`ApiRegistry`] and asks a [`RegistryProbe`].
pub struct RegistryVerifier<P> {
    registry: ApiRegistry,
    probe: P,
}

impl<P: RegistryProbe> RegistryVerifier<P> {
    pub fn new(registry: ApiRegistry, probe: P) -> Self {
        Self { registry, probe }
    }
}

impl RegistryVerifier<SimulatedProbe> {
    pub fn simulated(registry: ApiRegistry) -> Self {
        Self::new(registry, SimulatedProbe)
    }
}

#[async_trait]
impl<P: RegistryProbe> ExternalVerifier for RegistryVerifier<P> {
    async fn verify(&self, issuer: Option<&str>, fields: &FieldMap) -> ExternalVerification {
        let Some(issuer) = issuer.filter(|s| !s.is_empty()) else {
            return ExternalVerification {
                status: ExternalStatus::ManualReviewRequired,
                reason: REASON_ISSUER_MISSING.to_string(),
                api_used: None,
            };
        };

        let Some(entry) = self.registry.lookup(issuer) else {
            info!(issuer, "no verification API registered");
            return ExternalVerification {
                status: ExternalStatus::ManualVerificationRequired,
                reason: REASON_NO_API.to_string(),
                api_used: None,
            };
        };

        info!(issuer = %entry.issuer, url = %entry.api_url, "external API found, verifying");
        let number = fields
            .get(&TargetField::CertificateNumber)
            .and_then(|v| v.as_deref());

        match self.probe.probe(entry, number).await {
            Ok(ProbeVerdict::Confirmed) => ExternalVerification {
                status: ExternalStatus::Verified,
                reason: format!("Validated against {} Registry", entry.issuer),
                api_used: Some(entry.api_url.clone()),
            },
            Ok(ProbeVerdict::Rejected { reason }) => ExternalVerification {
                status: ExternalStatus::Failed,
                reason,
                api_used: None,
            },
            Err(e) => {
                warn!(issuer = %entry.issuer, error = %e, "registry probe failed");
                ExternalVerification {
                    status: ExternalStatus::ManualVerificationRequired,
                    reason: e.to_string(),
                    api_used: Some(entry.api_url.clone()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(number: Option<&str>) -> FieldMap {
        FieldMap::from([(TargetField::CertificateNumber, number.map(str::to_string))])
    }

    fn verifier() -> RegistryVerifier<SimulatedProbe> {
        RegistryVerifier::simulated(ApiRegistry::default())
    }

    #[tokio::test]
    async fn missing_issuer_needs_manual_review() {
        for issuer in [None, Some("")] {
            let v = verifier().verify(issuer, &fields(Some("ABCDEFGH"))).await;
            assert_eq!(v.status, ExternalStatus::ManualReviewRequired);
            assert_eq!(v.reason, REASON_ISSUER_MISSING);
        }
    }

    #[tokio::test]
    async fn unknown_issuer_needs_manual_verification() {
        let v = verifier()
            .verify(Some("Acme Training Ltd"), &fields(Some("ABCDEFGH")))
            .await;
        assert_eq!(v.status, ExternalStatus::ManualVerificationRequired);
        assert_eq!(v.reason, REASON_NO_API);
        assert_eq!(v.api_used, None);
    }

    #[tokio::test]
    async fn registered_issuer_with_long_number_verifies() {
        let v = verifier()
            .verify(Some("Amazon Web Services (aws)"), &fields(Some("AWS-123456")))
            .await;
        assert_eq!(v.status, ExternalStatus::Verified);
        assert_eq!(v.reason, "Validated against AWS Registry");
        assert_eq!(
            v.api_used.as_deref(),
            Some("https://aws.amazon.com/verification")
        );
    }

    #[tokio::test]
    async fn short_or_missing_number_fails() {
        for number in [None, Some("12345")] {
            let v = verifier().verify(Some("Microsoft"), &fields(number)).await;
            assert_eq!(v.status, ExternalStatus::Failed);
            assert_eq!(v.reason, REASON_NUMBER_MISSING);
        }
    }

    struct BrokenProbe;

    #[async_trait]
    impl RegistryProbe for BrokenProbe {
        async fn probe(
            &self,
            entry: &RegistryEntry,
            _certificate_number: Option<&str>,
        ) -> Result<ProbeVerdict, ProbeError> {
            Err(ProbeError::Server {
                status: 503,
                url: entry.api_url.clone(),
            })
        }
    }

    #[tokio::test]
    async fn probe_error_needs_manual_verification() {
        let v = RegistryVerifier::new(ApiRegistry::default(), BrokenProbe)
            .verify(Some("Coursera"), &fields(Some("ABCDEFGH")))
            .await;
        assert_eq!(v.status, ExternalStatus::ManualVerificationRequired);
        assert!(v.reason.contains("503"));
    }
}
