//! Live registry probe over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use certitude_core::RegistryEntry;
use tracing::info;

use crate::fallback::{ProbeError, ProbeVerdict, REASON_NUMBER_MISSING, RegistryProbe};

/// `GET {api_url}?certificate_number=<n>` against the registered endpoint.
///
/// 2xx confirms, 404 rejects, anything else is an error the verifier turns
/// into manual verification.
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RegistryProbe for HttpProbe {
    async fn probe(
        &self,
        entry: &RegistryEntry,
        certificate_number: Option<&str>,
    ) -> Result<ProbeVerdict, ProbeError> {
        let Some(number) = certificate_number.filter(|n| !n.is_empty()) else {
            return Ok(ProbeVerdict::Rejected {
                reason: REASON_NUMBER_MISSING.to_string(),
            });
        };

        info!(url = %entry.api_url, "querying issuer registry");
        let resp = self
            .client
            .get(&entry.api_url)
            .query(&[("certificate_number", number)])
            .send()
            .await?;
        let status = resp.status();

        if status.is_success() {
            Ok(ProbeVerdict::Confirmed)
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Ok(ProbeVerdict::Rejected {
                reason: format!("Certificate not found in {} Registry", entry.issuer),
            })
        } else {
            Err(ProbeError::Server {
                status: status.as_u16(),
                url: entry.api_url.clone(),
            })
        }
    }
}
