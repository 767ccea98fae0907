//! Trusted-issuer list and issuer validation.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::config::ConfigError;
use crate::verdict::{IssuerStatus, IssuerValidation};

/// On-disk shape: `{"trusted_issuers": ["ISO Authority", ...]}`.
#[derive(Deserialize)]
struct TrustListFile {
    trusted_issuers: Vec<String>,
}

/// The set of issuers accepted without an external check.
///
/// Loaded once at startup. A list that failed to load is kept as
/// `Unavailable` so every lookup reports why it could not validate instead
/// of aborting the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustList {
    Loaded(HashSet<String>),
    Unavailable(String),
}

impl Default for TrustList {
    fn default() -> Self {
        Self::Loaded(HashSet::new())
    }
}

impl TrustList {
    pub fn from_issuers<I, S>(issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Loaded(issuers.into_iter().map(Into::into).collect())
    }

    /// Read a trust list file, failing on I/O or JSON errors.
    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: TrustListFile =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        info!(path = %path.display(), count = file.trusted_issuers.len(), "loaded trust list");
        Ok(Self::from_issuers(file.trusted_issuers))
    }

    /// Read a trust list file, degrading to `Unavailable` on any error.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "trust list unavailable; issuers will not validate");
                Self::Unavailable(e.to_string())
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Loaded(set) => set.len(),
            Self::Unavailable(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exact, case-sensitive membership test for an issuer name.
    ///
    /// A missing or empty name is never trusted.
    pub fn validate_issuer(&self, issuer: Option<&str>) -> IssuerValidation {
        let set = match self {
            Self::Loaded(set) => set,
            Self::Unavailable(reason) => {
                return IssuerValidation {
                    issuer: issuer.map(str::to_string),
                    is_trusted: false,
                    status: IssuerStatus::Unavailable(reason.clone()),
                };
            }
        };

        let is_trusted = issuer.is_some_and(|name| !name.is_empty() && set.contains(name));
        IssuerValidation {
            issuer: issuer.map(str::to_string),
            is_trusted,
            status: if is_trusted {
                IssuerStatus::Valid
            } else {
                IssuerStatus::Untrusted
            },
        }
    }
}
