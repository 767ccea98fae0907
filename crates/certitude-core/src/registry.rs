//! Registry of issuers that expose an external verification endpoint.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    PublicWeb,
    RestApi,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Matched case-insensitively as a substring of the extracted issuer.
    pub issuer: String,
    pub api_url: String,
    pub kind: EndpointKind,
}

impl RegistryEntry {
    pub fn new(issuer: &str, api_url: &str, kind: EndpointKind) -> Self {
        Self {
            issuer: issuer.to_string(),
            api_url: api_url.to_string(),
            kind,
        }
    }
}

/// Ordered issuer → endpoint registry. Earlier entries win on overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRegistry {
    entries: Vec<RegistryEntry>,
}

impl Default for ApiRegistry {
    fn default() -> Self {
        Self::from_entries(vec![
            RegistryEntry::new(
                "AWS",
                "https://aws.amazon.com/verification",
                EndpointKind::PublicWeb,
            ),
            RegistryEntry::new(
                "Microsoft",
                "https://learn.microsoft.com/api/verify",
                EndpointKind::RestApi,
            ),
            RegistryEntry::new(
                "Coursera",
                "https://coursera.org/verify",
                EndpointKind::PublicWeb,
            ),
        ])
    }
}

impl ApiRegistry {
    pub fn from_entries(entries: Vec<RegistryEntry>) -> Self {
        Self { entries }
    }

    /// Load a JSON array of [`RegistryEntry`] objects.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries = serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_entries(entries))
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// First entry whose issuer name appears inside `issuer_name`, ignoring case.
    pub fn lookup(&self, issuer_name: &str) -> Option<&RegistryEntry> {
        let haystack = issuer_name.to_lowercase();
        self.entries
            .iter()
            .find(|e| haystack.contains(&e.issuer.to_lowercase()))
    }
}
