//! Process-wide configuration, built once at startup and shared read-only.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::registry::ApiRegistry;
use crate::trust::TrustList;

pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10 MiB
pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;
pub const DEFAULT_ENSEMBLE_ATTEMPTS: usize = 3;
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_BATCH_CONCURRENCY: usize = 4;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{0} must be at least 1")]
    Zero(&'static str),
}

/// Configuration for a verification run.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Only files under this directory may be read.
    pub data_root: PathBuf,
    /// Byte ceiling per input file.
    pub max_file_size: u64,
    /// Hard ceiling on documents per batch; larger batches are refused whole.
    pub max_batch_size: usize,
    /// Oracle calls per document.
    pub ensemble_attempts: usize,
    /// Per-call oracle timeout.
    pub oracle_timeout: Duration,
    /// Documents processed at once in batch mode.
    pub batch_concurrency: usize,
    pub trust_list: TrustList,
    pub registry: ApiRegistry,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            ensemble_attempts: DEFAULT_ENSEMBLE_ATTEMPTS,
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            trust_list: TrustList::default(),
            registry: ApiRegistry::default(),
        }
    }
}

impl VerifyConfig {
    /// Reject settings that would make the pipeline do nothing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ensemble_attempts == 0 {
            return Err(ConfigError::Zero("ensemble_attempts"));
        }
        if self.batch_concurrency == 0 {
            return Err(ConfigError::Zero("batch_concurrency"));
        }
        if self.max_batch_size == 0 {
            return Err(ConfigError::Zero("max_batch_size"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = VerifyConfig::default();
        assert_eq!(cfg.max_file_size, 10_485_760);
        assert_eq!(cfg.max_batch_size, 50);
        assert_eq!(cfg.ensemble_attempts, 3);
        assert_eq!(cfg.oracle_timeout, Duration::from_secs(30));
        assert_eq!(cfg.registry.entries().len(), 3);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_attempts_rejected() {
        let cfg = VerifyConfig {
            ensemble_attempts: 0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Zero("ensemble_attempts"))
        ));
    }
}
