//! Certificate classification and ensemble field extraction.

pub mod classifier;
pub mod ensemble;
pub mod keywords;
pub mod oracle;

#[cfg(feature = "azure")]
pub mod azure;

pub use classifier::{AcceptRule, CertificateSignals, Classification, classify, explain, score};
pub use ensemble::{Ensemble, calculate_consensus};
pub use oracle::{FieldOracle, OracleError, StaticOracle};

#[cfg(feature = "azure")]
pub use azure::{AzureConfig, AzureOracle};
