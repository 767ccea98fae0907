//! Core types, configuration, and the pure decision rules of certificate verification.

pub mod config;
pub mod dates;
pub mod document;
pub mod field;
pub mod guard;
pub mod normalize;
pub mod outcome;
pub mod registry;
pub mod status;
pub mod trust;
pub mod validation;
pub mod verdict;

pub use config::{ConfigError, VerifyConfig};
pub use dates::{Clock, FixedClock, SystemClock, normalize_date};
pub use document::Document;
pub use field::{
    ConfidenceMap, ConsensusResult, ExtractionAttempt, FieldGuess, FieldMap, FieldVote,
    TargetField, VoteCount, VotingLog,
};
pub use guard::{GuardError, SecurityGuard};
pub use normalize::{NormalizedFields, normalize};
pub use outcome::Outcome;
pub use registry::{ApiRegistry, EndpointKind, RegistryEntry};
pub use status::{apply_external, assign_status, needs_external_check};
pub use trust::TrustList;
pub use validation::validate_dates;
pub use verdict::{
    ExpiryStatus, ExternalStatus, ExternalVerification, FinalStatus, IssuerStatus,
    IssuerValidation, ValidationResult,
};
