//! Persistence: audit trail, PII redaction, batch list and result files.

pub mod audit;
pub mod batch;
mod error;
pub mod redact;

pub use audit::{
    AuditLogger, AuditRecord, AuditSink, JsonlAuditLog, MemoryAuditSink, check_for_issues,
};
pub use batch::{read_batch_list, write_batch_results};
pub use error::StoreError;
pub use redact::redact;
