//! Append-only audit trail, one JSON record per processed document.
//!
//! Audit writes are best-effort: a failing sink is reported through
//! `tracing` and a degraded [`Outcome`], never as an error that would stop
//! the pipeline.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use certitude_core::{ConfidenceMap, FieldMap, Outcome, ValidationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;

/// Stage label written into every record.
pub const AUDIT_STAGE: &str = "extraction_validation";

/// Default audit log file name.
pub const DEFAULT_AUDIT_LOG: &str = "extraction_logs.jsonl";

/// Fields scoring below this are flagged `LOW_CONFIDENCE_<FIELD>`.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.80;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub doc_id: String,
    pub timestamp: DateTime<Utc>,
    pub stage: String,
    pub fields: FieldMap,
    pub confidence_scores: ConfidenceMap,
    pub date_validation: ValidationResult,
    pub confidence_flags: Vec<String>,
    pub needs_manual_review: bool,
}

impl AuditRecord {
    /// Build a record; `needs_manual_review` follows from `flags`.
    pub fn new(
        doc_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        fields: FieldMap,
        confidence_scores: ConfidenceMap,
        date_validation: ValidationResult,
        confidence_flags: Vec<String>,
    ) -> Self {
        let needs_manual_review = !confidence_flags.is_empty();
        Self {
            doc_id: doc_id.into(),
            timestamp,
            stage: AUDIT_STAGE.to_string(),
            fields,
            confidence_scores,
            date_validation,
            confidence_flags,
            needs_manual_review,
        }
    }
}

/// Flag empty/null fields and low-confidence fields.
///
/// All `MISSING_*` flags come first, then all `LOW_CONFIDENCE_*` flags, each
/// group in key order.
pub fn check_for_issues<K: AsRef<str>>(
    fields: &BTreeMap<K, Option<String>>,
    confidence: &BTreeMap<K, f64>,
) -> Vec<String> {
    let missing = fields
        .iter()
        .filter(|(_, v)| v.as_deref().is_none_or(str::is_empty))
        .map(|(k, _)| format!("MISSING_{}", k.as_ref().to_uppercase()));
    let low = confidence
        .iter()
        .filter(|&(_, &c)| c < LOW_CONFIDENCE_THRESHOLD)
        .map(|(k, _)| format!("LOW_CONFIDENCE_{}", k.as_ref().to_uppercase()));
    missing.chain(low).collect()
}

/// Destination for audit records. Implementations must make each append
/// atomic with respect to concurrent appends.
pub trait AuditSink: Send + Sync {
    fn append(&self, record: &AuditRecord) -> Result<(), StoreError>;
}

/// JSON-lines file, one record per line, opened in append mode per write.
#[derive(Debug)]
pub struct JsonlAuditLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonlAuditLog {
    fn append(&self, record: &AuditRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        // A poisoned lock only means another writer panicked mid-append.
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }
}

/// In-memory sink for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, record: &AuditRecord) -> Result<(), StoreError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }
}

/// Best-effort front for an [`AuditSink`].
#[derive(Clone)]
pub struct AuditLogger {
    sink: Arc<dyn AuditSink>,
}

impl AuditLogger {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Append `record`. A write failure degrades the outcome but still
    /// returns the record.
    pub fn log(&self, record: AuditRecord) -> Outcome<AuditRecord> {
        match self.sink.append(&record) {
            Ok(()) => {
                debug!(doc_id = %record.doc_id, "audit record written");
                Outcome::Complete(record)
            }
            Err(e) => {
                warn!(doc_id = %record.doc_id, error = %e, "audit write failed, continuing");
                Outcome::degraded(record, e.to_string())
            }
        }
    }
}
