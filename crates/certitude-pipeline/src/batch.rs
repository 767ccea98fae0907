//! Batch mode: a list of paths processed with bounded concurrency.

use std::collections::HashMap;
use std::path::Path;

use certitude_core::GuardError;
use certitude_store::{StoreError, read_batch_list, write_batch_results};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::pipeline::Pipeline;
use crate::report::{DocumentOutcome, VerificationReport};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("batch list rejected: {0}")]
    Guard(#[from] GuardError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("batch too large: {count} documents listed, limit is {limit}")]
    TooLarge { count: usize, limit: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub listed: usize,
    pub processed: usize,
    pub skipped: usize,
}

/// Outcomes in list order plus their tally.
#[derive(Debug)]
pub struct BatchRun {
    pub outcomes: Vec<DocumentOutcome>,
    pub summary: BatchSummary,
}

impl BatchRun {
    /// Redacted reports of processed documents, in list order.
    pub fn redacted_reports(&self) -> Vec<VerificationReport> {
        self.outcomes
            .iter()
            .filter_map(DocumentOutcome::report)
            .map(VerificationReport::redacted)
            .collect()
    }

    /// Write [`redacted_reports`](Self::redacted_reports) to `path`.
    pub fn write_results(&self, path: &Path) -> Result<(), StoreError> {
        write_batch_results(path, &self.redacted_reports())
    }
}

impl Pipeline {
    /// Process every document named in the list at `list_path`.
    ///
    /// The list itself must pass the security guard, and a list longer than
    /// `max_batch_size` is refused before any document is touched.
    pub async fn run_batch(&self, list_path: &Path) -> Result<BatchRun, BatchError> {
        let list_path = self.guard().admit(list_path)?;
        let entries = read_batch_list(&list_path)?;

        let limit = self.config().max_batch_size;
        if entries.len() > limit {
            warn!(count = entries.len(), limit, "batch refused");
            return Err(BatchError::TooLarge {
                count: entries.len(),
                limit,
            });
        }

        info!(path = %list_path.display(), count = entries.len(), "starting batch");
        let outcomes: Vec<DocumentOutcome> = stream::iter(entries.iter())
            .map(|entry| self.process_path(Path::new(entry)))
            .buffered(self.config().batch_concurrency.max(1))
            .collect()
            .await;

        warn_duplicate_ids(&outcomes);

        let processed = outcomes.iter().filter(|o| o.is_processed()).count();
        let summary = BatchSummary {
            listed: entries.len(),
            processed,
            skipped: entries.len() - processed,
        };
        info!(
            listed = summary.listed,
            processed = summary.processed,
            skipped = summary.skipped,
            "batch complete"
        );
        Ok(BatchRun { outcomes, summary })
    }
}

/// `doc_id` comes from the file name, so two files with the same stem
/// collide in the audit log. Report it; ids are left as they are.
fn warn_duplicate_ids(outcomes: &[DocumentOutcome]) {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for report in outcomes.iter().filter_map(DocumentOutcome::report) {
        *seen.entry(report.doc_id.as_str()).or_default() += 1;
    }
    for (doc_id, count) in seen.into_iter().filter(|&(_, n)| n > 1) {
        warn!(doc_id, count, "duplicate doc_id in batch");
    }
}
