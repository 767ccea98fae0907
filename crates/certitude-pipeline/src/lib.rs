//! Certificate verification pipeline: one document end to end, or a batch.

mod batch;
mod pipeline;
mod report;
mod source;

pub use batch::{BatchError, BatchRun, BatchSummary};
pub use pipeline::Pipeline;
pub use report::{DocumentOutcome, SkipReason, VerificationReport};
pub use source::{AcquiredText, FsTextSource, TextError, TextSource};
