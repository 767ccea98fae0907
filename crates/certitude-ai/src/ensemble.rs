//! Self-consistency ensemble: repeated oracle calls reduced by majority vote.
//!
//! All attempts are issued concurrently, each under its own timeout, and the
//! vote runs only after every attempt has finished or timed out. Results are
//! kept in submission order so tie-breaking never depends on which call
//! returned first.

use std::time::Duration;

use certitude_core::{
    ConsensusResult, ExtractionAttempt, FieldGuess, FieldVote, Outcome, TargetField, VerifyConfig,
    VoteCount, VotingLog,
};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::oracle::{FieldOracle, OracleError};

#[derive(Debug, Clone, Copy)]
pub struct Ensemble {
    attempts: usize,
    timeout: Duration,
}

impl Ensemble {
    pub fn new(attempts: usize, timeout: Duration) -> Self {
        Self { attempts, timeout }
    }

    pub fn from_config(config: &VerifyConfig) -> Self {
        Self::new(config.ensemble_attempts, config.oracle_timeout)
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Run every attempt and vote.
    ///
    /// Failed, timed-out, and empty attempts are dropped. When none succeed
    /// the result is an all-null consensus marked as degraded.
    pub async fn run(&self, oracle: &dyn FieldOracle, text: &str) -> Outcome<ConsensusResult> {
        let calls = (0..self.attempts).map(|i| async move {
            let result = match tokio::time::timeout(self.timeout, oracle.extract(text)).await {
                Ok(result) => result,
                Err(_) => Err(OracleError::Timeout(self.timeout)),
            };
            (i, result)
        });
        let results = join_all(calls).await;

        let mut successes = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (i, result) in results {
            match result {
                Ok(attempt) if attempt.is_empty() => {
                    debug!(attempt = i + 1, oracle = oracle.name(), "empty extraction");
                    failures.push(format!("attempt {}: empty response", i + 1));
                }
                Ok(attempt) => {
                    debug!(
                        attempt = i + 1,
                        oracle = oracle.name(),
                        fields = attempt.fields.len(),
                        "extraction succeeded"
                    );
                    successes.push(attempt);
                }
                Err(e) => {
                    debug!(attempt = i + 1, oracle = oracle.name(), error = %e, "extraction failed");
                    failures.push(format!("attempt {}: {e}", i + 1));
                }
            }
        }

        info!(
            oracle = oracle.name(),
            succeeded = successes.len(),
            attempts = self.attempts,
            "ensemble complete"
        );

        if successes.is_empty() {
            let reason = format!(
                "all {} extraction attempts failed ({})",
                self.attempts,
                failures.join("; ")
            );
            warn!(oracle = oracle.name(), %reason, "extraction degraded to empty consensus");
            return Outcome::degraded(ConsensusResult::empty(), reason);
        }

        Outcome::Complete(calculate_consensus(&successes))
    }
}

/// Majority vote per field across `attempts`, in submission order.
///
/// Only attempts that mention a field vote on it; `None` is a candidate like
/// any other. Ties go to the value seen first. The winner's confidence is
/// taken from the first attempt that proposed it.
pub fn calculate_consensus(attempts: &[ExtractionAttempt]) -> ConsensusResult {
    if attempts.is_empty() {
        return ConsensusResult::empty();
    }

    let mut consensus = ConsensusResult::empty();
    let mut voting_log = VotingLog::default();

    for field in TargetField::ALL {
        let guesses: Vec<&FieldGuess> = attempts.iter().filter_map(|a| a.get(field)).collect();

        let mut tally: Vec<VoteCount> = Vec::new();
        for guess in &guesses {
            match tally.iter_mut().find(|c| c.value == guess.value) {
                Some(count) => count.votes += 1,
                None => tally.push(VoteCount {
                    value: guess.value.clone(),
                    votes: 1,
                }),
            }
        }

        let mut winner: Option<&VoteCount> = None;
        for candidate in &tally {
            if winner.is_none_or(|w| candidate.votes > w.votes) {
                winner = Some(candidate);
            }
        }
        let winner_value = winner.and_then(|w| w.value.clone());

        let confidence = guesses
            .iter()
            .find(|g| winner.is_some_and(|w| w.value == g.value))
            .map(|g| g.confidence)
            .unwrap_or(0.0);

        consensus.fields.insert(
            field,
            FieldGuess {
                value: winner_value.clone(),
                confidence,
            },
        );
        voting_log.fields.insert(
            field,
            FieldVote {
                winner: winner_value,
                tally,
                total_runs: attempts.len(),
            },
        );
    }

    consensus.voting_log = voting_log;
    consensus
}
