//! Extracted certificate fields, oracle attempts, and consensus results.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The fixed set of fields pulled from every certificate.
///
/// Declaration order is output order: maps keyed by `TargetField` iterate
/// issuer, certificate_number, issued_date, expiry_date, subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetField {
    Issuer,
    CertificateNumber,
    IssuedDate,
    ExpiryDate,
    Subject,
}

impl TargetField {
    pub const ALL: [TargetField; 5] = [
        Self::Issuer,
        Self::CertificateNumber,
        Self::IssuedDate,
        Self::ExpiryDate,
        Self::Subject,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issuer => "issuer",
            Self::CertificateNumber => "certificate_number",
            Self::IssuedDate => "issued_date",
            Self::ExpiryDate => "expiry_date",
            Self::Subject => "subject",
        }
    }

    /// Look up a field by its wire name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    /// Whether values of this field are normalised as dates.
    pub fn is_date(&self) -> bool {
        matches!(self, Self::IssuedDate | Self::ExpiryDate)
    }
}

impl AsRef<str> for TargetField {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TargetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single value guess with the confidence the oracle attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldGuess {
    pub value: Option<String>,
    pub confidence: f64,
}

impl FieldGuess {
    pub fn new(value: impl Into<String>, confidence: f64) -> Self {
        Self {
            value: Some(value.into()),
            confidence,
        }
    }

    /// No value, zero confidence.
    pub fn empty() -> Self {
        Self {
            value: None,
            confidence: 0.0,
        }
    }
}

/// One oracle response: a guess per field the oracle answered.
///
/// Fields the oracle did not mention are absent and do not take part in
/// the vote for that field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionAttempt {
    pub fields: BTreeMap<TargetField, FieldGuess>,
}

impl ExtractionAttempt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for fixtures.
    pub fn with(mut self, field: TargetField, guess: FieldGuess) -> Self {
        self.fields.insert(field, guess);
        self
    }

    pub fn get(&self, field: TargetField) -> Option<&FieldGuess> {
        self.fields.get(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Final per-field values after normalisation.
pub type FieldMap = BTreeMap<TargetField, Option<String>>;

/// Final per-field confidence after rounding.
pub type ConfidenceMap = BTreeMap<TargetField, f64>;

/// How many attempts voted for one candidate value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCount {
    /// `None` is the "no value" candidate.
    pub value: Option<String>,
    pub votes: usize,
}

/// Vote trail for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldVote {
    pub winner: Option<String>,
    /// Candidates in first-seen order.
    pub tally: Vec<VoteCount>,
    pub total_runs: usize,
}

impl FieldVote {
    /// Votes cast for the winning value.
    pub fn winning_votes(&self) -> usize {
        self.tally
            .iter()
            .find(|c| c.value == self.winner)
            .map(|c| c.votes)
            .unwrap_or(0)
    }
}

/// Per-field vote trails for one ensemble run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingLog {
    pub fields: BTreeMap<TargetField, FieldVote>,
}

impl VotingLog {
    pub fn get(&self, field: TargetField) -> Option<&FieldVote> {
        self.fields.get(&field)
    }
}

/// Majority-vote result across extraction attempts.
///
/// Always holds every [`TargetField`], in declaration order, even when no
/// attempt produced a value for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub fields: BTreeMap<TargetField, FieldGuess>,
    pub voting_log: VotingLog,
}

impl ConsensusResult {
    /// Every field null with zero confidence and an empty vote trail.
    pub fn empty() -> Self {
        Self {
            fields: TargetField::ALL
                .into_iter()
                .map(|f| (f, FieldGuess::empty()))
                .collect(),
            voting_log: VotingLog::default(),
        }
    }

    pub fn get(&self, field: TargetField) -> Option<&FieldGuess> {
        self.fields.get(&field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_order_matches_declaration() {
        let names: Vec<&str> = TargetField::ALL.iter().map(|f| f.as_str()).collect();
        assert_eq!(
            names,
            [
                "issuer",
                "certificate_number",
                "issued_date",
                "expiry_date",
                "subject"
            ]
        );

        let mut map = FieldMap::new();
        map.insert(TargetField::Subject, None);
        map.insert(TargetField::Issuer, None);
        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, [TargetField::Issuer, TargetField::Subject]);
    }

    #[test]
    fn from_name_rejects_unknown() {
        assert_eq!(
            TargetField::from_name("expiry_date"),
            Some(TargetField::ExpiryDate)
        );
        assert_eq!(TargetField::from_name("recipient"), None);
    }

    #[test]
    fn empty_consensus_has_every_field() {
        let c = ConsensusResult::empty();
        assert_eq!(c.fields.len(), TargetField::ALL.len());
        assert!(c.fields.values().all(|g| g.value.is_none() && g.confidence == 0.0));
    }

    #[test]
    fn field_map_serializes_with_snake_case_keys() {
        let mut map = FieldMap::new();
        map.insert(TargetField::CertificateNumber, Some("ISO-1".into()));
        map.insert(TargetField::Subject, None);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"certificate_number":"ISO-1","subject":null}"#);
    }

    #[test]
    fn winning_votes_reads_tally() {
        let vote = FieldVote {
            winner: Some("A".into()),
            tally: vec![
                VoteCount {
                    value: Some("A".into()),
                    votes: 2,
                },
                VoteCount {
                    value: Some("B".into()),
                    votes: 1,
                },
            ],
            total_runs: 3,
        };
        assert_eq!(vote.winning_votes(), 2);
    }
}
