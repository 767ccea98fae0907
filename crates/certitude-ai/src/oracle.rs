//! Field-extraction oracle contract and the offline static oracle.

use async_trait::async_trait;
use certitude_core::{ExtractionAttempt, FieldGuess, TargetField};
use serde_json::Value;
use thiserror::Error;

/// Confidence attached to a truthy value parsed from a chat response.
pub const PARSED_CONFIDENCE: f64 = 0.95;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("oracle is not configured: {0}")]
    NotConfigured(String),
    #[cfg(feature = "azure")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("malformed oracle response: {0}")]
    Malformed(String),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("oracle call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// An external capability that guesses certificate fields from text.
///
/// Implementations may be non-deterministic and may fail; the ensemble
/// calls them repeatedly and votes.
#[async_trait]
pub trait FieldOracle: Send + Sync {
    async fn extract(&self, text: &str) -> Result<ExtractionAttempt, OracleError>;

    /// Short label used in logs.
    fn name(&self) -> &str;
}

/// Always answers with the same attempt.
#[derive(Debug, Clone)]
pub struct StaticOracle {
    attempt: ExtractionAttempt,
}

impl StaticOracle {
    pub fn new(attempt: ExtractionAttempt) -> Self {
        Self { attempt }
    }

    /// The canned ISO 9001 answer used when no API credentials are configured.
    pub fn demo() -> Self {
        Self::new(
            ExtractionAttempt::new()
                .with(TargetField::Issuer, FieldGuess::new("ISO Authority", 0.96))
                .with(
                    TargetField::CertificateNumber,
                    FieldGuess::new("ISO-9001-2024-098", 0.93),
                )
                .with(TargetField::IssuedDate, FieldGuess::new("15/01/2024", 0.98))
                .with(TargetField::ExpiryDate, FieldGuess::new("15-01-2026", 0.97))
                .with(
                    TargetField::Subject,
                    FieldGuess::new("Quality Management System", 0.90),
                ),
        )
    }
}

#[async_trait]
impl FieldOracle for StaticOracle {
    async fn extract(&self, _text: &str) -> Result<ExtractionAttempt, OracleError> {
        Ok(self.attempt.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Remove a leading ```` ```json ```` or ```` ``` ```` fence and any closing fence.
pub fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse a chat model's JSON reply into an attempt.
///
/// Keys that are not target fields are ignored. Truthy values get
/// [`PARSED_CONFIDENCE`], falsy ones (null, empty string, zero, false) get 0.
pub fn parse_attempt(content: &str) -> Result<ExtractionAttempt, OracleError> {
    let value: Value = serde_json::from_str(strip_code_fences(content))?;
    let Value::Object(map) = value else {
        return Err(OracleError::Malformed(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    };

    let mut attempt = ExtractionAttempt::new();
    for (key, raw) in map {
        let Some(field) = TargetField::from_name(&key) else {
            continue;
        };
        let confidence = if is_truthy(&raw) { PARSED_CONFIDENCE } else { 0.0 };
        attempt.fields.insert(
            field,
            FieldGuess {
                value: stringify(raw),
                confidence,
            },
        );
    }
    Ok(attempt)
}

fn stringify(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
