//! Turn a consensus result into the final field and confidence maps.

use crate::dates::normalize_date;
use crate::field::{ConfidenceMap, ConsensusResult, FieldMap, TargetField};

/// Normalised fields ready for validation and output.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFields {
    pub fields: FieldMap,
    pub confidence: ConfidenceMap,
}

impl NormalizedFields {
    pub fn get(&self, field: TargetField) -> Option<&str> {
        self.fields.get(&field).and_then(|v| v.as_deref())
    }
}

/// Canonicalise every target field.
///
/// Absent fields become `null` with `0.0` confidence, dates are rewritten to
/// `YYYY-MM-DD` where a known format matches, and confidences are rounded to
/// two decimals.
pub fn normalize(consensus: &ConsensusResult) -> NormalizedFields {
    let mut fields = FieldMap::new();
    let mut confidence = ConfidenceMap::new();

    for field in TargetField::ALL {
        let Some(guess) = consensus.get(field) else {
            fields.insert(field, None);
            confidence.insert(field, 0.0);
            continue;
        };

        let value = match (&guess.value, field.is_date()) {
            (Some(v), true) if v.is_empty() => None,
            (Some(v), true) => Some(normalize_date(v)),
            (v, _) => v.clone(),
        };
        fields.insert(field, value);
        confidence.insert(field, round_confidence(guess.confidence));
    }

    NormalizedFields { fields, confidence }
}

/// Round to two decimal places.
pub fn round_confidence(c: f64) -> f64 {
    (c * 100.0).round() / 100.0
}
