//! Heuristic certificate classifier.
//!
//! Scores lower-cased text against four independent signals and accepts it
//! when any one of five rules holds:
//!
//! | Rule | Condition |
//! |---|---|
//! | A | primary ≥ 1 and formal ≥ 1 |
//! | B | formal ≥ 2 |
//! | C | dates found and fields ≥ 3 |
//! | D | primary ≥ 1 and dates found |
//! | E | fields ≥ 3 |
//!
//! A file type outside [`ALLOWED_FILE_TYPES`] is rejected before the text is
//! looked at.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::keywords::{
    ALLOWED_FILE_TYPES, DATE_PATTERN, FIELD_KEYWORDS, FORMAL_PHRASES, MIN_DATE_HITS,
    PRIMARY_KEYWORDS,
};

static DATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DATE_PATTERN).expect("invalid date pattern"));

/// Raw heuristic counts for one text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CertificateSignals {
    pub primary_count: usize,
    pub formal_count: usize,
    /// Non-overlapping date-like matches.
    pub date_hits: usize,
    pub field_count: usize,
}

impl CertificateSignals {
    pub fn date_found(&self) -> bool {
        self.date_hits >= MIN_DATE_HITS
    }

    /// The first rule (in table order) that accepts these signals.
    pub fn accepting_rule(&self) -> Option<AcceptRule> {
        let dates = self.date_found();
        if self.primary_count >= 1 && self.formal_count >= 1 {
            Some(AcceptRule::PrimaryAndFormal)
        } else if self.formal_count >= 2 {
            Some(AcceptRule::MultipleFormal)
        } else if dates && self.field_count >= 3 {
            Some(AcceptRule::DatesAndFields)
        } else if self.primary_count >= 1 && dates {
            Some(AcceptRule::PrimaryAndDates)
        } else if self.field_count >= 3 {
            Some(AcceptRule::MultipleFields)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptRule {
    PrimaryAndFormal,
    MultipleFormal,
    DatesAndFields,
    PrimaryAndDates,
    MultipleFields,
}

impl AcceptRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrimaryAndFormal => "primary keyword + formal phrase",
            Self::MultipleFormal => "multiple formal phrases",
            Self::DatesAndFields => "dates + field keywords",
            Self::PrimaryAndDates => "primary keyword + dates",
            Self::MultipleFields => "multiple field keywords",
        }
    }
}

/// Classifier verdict with the evidence behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub file_type_allowed: bool,
    pub signals: CertificateSignals,
    pub rule: Option<AcceptRule>,
}

impl Classification {
    pub fn is_certificate(&self) -> bool {
        self.file_type_allowed && self.rule.is_some()
    }
}

/// Whether `file_type` (any case, dots ignored) is on the allow-list.
pub fn is_allowed_file_type(file_type: &str) -> bool {
    let normalized = file_type.to_lowercase().replace('.', "");
    ALLOWED_FILE_TYPES.contains(&normalized.as_str())
}

/// Count every heuristic signal in `text`.
pub fn score(text: &str) -> CertificateSignals {
    let lower = text.to_lowercase();
    let count = |list: &[&str]| list.iter().filter(|kw| lower.contains(*kw)).count();

    CertificateSignals {
        primary_count: count(PRIMARY_KEYWORDS),
        formal_count: count(FORMAL_PHRASES),
        date_hits: DATE_REGEX.find_iter(&lower).count(),
        field_count: count(FIELD_KEYWORDS),
    }
}

/// Classify with full evidence. Text is not scored for disallowed file types.
pub fn explain(file_type: &str, text: &str) -> Classification {
    if !is_allowed_file_type(file_type) {
        return Classification {
            file_type_allowed: false,
            signals: CertificateSignals::default(),
            rule: None,
        };
    }
    let signals = score(text);
    Classification {
        file_type_allowed: true,
        signals,
        rule: signals.accepting_rule(),
    }
}

/// Decide whether a document is a certificate.
pub fn classify(file_type: &str, text: &str) -> bool {
    explain(file_type, text).is_certificate()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
        CERTIFICATE OF COMPLETION
        This is to certify that John Doe has completed the Quality Management System course.
        Certificate Number: ISO-9001-2024-098
        Issued By: ISO Authority
        Issued On: 2024-01-15
        Valid Until: 2026-01-15
    ";

    #[test]
    fn disallowed_file_type_always_rejected() {
        assert!(!classify("exe", "certificate issued by"));
        assert!(!classify("docx", SAMPLE));
        let c = explain("exe", SAMPLE);
        assert!(!c.file_type_allowed);
        assert_eq!(c.signals, CertificateSignals::default());
    }

    #[test]
    fn file_type_normalised() {
        assert!(is_allowed_file_type(".PDF"));
        assert!(is_allowed_file_type("Jpeg"));
        assert!(!is_allowed_file_type("pdfx"));
    }

    #[test]
    fn sample_certificate_accepted_by_rule_a() {
        let c = explain("pdf", SAMPLE);
        assert!(c.is_certificate());
        assert_eq!(c.rule, Some(AcceptRule::PrimaryAndFormal));
    }

    #[test]
    fn field_keywords_alone_accept() {
        // issued, issued by, valid until → rule E.
        let c = explain("pdf", "This certificate is issued by ISO and valid until 2025");
        assert!(c.is_certificate());
        assert_eq!(c.signals.field_count, 3);
    }

    #[test]
    fn random_text_rejected() {
        assert!(!classify("pdf", "This is just a random document"));
    }

    #[test]
    fn keywords_count_once_each() {
        let s = score("certificate certificate certificate");
        assert_eq!(s.primary_count, 1);
    }

    #[test]
    fn overlapping_keywords_count_separately() {
        // "certification" does not contain "certificate".
        let s = score("certification");
        assert_eq!(s.primary_count, 1);
        let s = score("certificate certification");
        assert_eq!(s.primary_count, 2);
    }

    #[test]
    fn date_detection_needs_two_hits() {
        assert_eq!(score("dated 15/01/2024").date_hits, 1);
        assert!(!score("dated 15/01/2024").date_found());
        assert!(score("from 15/01/2024 to 15.01.2026").date_found());
        assert!(score("January and March").date_found());
    }

    #[test]
    fn full_month_name_is_one_hit() {
        assert_eq!(score("september").date_hits, 1);
    }

    #[test]
    fn rule_b_two_formal_phrases() {
        let c = explain("txt", "to whomsoever it may concern: this is to confirm receipt");
        assert_eq!(c.rule, Some(AcceptRule::MultipleFormal));
    }

    #[test]
    fn rule_d_primary_and_dates() {
        let c = explain("png", "diploma june july");
        assert_eq!(c.rule, Some(AcceptRule::PrimaryAndDates));
    }

    #[test]
    fn rule_c_dates_and_fields() {
        let c = explain("txt", "expiry 01/02/2030, signature, authorized 02/02/2020");
        assert_eq!(c.rule, Some(AcceptRule::DatesAndFields));
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(score("DIPLOMA").primary_count, 1);
    }
}
