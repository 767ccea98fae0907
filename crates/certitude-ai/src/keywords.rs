//! Keyword tables for the certificate classifier.
//!
//! Every entry is matched as a lower-case substring of the lower-cased text
//! and counts at most once, however often it occurs.

/// File extensions the classifier will consider at all.
pub const ALLOWED_FILE_TYPES: &[&str] = &["pdf", "jpg", "png", "jpeg", "tiff", "bmp", "txt", "gif"];

/// Words that name the document type directly.
pub const PRIMARY_KEYWORDS: &[&str] = &[
    "certificate",
    "certification",
    "certify",
    "certified",
    "diploma",
];

/// Boilerplate phrases typical of certificate wording.
pub const FORMAL_PHRASES: &[&str] = &[
    "to whomsoever it may concern",
    "this is to certify that",
    "has completed",
    "is hereby awarded",
    "this is to confirm",
    "completion certificate",
    "achievement certificate",
    "certificate of",
    "award",
    "completion of",
];

/// Labels of administrative fields printed on certificates.
pub const FIELD_KEYWORDS: &[&str] = &[
    "issued",
    "issue date",
    "expiry",
    "expires",
    "expiration",
    "valid until",
    "issuer",
    "issued by",
    "issued on",
    "date",
    "signature",
    "authorized",
    "validation number",
    "validate at",
];

/// Numeric dates (`15/01/2024`, `1.2.24`) or month names, full before short.
///
/// No word boundaries: `mar` inside `summary` counts, as does `may` anywhere.
pub const DATE_PATTERN: &str = r"\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4}|january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec";

/// Date-like matches needed before dates count as present.
pub const MIN_DATE_HITS: usize = 2;
