//! Date normalisation and the validation clock.
//!
//! Oracle output uses whatever date style the certificate printed. Everything
//! downstream of the normaliser works on ISO `YYYY-MM-DD` only.

use chrono::{Local, NaiveDate};

/// Wire format for every normalised date.
pub const ISO_DATE: &str = "%Y-%m-%d";

/// Accepted input formats, tried in order; the first that parses wins.
///
/// `DD/MM/YYYY` precedes `MM/DD/YYYY`, so an ambiguous `03/04/2024` is read
/// as 3 April.
pub const DATE_FORMATS: &[&str] = &[
    ISO_DATE,
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%B %d, %Y",
    "%d %B %Y",
];

/// Re-emit a date string as `YYYY-MM-DD`.
///
/// Strings matching none of [`DATE_FORMATS`] pass through unchanged, so an
/// unparseable value surfaces later as an `invalid_format` validation status
/// rather than an error here.
pub fn normalize_date(raw: &str) -> String {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .map(|d| d.format(ISO_DATE).to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Parse a date that must already be in strict `YYYY-MM-DD` form.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, ISO_DATE).ok()
}

/// Source of "today" for expiry and issue-date checks.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date at call time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one date, for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
