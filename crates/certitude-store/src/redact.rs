//! PII masking for persisted results.

use std::collections::BTreeMap;

/// Replacement appended after the kept prefix.
pub const REDACTION_MARKER: &str = "***REDACTED***";

/// Exact key names treated as personal data (compared lower-cased).
pub const SENSITIVE_KEYS: &[&str] = &["certificate_number", "subject", "name", "recipient"];

/// Characters kept from the start of a redacted value.
const KEEP_PREFIX: usize = 2;

/// Whether values under `key` must be masked. Any key containing `id` counts.
pub fn is_sensitive(key: &str) -> bool {
    let key = key.to_lowercase();
    SENSITIVE_KEYS.contains(&key.as_str()) || key.contains("id")
}

/// Keep the first two characters and mask the rest; short values are
/// masked completely.
pub fn redact_value(value: &str) -> String {
    if value.chars().count() <= KEEP_PREFIX {
        return REDACTION_MARKER.to_string();
    }
    let prefix: String = value.chars().take(KEEP_PREFIX).collect();
    format!("{prefix}{REDACTION_MARKER}")
}

/// Copy of `fields` with sensitive values masked. Null and empty values are
/// left as they are.
pub fn redact<K>(fields: &BTreeMap<K, Option<String>>) -> BTreeMap<K, Option<String>>
where
    K: AsRef<str> + Ord + Clone,
{
    fields
        .iter()
        .map(|(k, v)| {
            let value = match v.as_deref() {
                Some(s) if !s.is_empty() && is_sensitive(k.as_ref()) => Some(redact_value(s)),
                _ => v.clone(),
            };
            (k.clone(), value)
        })
        .collect()
}
