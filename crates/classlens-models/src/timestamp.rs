//! Strict ISO-8601 capture-timestamp validation.
//!
//! A frame's timestamp must be an RFC 3339 instant that round-trips
//! byte-for-byte through canonical re-serialization. Non-canonical
//! forms (lowercase designators, padded fractional seconds, missing
//! offsets) are rejected so that every timestamp stored downstream has
//! exactly one spelling.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use thiserror::Error;

/// Timestamp validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("not a valid ISO-8601 instant: {0}")]
    Unparseable(String),

    #[error("non-canonical ISO-8601 form: {0}")]
    NonCanonical(String),
}

/// Validate a timestamp string as a canonical ISO-8601 instant.
///
/// The string must parse as RFC 3339 and re-serialize to the identical
/// byte sequence. A trailing `Z` and an explicit numeric offset are
/// both accepted; whichever the caller used must survive the round
/// trip. Fractional seconds are canonical in 3-digit groups.
pub fn validate_canonical(ts: &str) -> Result<DateTime<FixedOffset>, TimestampError> {
    let parsed = DateTime::parse_from_rfc3339(ts)
        .map_err(|_| TimestampError::Unparseable(ts.to_string()))?;

    let canonical = parsed.to_rfc3339_opts(SecondsFormat::AutoSi, ts.ends_with('Z'));
    if canonical != ts {
        return Err(TimestampError::NonCanonical(ts.to_string()));
    }

    Ok(parsed)
}
