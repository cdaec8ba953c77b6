//! Event timestamp normalization.
//!
//! Stored timestamps come from several generations of writers: some carry an
//! explicit offset, some do not. Everything downstream buckets on the
//! canonical UTC calendar date produced here.
//!
//! Rule: an offset-aware instant is converted to UTC before taking its date.
//! A naive instant is assumed to already be UTC and its date is taken as-is.
//! Changing this rule would silently move historical events between days.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Offset-aware layouts tried after RFC 3339. `%#z` accepts `+05`, `+0500`
/// and `+05:00`.
const AWARE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%.f%#z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// An instant as it was stored, with or without timezone information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredInstant {
    /// Carries an explicit UTC offset
    Aware(DateTime<FixedOffset>),
    /// No offset recorded; treated as UTC
    Naive(NaiveDateTime),
}

impl StoredInstant {
    /// Canonical UTC calendar date of this instant.
    pub fn canonical_date(&self) -> NaiveDate {
        match self {
            StoredInstant::Aware(dt) => dt.with_timezone(&Utc).date_naive(),
            StoredInstant::Naive(dt) => dt.date(),
        }
    }

    /// Whether the stored value carried an offset.
    pub fn is_aware(&self) -> bool {
        matches!(self, StoredInstant::Aware(_))
    }
}

impl From<DateTime<Utc>> for StoredInstant {
    fn from(dt: DateTime<Utc>) -> Self {
        StoredInstant::Aware(dt.fixed_offset())
    }
}

impl fmt::Display for StoredInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoredInstant::Aware(dt) => {
                f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
            }
            StoredInstant::Naive(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

impl FromStr for StoredInstant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_stored_instant(s)
    }
}

impl serde::Serialize for StoredInstant {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for StoredInstant {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_stored_instant(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parse a stored timestamp.
///
/// Returns [`Error::MalformedEvent`] when no known layout matches.
pub fn parse_stored_instant(raw: &str) -> Result<StoredInstant> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(Error::MalformedEvent {
            value: raw.to_string(),
            reason: "empty timestamp".to_string(),
        });
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(StoredInstant::Aware(dt));
    }
    for format in AWARE_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Ok(StoredInstant::Aware(dt));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(StoredInstant::Naive(dt));
        }
    }
    // Bare dates are midnight UTC
    if let Some(midnight) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(StoredInstant::Naive(midnight));
    }

    Err(Error::MalformedEvent {
        value: raw.to_string(),
        reason: "unrecognized timestamp layout".to_string(),
    })
}

/// Canonical UTC date of an optional stored instant.
///
/// Events whose timestamp failed to parse have no date and are skipped by
/// every bucketer.
pub fn event_date(instant: Option<&StoredInstant>) -> Option<NaiveDate> {
    instant.map(StoredInstant::canonical_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_aware_instant_converts_to_utc_first() {
        // 01:30 at +05:00 is 20:30 UTC on the previous day
        let instant = parse_stored_instant("2024-03-11T01:30:00+05:00").unwrap();
        assert!(instant.is_aware());
        assert_eq!(instant.canonical_date(), date(2024, 3, 10));
    }

    #[test]
    fn test_naive_instant_is_taken_as_utc() {
        let instant = parse_stored_instant("2024-03-10 23:30:00").unwrap();
        assert!(!instant.is_aware());
        assert_eq!(instant.canonical_date(), date(2024, 3, 10));

        let with_fraction = parse_stored_instant("2024-03-10T23:59:59.123456").unwrap();
        assert_eq!(with_fraction.canonical_date(), date(2024, 3, 10));
    }

    #[test]
    fn test_zulu_and_postgres_offsets() {
        let zulu = parse_stored_instant("2024-03-13T23:00:00Z").unwrap();
        assert_eq!(zulu.canonical_date(), date(2024, 3, 13));

        let short_offset = parse_stored_instant("2024-03-13 23:00:00.5-02").unwrap();
        assert_eq!(short_offset.canonical_date(), date(2024, 3, 14));
    }

    #[test]
    fn test_bare_date_is_midnight_utc() {
        let instant = parse_stored_instant("2024-02-29").unwrap();
        assert_eq!(instant.canonical_date(), date(2024, 2, 29));
    }

    #[test]
    fn test_malformed_timestamps_are_rejected() {
        for raw in ["", "   ", "yesterday", "2024-13-01T00:00:00", "2024-03-10T25:00:00Z"] {
            let err = parse_stored_instant(raw).unwrap_err();
            assert!(matches!(err, Error::MalformedEvent { .. }), "{raw:?} -> {err}");
        }
    }

    #[test]
    fn test_display_keeps_awareness() {
        let aware = parse_stored_instant("2024-03-13T23:00:00+00:00").unwrap();
        let reparsed = parse_stored_instant(&aware.to_string()).unwrap();
        assert_eq!(reparsed, aware);

        let naive = parse_stored_instant("2024-03-13 23:00:00").unwrap();
        let reparsed = parse_stored_instant(&naive.to_string()).unwrap();
        assert!(!reparsed.is_aware());
        assert_eq!(reparsed, naive);
    }

    #[test]
    fn test_event_date_skips_missing() {
        assert_eq!(event_date(None), None);
        let instant = parse_stored_instant("2024-03-13T10:00:00Z").unwrap();
        assert_eq!(event_date(Some(&instant)), Some(date(2024, 3, 13)));
    }
}
