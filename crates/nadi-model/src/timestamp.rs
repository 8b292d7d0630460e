//! Backend timestamps
//!
//! The backend hands out `timestamptz` values as RFC 3339 strings, plain
//! `timestamp` values without an offset, and the dashboard forms send bare
//! dates. [`Timestamp`] accepts all three and always serializes as RFC 3339.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A point in time in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub DateTime<Utc>);

/// Error for strings that are neither a date nor a date-time
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised timestamp '{0}'")]
pub struct TimestampError(pub String);

impl Timestamp {
    /// Current time
    #[inline]
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Midnight UTC at the start of `date`
    #[inline]
    #[must_use]
    pub fn start_of(date: NaiveDate) -> Self {
        Self(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    /// Get the inner date-time
    #[inline]
    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Calendar date in UTC
    #[inline]
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self(parsed.with_timezone(&Utc)));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(Self(naive.and_utc()));
            }
        }
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(Self::start_of)
            .map_err(|_| TimestampError(raw.to_string()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl From<NaiveDate> for Timestamp {
    fn from(date: NaiveDate) -> Self {
        Self::start_of(date)
    }
}

impl From<Timestamp> for serde_json::Value {
    fn from(value: Timestamp) -> Self {
        serde_json::Value::String(value.to_string())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_bare_date_as_midnight_utc() {
        let ts: Timestamp = "2025-01-10".parse().unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
        assert_eq!(ts.0.hour(), 0);
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let ts: Timestamp = "2025-01-10T08:30:00+08:00".parse().unwrap();
        assert_eq!(ts.0.hour(), 0);
        assert_eq!(ts.0.minute(), 30);
    }

    #[test]
    fn parses_timestamp_without_offset() {
        let ts: Timestamp = "2025-03-01 12:00:00.123".parse().unwrap();
        assert_eq!(ts.0.month(), 3);
        assert_eq!(ts.0.hour(), 12);
    }

    #[test]
    fn rejects_garbage() {
        let err = "next tuesday".parse::<Timestamp>().unwrap_err();
        assert!(err.to_string().contains("next tuesday"));
    }

    #[test]
    fn ordering_follows_time() {
        let early: Timestamp = "2025-01-05".parse().unwrap();
        let late: Timestamp = "2025-01-10".parse().unwrap();
        assert!(early < late);
    }

    #[test]
    fn serde_uses_rfc3339() {
        let ts: Timestamp = "2025-01-10".parse().unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2025-01-10T00:00:00Z\"");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }
}
