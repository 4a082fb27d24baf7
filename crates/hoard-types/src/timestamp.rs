use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// UTC instant with nanosecond resolution, used as the time-index key.
///
/// The canonical string form is fixed-width RFC 3339 with nine fractional
/// digits and a `Z` suffix (`2026-10-18T09:30:00.123456789Z`). Because every
/// rendering has the same width, lexicographic order on the strings is the
/// same as chronological order, which is what the attribute store compares.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The UNIX epoch. Default lower bound of every index query.
    pub const MIN: Self = Self(0);

    /// Create a timestamp from nanoseconds since the UNIX epoch.
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        Self(Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX))
    }

    /// Nanoseconds since the UNIX epoch.
    pub fn as_nanos(&self) -> i64 {
        self.0
    }

    /// The next representable instant (one nanosecond later).
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Convert to a `chrono` date-time.
    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.0)
    }

    /// Parse the canonical form, or any RFC 3339 date-time.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let parsed = DateTime::parse_from_rfc3339(s).map_err(|e| TypeError::InvalidTimestamp {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        let nanos = parsed
            .with_timezone(&Utc)
            .timestamp_nanos_opt()
            .ok_or_else(|| TypeError::InvalidTimestamp {
                input: s.to_string(),
                reason: "out of range for nanosecond precision".into(),
            })?;
        Ok(Self(nanos))
    }

    /// Parse an optional query bound: empty input means "not given", and
    /// `"0"` is accepted as [`Timestamp::MIN`].
    pub fn parse_bound(s: &str) -> Result<Option<Self>, TypeError> {
        match s {
            "" => Ok(None),
            "0" => Ok(Some(Self::MIN)),
            _ => Self::parse(s).map(Some),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_datetime().to_rfc3339_opts(SecondsFormat::Nanos, true))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({self})")
    }
}

impl FromStr for Timestamp {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
