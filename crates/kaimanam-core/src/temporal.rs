//! # Temporal Types -- UTC-Only Timestamps
//!
//! Defines `Timestamp`, a UTC timestamp truncated to seconds precision,
//! written as `YYYY-MM-DDTHH:MM:SSZ`.
//!
//! ## Reading stored timestamps
//!
//! Orders reach the database from different clients. Some write RFC 3339
//! text with an offset, some let the database fill in its server timestamp
//! (epoch milliseconds). [`Timestamp`] decodes both and always normalizes to
//! UTC.

use chrono::{DateTime, Timelike, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::KaimanamError;
use crate::lenient::NumberOrText;

/// A UTC timestamp, truncated to seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse RFC 3339 text with any offset, converting to UTC.
    pub fn parse(s: &str) -> Result<Self, KaimanamError> {
        let dt = DateTime::parse_from_rfc3339(s.trim()).map_err(|e| {
            KaimanamError::InvalidTimestamp {
                input: s.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// From Unix epoch milliseconds, the database's server-timestamp form.
    pub fn from_epoch_millis(millis: i64) -> Result<Self, KaimanamError> {
        let dt = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
            KaimanamError::InvalidTimestamp {
                input: millis.to_string(),
                reason: "out of range".into(),
            }
        })?;
        Ok(Self(truncate_to_seconds(dt)))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// Long human form used on order cards and receipts, e.g.
    /// `October 19, 2026, 02:30 PM`.
    pub fn to_receipt_string(&self) -> String {
        self.0.format("%B %-d, %Y, %I:%M %p").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match NumberOrText::deserialize(deserializer)? {
            NumberOrText::Number(n) => {
                let millis = n
                    .as_i64()
                    .or_else(|| n.as_f64().map(|f| f as i64))
                    .ok_or_else(|| D::Error::custom(format!("bad epoch timestamp {n}")))?;
                Timestamp::from_epoch_millis(millis).map_err(D::Error::custom)
            }
            NumberOrText::Text(s) => Timestamp::parse(&s).map_err(D::Error::custom),
        }
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}
