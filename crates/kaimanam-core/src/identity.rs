//! # Identifier Newtypes
//!
//! Three identifier namespaces meet in the storefront and must never be
//! swapped for one another:
//!
//! - [`ItemId`]: the business id an admin types into the item form. Carts
//!   and order lines are keyed by it.
//! - [`RecordKey`]: the key the database assigns on insert (a push key).
//!   Point reads, updates, and deletes address records by it.
//! - [`Version`]: the opaque concurrency token (ETag) returned with a point
//!   read and echoed back on a conditional write.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;
use crate::lenient::NumberOrText;

/// Admin-assigned business identifier of a catalog item.
///
/// Stored as text. Older records hold it as a JSON number, which decodes to
/// the same value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ItemId(String);

impl ItemId {
    /// Build an id from admin input. Surrounding whitespace is trimmed.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingFields(vec!["id"]));
        }
        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidField {
                field: "id",
                reason: format!("expected a numeric id, got {trimmed:?}"),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Wrap an id without validation. Used when a record key stands in for
    /// a missing business id.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Access the id text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id as a number, when it is one. The database indexes numeric ids.
    pub fn as_number(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match NumberOrText::deserialize(deserializer)? {
            NumberOrText::Number(n) => Ok(Self(n.to_string())),
            NumberOrText::Text(s) if s.trim().is_empty() => {
                Err(D::Error::custom("item id must not be empty"))
            }
            NumberOrText::Text(s) => Ok(Self(s.trim().to_string())),
        }
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Database-assigned key of a stored record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    /// Wrap a key returned by the database.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Access the key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque optimistic-concurrency token for a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    /// Wrap a token returned by the database.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Access the token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_accepts_digits() {
        let id = ItemId::parse("  7 ").unwrap();
        assert_eq!(id.as_str(), "7");
        assert_eq!(id.as_number(), Some(7));
    }

    #[test]
    fn parse_rejects_empty_and_non_numeric() {
        assert!(matches!(
            ItemId::parse("   "),
            Err(ValidationError::MissingFields(_))
        ));
        assert!(matches!(
            ItemId::parse("7a"),
            Err(ValidationError::InvalidField { field: "id", .. })
        ));
    }

    #[test]
    fn numeric_and_text_ids_decode_equal() {
        let a: ItemId = serde_json::from_str("7").unwrap();
        let b: ItemId = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"7\"");
    }

    #[test]
    fn record_key_is_transparent() {
        let key: RecordKey = serde_json::from_str("\"-Nabc\"").unwrap();
        assert_eq!(key.as_str(), "-Nabc");
        assert_eq!(key.to_string(), "-Nabc");
    }
}
