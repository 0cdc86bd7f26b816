//! # Stored Records
//!
//! The database holds each collection as a JSON object mapping record keys to
//! record bodies. [`Record`] ties a Rust type to its collection and lets it
//! patch a raw body before decoding. [`Keyed`] pairs a decoded value with its
//! key, and [`Versioned`] pairs it with the concurrency token from a point
//! read.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::identity::{RecordKey, Version};

/// A type stored as one record of a database collection.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection the records live in.
    const COLLECTION: &'static str;

    /// Adjust a raw record body before decoding it.
    ///
    /// The default leaves the body untouched.
    fn prepare(_key: &RecordKey, _body: &mut serde_json::Value) {}

    /// Decode one stored record.
    fn decode(key: &RecordKey, mut body: serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::prepare(key, &mut body);
        serde_json::from_value(body)
    }
}

/// A decoded record together with the key it is stored under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyed<T> {
    pub key: RecordKey,
    pub value: T,
}

impl<T> Keyed<T> {
    pub fn new(key: RecordKey, value: T) -> Self {
        Self { key, value }
    }
}

/// A point-read record with the version it was read at.
///
/// `version` is `None` when the backend did not report one; writes made with
/// a `None` version are unconditional.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub record: Keyed<T>,
    pub version: Option<Version>,
}

impl<T> Versioned<T> {
    pub fn new(record: Keyed<T>, version: Option<Version>) -> Self {
        Self { record, version }
    }

    /// The stored key.
    pub fn key(&self) -> &RecordKey {
        &self.record.key
    }

    /// The decoded value.
    pub fn value(&self) -> &T {
        &self.record.value
    }
}
