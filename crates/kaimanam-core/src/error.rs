//! # Error Types
//!
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! - Validation errors name every offending field at once, so a form can be
//!   corrected in a single pass.
//! - Parse errors carry the rejected input verbatim.

use thiserror::Error;

/// Top-level error type for core record handling.
#[derive(Error, Debug)]
pub enum KaimanamError {
    /// Form or record validation failed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A monetary amount could not be parsed or represented.
    #[error("invalid amount {input:?}: {reason}")]
    InvalidAmount {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A timestamp could not be parsed.
    #[error("invalid timestamp {input:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Validation failure raised before any network write.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more required fields were left empty.
    #[error("please fill out all fields (missing: {})", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// A field was present but malformed.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// The form field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}
