//! Client error types.

/// Errors from the hosted database, blob store, or order endpoint.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The service returned a non-2xx status.
    #[error("{endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response body could not be read as JSON.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// A stored record did not match its expected shape.
    #[error("malformed record from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },
    /// The addressed record does not exist.
    #[error("not found: {what}")]
    NotFound { what: String },
    /// A conditional write lost to a concurrent change.
    #[error("{endpoint} was changed by someone else; reload and try again")]
    Conflict { endpoint: String },
    /// A live subscription ended abnormally.
    #[error("subscription to {endpoint} ended: {reason}")]
    Stream { endpoint: String, reason: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl StoreError {
    /// Whether this is a lost-update conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Whether this is a missing-record error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
