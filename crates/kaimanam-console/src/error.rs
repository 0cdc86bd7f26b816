//! Admin workflow errors.

use thiserror::Error;

use kaimanam_client::StoreError;
use kaimanam_core::ValidationError;
use kaimanam_state::EditError;

/// Errors from the order desk and catalog administration.
#[derive(Error, Debug)]
pub enum AdminError {
    /// The submitted form is incomplete or malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// An order edit was rejected.
    #[error("invalid edit: {0}")]
    Edit(#[from] EditError),
    /// The backend call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AdminError {
    /// Whether the addressed record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_not_found())
    }

    /// Whether a concurrent change won.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_conflict())
    }
}
