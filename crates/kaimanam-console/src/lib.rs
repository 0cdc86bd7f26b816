//! # kaimanam-console -- Storefront and Admin Workflows
//!
//! Ties the client-side state in `kaimanam-state` to the storage traits in
//! `kaimanam-client`. Every workflow is generic over the repository traits,
//! so the same code runs against the hosted services and against
//! `MemoryBackend`.
//!
//! ## Workflows
//!
//! - [`Storefront`]: live catalog, cart, single-write order submission.
//! - [`OrderDesk`]: live order board, confirmed deletion, versioned inline
//!   edits, receipts.
//! - [`CatalogAdmin`]: image upload plus item create, lookup by business id,
//!   versioned update, delete.
//!
//! Every workflow error is terminal to the operation that raised it. Nothing
//! is retried.

pub mod catalog_admin;
pub mod error;
pub mod order_desk;
pub mod receipt;
pub mod storefront;

pub use catalog_admin::{form_for, CatalogAdmin};
pub use error::AdminError;
pub use order_desk::{EditSession, OrderDesk, SaveOutcome};
pub use receipt::{Receipt, ShopProfile};
pub use storefront::{Confirmation, Storefront, SubmitError};
