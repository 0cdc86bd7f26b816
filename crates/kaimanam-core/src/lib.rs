//! # kaimanam-core -- Foundational Types for the Kaimanam Storefront
//!
//! Defines the record types that flow between the catalog, the cart, the
//! order desk, and the hosted realtime database. Every other crate in the
//! workspace depends on `kaimanam-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `ItemId` (the admin-assigned
//!    business id), `RecordKey` (the database push key), and `Version`
//!    (the database ETag) cannot be confused with one another.
//!
//! 2. **Exact money.** `Money` holds integer minor units. Line extensions and
//!    totals never pass through floating point, so `50 × 2 + 30` is `130`,
//!    not `129.99999`.
//!
//! 3. **Lenient reads, strict writes.** Records written by older clients store
//!    prices, ratings, and ids as strings. Decoding accepts both strings and
//!    numbers; encoding always writes numbers.
//!
//! 4. **UTC-only timestamps.** `Timestamp` is UTC with seconds precision.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `kaimanam-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod category;
pub mod error;
pub mod form;
pub mod identity;
pub mod item;
pub(crate) mod lenient;
pub mod money;
pub mod order;
pub mod record;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use category::Category;
pub use error::{KaimanamError, ValidationError};
pub use form::{ImageFile, ItemDraft, ItemForm};
pub use identity::{ItemId, RecordKey, Version};
pub use item::Item;
pub use money::Money;
pub use order::{Order, OrderLine};
pub use record::{Keyed, Record, Versioned};
pub use temporal::Timestamp;

/// Database collection holding catalog items.
pub const ITEMS_COLLECTION: &str = "items";

/// Database collection holding placed orders.
pub const ORDERS_COLLECTION: &str = "UserData";
