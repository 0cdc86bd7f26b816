//! # kaimanam-state -- Client-Side Storefront State
//!
//! Everything the storefront and the admin console hold in memory between
//! network calls. Nothing here performs I/O; callers feed in snapshots and
//! user actions and read back the resulting state.
//!
//! ## Components
//!
//! - **Cart** (`cart.rs`): the cart aggregator. Maps item id to a cart line,
//!   keeps insertion order, floors quantities at one, and computes the total.
//!
//! - **Order editor** (`editor.rs`): inline editing of a placed order's lines
//!   with the total recomputed on every change.
//!
//! - **Feeds** (`feed.rs`): view models folded from live snapshots. Every
//!   snapshot fully replaces the previous view; `ViewState` tracks the
//!   loading/ready/failed status of one screen.

pub mod cart;
pub mod editor;
pub mod feed;

pub use cart::{Cart, CartError, CartLine, Reconciliation};
pub use editor::{EditError, OrderEditor};
pub use feed::{CatalogView, OrderBoard, SnapshotView, ViewState};
