//! # Repository Seams
//!
//! The console and the CLI talk to storage only through the traits in this
//! module. Two backends implement them: the HTTP clients in this crate, which
//! speak to the hosted database, blob store, and order endpoint, and
//! [`MemoryBackend`](crate::memory::MemoryBackend), which keeps everything in
//! process for tests.
//!
//! ## Subscriptions
//!
//! A [`Subscription`] is a lazy pull sequence of full collection snapshots.
//! Nothing is buffered on the consumer's behalf beyond the latest state;
//! dropping the subscription closes the underlying stream.

use std::future::Future;

use serde_json::Value;
use tokio::sync::watch;

use kaimanam_core::{ImageFile, Item, ItemId, Keyed, Order, Record, RecordKey, Version, Versioned};

use crate::error::StoreError;
use crate::stream::{EventStream, Tree};

// ─── Snapshots ───────────────────────────────────────────────────────

/// Every record of a collection at one instant, in key order.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    /// Records that decoded cleanly.
    pub records: Vec<Keyed<T>>,
    /// Keys of records that did not match the expected shape.
    pub rejected: Vec<RecordKey>,
}

impl<T: Record> Snapshot<T> {
    /// Decode a raw collection. Malformed records are logged and listed in
    /// `rejected` instead of failing the whole snapshot.
    pub(crate) fn from_tree(tree: Tree) -> Self {
        let mut records = Vec::with_capacity(tree.len());
        let mut rejected = Vec::new();
        for (key, body) in tree {
            let key = RecordKey::new(key);
            match T::decode(&key, body) {
                Ok(value) => records.push(Keyed::new(key, value)),
                Err(e) => {
                    tracing::warn!(
                        collection = T::COLLECTION,
                        key = %key,
                        error = %e,
                        "skipping malformed record"
                    );
                    rejected.push(key);
                }
            }
        }
        Self { records, rejected }
    }

    /// Decode a collection read from the wire, where a missing collection
    /// reads as `null`.
    pub(crate) fn from_value(value: Value) -> Self {
        match value {
            Value::Object(tree) => Self::from_tree(tree),
            _ => Self::from_tree(Tree::new()),
        }
    }

    /// The decoded records, dropping the rejected keys.
    pub fn into_records(self) -> Vec<Keyed<T>> {
        self.records
    }
}

enum Source {
    Remote(EventStream),
    Local {
        rx: watch::Receiver<Tree>,
        primed: bool,
    },
}

/// A live view of one collection.
///
/// The first call to [`next`](Self::next) yields the current contents; every
/// later call waits for the next change. Returns `None` once the backend
/// closes the stream.
pub struct Subscription<T> {
    source: Source,
    _record: std::marker::PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match &self.source {
            Source::Remote(stream) => format!("{stream:?}"),
            Source::Local { primed, .. } => format!("Local {{ primed: {primed} }}"),
        };
        f.debug_struct("Subscription").field("source", &source).finish()
    }
}

impl<T: Record> Subscription<T> {
    pub(crate) fn remote(stream: EventStream) -> Self {
        Self {
            source: Source::Remote(stream),
            _record: std::marker::PhantomData,
        }
    }

    pub(crate) fn local(rx: watch::Receiver<Tree>) -> Self {
        Self {
            source: Source::Local { rx, primed: false },
            _record: std::marker::PhantomData,
        }
    }

    /// Wait for the next snapshot.
    pub async fn next(&mut self) -> Option<Result<Snapshot<T>, StoreError>> {
        match &mut self.source {
            Source::Remote(stream) => {
                let tree = stream.next_tree().await?;
                Some(tree.map(Snapshot::from_tree))
            }
            Source::Local { rx, primed } => {
                if *primed {
                    rx.changed().await.ok()?;
                } else {
                    *primed = true;
                }
                let tree = rx.borrow_and_update().clone();
                Some(Ok(Snapshot::from_tree(tree)))
            }
        }
    }
}

// ─── Traits ──────────────────────────────────────────────────────────

/// Catalog storage: the `items` collection.
pub trait ItemRepository: Send + Sync {
    /// Every item, in key order.
    fn list_items(&self) -> impl Future<Output = Result<Vec<Keyed<Item>>, StoreError>> + Send;

    /// A live view of the catalog.
    fn subscribe_items(
        &self,
    ) -> impl Future<Output = Result<Subscription<Item>, StoreError>> + Send;

    /// The item with business id `id`, with the version it was read at.
    ///
    /// When several records share the id, the first in key order is returned.
    fn find_item(
        &self,
        id: &ItemId,
    ) -> impl Future<Output = Result<Option<Versioned<Item>>, StoreError>> + Send;

    /// Store a new item under a fresh key.
    fn insert_item(&self, item: &Item)
        -> impl Future<Output = Result<RecordKey, StoreError>> + Send;

    /// Overwrite the item at `key`.
    ///
    /// With `expected` set, the write only lands if the record is still at
    /// that version; otherwise it fails with [`StoreError::Conflict`].
    /// Returns the new version when the backend reports one.
    fn update_item(
        &self,
        key: &RecordKey,
        item: &Item,
        expected: Option<&Version>,
    ) -> impl Future<Output = Result<Option<Version>, StoreError>> + Send;

    /// Remove the item at `key`. Removing a missing key is not an error.
    fn delete_item(&self, key: &RecordKey) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Placed orders: the `UserData` collection.
pub trait OrderRepository: Send + Sync {
    /// Every order, in key order.
    fn list_orders(&self) -> impl Future<Output = Result<Vec<Keyed<Order>>, StoreError>> + Send;

    /// A live view of the order desk.
    fn subscribe_orders(
        &self,
    ) -> impl Future<Output = Result<Subscription<Order>, StoreError>> + Send;

    /// The order at `key`, with the version it was read at.
    fn get_order(
        &self,
        key: &RecordKey,
    ) -> impl Future<Output = Result<Option<Versioned<Order>>, StoreError>> + Send;

    /// Overwrite the order at `key`, conditionally on `expected`.
    fn update_order(
        &self,
        key: &RecordKey,
        order: &Order,
        expected: Option<&Version>,
    ) -> impl Future<Output = Result<Option<Version>, StoreError>> + Send;

    /// Remove the order at `key`. Removing a missing key is not an error.
    fn delete_order(&self, key: &RecordKey)
        -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Where placed orders go.
pub trait OrderSink: Send + Sync {
    /// Write one order. Returns the stored key when the endpoint reports it.
    ///
    /// Never retried.
    fn submit_order(
        &self,
        order: &Order,
    ) -> impl Future<Output = Result<Option<RecordKey>, StoreError>> + Send;
}

/// Product image storage.
pub trait BlobStore: Send + Sync {
    /// Upload `image` under `images/<file name>` and return its retrieval URL.
    fn upload_image(
        &self,
        image: &ImageFile,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;
}
