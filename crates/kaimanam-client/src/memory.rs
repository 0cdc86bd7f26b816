//! # In-Memory Backend
//!
//! Implements every repository trait without a network, for the console and
//! CLI tests.
//!
//! Each collection is a record tree held in a `tokio::sync::watch` channel,
//! so subscribers always see the latest full snapshot. Versions are drawn
//! from one counter shared by every collection and bumped on each write.
//! Locks are `parking_lot` and are never held across an await.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;

use kaimanam_core::{
    ImageFile, Item, ItemId, Keyed, Order, Record, RecordKey, Version, Versioned,
};

use crate::error::StoreError;
use crate::repository::{
    BlobStore, ItemRepository, OrderRepository, OrderSink, Snapshot, Subscription,
};
use crate::stream::Tree;

/// Scheme of the URLs handed out for stored images.
pub const MEMORY_BLOB_SCHEME: &str = "memory";

struct Collection {
    records: watch::Sender<Tree>,
    versions: HashMap<String, u64>,
    /// `id` field text → keys carrying it, in key order.
    by_id: BTreeMap<String, BTreeSet<String>>,
}

impl Collection {
    fn new() -> Self {
        let (records, _) = watch::channel(Tree::new());
        Self {
            records,
            versions: HashMap::new(),
            by_id: BTreeMap::new(),
        }
    }

    fn unindex(&mut self, key: &str) {
        let old = self.records.borrow().get(key).map(|body| id_text(key, body));
        if let Some(old) = old {
            if let Some(keys) = self.by_id.get_mut(&old) {
                keys.remove(key);
                if keys.is_empty() {
                    self.by_id.remove(&old);
                }
            }
        }
    }
}

/// Text form of a record's `id` field; the key stands in when it is absent.
fn id_text(key: &str, body: &Value) -> String {
    match body.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => key.to_string(),
    }
}

#[derive(Default)]
struct Inner {
    collections: Mutex<HashMap<&'static str, Collection>>,
    blobs: Mutex<BTreeMap<String, ImageFile>>,
    rejecting: Mutex<HashSet<&'static str>>,
    sequence: AtomicU64,
}

/// Process-local storage for every collection and for images.
///
/// Cloning shares the same storage.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let collections = self.inner.collections.lock();
        let sizes: BTreeMap<_, _> = collections
            .iter()
            .map(|(name, c)| (*name, c.records.borrow().len()))
            .collect();
        f.debug_struct("MemoryBackend")
            .field("collections", &sizes)
            .field("blobs", &self.inner.blobs.lock().len())
            .finish()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to `collection` fail with a 503 until switched off.
    ///
    /// Reads and subscriptions are unaffected.
    pub fn reject_writes(&self, collection: &'static str, reject: bool) {
        let mut rejecting = self.inner.rejecting.lock();
        if reject {
            rejecting.insert(collection);
        } else {
            rejecting.remove(collection);
        }
    }

    /// Store a raw record body under `key`, bypassing typed encoding.
    ///
    /// Lets tests seed records in the shapes older clients wrote.
    pub fn insert_raw(&self, collection: &'static str, key: &str, body: Value) -> Version {
        let seq = self.next_sequence();
        let mut collections = self.inner.collections.lock();
        let coll = collections.entry(collection).or_insert_with(Collection::new);
        store(coll, key, body, seq);
        Version::new(seq.to_string())
    }

    /// The image stored at `path`, if any.
    pub fn blob(&self, path: &str) -> Option<ImageFile> {
        self.inner.blobs.lock().get(path).cloned()
    }

    /// Number of stored images.
    pub fn blob_count(&self) -> usize {
        self.inner.blobs.lock().len()
    }

    fn next_sequence(&self) -> u64 {
        self.inner.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn check_writable(&self, collection: &'static str, endpoint: &str) -> Result<(), StoreError> {
        if self.inner.rejecting.lock().contains(collection) {
            return Err(StoreError::Api {
                endpoint: endpoint.to_string(),
                status: 503,
                body: "writes are disabled".to_string(),
            });
        }
        Ok(())
    }

    fn list<T: Record>(&self) -> Snapshot<T> {
        let tree = {
            let collections = self.inner.collections.lock();
            collections
                .get(T::COLLECTION)
                .map(|c| c.records.borrow().clone())
                .unwrap_or_default()
        };
        Snapshot::from_tree(tree)
    }

    fn subscribe<T: Record>(&self) -> Subscription<T> {
        let mut collections = self.inner.collections.lock();
        let coll = collections.entry(T::COLLECTION).or_insert_with(Collection::new);
        Subscription::local(coll.records.subscribe())
    }

    fn get_versioned<T: Record>(&self, key: &RecordKey) -> Result<Option<Versioned<T>>, StoreError> {
        let found = {
            let collections = self.inner.collections.lock();
            collections.get(T::COLLECTION).and_then(|c| {
                let body = c.records.borrow().get(key.as_str()).cloned()?;
                let version = c.versions.get(key.as_str()).map(|v| Version::new(v.to_string()));
                Some((body, version))
            })
        };
        let Some((body, version)) = found else {
            return Ok(None);
        };
        let value = T::decode(key, body).map_err(|e| StoreError::Decode {
            endpoint: format!("memory /{}/{key}", T::COLLECTION),
            source: e,
        })?;
        Ok(Some(Versioned::new(Keyed::new(key.clone(), value), version)))
    }

    fn push<T: Record>(&self, value: &T) -> Result<RecordKey, StoreError> {
        let endpoint = format!("memory POST /{}", T::COLLECTION);
        self.check_writable(T::COLLECTION, &endpoint)?;
        let body = encode(&endpoint, value)?;
        let seq = self.next_sequence();
        // Zero-padded so key order is insertion order.
        let key = format!("-K{seq:016}");
        {
            let mut collections = self.inner.collections.lock();
            let coll = collections.entry(T::COLLECTION).or_insert_with(Collection::new);
            store(coll, &key, body, seq);
        }
        tracing::info!(collection = T::COLLECTION, key = %key, "record created");
        Ok(RecordKey::new(key))
    }

    fn put<T: Record>(
        &self,
        key: &RecordKey,
        value: &T,
        expected: Option<&Version>,
    ) -> Result<Option<Version>, StoreError> {
        let endpoint = format!("memory PUT /{}/{key}", T::COLLECTION);
        self.check_writable(T::COLLECTION, &endpoint)?;
        let body = encode(&endpoint, value)?;
        let seq = self.next_sequence();
        {
            let mut collections = self.inner.collections.lock();
            let coll = collections.entry(T::COLLECTION).or_insert_with(Collection::new);
            if let Some(expected) = expected {
                let current = coll.versions.get(key.as_str()).map(u64::to_string);
                if current.as_deref() != Some(expected.as_str()) {
                    tracing::warn!(collection = T::COLLECTION, key = %key, "conditional write rejected");
                    return Err(StoreError::Conflict { endpoint });
                }
            }
            store(coll, key.as_str(), body, seq);
        }
        tracing::info!(collection = T::COLLECTION, key = %key, "record written");
        Ok(Some(Version::new(seq.to_string())))
    }

    fn delete(&self, collection: &'static str, key: &RecordKey) -> Result<(), StoreError> {
        let endpoint = format!("memory DELETE /{collection}/{key}");
        self.check_writable(collection, &endpoint)?;
        let mut collections = self.inner.collections.lock();
        if let Some(coll) = collections.get_mut(collection) {
            coll.unindex(key.as_str());
            coll.versions.remove(key.as_str());
            coll.records
                .send_if_modified(|tree| tree.remove(key.as_str()).is_some());
        }
        tracing::info!(collection, key = %key, "record deleted");
        Ok(())
    }
}

fn encode<T: Record>(endpoint: &str, value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Decode {
        endpoint: endpoint.to_string(),
        source: e,
    })
}

fn store(coll: &mut Collection, key: &str, body: Value, seq: u64) {
    coll.unindex(key);
    coll.by_id
        .entry(id_text(key, &body))
        .or_default()
        .insert(key.to_string());
    coll.versions.insert(key.to_string(), seq);
    coll.records.send_modify(|tree| {
        tree.insert(key.to_string(), body);
    });
}

impl ItemRepository for MemoryBackend {
    async fn list_items(&self) -> Result<Vec<Keyed<Item>>, StoreError> {
        Ok(self.list::<Item>().into_records())
    }

    async fn subscribe_items(&self) -> Result<Subscription<Item>, StoreError> {
        Ok(self.subscribe())
    }

    /// Served from the maintained `id` index.
    async fn find_item(&self, id: &ItemId) -> Result<Option<Versioned<Item>>, StoreError> {
        let key = {
            let collections = self.inner.collections.lock();
            collections
                .get(Item::COLLECTION)
                .and_then(|c| c.by_id.get(id.as_str()))
                .and_then(|keys| keys.iter().next().cloned())
        };
        match key {
            Some(key) => self.get_versioned(&RecordKey::new(key)),
            None => Ok(None),
        }
    }

    async fn insert_item(&self, item: &Item) -> Result<RecordKey, StoreError> {
        self.push(item)
    }

    async fn update_item(
        &self,
        key: &RecordKey,
        item: &Item,
        expected: Option<&Version>,
    ) -> Result<Option<Version>, StoreError> {
        self.put(key, item, expected)
    }

    async fn delete_item(&self, key: &RecordKey) -> Result<(), StoreError> {
        self.delete(Item::COLLECTION, key)
    }
}

impl OrderRepository for MemoryBackend {
    async fn list_orders(&self) -> Result<Vec<Keyed<Order>>, StoreError> {
        Ok(self.list::<Order>().into_records())
    }

    async fn subscribe_orders(&self) -> Result<Subscription<Order>, StoreError> {
        Ok(self.subscribe())
    }

    async fn get_order(&self, key: &RecordKey) -> Result<Option<Versioned<Order>>, StoreError> {
        self.get_versioned(key)
    }

    async fn update_order(
        &self,
        key: &RecordKey,
        order: &Order,
        expected: Option<&Version>,
    ) -> Result<Option<Version>, StoreError> {
        self.put(key, order, expected)
    }

    async fn delete_order(&self, key: &RecordKey) -> Result<(), StoreError> {
        self.delete(Order::COLLECTION, key)
    }
}

impl OrderSink for MemoryBackend {
    async fn submit_order(&self, order: &Order) -> Result<Option<RecordKey>, StoreError> {
        self.push(order).map(Some)
    }
}

impl BlobStore for MemoryBackend {
    async fn upload_image(&self, image: &ImageFile) -> Result<String, StoreError> {
        let path = image.storage_path();
        self.inner.blobs.lock().insert(path.clone(), image.clone());
        tracing::info!(path = %path, bytes = image.bytes.len(), "image stored");
        Ok(format!("{MEMORY_BLOB_SCHEME}:///{path}"))
    }
}
