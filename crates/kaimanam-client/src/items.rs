//! Typed client for the `items` collection (the catalog).

use kaimanam_core::{Item, ItemId, Keyed, Record, RecordKey, Version, Versioned};

use crate::database::Database;
use crate::error::StoreError;
use crate::repository::{ItemRepository, Subscription};

/// Client for catalog items.
#[derive(Debug, Clone)]
pub struct ItemClient {
    db: Database,
}

impl ItemClient {
    pub(crate) fn new(db: Database) -> Self {
        Self { db }
    }

    /// Read one item by record key.
    pub async fn get_item(&self, key: &RecordKey) -> Result<Option<Versioned<Item>>, StoreError> {
        self.db.get_versioned(key).await
    }
}

/// Database keys are non-empty and exclude `.`, `#`, `$`, `[`, `]` and `/`.
fn is_key_like(raw: &str) -> bool {
    !raw.is_empty() && !raw.contains(['.', '#', '$', '[', ']', '/'])
}

impl ItemRepository for ItemClient {
    async fn list_items(&self) -> Result<Vec<Keyed<Item>>, StoreError> {
        Ok(self.db.list::<Item>().await?.into_records())
    }

    async fn subscribe_items(&self) -> Result<Subscription<Item>, StoreError> {
        self.db.subscribe().await
    }

    /// Indexed lookup, then a point read of the first match for its version.
    ///
    /// A record saved without an `id` field is identified by its key, which
    /// the index cannot see. A non-numeric id that matches nothing is read as
    /// a key and accepted only when that record carries no `id` of its own.
    async fn find_item(&self, id: &ItemId) -> Result<Option<Versioned<Item>>, StoreError> {
        let matches = self.db.query_id::<Item>(id).await?;
        if let Some(first) = matches.into_iter().next() {
            return self.db.get_versioned(&first.key).await;
        }
        if id.as_number().is_some() || !is_key_like(id.as_str()) {
            return Ok(None);
        }
        let found = self.db.get_versioned::<Item>(&RecordKey::new(id.as_str())).await?;
        Ok(found.filter(|v| v.value().id == *id))
    }

    async fn insert_item(&self, item: &Item) -> Result<RecordKey, StoreError> {
        self.db.push(item).await
    }

    async fn update_item(
        &self,
        key: &RecordKey,
        item: &Item,
        expected: Option<&Version>,
    ) -> Result<Option<Version>, StoreError> {
        self.db.put(key, item, expected).await
    }

    async fn delete_item(&self, key: &RecordKey) -> Result<(), StoreError> {
        self.db.delete(Item::COLLECTION, key).await
    }
}
