//! Typed client for the `UserData` collection (placed orders).

use kaimanam_core::{Keyed, Order, Record, RecordKey, Version, Versioned};

use crate::database::Database;
use crate::error::StoreError;
use crate::repository::{OrderRepository, Subscription};

/// Client for placed orders.
#[derive(Debug, Clone)]
pub struct OrderClient {
    db: Database,
}

impl OrderClient {
    pub(crate) fn new(db: Database) -> Self {
        Self { db }
    }
}

impl OrderRepository for OrderClient {
    async fn list_orders(&self) -> Result<Vec<Keyed<Order>>, StoreError> {
        Ok(self.db.list::<Order>().await?.into_records())
    }

    async fn subscribe_orders(&self) -> Result<Subscription<Order>, StoreError> {
        self.db.subscribe().await
    }

    async fn get_order(&self, key: &RecordKey) -> Result<Option<Versioned<Order>>, StoreError> {
        self.db.get_versioned(key).await
    }

    async fn update_order(
        &self,
        key: &RecordKey,
        order: &Order,
        expected: Option<&Version>,
    ) -> Result<Option<Version>, StoreError> {
        self.db.put(key, order, expected).await
    }

    async fn delete_order(&self, key: &RecordKey) -> Result<(), StoreError> {
        self.db.delete(Order::COLLECTION, key).await
    }
}
