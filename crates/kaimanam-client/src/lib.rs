//! # kaimanam-client -- Typed Rust client for the storefront's hosted services
//!
//! Provides typed access to everything the storefront keeps outside the
//! process:
//! - **Catalog** via the `items` collection of the realtime database
//! - **Orders** via the `UserData` collection
//! - **Images** via blob storage under `images/`
//! - **Order ingestion** via a single POST endpoint
//!
//! ## Architecture
//!
//! Consumers depend on the traits in [`repository`], never on a concrete
//! backend. [`KaimanamClient`] bundles the HTTP implementations;
//! [`MemoryBackend`] implements the same traits in process.
//!
//! Calls are terminal: nothing is retried and no call backs off. Live
//! subscriptions stream server-sent events over a connection that has no
//! overall timeout; every other request is bounded by
//! [`ClientConfig::timeout_secs`].

pub mod blobs;
pub mod config;
pub(crate) mod database;
pub mod error;
pub mod ingest;
pub mod items;
pub mod memory;
pub mod orders;
pub mod repository;
pub(crate) mod stream;

pub use config::{ClientConfig, ConfigError};
pub use error::StoreError;
pub use memory::MemoryBackend;
pub use repository::{
    BlobStore, ItemRepository, OrderRepository, OrderSink, Snapshot, Subscription,
};

use std::time::Duration;

/// Top-level client. Holds one sub-client per service.
#[derive(Debug, Clone)]
pub struct KaimanamClient {
    items: items::ItemClient,
    orders: orders::OrderClient,
    blobs: blobs::BlobClient,
    ingest: ingest::OrderIngestClient,
}

impl KaimanamClient {
    /// Create a client from configuration.
    pub fn new(config: ClientConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        // Subscriptions stay open indefinitely; only the connect is bounded.
        let streaming = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        let ingest = ingest::OrderIngestClient::new(
            http.clone(),
            config.order_endpoint,
            &config.database_url,
            config.auth_token.clone(),
        );
        let db = database::Database::new(
            http.clone(),
            streaming,
            config.database_url,
            config.auth_token.clone(),
        );
        Ok(Self {
            items: items::ItemClient::new(db.clone()),
            orders: orders::OrderClient::new(db),
            blobs: blobs::BlobClient::new(
                http.clone(),
                config.storage_url,
                config.storage_bucket,
                config.auth_token,
            ),
            ingest,
        })
    }

    /// Access the catalog (`items`) client.
    pub fn items(&self) -> &items::ItemClient {
        &self.items
    }

    /// Access the placed-orders (`UserData`) client.
    pub fn orders(&self) -> &orders::OrderClient {
        &self.orders
    }

    /// Access the image storage client.
    pub fn blobs(&self) -> &blobs::BlobClient {
        &self.blobs
    }

    /// Access the order ingestion client.
    pub fn ingest(&self) -> &ingest::OrderIngestClient {
        &self.ingest
    }
}
