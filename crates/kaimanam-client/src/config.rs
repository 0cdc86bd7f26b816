//! Client configuration.
//!
//! Configures the database, blob storage, and order ingestion endpoints.
//! Load from environment variables or construct explicitly for tests.

use url::Url;
use zeroize::Zeroizing;

/// Default blob storage API root.
pub const DEFAULT_STORAGE_URL: &str = "https://firebasestorage.googleapis.com";

/// Configuration for the hosted storefront services.
///
/// Custom `Debug` implementation redacts the `auth_token` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct ClientConfig {
    /// Root of the realtime database, e.g. `https://shop-default-rtdb.firebaseio.com/`.
    pub database_url: Url,
    /// Root of the blob storage API.
    pub storage_url: Url,
    /// Storage bucket for item images. Uploads fail without one.
    pub storage_bucket: Option<String>,
    /// Where placed orders are POSTed.
    /// Default: the `UserData` collection of `database_url`.
    pub order_endpoint: Url,
    /// Database secret or ID token. Sent as `auth=` to the database (order
    /// endpoints under `database_url` included) and as a bearer token to
    /// storage and any other order endpoint.
    pub auth_token: Option<Zeroizing<String>>,
    /// Request timeout in seconds. Live subscriptions are exempt.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("database_url", &self.database_url)
            .field("storage_url", &self.storage_url)
            .field("storage_bucket", &self.storage_bucket)
            .field("order_endpoint", &self.order_endpoint)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    /// Build a configuration for `database_url` with every other setting
    /// defaulted.
    pub fn new(database_url: &str) -> Result<Self, ConfigError> {
        let database_url = parse_root("database_url", database_url)?;
        let order_endpoint = default_order_endpoint(&database_url)?;
        Ok(Self {
            database_url,
            storage_url: parse_root("storage_url", DEFAULT_STORAGE_URL)?,
            storage_bucket: None,
            order_endpoint,
            auth_token: None,
            timeout_secs: 30,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `KAIMANAM_DATABASE_URL` (required)
    /// - `KAIMANAM_STORAGE_URL` (default: `https://firebasestorage.googleapis.com`)
    /// - `KAIMANAM_STORAGE_BUCKET` (optional; required for image uploads)
    /// - `KAIMANAM_ORDER_ENDPOINT` (default: `{database}/UserData.json`)
    /// - `KAIMANAM_AUTH_TOKEN` (optional)
    /// - `KAIMANAM_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_db = std::env::var("KAIMANAM_DATABASE_URL")
            .map_err(|_| ConfigError::Missing("KAIMANAM_DATABASE_URL"))?;
        let mut config = Self::new(&raw_db)?;

        if let Ok(raw) = std::env::var("KAIMANAM_STORAGE_URL") {
            config.storage_url = parse_root("KAIMANAM_STORAGE_URL", &raw)?;
        }
        config.storage_bucket = std::env::var("KAIMANAM_STORAGE_BUCKET")
            .ok()
            .filter(|b| !b.trim().is_empty());
        if let Ok(raw) = std::env::var("KAIMANAM_ORDER_ENDPOINT") {
            config.order_endpoint = Url::parse(&raw).map_err(|e| {
                ConfigError::InvalidUrl("KAIMANAM_ORDER_ENDPOINT".to_string(), e.to_string())
            })?;
        }
        config.auth_token = std::env::var("KAIMANAM_AUTH_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .map(Zeroizing::new);
        config.timeout_secs = std::env::var("KAIMANAM_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);
        Ok(config)
    }

    /// A configuration with every service on one local mock server (for testing).
    pub fn local_mock(base: &str) -> Result<Self, ConfigError> {
        let mut config = Self::new(base)?;
        config.storage_url = parse_root("storage_url", base)?;
        config.storage_bucket = Some("test-bucket".to_string());
        config.timeout_secs = 5;
        Ok(config)
    }
}

/// Parse a service root and make sure its path ends in `/`, so that
/// relative joins land beneath it.
fn parse_root(var: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(
            var.to_string(),
            "not a hierarchical URL".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn default_order_endpoint(database_url: &Url) -> Result<Url, ConfigError> {
    database_url
        .join(&format!("{}.json", kaimanam_core::ORDERS_COLLECTION))
        .map_err(|e| ConfigError::InvalidUrl("order_endpoint".to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("no storage bucket configured; set KAIMANAM_STORAGE_BUCKET")]
    MissingBucket,
}
