//! REST access to the hosted realtime database.
//!
//! ## Paths
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/{collection}.json` | Read a whole collection |
//! | GET    | `/{collection}.json?orderBy="id"&equalTo=..` | Indexed lookup |
//! | GET    | `/{collection}.json` + `Accept: text/event-stream` | Live stream |
//! | POST   | `/{collection}.json` | Push a record under a fresh key |
//! | GET    | `/{collection}/{key}.json` | Read one record |
//! | PUT    | `/{collection}/{key}.json` | Overwrite one record |
//! | DELETE | `/{collection}/{key}.json` | Remove one record |
//!
//! Point reads and writes send `X-Firebase-ETag: true` and get the record's
//! ETag back; conditional writes send it as `if-match` and fail with 412 when
//! the record moved on.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ETAG, IF_MATCH};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use url::Url;
use zeroize::Zeroizing;

use kaimanam_core::{ItemId, Keyed, Record, RecordKey, Version, Versioned};

use crate::config::ConfigError;
use crate::error::StoreError;
use crate::repository::{Snapshot, Subscription};
use crate::stream::EventStream;

const ETAG_REQUEST: &str = "X-Firebase-ETag";

/// Body returned by a push.
#[derive(Debug, Deserialize)]
pub(crate) struct PushResponse {
    pub(crate) name: String,
}

/// Low-level database access shared by the collection clients.
#[derive(Clone)]
pub(crate) struct Database {
    http: reqwest::Client,
    streaming: reqwest::Client,
    base_url: Url,
    auth: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Database {
    pub(crate) fn new(
        http: reqwest::Client,
        streaming: reqwest::Client,
        base_url: Url,
        auth: Option<Zeroizing<String>>,
    ) -> Self {
        Self {
            http,
            streaming,
            base_url,
            auth,
        }
    }

    /// `{base}/{collection}.json` or `{base}/{collection}/{key}.json`, with
    /// the credential attached.
    fn url(&self, collection: &str, key: Option<&RecordKey>) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                ConfigError::InvalidUrl(
                    "database_url".to_string(),
                    "not a hierarchical URL".to_string(),
                )
            })?;
            segments.pop_if_empty();
            match key {
                Some(key) => {
                    segments.push(collection);
                    segments.push(&format!("{}.json", key.as_str()));
                }
                None => {
                    segments.push(&format!("{collection}.json"));
                }
            }
        }
        if let Some(token) = &self.auth {
            url.query_pairs_mut().append_pair("auth", token.as_str());
        }
        Ok(url)
    }

    /// Read a whole collection.
    pub(crate) async fn list<T: Record>(&self) -> Result<Snapshot<T>, StoreError> {
        let endpoint = format!("GET /{}", T::COLLECTION);
        let url = self.url(T::COLLECTION, None)?;

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| StoreError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        let resp = check(&endpoint, resp).await?;

        let value: Value = resp.json().await.map_err(|e| StoreError::Deserialization {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        Ok(Snapshot::from_value(value))
    }

    /// Read one record with its ETag. A missing record reads as `null`.
    pub(crate) async fn get_versioned<T: Record>(
        &self,
        key: &RecordKey,
    ) -> Result<Option<Versioned<T>>, StoreError> {
        let endpoint = format!("GET /{}/{key}", T::COLLECTION);
        let url = self.url(T::COLLECTION, Some(key))?;

        let resp = self
            .http
            .get(url)
            .header(ETAG_REQUEST, "true")
            .send()
            .await
            .map_err(|e| StoreError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        let resp = check(&endpoint, resp).await?;
        let version = etag(resp.headers());

        let body: Value = resp.json().await.map_err(|e| StoreError::Deserialization {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        if body.is_null() {
            return Ok(None);
        }
        let value = T::decode(key, body).map_err(|e| StoreError::Decode {
            endpoint,
            source: e,
        })?;
        Ok(Some(Versioned::new(Keyed::new(key.clone(), value), version)))
    }

    /// Push `value` under a fresh server-generated key.
    pub(crate) async fn push<T: Record>(&self, value: &T) -> Result<RecordKey, StoreError> {
        let endpoint = format!("POST /{}", T::COLLECTION);
        let url = self.url(T::COLLECTION, None)?;

        let resp = self
            .http
            .post(url)
            .json(value)
            .send()
            .await
            .map_err(|e| StoreError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        let resp = check(&endpoint, resp).await?;

        let pushed: PushResponse = resp.json().await.map_err(|e| StoreError::Deserialization {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        tracing::info!(collection = T::COLLECTION, key = %pushed.name, "record created");
        Ok(RecordKey::new(pushed.name))
    }

    /// Overwrite the record at `key`.
    ///
    /// With `expected` set the write is conditional; a 412 becomes
    /// [`StoreError::Conflict`].
    pub(crate) async fn put<T: Record>(
        &self,
        key: &RecordKey,
        value: &T,
        expected: Option<&Version>,
    ) -> Result<Option<Version>, StoreError> {
        let endpoint = format!("PUT /{}/{key}", T::COLLECTION);
        let url = self.url(T::COLLECTION, Some(key))?;

        let mut req = self.http.put(url).header(ETAG_REQUEST, "true").json(value);
        if let Some(version) = expected {
            req = req.header(IF_MATCH, version.as_str());
        }
        let resp = req.send().await.map_err(|e| StoreError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        if resp.status() == StatusCode::PRECONDITION_FAILED {
            tracing::warn!(collection = T::COLLECTION, key = %key, "conditional write rejected");
            return Err(StoreError::Conflict { endpoint });
        }
        let resp = check(&endpoint, resp).await?;
        tracing::info!(collection = T::COLLECTION, key = %key, "record written");
        Ok(etag(resp.headers()))
    }

    /// Remove the record at `key`.
    pub(crate) async fn delete(&self, collection: &str, key: &RecordKey) -> Result<(), StoreError> {
        let endpoint = format!("DELETE /{collection}/{key}");
        let url = self.url(collection, Some(key))?;

        let resp = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(|e| StoreError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        check(&endpoint, resp).await?;
        tracing::info!(collection, key = %key, "record deleted");
        Ok(())
    }

    /// Records whose `id` field equals `id`, in key order.
    ///
    /// Older records store the id as text and newer ones as a number, and
    /// the database compares types strictly, so a numeric id that matches
    /// nothing as text is retried as a number.
    pub(crate) async fn query_id<T: Record>(&self, id: &ItemId) -> Result<Vec<Keyed<T>>, StoreError> {
        let as_text = Value::String(id.as_str().to_string()).to_string();
        let found = self.query_equal::<T>("id", &as_text).await?;
        if !found.is_empty() {
            return Ok(found);
        }
        match id.as_number() {
            Some(n) => self.query_equal::<T>("id", &n.to_string()).await,
            None => Ok(found),
        }
    }

    async fn query_equal<T: Record>(
        &self,
        field: &str,
        literal: &str,
    ) -> Result<Vec<Keyed<T>>, StoreError> {
        let endpoint = format!("GET /{}?orderBy={field}", T::COLLECTION);
        let mut url = self.url(T::COLLECTION, None)?;
        url.query_pairs_mut()
            .append_pair("orderBy", &format!("\"{field}\""))
            .append_pair("equalTo", literal);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| StoreError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        let resp = check(&endpoint, resp).await?;

        let value: Value = resp.json().await.map_err(|e| StoreError::Deserialization {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        Ok(Snapshot::from_value(value).into_records())
    }

    /// Open a live stream over a collection.
    pub(crate) async fn subscribe<T: Record>(&self) -> Result<Subscription<T>, StoreError> {
        let endpoint = format!("STREAM /{}", T::COLLECTION);
        let url = self.url(T::COLLECTION, None)?;

        let resp = self
            .streaming
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
            .send()
            .await
            .map_err(|e| StoreError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        let resp = check(&endpoint, resp).await?;
        tracing::debug!(collection = T::COLLECTION, "subscription opened");
        Ok(Subscription::remote(EventStream::new(endpoint, resp)))
    }
}

/// Pass a 2xx response through; turn anything else into [`StoreError::Api`].
pub(crate) async fn check(
    endpoint: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, StoreError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Api {
        endpoint: endpoint.to_string(),
        status,
        body,
    })
}

fn etag(headers: &HeaderMap) -> Option<Version> {
    headers
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(Version::new)
}
