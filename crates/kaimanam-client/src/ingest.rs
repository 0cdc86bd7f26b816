//! Order ingestion endpoint.
//!
//! A placed order is one `POST` of `{items, total, createdAt}`. Any 2xx
//! counts as accepted. Endpoints that store the order directly answer with
//! `{"name": key}`; the key is passed back when present, and any other body
//! is ignored.
//!
//! The default endpoint is a database collection, which only accepts the
//! credential as an `auth=` query parameter. Endpoints elsewhere get it as a
//! bearer token.

use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use kaimanam_core::{Order, RecordKey};

use crate::database::check;
use crate::error::StoreError;
use crate::repository::OrderSink;

#[derive(Debug, Deserialize)]
struct Accepted {
    name: Option<String>,
}

/// Client for the order ingestion endpoint.
#[derive(Clone)]
pub struct OrderIngestClient {
    http: reqwest::Client,
    endpoint_url: Url,
    auth: Option<Zeroizing<String>>,
    auth_in_query: bool,
}

impl std::fmt::Debug for OrderIngestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderIngestClient")
            .field("endpoint_url", &self.endpoint_url)
            .field("auth", &self.auth.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl OrderIngestClient {
    pub(crate) fn new(
        http: reqwest::Client,
        endpoint_url: Url,
        database_url: &Url,
        auth: Option<Zeroizing<String>>,
    ) -> Self {
        let auth_in_query = is_under(&endpoint_url, database_url);
        Self {
            http,
            endpoint_url,
            auth,
            auth_in_query,
        }
    }
}

/// Whether `endpoint` addresses a path inside the database at `database_url`.
fn is_under(endpoint: &Url, database_url: &Url) -> bool {
    let root = database_url.path().trim_end_matches('/');
    endpoint.origin() == database_url.origin()
        && endpoint
            .path()
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
}

impl OrderSink for OrderIngestClient {
    async fn submit_order(&self, order: &Order) -> Result<Option<RecordKey>, StoreError> {
        let endpoint = format!("POST {}", self.endpoint_url.path());

        let mut url = self.endpoint_url.clone();
        if self.auth_in_query {
            if let Some(token) = &self.auth {
                url.query_pairs_mut().append_pair("auth", token.as_str());
            }
        }
        let mut req = self.http.post(url).json(order);
        if !self.auth_in_query {
            if let Some(token) = &self.auth {
                req = req.header(AUTHORIZATION, format!("Bearer {}", token.as_str()));
            }
        }
        let resp = req.send().await.map_err(|e| StoreError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        let resp = check(&endpoint, resp).await?;

        let body = resp.bytes().await.map_err(|e| StoreError::Deserialization {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        let key = serde_json::from_slice::<Accepted>(&body)
            .ok()
            .and_then(|a| a.name)
            .map(RecordKey::new);
        tracing::info!(
            endpoint = %endpoint,
            key = ?key.as_ref().map(RecordKey::as_str),
            lines = order.items.len(),
            total = %order.total,
            "order submitted"
        );
        Ok(key)
    }
}
