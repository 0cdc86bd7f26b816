//! Typed client for blob storage (product images).
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/v0/b/{bucket}/o?uploadType=media&name={path}` | Upload bytes |
//! | GET    | `/v0/b/{bucket}/o/{encoded path}?alt=media&token={t}` | Retrieval URL |
//!
//! The upload response carries the object's download tokens; the first one
//! is embedded in the retrieval URL so the image is readable without
//! credentials.

use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use kaimanam_core::ImageFile;

use crate::config::ConfigError;
use crate::database::check;
use crate::error::StoreError;
use crate::repository::BlobStore;

/// Object metadata returned by an upload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub name: String,
    #[serde(default)]
    pub bucket: Option<String>,
    /// Comma-separated download tokens.
    #[serde(default)]
    pub download_tokens: Option<String>,
}

/// Client for image uploads.
#[derive(Clone)]
pub struct BlobClient {
    http: reqwest::Client,
    base_url: Url,
    bucket: Option<String>,
    auth: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for BlobClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobClient")
            .field("base_url", &self.base_url)
            .field("bucket", &self.bucket)
            .field("auth", &self.auth.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl BlobClient {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: Url,
        bucket: Option<String>,
        auth: Option<Zeroizing<String>>,
    ) -> Self {
        Self {
            http,
            base_url,
            bucket,
            auth,
        }
    }

    /// `{base}/v0/b/{bucket}/o`, with `extra` appended as one more segment.
    fn object_url(&self, bucket: &str, extra: Option<&str>) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                ConfigError::InvalidUrl(
                    "storage_url".to_string(),
                    "not a hierarchical URL".to_string(),
                )
            })?;
            segments.pop_if_empty().extend(["v0", "b", bucket, "o"]);
            if let Some(extra) = extra {
                // A `/` inside the object name is escaped to `%2F`.
                segments.push(extra);
            }
        }
        Ok(url)
    }

    /// The public retrieval URL of a stored object.
    pub fn download_url(&self, object: &StoredObject) -> Result<String, StoreError> {
        let bucket = object
            .bucket
            .as_deref()
            .or(self.bucket.as_deref())
            .ok_or(ConfigError::MissingBucket)?;
        let mut url = self.object_url(bucket, Some(&object.name))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("alt", "media");
            let token = object
                .download_tokens
                .as_deref()
                .and_then(|t| t.split(',').map(str::trim).find(|t| !t.is_empty()));
            if let Some(token) = token {
                query.append_pair("token", token);
            }
        }
        Ok(url.into())
    }

    /// Upload an image and return the object metadata.
    pub async fn upload(&self, image: &ImageFile) -> Result<StoredObject, StoreError> {
        let bucket = self.bucket.as_deref().ok_or(ConfigError::MissingBucket)?;
        let path = image.storage_path();
        let endpoint = format!("POST /o/{path}");

        let mut url = self.object_url(bucket, None)?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", &path);

        let content_type = HeaderValue::from_str(&image.content_type).map_err(|_| StoreError::Api {
            endpoint: endpoint.clone(),
            status: 0,
            body: format!("unusable content type {:?}", image.content_type),
        })?;
        let mut req = self
            .http
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(image.bytes.clone());
        if let Some(token) = &self.auth {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token.as_str()));
        }

        let resp = req.send().await.map_err(|e| StoreError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        let resp = check(&endpoint, resp).await?;

        let object: StoredObject = resp.json().await.map_err(|e| StoreError::Deserialization {
            endpoint,
            source: e,
        })?;
        tracing::info!(path = %object.name, bytes = image.bytes.len(), "image uploaded");
        Ok(object)
    }
}

impl BlobStore for BlobClient {
    async fn upload_image(&self, image: &ImageFile) -> Result<String, StoreError> {
        let object = self.upload(image).await?;
        self.download_url(&object)
    }
}
