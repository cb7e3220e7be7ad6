//! Blob storage backends for uploaded media.
//!
//! Images and audio clips reference their payload by object name. Two
//! backends resolve those names:
//! - `FilesystemBlobStore` reads from a local directory (development, tests)
//! - `BucketBlobStore` downloads from a cloud bucket over the GCS JSON API
//!
//! ## Example
//!
//! ```rust,ignore
//! use jotter_db::storage::blob_store_for_bucket;
//!
//! let store = blob_store_for_bucket("journal-media", None, None)?;
//! let bytes = store.fetch("users/42/images/receipt.jpg").await?;
//! ```

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio::fs;
use tracing::{debug, instrument, warn};

use jotter_core::defaults::{BLOB_TIMEOUT_SECS, BLOB_URL};
use jotter_core::{BlobStore, Error, Result};

/// Prefix that selects the filesystem backend in a bucket identifier.
pub const FILE_BUCKET_PREFIX: &str = "file://";

/// Pick a backend for a bucket identifier.
///
/// `file:///var/jotter/blobs` selects the filesystem backend rooted at that
/// directory; anything else is treated as a cloud bucket name.
pub fn blob_store_for_bucket(
    bucket: &str,
    base_url: Option<String>,
    access_token: Option<String>,
) -> Result<Arc<dyn BlobStore>> {
    let bucket = bucket.trim();
    if bucket.is_empty() {
        return Err(Error::Config("blob bucket identifier is empty".to_string()));
    }

    if let Some(root) = bucket.strip_prefix(FILE_BUCKET_PREFIX) {
        return Ok(Arc::new(FilesystemBlobStore::new(root)));
    }

    let mut store = BucketBlobStore::new(
        base_url.unwrap_or_else(|| BLOB_URL.to_string()),
        bucket.to_string(),
    )?;
    if let Some(token) = access_token.filter(|t| !t.is_empty()) {
        store = store.with_access_token(token);
    }
    Ok(Arc::new(store))
}

// =============================================================================
// FILESYSTEM
// =============================================================================

/// Filesystem storage backend.
///
/// Object names are relative paths below the root directory.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
}

impl FilesystemBlobStore {
    /// Create a new filesystem backend with the given base directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, object_name: &str) -> Result<PathBuf> {
        let relative = Path::new(object_name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if object_name.is_empty() || escapes {
            return Err(Error::InvalidInput(format!(
                "object name '{}' is not a relative path",
                object_name
            )));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn fetch(&self, object_name: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(object_name)?;
        debug!(object_name, full_path = %full_path.display(), "blob_store: read");

        match fs::read(&full_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("blob {}", object_name)))
            }
            Err(e) => {
                warn!(object_name, error = %e, "blob_store: read failed");
                Err(Error::Io(e))
            }
        }
    }

    fn name(&self) -> &str {
        "filesystem"
    }
}

// =============================================================================
// CLOUD BUCKET
// =============================================================================

/// Cloud bucket backend speaking the GCS JSON API media download endpoint.
pub struct BucketBlobStore {
    client: Client,
    base_url: String,
    bucket: String,
    access_token: Option<String>,
}

impl BucketBlobStore {
    /// Create a new bucket backend.
    pub fn new(base_url: String, bucket: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(BLOB_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket,
            access_token: None,
        })
    }

    /// Send a bearer token with every download.
    pub fn with_access_token(mut self, token: String) -> Self {
        self.access_token = Some(token);
        self
    }

    fn object_url(&self, object_name: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}?alt=media",
            self.base_url,
            urlencoding::encode(&self.bucket),
            urlencoding::encode(object_name)
        )
    }
}

#[async_trait]
impl BlobStore for BucketBlobStore {
    #[instrument(skip(self), fields(subsystem = "storage", component = "bucket", op = "fetch", bucket = %self.bucket))]
    async fn fetch(&self, object_name: &str) -> Result<Vec<u8>> {
        let mut request = self.client.get(self.object_url(object_name));
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Storage(format!("download request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("blob {}", object_name)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Storage(format!(
                "bucket returned {}: {}",
                status, body
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Storage(format!("failed to read object body: {}", e)))?;
        debug!(size = bytes.len(), "blob downloaded");
        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        "bucket"
    }
}
