//! Artifact store for rendered overlays (local filesystem, S3/MinIO, memory).
//!
//! Every `put` replaces the whole object: the local backend writes to a
//! temporary file and renames it into place, and S3 puts are atomic, so a
//! reader never observes a partially written overlay.

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::{
    aws::AmazonS3Builder, local::LocalFileSystem, memory::InMemory, path::Path, ObjectStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use radar_common::{RadarError, RadarResult};

/// Connection settings for an S3-compatible artifact bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Use "us-east-1" for MinIO
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub allow_http: bool,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Listing entry: key and size in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub size: usize,
}

/// Named blob store for overlays, georeference sidecars and pointers.
#[derive(Clone)]
pub struct ArtifactStore {
    store: Arc<dyn ObjectStore>,
    location: String,
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("location", &self.location)
            .finish()
    }
}

fn storage_err(action: &str, key: &str, e: impl std::fmt::Display) -> RadarError {
    RadarError::StorageError(format!("Failed to {} {}: {}", action, key, e))
}

impl ArtifactStore {
    /// Store rooted at `dir`, created if missing.
    pub fn local(dir: impl AsRef<std::path::Path>) -> RadarResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let store = LocalFileSystem::new_with_prefix(dir)
            .map_err(|e| storage_err("open", &dir.display().to_string(), e))?;
        Ok(Self {
            store: Arc::new(store),
            location: dir.display().to_string(),
        })
    }

    pub fn s3(config: &S3Config) -> RadarResult<Self> {
        let store = AmazonS3Builder::new()
            .with_endpoint(&config.endpoint)
            .with_bucket_name(&config.bucket)
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.secret_access_key)
            .with_region(&config.region)
            .with_allow_http(config.allow_http)
            .build()
            .map_err(|e| storage_err("connect to bucket", &config.bucket, e))?;
        Ok(Self {
            store: Arc::new(store),
            location: format!("s3://{}", config.bucket),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            location: "memory".to_string(),
        }
    }

    /// Where this store writes, for logs.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Write (or replace) `key`.
    #[instrument(skip(self, data), fields(store = %self.location, key = %key))]
    pub async fn put(&self, key: &str, data: impl Into<Bytes>) -> RadarResult<()> {
        let data: Bytes = data.into();
        debug!(size = data.len(), "Writing artifact");
        self.store
            .put(&Path::from(key), data)
            .await
            .map_err(|e| storage_err("write", key, e))?;
        Ok(())
    }

    /// Serialize `value` as pretty JSON and write it to `key`.
    pub async fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> RadarResult<()> {
        let json = serde_json::to_vec_pretty(value).map_err(|e| storage_err("encode", key, e))?;
        self.put(key, json).await
    }

    pub async fn get(&self, key: &str) -> RadarResult<Bytes> {
        let result = self
            .store
            .get(&Path::from(key))
            .await
            .map_err(|e| storage_err("read", key, e))?;
        result.bytes().await.map_err(|e| storage_err("read", key, e))
    }

    pub async fn get_json<T: for<'de> Deserialize<'de>>(&self, key: &str) -> RadarResult<T> {
        let bytes = self.get(key).await?;
        serde_json::from_slice(&bytes).map_err(|e| storage_err("decode", key, e))
    }

    pub async fn exists(&self, key: &str) -> RadarResult<bool> {
        match self.store.head(&Path::from(key)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(storage_err("check", key, e)),
        }
    }

    /// Objects under `prefix` (a directory-like path such as `history`), sorted by key.
    pub async fn list(&self, prefix: Option<&str>) -> RadarResult<Vec<StoredObject>> {
        let label = prefix.unwrap_or_default().to_string();
        let prefix = prefix.map(Path::from);
        let mut objects: Vec<StoredObject> = self
            .store
            .list(prefix.as_ref())
            .map_ok(|meta| StoredObject {
                key: meta.location.to_string(),
                size: meta.size,
            })
            .try_collect()
            .await
            .map_err(|e| storage_err("list", &label, e))?;
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    pub async fn delete(&self, key: &str) -> RadarResult<()> {
        self.store
            .delete(&Path::from(key))
            .await
            .map_err(|e| storage_err("delete", key, e))
    }

    /// Keep the newest `keep` objects under `prefix` whose file name starts
    /// with `name_prefix`, deleting the rest. Names must sort chronologically.
    ///
    /// Returns the number of objects deleted.
    #[instrument(skip(self), fields(store = %self.location))]
    pub async fn prune(&self, prefix: &str, name_prefix: &str, keep: usize) -> RadarResult<usize> {
        let mut matching: Vec<StoredObject> = self
            .list(Some(prefix))
            .await?
            .into_iter()
            .filter(|o| {
                o.key
                    .rsplit('/')
                    .next()
                    .is_some_and(|name| name.starts_with(name_prefix))
            })
            .collect();

        if matching.len() <= keep {
            return Ok(0);
        }
        // Oldest first; everything before the newest `keep` goes
        let excess = matching.len() - keep;
        let stale: Vec<StoredObject> = matching.drain(..excess).collect();
        for object in &stale {
            self.delete(&object.key).await?;
        }
        info!(deleted = stale.len(), kept = keep, "Pruned history");
        Ok(stale.len())
    }
}
