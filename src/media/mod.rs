// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Media Object Store
//!
//! Read access to the object store holding manifests and segments. The edge
//! gate only ever calls [`MediaStore::fetch`]; `put` exists for seeding and
//! tests.
//!
//! Backends come from the `object_store` crate:
//!
//! | Config | Backend |
//! |--------|---------|
//! | `memory` | `InMemory` (tests) |
//! | `local` | `LocalFileSystem` rooted at a directory |
//! | `s3` | `AmazonS3` (AWS S3, Cloudflare R2, MinIO) |

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::BoxStream;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ClientOptions, ObjectStore, PutPayload};
use thiserror::Error;

pub mod content_type;

pub use content_type::content_type_for;

/// Default bound on how long a fetch may take to start returning data.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Object storage backend configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ObjectStoreConfig {
    #[default]
    Memory,

    Local {
        path: PathBuf,
    },

    /// S3-compatible storage (S3, R2, MinIO).
    S3 {
        endpoint: String,
        bucket: String,
        access_key: String,
        secret_key: String,
        /// Defaults to `auto`, which R2 expects.
        region: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum MediaStoreError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    #[error("object store request timed out after {0:?}")]
    Timeout(Duration),
    #[error("object store configuration error: {0}")]
    Config(String),
    #[error("object store error: {0}")]
    Backend(#[source] object_store::Error),
}

impl From<object_store::Error> for MediaStoreError {
    fn from(e: object_store::Error) -> Self {
        match e {
            object_store::Error::NotFound { path, .. } => MediaStoreError::NotFound(path),
            other => MediaStoreError::Backend(other),
        }
    }
}

/// An object ready to be streamed to a client.
pub struct StoredObject {
    pub key: String,
    pub content_type: &'static str,
    pub etag: Option<String>,
    pub size: u64,
    pub body: BoxStream<'static, object_store::Result<Bytes>>,
}

impl std::fmt::Debug for StoredObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredObject")
            .field("key", &self.key)
            .field("content_type", &self.content_type)
            .field("etag", &self.etag)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Handle to the media object store.
#[derive(Debug, Clone)]
pub struct MediaStore {
    inner: Arc<dyn ObjectStore>,
    fetch_timeout: Duration,
}

impl MediaStore {
    pub fn new(inner: Arc<dyn ObjectStore>) -> Self {
        Self {
            inner,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()))
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Build the backend described by `config`.
    pub async fn from_config(
        config: &ObjectStoreConfig,
        fetch_timeout: Duration,
    ) -> Result<Self, MediaStoreError> {
        let inner: Arc<dyn ObjectStore> = match config {
            ObjectStoreConfig::Memory => Arc::new(InMemory::new()),

            ObjectStoreConfig::Local { path } => {
                tokio::fs::create_dir_all(path)
                    .await
                    .map_err(|e| MediaStoreError::Config(e.to_string()))?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(path)
                        .map_err(|e| MediaStoreError::Config(e.to_string()))?,
                )
            }

            ObjectStoreConfig::S3 {
                endpoint,
                bucket,
                access_key,
                secret_key,
                region,
            } => Arc::new(
                AmazonS3Builder::new()
                    .with_endpoint(endpoint)
                    .with_bucket_name(bucket)
                    .with_access_key_id(access_key)
                    .with_secret_access_key(secret_key)
                    .with_region(region.as_deref().unwrap_or("auto"))
                    .with_allow_http(endpoint.starts_with("http://"))
                    .with_client_options(ClientOptions::new().with_timeout(fetch_timeout))
                    .build()
                    .map_err(|e| MediaStoreError::Config(e.to_string()))?,
            ),
        };

        Ok(Self::new(inner).with_fetch_timeout(fetch_timeout))
    }

    /// Fetch an object by key.
    ///
    /// Dropping the returned body stream abandons the read.
    pub async fn fetch(&self, key: &str) -> Result<StoredObject, MediaStoreError> {
        let path = object_path(key)?;

        let result = tokio::time::timeout(self.fetch_timeout, self.inner.get(&path))
            .await
            .map_err(|_| MediaStoreError::Timeout(self.fetch_timeout))??;

        let etag = result.meta.e_tag.clone();
        let size = result.meta.size as u64;

        Ok(StoredObject {
            key: key.to_string(),
            content_type: content_type_for(key),
            etag,
            size,
            body: result.into_stream(),
        })
    }

    /// Store an object.
    pub async fn put(&self, key: &str, data: impl Into<Bytes>) -> Result<(), MediaStoreError> {
        let path = object_path(key)?;
        self.inner
            .put(&path, PutPayload::from(data.into()))
            .await?;
        Ok(())
    }
}

fn object_path(key: &str) -> Result<ObjectPath, MediaStoreError> {
    if key.is_empty() {
        return Err(MediaStoreError::InvalidKey(key.to_string()));
    }
    ObjectPath::parse(key).map_err(|e| MediaStoreError::InvalidKey(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use object_store::throttle::{ThrottleConfig, ThrottledStore};
    use tempfile::TempDir;

    async fn read_body(object: StoredObject) -> Vec<u8> {
        let chunks: Vec<Bytes> = object.body.try_collect().await.unwrap();
        chunks.concat()
    }

    #[tokio::test]
    async fn fetch_returns_body_and_metadata() {
        let store = MediaStore::in_memory();
        store
            .put("movies/space-trip/master.m3u8", "#EXTM3U\n")
            .await
            .unwrap();

        let object = store.fetch("movies/space-trip/master.m3u8").await.unwrap();
        assert_eq!(object.content_type, content_type::HLS_PLAYLIST);
        assert_eq!(object.size, 8);
        assert!(object.etag.is_some());
        assert_eq!(read_body(object).await, b"#EXTM3U\n");
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let store = MediaStore::in_memory();
        let err = store.fetch("movies/none/master.m3u8").await.unwrap_err();
        assert!(matches!(err, MediaStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn unparseable_key_is_invalid() {
        let store = MediaStore::in_memory();
        assert!(matches!(
            store.fetch("movies/../secret").await,
            Err(MediaStoreError::InvalidKey(_))
        ));
        assert!(matches!(
            store.fetch("movies//seg.ts").await,
            Err(MediaStoreError::InvalidKey(_))
        ));
        assert!(matches!(store.fetch("").await, Err(MediaStoreError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let slow = ThrottledStore::new(
            InMemory::new(),
            ThrottleConfig {
                wait_get_per_call: Duration::from_secs(5),
                ..ThrottleConfig::default()
            },
        );
        let store = MediaStore::new(Arc::new(slow)).with_fetch_timeout(Duration::from_millis(50));
        store.put("movies/a/seg0.ts", vec![0u8; 4]).await.unwrap();

        let err = store.fetch("movies/a/seg0.ts").await.unwrap_err();
        assert!(matches!(err, MediaStoreError::Timeout(t) if t == Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn local_backend_reads_files() {
        let dir = TempDir::new().unwrap();
        let config = ObjectStoreConfig::Local {
            path: dir.path().join("media"),
        };
        let store = MediaStore::from_config(&config, DEFAULT_FETCH_TIMEOUT)
            .await
            .unwrap();

        store.put("movies/a/seg0.ts", vec![1u8, 2, 3]).await.unwrap();
        let object = store.fetch("movies/a/seg0.ts").await.unwrap();
        assert_eq!(object.content_type, content_type::MPEG_TS);
        assert_eq!(read_body(object).await, vec![1u8, 2, 3]);
    }
}
