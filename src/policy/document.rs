// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Policy store backed by JSON documents on disk.
//!
//! Documents are re-read on every lookup so edits by the administrative
//! process take effect on the next issuance without a restart.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};

use super::{AccessPolicyStore, AssetRecord, DocumentPaths, PolicyStoreError};

/// `config/allowedEmails` document.
#[derive(Debug, Default, Deserialize)]
struct AllowlistDocument {
    /// Email → flag. Only a literal `true` grants access.
    #[serde(default)]
    emails: HashMap<String, serde_json::Value>,
}

/// `movies/{id}` document. Catalog fields (title, poster, ...) are ignored.
#[derive(Debug, Deserialize)]
struct MovieDocument {
    #[serde(default, rename = "manifestPath")]
    manifest_path: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct DocumentPolicyStore {
    paths: DocumentPaths,
}

impl DocumentPolicyStore {
    pub fn new(paths: DocumentPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &DocumentPaths {
        &self.paths
    }

    /// Read and decode a document. `Ok(None)` when the file does not exist.
    async fn read_document<T: DeserializeOwned>(
        &self,
        path: &Path,
    ) -> Result<Option<T>, PolicyStoreError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| PolicyStoreError::InvalidDocument {
                path: path.display().to_string(),
                source,
            })
    }
}

#[async_trait]
impl AccessPolicyStore for DocumentPolicyStore {
    async fn is_allowed(&self, identity: &str) -> Result<bool, PolicyStoreError> {
        let path = self.paths.allowlist();
        let Some(document) = self.read_document::<AllowlistDocument>(&path).await? else {
            tracing::warn!(path = %path.display(), "Allowlist document missing, denying all");
            return Ok(false);
        };

        Ok(document
            .emails
            .get(identity)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false))
    }

    async fn asset(&self, asset_id: &str) -> Result<Option<AssetRecord>, PolicyStoreError> {
        let Some(path) = self.paths.movie(asset_id) else {
            return Ok(None);
        };

        let Some(document) = self.read_document::<MovieDocument>(&path).await? else {
            return Ok(None);
        };

        let manifest_path = match document.manifest_path {
            Some(serde_json::Value::String(path)) => Some(path),
            _ => None,
        };

        Ok(Some(AssetRecord {
            asset_id: asset_id.to_string(),
            manifest_path,
        }))
    }

    async fn health_check(&self) -> Result<(), PolicyStoreError> {
        let metadata = tokio::fs::metadata(self.paths.root()).await?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(PolicyStoreError::Unavailable(format!(
                "{} is not a directory",
                self.paths.root().display()
            )))
        }
    }
}
