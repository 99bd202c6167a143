// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Access Policy Store
//!
//! Read-only view of the two documents the issuer consults:
//!
//! - the **allowlist**: identity (email) → permission flag, default-deny
//! - **asset records**: asset id → manifest storage path
//!
//! Both are owned by an external administrative process. The issuer never
//! writes to them.
//!
//! The store is an explicit handle passed to the issuer at construction; the
//! process bootstrap owns its lifecycle.

use async_trait::async_trait;
use thiserror::Error;

pub mod document;
pub mod memory;
pub mod paths;

pub use document::DocumentPolicyStore;
pub use memory::InMemoryPolicyStore;
pub use paths::DocumentPaths;

/// Asset metadata as seen by the issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub asset_id: String,
    /// Storage key of the asset's manifest. `None` when the record exists but
    /// was never given a manifest.
    pub manifest_path: Option<String>,
}

impl AssetRecord {
    pub fn new(asset_id: impl Into<String>, manifest_path: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            manifest_path: Some(manifest_path.into()),
        }
    }

    /// The manifest path, treating an empty string as missing.
    pub fn manifest_path(&self) -> Option<&str> {
        self.manifest_path.as_deref().filter(|p| !p.is_empty())
    }
}

/// Failures reading policy documents.
#[derive(Debug, Error)]
pub enum PolicyStoreError {
    #[error("policy store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("policy document {path} is invalid: {source}")]
    InvalidDocument {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("policy store unavailable: {0}")]
    Unavailable(String),
}

/// Read contract over the allowlist and asset records.
#[async_trait]
pub trait AccessPolicyStore: Send + Sync {
    /// Whether `identity` is on the allowlist with its flag set.
    /// Absent entries are `false`.
    async fn is_allowed(&self, identity: &str) -> Result<bool, PolicyStoreError>;

    /// Look up an asset record. `Ok(None)` when no such asset exists.
    async fn asset(&self, asset_id: &str) -> Result<Option<AssetRecord>, PolicyStoreError>;

    /// Cheap reachability check used by readiness.
    async fn health_check(&self) -> Result<(), PolicyStoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_manifest_counts_as_missing() {
        let record = AssetRecord {
            asset_id: "a".into(),
            manifest_path: Some(String::new()),
        };
        assert_eq!(record.manifest_path(), None);

        let record = AssetRecord::new("a", "movies/a/master.m3u8");
        assert_eq!(record.manifest_path(), Some("movies/a/master.m3u8"));
    }
}
