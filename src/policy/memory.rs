// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory policy store, used for tests and seeded local runs.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{AccessPolicyStore, AssetRecord, PolicyStoreError};

#[derive(Debug, Default, Clone)]
pub struct InMemoryPolicyStore {
    allowlist: HashMap<String, bool>,
    assets: HashMap<String, AssetRecord>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_allowlist_entry(&mut self, identity: impl Into<String>, allowed: bool) {
        self.allowlist.insert(identity.into(), allowed);
    }

    pub fn insert_asset(&mut self, record: AssetRecord) {
        self.assets.insert(record.asset_id.clone(), record);
    }

    pub fn with_allowlist_entry(mut self, identity: impl Into<String>, allowed: bool) -> Self {
        self.insert_allowlist_entry(identity, allowed);
        self
    }

    pub fn with_asset(mut self, record: AssetRecord) -> Self {
        self.insert_asset(record);
        self
    }
}

#[async_trait]
impl AccessPolicyStore for InMemoryPolicyStore {
    async fn is_allowed(&self, identity: &str) -> Result<bool, PolicyStoreError> {
        Ok(self.allowlist.get(identity).copied().unwrap_or(false))
    }

    async fn asset(&self, asset_id: &str) -> Result<Option<AssetRecord>, PolicyStoreError> {
        Ok(self.assets.get(asset_id).cloned())
    }
}
