// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Token Issuer
//!
//! Mints play tokens for allowlisted callers. Given a verified identity and
//! an asset id, the issuer:
//!
//! 1. rejects a missing identity (`unauthenticated`)
//! 2. rejects a missing asset id (`invalid-argument`)
//! 3. reads the allowlist entry and the asset record concurrently
//! 4. rejects callers not on the allowlist (`permission-denied`)
//! 5. rejects unknown assets (`not-found`)
//! 6. rejects assets without a usable manifest (`failed-precondition`)
//! 7. requires the signing secret and edge base URL (`internal`)
//!
//! and returns a token scoped to the manifest's directory. Nothing is
//! written; a revoked allowlist entry only affects later issuances.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

pub use crate::error::IssueError;
use crate::policy::{AccessPolicyStore, AssetRecord, PolicyStoreError};
use crate::token::{self, derive_prefix, PlayClaims, PrefixError, SigningSecret};

/// Token lifetime in the reference policy (2 hours).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Upper bound on the combined allowlist + asset read.
pub const DEFAULT_POLICY_READ_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct IssuerConfig {
    /// HMAC secret shared with the edge gate
    pub secret: Option<SigningSecret>,
    /// Edge gate URL handed to clients
    pub base_url: Option<String>,
    pub token_ttl: Duration,
    pub policy_read_timeout: Duration,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            secret: None,
            base_url: None,
            token_ttl: DEFAULT_TOKEN_TTL,
            policy_read_timeout: DEFAULT_POLICY_READ_TIMEOUT,
        }
    }
}

/// A freshly minted token and where to use it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayToken {
    pub token: String,
    /// Edge gate base URL, without trailing slash
    pub base_url: String,
    /// Scope the token was minted for
    pub prefix: String,
    /// Expiry (Unix seconds)
    pub expires_at: i64,
}

/// Outcome of the concurrent allowlist and asset reads.
type PolicyReads = (
    Result<bool, PolicyStoreError>,
    Result<Option<AssetRecord>, PolicyStoreError>,
);

pub struct TokenIssuer {
    policy: Arc<dyn AccessPolicyStore>,
    config: IssuerConfig,
}

impl TokenIssuer {
    pub fn new(policy: Arc<dyn AccessPolicyStore>, config: IssuerConfig) -> Self {
        Self { policy, config }
    }

    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }

    pub fn policy(&self) -> &Arc<dyn AccessPolicyStore> {
        &self.policy
    }

    /// Issue a play token for `asset_id` on behalf of `caller_identity`.
    pub async fn issue(
        &self,
        caller_identity: Option<&str>,
        asset_id: Option<&str>,
    ) -> Result<PlayToken, IssueError> {
        self.issue_at(caller_identity, asset_id, Utc::now().timestamp())
            .await
    }

    /// [`issue`](Self::issue) with an explicit clock (Unix seconds).
    pub async fn issue_at(
        &self,
        caller_identity: Option<&str>,
        asset_id: Option<&str>,
        now: i64,
    ) -> Result<PlayToken, IssueError> {
        let identity = caller_identity
            .filter(|id| !id.is_empty())
            .ok_or_else(|| IssueError::unauthenticated("You must be signed in."))?;

        let asset_id = asset_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| IssueError::invalid_argument("Missing movieId."))?;

        let (allowed, asset) = self.read_policy(identity, asset_id).await?;

        let allowed = allowed.map_err(|e| {
            tracing::error!(error = %e, "Allowlist lookup failed");
            IssueError::internal("Could not read the allowlist.")
        })?;
        if !allowed {
            tracing::info!(asset_id, "Play token denied: caller not on allowlist");
            return Err(IssueError::permission_denied(
                "You are not allowed to use this app.",
            ));
        }

        let asset = asset
            .map_err(|e| {
                tracing::error!(error = %e, asset_id, "Asset lookup failed");
                IssueError::internal("Could not read the movie record.")
            })?
            .ok_or_else(|| IssueError::not_found("Movie not found."))?;

        let manifest_path = asset.manifest_path().ok_or_else(|| {
            IssueError::failed_precondition("The movie has no manifestPath configured.")
        })?;

        let prefix = derive_prefix(manifest_path).map_err(|e| match e {
            PrefixError::Empty => {
                IssueError::failed_precondition("The movie has no manifestPath configured.")
            }
            PrefixError::NoDirectory(_) => IssueError::failed_precondition(
                "The movie manifest must live inside a directory.",
            ),
        })?;

        let secret = self
            .config
            .secret
            .as_ref()
            .ok_or_else(|| IssueError::internal("Signing secret is not configured."))?;

        let base_url = self
            .config
            .base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .ok_or_else(|| IssueError::internal("Edge base URL is not configured."))?;

        let ttl = i64::try_from(self.config.token_ttl.as_secs()).map_err(|_| {
            tracing::error!(
                ttl_secs = self.config.token_ttl.as_secs(),
                "Play token TTL out of range"
            );
            IssueError::internal("Play token lifetime is misconfigured.")
        })?;
        let expires_at = now.saturating_add(ttl);
        let claims = PlayClaims::scoped(expires_at, prefix.clone());
        let token = token::mint(&claims, secret).map_err(|e| {
            tracing::error!(error = %e, "Failed to mint play token");
            IssueError::internal("Could not create the play token.")
        })?;

        tracing::info!(asset_id, prefix = %prefix, expires_at, "Issued play token");

        Ok(PlayToken {
            token,
            base_url: base_url.to_string(),
            prefix,
            expires_at,
        })
    }

    /// Read the allowlist entry and the asset record. The two reads are
    /// independent, so they run concurrently under a single timeout.
    async fn read_policy(
        &self,
        identity: &str,
        asset_id: &str,
    ) -> Result<PolicyReads, IssueError> {
        let reads = async {
            tokio::join!(
                self.policy.is_allowed(identity),
                self.policy.asset(asset_id)
            )
        };

        tokio::time::timeout(self.config.policy_read_timeout, reads)
            .await
            .map_err(|_| {
                tracing::error!(
                    timeout_ms = self.config.policy_read_timeout.as_millis() as u64,
                    "Policy store read timed out"
                );
                IssueError::internal("The policy store did not respond in time.")
            })
    }
}
