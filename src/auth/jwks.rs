// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching for the identity provider.
//!
//! - Keys are fetched over HTTPS with a request timeout
//! - Keys are cached for a configurable TTL
//! - A fetch failure surfaces as [`AuthError::JwksFetchError`], which the
//!   issuer reports as an internal error rather than blaming the caller

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::RwLock;

use super::error::AuthError;

/// Default JWKS cache TTL (5 minutes).
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Timeout for a single JWKS request.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// JWKS manager with caching.
#[derive(Clone)]
pub struct JwksManager {
    jwks_url: String,
    cache_ttl: Duration,
    cache: Arc<RwLock<Option<CacheEntry>>>,
    client: reqwest::Client,
}

impl std::fmt::Debug for JwksManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksManager")
            .field("jwks_url", &self.jwks_url)
            .field("cache_ttl", &self.cache_ttl)
            .finish_non_exhaustive()
    }
}

impl JwksManager {
    /// Create a new JWKS manager for `jwks_url`, e.g.
    /// `https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com`.
    pub fn new(jwks_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Arc::new(RwLock::new(None)),
            client,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Fetch JWKS (with caching).
    async fn get_jwks(&self) -> Result<JwkSet, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                if entry.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(entry.jwks.clone());
                }
            }
        }

        let jwks = self.fetch_jwks().await?;

        {
            let mut cache = self.cache.write().await;
            *cache = Some(CacheEntry {
                jwks: jwks.clone(),
                fetched_at: Instant::now(),
            });
        }

        Ok(jwks)
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        tracing::debug!(url = %self.jwks_url, "Fetching identity provider JWKS");

        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetchError(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))
    }

    /// Get a decoding key for the given key ID.
    ///
    /// A `kid` missing from the cached set triggers one refetch, so keys the
    /// provider rotated in since the last fetch are picked up before the TTL
    /// expires.
    pub async fn get_decoding_key(&self, kid: &str) -> Result<(DecodingKey, Algorithm), AuthError> {
        let jwks = self.get_jwks().await?;
        if let Some(jwk) = find_key(&jwks, kid) {
            return jwk_to_decoding_key(jwk);
        }

        tracing::debug!(kid, "Key ID not in cached JWKS, refetching");
        let jwks = self.refetch().await?;
        let jwk = find_key(&jwks, kid).ok_or(AuthError::NoMatchingKey)?;
        jwk_to_decoding_key(jwk)
    }

    /// Get the first usable decoding key (for tokens without `kid`).
    pub async fn get_any_decoding_key(&self) -> Result<(DecodingKey, Algorithm), AuthError> {
        let jwks = self.get_jwks().await?;

        jwks.keys
            .iter()
            .find_map(|jwk| jwk_to_decoding_key(jwk).ok())
            .ok_or(AuthError::NoMatchingKey)
    }

    /// Force refresh the JWKS cache.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        self.refetch().await.map(|_| ())
    }

    async fn refetch(&self) -> Result<JwkSet, AuthError> {
        let jwks = self.fetch_jwks().await?;
        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            jwks: jwks.clone(),
            fetched_at: Instant::now(),
        });
        Ok(jwks)
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
    }
}

fn find_key<'a>(jwks: &'a JwkSet, kid: &str) -> Option<&'a Jwk> {
    jwks.keys
        .iter()
        .find(|k| k.common.key_id.as_deref() == Some(kid))
}

fn jwk_to_decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), AuthError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| AuthError::InternalError(format!("Failed to create RSA key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                _ => Algorithm::RS256,
            };

            Ok((key, alg))
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| AuthError::InternalError(format!("Failed to create EC key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                _ => Algorithm::ES256,
            };

            Ok((key, alg))
        }
        _ => Err(AuthError::InternalError(
            "Unsupported key type in JWKS".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn rsa_jwk(kid: &str) -> serde_json::Value {
        serde_json::json!({
            "kty": "RSA",
            "kid": kid,
            "alg": "RS256",
            "n": "wf9blw0Y0Z2QxWuDQw6yrUeKce2Wx1Q9ZN18_0VGuf1iLnRzOZedFLxMklSXA2s9lxl7g1l8UJCmwELaLOnGB13YdLxMmq-vo4LeveKibdZrTXSJ_fx5qvhI0popCU82iRBsdaeT07T4vxZnuD8VrxnHXMR581YKcLpv1LCvKgmthm2zjOEfZiNuONpfYplyUjVz1AUl8r0g2Muf39-xB5u7m4CLf45pWPjCapOHppTwY9YHCUn8DzVzAj4_hDQ7PoiYsCguFhT53SXSFeaRv2ffqV18TfkxDitwQYkCHbxfSoIdba2VSZeCHSO0GTXzfW1nu3BfjDU8mTGTXTY2qw",
            "e": "AQAB"
        })
    }

    /// Serves a JWKS holding `kid` and counts requests.
    async fn serve_jwks(kid: &'static str) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/jwks.json",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(serde_json::json!({ "keys": [rsa_jwk(kid)] }))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/jwks.json"), hits)
    }

    async fn seed_cache(manager: &JwksManager, kid: &str) {
        let jwks: JwkSet =
            serde_json::from_value(serde_json::json!({ "keys": [rsa_jwk(kid)] })).unwrap();
        *manager.cache.write().await = Some(CacheEntry {
            jwks,
            fetched_at: Instant::now(),
        });
    }

    #[test]
    fn jwks_manager_creation() {
        let manager = JwksManager::new("https://idp.example.com/.well-known/jwks.json");
        assert_eq!(
            manager.jwks_url(),
            "https://idp.example.com/.well-known/jwks.json"
        );
    }

    #[test]
    fn custom_cache_ttl() {
        let manager = JwksManager::new("https://idp.example.com/.well-known/jwks.json")
            .with_cache_ttl(Duration::from_secs(60));
        assert_eq!(manager.cache_ttl, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn cache_initially_empty() {
        let manager = JwksManager::new("https://idp.example.com/.well-known/jwks.json");
        assert!(!manager.is_cached().await);
    }

    #[tokio::test]
    async fn cached_kid_does_not_refetch() {
        let (url, hits) = serve_jwks("rotated").await;
        let manager = JwksManager::new(url);
        seed_cache(&manager, "current").await;

        let (_, alg) = manager.get_decoding_key("current").await.unwrap();
        assert_eq!(alg, Algorithm::RS256);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_kid_refetches_once() {
        let (url, hits) = serve_jwks("rotated").await;
        let manager = JwksManager::new(url);
        seed_cache(&manager, "current").await;

        manager.get_decoding_key("rotated").await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // The refetched set is cached.
        manager.get_decoding_key("rotated").await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn kid_missing_after_refetch_is_no_matching_key() {
        let (url, hits) = serve_jwks("rotated").await;
        let manager = JwksManager::new(url);
        seed_cache(&manager, "current").await;

        let err = manager.get_decoding_key("unknown").await.unwrap_err();
        assert!(matches!(err, AuthError::NoMatchingKey));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_fetch_error() {
        let manager = JwksManager::new("http://127.0.0.1:9/jwks.json");
        let err = manager.get_any_decoding_key().await.unwrap_err();
        assert!(matches!(err, AuthError::JwksFetchError(_)));
    }
}
