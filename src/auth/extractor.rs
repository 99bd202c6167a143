// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the issuer's caller identity.
//!
//! ```rust,ignore
//! async fn play_token(Caller(identity): Caller, ...) -> ... {
//!     // identity.email is the verified account email
//! }
//! ```

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, decode_header, Validation};

use super::claims::{IdTokenClaims, VerifiedIdentity};
use super::{AuthError, JwksManager};
use crate::issuer::IssueError;
use crate::state::IssuerState;

/// Clock skew tolerance for ID tokens (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Identity provider verification settings.
#[derive(Debug, Clone, Default)]
pub struct IdentityConfig {
    /// JWKS manager; `None` when no provider is configured
    pub jwks: Option<Arc<JwksManager>>,
    /// Expected `iss` claim
    pub issuer: Option<String>,
    /// Expected `aud` claim (the provider project / client id)
    pub audience: Option<String>,
}

impl IdentityConfig {
    pub fn new(jwks_url: impl Into<String>) -> Self {
        Self {
            jwks: Some(Arc::new(JwksManager::new(jwks_url))),
            issuer: None,
            audience: None,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Verify an ID token and return the caller it identifies.
    pub async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        match &self.jwks {
            Some(jwks) => self.verify_with_jwks(token, jwks).await,
            None => verify_without_provider(token),
        }
    }

    async fn verify_with_jwks(
        &self,
        token: &str,
        jwks: &JwksManager,
    ) -> Result<VerifiedIdentity, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;

        let (decoding_key, algorithm) = match &header.kid {
            Some(kid) => jwks.get_decoding_key(kid).await?,
            None => jwks.get_any_decoding_key().await?,
        };

        let mut validation = Validation::new(algorithm);
        validation.leeway = CLOCK_SKEW_LEEWAY;

        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }

        if let Some(audience) = &self.audience {
            validation.set_audience(&[audience]);
        } else {
            validation.validate_aud = false;
        }

        let token_data = decode::<IdTokenClaims>(token, &decoding_key, &validation)?;
        Ok(VerifiedIdentity::from_claims(token_data.claims))
    }
}

/// Development mode: decode without signature verification.
///
/// WARNING: only compiled with the `dev` feature.
#[cfg(feature = "dev")]
fn verify_without_provider(token: &str) -> Result<VerifiedIdentity, AuthError> {
    let token_data = jsonwebtoken::dangerous::insecure_decode::<IdTokenClaims>(token)
        .map_err(|_| AuthError::MalformedToken)?;

    let claims = token_data.claims;
    let now = chrono::Utc::now().timestamp();
    if claims.exp > 0 && claims.exp < now - CLOCK_SKEW_LEEWAY as i64 {
        return Err(AuthError::TokenExpired);
    }

    tracing::warn!(sub = %claims.sub, "Accepted unverified ID token (dev mode)");
    Ok(VerifiedIdentity::from_claims(claims))
}

#[cfg(not(feature = "dev"))]
fn verify_without_provider(_token: &str) -> Result<VerifiedIdentity, AuthError> {
    Err(AuthError::NotConfigured)
}

/// Extractor for the verified caller.
///
/// Rejects with [`IssueError::Unauthenticated`] for missing or invalid
/// credentials and [`IssueError::Internal`] when the provider cannot be
/// consulted.
pub struct Caller(pub VerifiedIdentity);

impl FromRequestParts<IssuerState> for Caller {
    type Rejection = IssueError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &IssuerState,
    ) -> Result<Self, Self::Rejection> {
        // An upstream layer may already have authenticated the request
        if let Some(identity) = parts.extensions.get::<VerifiedIdentity>().cloned() {
            return Ok(Caller(identity));
        }

        let token = bearer_token(parts)?;

        let identity = state.identity.verify(token).await.map_err(|e| {
            tracing::info!(error_code = e.error_code(), "Caller authentication failed");
            IssueError::from(e)
        })?;

        Ok(Caller(identity))
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidAuthHeader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::{IssuerConfig, TokenIssuer};
    use crate::policy::InMemoryPolicyStore;
    use axum::http::Request;

    fn test_state(identity: IdentityConfig) -> IssuerState {
        let issuer = TokenIssuer::new(
            Arc::new(InMemoryPolicyStore::new()),
            IssuerConfig::default(),
        );
        IssuerState::new(issuer, identity)
    }

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/v1/play-token");
        if let Some(value) = header {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn missing_header_is_unauthenticated() {
        let state = test_state(IdentityConfig::default());
        let mut parts = parts_with(None);

        let result = Caller::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(IssueError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn non_bearer_header_is_unauthenticated() {
        let state = test_state(IdentityConfig::default());
        let mut parts = parts_with(Some("Basic dXNlcjpwYXNz"));

        let result = Caller::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(IssueError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn garbage_token_is_unauthenticated() {
        let state = test_state(IdentityConfig::new("http://127.0.0.1:9/jwks.json"));
        let mut parts = parts_with(Some("Bearer not-a-jwt"));

        let result = Caller::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(IssueError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn unreachable_provider_is_internal() {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT","kid":"k1"}"#);
        let claims = URL_SAFE_NO_PAD.encode(r#"{"sub":"uid","exp":9999999999}"#);
        let token = format!("{header}.{claims}.c2ln");

        let state = test_state(IdentityConfig::new("http://127.0.0.1:9/jwks.json"));
        let mut parts = parts_with(Some(&format!("Bearer {token}")));

        let result = Caller::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(IssueError::Internal(_))));
    }

    #[cfg(not(feature = "dev"))]
    #[tokio::test]
    async fn unconfigured_provider_is_internal() {
        let state = test_state(IdentityConfig::default());
        let mut parts = parts_with(Some("Bearer a.b.c"));

        let result = Caller::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(IssueError::Internal(_))));
    }

    #[tokio::test]
    async fn caller_prefers_extensions() {
        let state = test_state(IdentityConfig::default());
        let mut parts = parts_with(None);

        let identity = VerifiedIdentity {
            subject: "uid_from_layer".to_string(),
            email: Some("user@example.com".to_string()),
            expires_at: 0,
        };
        parts.extensions.insert(identity.clone());

        let Caller(found) = Caller::from_request_parts(&mut parts, &state)
            .await
            .unwrap_or_else(|_| panic!("extension identity should be accepted"));
        assert_eq!(found, identity);
    }
}
