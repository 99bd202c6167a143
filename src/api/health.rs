// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::IssuerState;

const OK: &str = "ok";

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Policy store reachability.
    pub policy_store: String,
    /// Whether the signing secret and edge base URL are configured.
    pub signing: String,
    /// JWKS (identity provider keys) status.
    /// Only present when a JWKS URL is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks: Option<String>,
}

/// Simple health check response for liveness checks.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

async fn check_policy_store(state: &IssuerState) -> String {
    match state.issuer.policy().health_check().await {
        Ok(()) => OK.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Policy store health check failed");
            "unavailable".to_string()
        }
    }
}

fn check_signing(state: &IssuerState) -> String {
    let config = state.issuer.config();
    if config.secret.is_some() && config.base_url.is_some() {
        OK.to_string()
    } else {
        "missing".to_string()
    }
}

async fn check_jwks(state: &IssuerState) -> Option<String> {
    let jwks = state.identity.jwks.as_ref()?;
    if jwks.is_cached().await {
        return Some(OK.to_string());
    }
    match jwks.refresh().await {
        Ok(()) => Some(OK.to_string()),
        Err(_) => Some("unavailable".to_string()),
    }
}

/// Health check endpoint handler.
///
/// Returns 200 if all checks pass, 503 if any check fails.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Service is unhealthy", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<IssuerState>) -> (StatusCode, Json<ReadyResponse>) {
    let (policy_store, jwks) = tokio::join!(check_policy_store(&state), check_jwks(&state));
    let signing = check_signing(&state);

    let all_ok = policy_store == OK
        && signing == OK
        && jwks.as_deref().map(|s| s == OK).unwrap_or(true);

    let response = ReadyResponse {
        status: if all_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: OK.to_string(),
            policy_store,
            signing,
            jwks,
        },
    };

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Liveness check handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: OK.to_string(),
    })
}

/// Readiness check handler.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(state: State<IssuerState>) -> (StatusCode, Json<ReadyResponse>) {
    health(state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::IdentityConfig;
    use crate::issuer::{IssuerConfig, TokenIssuer};
    use crate::policy::{DocumentPaths, DocumentPolicyStore, InMemoryPolicyStore};
    use crate::token::SigningSecret;
    use std::sync::Arc;

    fn configured() -> IssuerConfig {
        IssuerConfig {
            secret: SigningSecret::new("health-secret"),
            base_url: Some("https://media.example.com".to_string()),
            ..IssuerConfig::default()
        }
    }

    #[tokio::test]
    async fn healthy_when_configured() {
        let issuer = TokenIssuer::new(Arc::new(InMemoryPolicyStore::new()), configured());
        let state = IssuerState::new(issuer, IdentityConfig::default());

        let (status, Json(body)) = health(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert!(body.checks.jwks.is_none());
    }

    #[tokio::test]
    async fn missing_secret_is_degraded() {
        let issuer = TokenIssuer::new(
            Arc::new(InMemoryPolicyStore::new()),
            IssuerConfig::default(),
        );
        let state = IssuerState::new(issuer, IdentityConfig::default());

        let (status, Json(body)) = readiness(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.checks.signing, "missing");
    }

    #[tokio::test]
    async fn unreachable_policy_store_is_degraded() {
        let store = DocumentPolicyStore::new(DocumentPaths::new("/nonexistent/policy-root"));
        let issuer = TokenIssuer::new(Arc::new(store), configured());
        let state = IssuerState::new(issuer, IdentityConfig::default());

        let (status, Json(body)) = health(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.checks.policy_store, "unavailable");
    }

    #[tokio::test]
    async fn liveness_is_always_ok() {
        let Json(body) = liveness().await;
        assert_eq!(body.status, "ok");
    }
}
