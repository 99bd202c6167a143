// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Issuer error taxonomy.
//!
//! Every failure of a play-token request is one of six kinds, reported to
//! the client as a `(code, message)` pair it can branch on:
//!
//! ```json
//! {"error": "You are not allowed to use this app.", "error_code": "permission-denied"}
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::auth::AuthError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IssueError {
    /// No verified caller identity
    #[error("{0}")]
    Unauthenticated(String),
    /// Malformed request shape
    #[error("{0}")]
    InvalidArgument(String),
    /// Caller not on the allowlist
    #[error("{0}")]
    PermissionDenied(String),
    /// Unknown asset
    #[error("{0}")]
    NotFound(String),
    /// Asset metadata incomplete
    #[error("{0}")]
    FailedPrecondition(String),
    /// Missing configuration or store failure
    #[error("{0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable message
    pub error: String,
    /// One of `unauthenticated`, `invalid-argument`, `permission-denied`,
    /// `not-found`, `failed-precondition`, `internal`
    pub error_code: String,
}

impl IssueError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::FailedPrecondition(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Machine-readable error kind.
    pub fn code(&self) -> &'static str {
        match self {
            IssueError::Unauthenticated(_) => "unauthenticated",
            IssueError::InvalidArgument(_) => "invalid-argument",
            IssueError::PermissionDenied(_) => "permission-denied",
            IssueError::NotFound(_) => "not-found",
            IssueError::FailedPrecondition(_) => "failed-precondition",
            IssueError::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            IssueError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            IssueError::InvalidArgument(_) | IssueError::FailedPrecondition(_) => {
                StatusCode::BAD_REQUEST
            }
            IssueError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            IssueError::NotFound(_) => StatusCode::NOT_FOUND,
            IssueError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for IssueError {
    fn from(e: AuthError) -> Self {
        if e.is_credential_error() {
            IssueError::unauthenticated(e.to_string())
        } else {
            tracing::error!(error = %e, "Identity provider unavailable");
            IssueError::internal("Identity verification is unavailable.")
        }
    }
}

impl IntoResponse for IssueError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorBody {
            error_code: self.code().to_string(),
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn codes_and_statuses() {
        let cases = [
            (IssueError::unauthenticated("x"), "unauthenticated", StatusCode::UNAUTHORIZED),
            (IssueError::invalid_argument("x"), "invalid-argument", StatusCode::BAD_REQUEST),
            (IssueError::permission_denied("x"), "permission-denied", StatusCode::FORBIDDEN),
            (IssueError::not_found("x"), "not-found", StatusCode::NOT_FOUND),
            (
                IssueError::failed_precondition("x"),
                "failed-precondition",
                StatusCode::BAD_REQUEST,
            ),
            (IssueError::internal("x"), "internal", StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, code, status) in cases {
            assert_eq!(error.code(), code);
            assert_eq!(error.status_code(), status);
        }
    }

    #[test]
    fn auth_errors_map_by_fault() {
        assert!(matches!(
            IssueError::from(AuthError::TokenExpired),
            IssueError::Unauthenticated(_)
        ));
        assert!(matches!(
            IssueError::from(AuthError::JwksFetchError("down".into())),
            IssueError::Internal(_)
        ));
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = IssueError::not_found("Movie not found.").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error"], "Movie not found.");
        assert_eq!(body["error_code"], "not-found");
    }
}
