// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use thiserror::Error;

/// Failure to establish the caller's identity.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization header is required")]
    MissingAuthHeader,
    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,
    #[error("Token is malformed")]
    MalformedToken,
    #[error("Token signature is invalid")]
    InvalidSignature,
    #[error("Token has expired")]
    TokenExpired,
    #[error("Token issuer is invalid")]
    InvalidIssuer,
    #[error("Token audience is invalid")]
    InvalidAudience,
    #[error("Token is not yet valid")]
    TokenNotYetValid,
    #[error("No matching key found in JWKS")]
    NoMatchingKey,
    #[error("Failed to fetch JWKS: {0}")]
    JwksFetchError(String),
    #[error("Identity provider is not configured")]
    NotConfigured,
    #[error("Internal authentication error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::NoMatchingKey => "no_matching_key",
            AuthError::JwksFetchError(_) => "jwks_fetch_error",
            AuthError::NotConfigured => "not_configured",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Whether the caller is at fault (bad or missing credential) as opposed
    /// to the server (unreachable JWKS, missing configuration).
    pub fn is_credential_error(&self) -> bool {
        !matches!(
            self,
            AuthError::JwksFetchError(_) | AuthError::NotConfigured | AuthError::InternalError(_)
        )
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
            ErrorKind::InvalidAudience => AuthError::InvalidAudience,
            ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
            _ => AuthError::MalformedToken,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_errors_are_distinguished_from_server_faults() {
        assert!(AuthError::MissingAuthHeader.is_credential_error());
        assert!(AuthError::TokenExpired.is_credential_error());
        assert!(AuthError::NoMatchingKey.is_credential_error());
        assert!(!AuthError::JwksFetchError("timeout".into()).is_credential_error());
        assert!(!AuthError::NotConfigured.is_credential_error());
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(AuthError::MissingAuthHeader.error_code(), "missing_auth_header");
        assert_eq!(AuthError::InvalidSignature.error_code(), "invalid_signature");
    }
}
