// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ID token claims and the verified caller identity.

use serde::Deserialize;

/// Claims read from an identity provider ID token.
///
/// Only the fields the issuer needs; everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct IdTokenClaims {
    /// Subject (provider user ID)
    pub sub: String,

    /// Expiration timestamp
    #[serde(default)]
    pub exp: i64,

    /// Account email
    #[serde(default)]
    pub email: Option<String>,

    /// Whether the provider verified the email
    #[serde(default)]
    pub email_verified: Option<bool>,
}

/// Caller identity established from a verified ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Provider user ID (`sub`)
    pub subject: String,

    /// Verified email, used as the allowlist key
    pub email: Option<String>,

    /// ID token expiry (Unix timestamp)
    pub expires_at: i64,
}

impl VerifiedIdentity {
    /// Build from claims. An email the provider explicitly marks as
    /// unverified is dropped.
    pub fn from_claims(claims: IdTokenClaims) -> Self {
        let email = match claims.email_verified {
            Some(false) => None,
            _ => claims.email.filter(|e| !e.is_empty()),
        };

        Self {
            subject: claims.sub,
            email,
            expires_at: claims.exp,
        }
    }

    /// Identity string checked against the allowlist.
    pub fn allowlist_identity(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> IdTokenClaims {
        IdTokenClaims {
            sub: "uid_123".to_string(),
            exp: 1700003600,
            email: Some("user@example.com".to_string()),
            email_verified: Some(true),
        }
    }

    #[test]
    fn from_claims_extracts_email() {
        let identity = VerifiedIdentity::from_claims(sample_claims());
        assert_eq!(identity.subject, "uid_123");
        assert_eq!(identity.allowlist_identity(), Some("user@example.com"));
    }

    #[test]
    fn unverified_email_is_dropped() {
        let mut claims = sample_claims();
        claims.email_verified = Some(false);
        let identity = VerifiedIdentity::from_claims(claims);
        assert_eq!(identity.allowlist_identity(), None);
    }

    #[test]
    fn missing_verification_flag_keeps_email() {
        let mut claims = sample_claims();
        claims.email_verified = None;
        let identity = VerifiedIdentity::from_claims(claims);
        assert_eq!(identity.allowlist_identity(), Some("user@example.com"));
    }

    #[test]
    fn empty_email_is_dropped() {
        let mut claims = sample_claims();
        claims.email = Some(String::new());
        let identity = VerifiedIdentity::from_claims(claims);
        assert_eq!(identity.allowlist_identity(), None);
    }
}
