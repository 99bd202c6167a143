// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Play token header and claims.

use serde::{Deserialize, Serialize};

/// The only signing algorithm minted or accepted.
pub const ALGORITHM: &str = "HS256";

/// Token type declared in the header.
pub const TOKEN_TYPE: &str = "JWT";

/// JOSE header of a play token.
///
/// Field order matters for the encoded form: `alg` first, then `typ`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: Some(TOKEN_TYPE.to_string()),
        }
    }
}

/// Claims carried by a play token.
///
/// The edge gate trusts nothing else, so the shape is closed: a payload with
/// any additional claim fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayClaims {
    /// Absolute expiry (Unix seconds). Rejected once `now >= exp`.
    pub exp: i64,

    /// Storage-key prefix the token authorizes.
    ///
    /// `None` (or an empty string) marks an unscoped token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl PlayClaims {
    /// Claims scoped to `prefix`, expiring at `exp`.
    pub fn scoped(exp: i64, prefix: impl Into<String>) -> Self {
        Self {
            exp,
            prefix: Some(prefix.into()),
        }
    }

    /// The prefix claim, treating an empty string as absent.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref().filter(|p| !p.is_empty())
    }

    /// Whether the token has expired at `now` (Unix seconds).
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_serializes_alg_before_typ() {
        let json = serde_json::to_string(&TokenHeader::default()).unwrap();
        assert_eq!(json, r#"{"alg":"HS256","typ":"JWT"}"#);
    }

    #[test]
    fn claims_serialize_exp_then_prefix() {
        let claims = PlayClaims::scoped(1_700_000_000, "movies/space-trip/");
        let json = serde_json::to_string(&claims).unwrap();
        assert_eq!(json, r#"{"exp":1700000000,"prefix":"movies/space-trip/"}"#);
    }

    #[test]
    fn unknown_claims_are_rejected() {
        let result: Result<PlayClaims, _> =
            serde_json::from_str(r#"{"exp":1,"prefix":"a/","admin":true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn mistyped_claims_are_rejected() {
        let result: Result<PlayClaims, _> = serde_json::from_str(r#"{"exp":"soon"}"#);
        assert!(result.is_err());

        let result: Result<PlayClaims, _> = serde_json::from_str(r#"{"prefix":"a/"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn empty_prefix_counts_as_unscoped() {
        let claims = PlayClaims {
            exp: 10,
            prefix: Some(String::new()),
        };
        assert_eq!(claims.prefix(), None);
    }

    #[test]
    fn expiry_is_inclusive_of_exp() {
        let claims = PlayClaims::scoped(100, "a/");
        assert!(!claims.is_expired_at(99));
        assert!(claims.is_expired_at(100));
        assert!(claims.is_expired_at(101));
    }
}
