// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HS256 minting and verification.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Serialize};
use sha2::Sha256;
use thiserror::Error;

use super::claims::{PlayClaims, TokenHeader, ALGORITHM};
use super::secret::SigningSecret;

type HmacSha256 = Hmac<Sha256>;

/// Reasons a play token is refused.
///
/// The edge gate maps every variant to `401 Unauthorized`; the distinction
/// only feeds logs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    BadSignature,
    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("token has expired")]
    Expired,
    #[error("failed to encode token: {0}")]
    Encoding(String),
}

impl TokenError {
    /// Short machine-readable reason for structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::BadSignature => "bad_signature",
            TokenError::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            TokenError::Expired => "expired",
            TokenError::Encoding(_) => "encoding",
        }
    }
}

/// Mint a signed token carrying `claims`.
pub fn mint(claims: &PlayClaims, secret: &SigningSecret) -> Result<String, TokenError> {
    let header = encode_segment(&TokenHeader::default())?;
    let payload = encode_segment(claims)?;
    let signing_input = format!("{header}.{payload}");
    let signature = Base64UrlUnpadded::encode_string(&sign(secret, signing_input.as_bytes())?);
    Ok(format!("{signing_input}.{signature}"))
}

/// Verify `token` against `secret` at time `now` (Unix seconds).
///
/// The signature is checked before the header or payload is parsed, so no
/// attacker-controlled JSON is decoded for an unsigned token.
pub fn verify(token: &str, secret: &SigningSecret, now: i64) -> Result<PlayClaims, TokenError> {
    let mut segments = token.split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed);
    };

    if header_b64.is_empty() || payload_b64.is_empty() || signature_b64.is_empty() {
        return Err(TokenError::Malformed);
    }

    let signature =
        Base64UrlUnpadded::decode_vec(signature_b64).map_err(|_| TokenError::Malformed)?;
    let signing_input_len = header_b64.len() + 1 + payload_b64.len();
    let signing_input = &token[..signing_input_len];

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| TokenError::BadSignature)?;
    mac.update(signing_input.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| TokenError::BadSignature)?;

    let header: TokenHeader = decode_segment(header_b64)?;
    if header.alg != ALGORITHM {
        return Err(TokenError::UnsupportedAlgorithm(header.alg));
    }

    let claims: PlayClaims = decode_segment(payload_b64)?;
    if claims.is_expired_at(now) {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

fn sign(secret: &SigningSecret, input: &[u8]) -> Result<Vec<u8>, TokenError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| TokenError::Encoding(e.to_string()))?;
    mac.update(input);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value).map_err(|e| TokenError::Encoding(e.to_string()))?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(segment).map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}
