// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Play Tokens
//!
//! Self-contained HS256 capability tokens shared by the issuer and the edge
//! gate. A token is three unpadded base64url segments joined by `.`:
//!
//! ```text
//! b64url({"alg":"HS256","typ":"JWT"}) . b64url({"exp":<int>,"prefix":"<string>"}) . b64url(sig)
//! ```
//!
//! where `sig = HMAC-SHA256(secret, header_b64 + "." + payload_b64)`.
//!
//! Tokens are never stored server-side. Their whole lifecycle is `exp`.

pub mod claims;
pub mod codec;
pub mod scope;
pub mod secret;

pub use claims::PlayClaims;
pub use codec::{mint, verify, TokenError};
pub use scope::{derive_prefix, PrefixError, Scope};
pub use secret::SigningSecret;
