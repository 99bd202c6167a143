// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Caller Authentication
//!
//! Verifies the identity provider's ID token presented to the issuer and
//! yields the caller's verified email.
//!
//! ## Auth Flow
//!
//! 1. Client signs in with the identity provider
//! 2. Client calls the issuer with `Authorization: Bearer <ID token>`
//! 3. Issuer:
//!    - Fetches the provider's JWKS via HTTPS (cached with TTL)
//!    - Verifies signature, expiry, issuer, audience
//!    - Extracts `sub` and the verified `email`
//!
//! Play tokens minted afterwards are a separate credential; see
//! [`crate::token`].

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;

pub use claims::VerifiedIdentity;
pub use error::AuthError;
pub use extractor::{Caller, IdentityConfig};
pub use jwks::JwksManager;
