// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! vod-gate - Capability tokens for video-on-demand assets
//!
//! Two services share this crate. The token issuer hands allowlisted
//! viewers a short-lived play token scoped to one movie's directory; the
//! edge gate verifies that token on every manifest and segment request and
//! streams the object from the media store.
//!
//! ## Modules
//!
//! - `token` - Play token format, signing and scope rules
//! - `issuer` - Token issuance policy
//! - `edge` - Verifying object proxy (Axum)
//! - `api` - Issuer HTTP API handlers (Axum)
//! - `auth` - Caller authentication (identity provider ID tokens)
//! - `policy` - Allowlist and movie records
//! - `media` - Object store access (`object_store`)

pub mod api;
pub mod auth;
pub mod config;
pub mod edge;
pub mod error;
pub mod issuer;
pub mod media;
pub mod policy;
pub mod state;
pub mod tls;
pub mod token;
