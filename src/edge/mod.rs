// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Edge Gate
//!
//! Serves media objects to holders of a valid play token. Every request
//! path is an object key:
//!
//! ```text
//! GET /movies/space-trip/seg0.ts
//! Authorization: Bearer <play token>
//! ```
//!
//! | Outcome | Status |
//! |---------|--------|
//! | empty key, invalid key, absent object | 404 |
//! | no bearer credential | 401 + `WWW-Authenticate: Bearer` |
//! | token fails verification | 401 |
//! | key outside the token scope | 403 |
//! | signing secret missing, store failure | 500 |
//!
//! The gate holds no per-request state; tokens are checked against the
//! shared secret and the clock only.

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Uri},
    response::Response,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;

use crate::api::with_request_tracing;
use crate::state::EdgeState;

pub mod error;
pub mod gate;

pub use error::EdgeError;
pub use gate::{EdgeConfig, EdgeGate, CACHE_CONTROL_VALUE};

pub fn router(state: EdgeState) -> Router {
    with_request_tracing(
        Router::new()
            .route("/", get(serve_object))
            .route("/{*key}", get(serve_object))
            .with_state(state)
            .layer(CorsLayer::permissive()),
    )
}

/// The raw request path is the key; it is not percent-decoded.
async fn serve_object(State(state): State<EdgeState>, uri: Uri, headers: HeaderMap) -> Response {
    state
        .gate
        .handle(uri.path(), headers.get(AUTHORIZATION))
        .await
}
