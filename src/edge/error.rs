// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Edge rejections.
//!
//! The edge answers with a bare status and a one-line plain-text body; no
//! internal detail reaches the client.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::media::MediaStoreError;
use crate::token::TokenError;

#[derive(Debug, Error)]
pub enum EdgeError {
    /// Empty key, invalid key, or absent object
    #[error("not found")]
    NotFound,
    /// No `Authorization: Bearer <token>` header
    #[error("missing bearer credential")]
    MissingCredential,
    /// Token failed verification
    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenError),
    /// Valid token, key outside its scope
    #[error("key outside token scope")]
    Forbidden,
    /// Shared secret not configured
    #[error("signing secret not configured")]
    Misconfigured,
    /// Object store failure or timeout
    #[error("object store failure: {0}")]
    Store(String),
}

impl EdgeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EdgeError::NotFound => StatusCode::NOT_FOUND,
            EdgeError::MissingCredential | EdgeError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            EdgeError::Forbidden => StatusCode::FORBIDDEN,
            EdgeError::Misconfigured | EdgeError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> &'static str {
        match self {
            EdgeError::NotFound => "Not Found",
            EdgeError::MissingCredential => "Unauthorized",
            EdgeError::InvalidToken(_) => "Invalid or expired token",
            EdgeError::Forbidden => "Forbidden",
            EdgeError::Misconfigured => "Server misconfiguration",
            EdgeError::Store(_) => "Internal Server Error",
        }
    }
}

impl From<MediaStoreError> for EdgeError {
    fn from(e: MediaStoreError) -> Self {
        match e {
            MediaStoreError::NotFound(_) | MediaStoreError::InvalidKey(_) => EdgeError::NotFound,
            other => EdgeError::Store(other.to_string()),
        }
    }
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        let mut response = (self.status_code(), self.body()).into_response();
        if matches!(self, EdgeError::MissingCredential) {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
