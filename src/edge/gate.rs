// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request authorization and object delivery.

use axum::{
    body::Body,
    http::{
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, ETAG},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use chrono::Utc;

use super::error::EdgeError;
use crate::media::MediaStore;
use crate::token::{self, Scope, SigningSecret};

/// Caching directive attached to every delivered object.
pub const CACHE_CONTROL_VALUE: &str = "public, max-age=3600";

/// Edge gate settings.
#[derive(Debug, Clone, Default)]
pub struct EdgeConfig {
    /// HMAC secret shared with the issuer
    pub secret: Option<SigningSecret>,
    /// Serve any key to a valid token that carries no prefix
    pub allow_unscoped_tokens: bool,
}

/// The edge gate: verifies play tokens and streams the objects they cover.
#[derive(Debug, Clone)]
pub struct EdgeGate {
    media: MediaStore,
    config: EdgeConfig,
}

impl EdgeGate {
    pub fn new(media: MediaStore, config: EdgeConfig) -> Self {
        Self { media, config }
    }

    /// Handle a request for `path` carrying the given `Authorization` value.
    pub async fn handle(&self, path: &str, authorization: Option<&HeaderValue>) -> Response {
        self.handle_at(path, authorization, Utc::now().timestamp())
            .await
    }

    /// [`handle`](Self::handle) with an explicit clock (Unix seconds).
    pub async fn handle_at(
        &self,
        path: &str,
        authorization: Option<&HeaderValue>,
        now: i64,
    ) -> Response {
        match self.serve(path, authorization, now).await {
            Ok(response) => response,
            Err(e) => e.into_response(),
        }
    }

    async fn serve(
        &self,
        path: &str,
        authorization: Option<&HeaderValue>,
        now: i64,
    ) -> Result<Response, EdgeError> {
        let key = self.authorize(path, authorization, now)?;
        self.deliver(key).await
    }

    /// Resolve the object key a request may read.
    ///
    /// Checks run in a fixed order: key present, credential present, secret
    /// configured, token valid, key in scope.
    pub fn authorize<'a>(
        &self,
        path: &'a str,
        authorization: Option<&HeaderValue>,
        now: i64,
    ) -> Result<&'a str, EdgeError> {
        let key = path.trim_start_matches('/');
        if key.is_empty() {
            return Err(EdgeError::NotFound);
        }

        let bearer = authorization
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(EdgeError::MissingCredential)?;

        let secret = self.config.secret.as_ref().ok_or_else(|| {
            tracing::error!("Edge signing secret is not configured");
            EdgeError::Misconfigured
        })?;

        let claims = token::verify(bearer, secret, now).map_err(|e| {
            tracing::info!(reason = e.reason(), key, "Rejected play token");
            EdgeError::InvalidToken(e)
        })?;

        match claims.prefix() {
            Some(prefix) => {
                let scope = Scope::new(prefix);
                if !scope.permits(key) {
                    tracing::info!(key, scope = scope.directory(), "Key outside token scope");
                    return Err(EdgeError::Forbidden);
                }
            }
            None if self.config.allow_unscoped_tokens => {
                tracing::debug!(key, "Serving key to unscoped token");
            }
            None => {
                tracing::info!(key, "Rejected unscoped play token");
                return Err(EdgeError::Forbidden);
            }
        }

        Ok(key)
    }

    async fn deliver(&self, key: &str) -> Result<Response, EdgeError> {
        let object = self.media.fetch(key).await.map_err(|e| {
            let error = EdgeError::from(e);
            if error.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
                tracing::error!(key, error = %error, "Object fetch failed");
            } else {
                tracing::debug!(key, "Object not found");
            }
            error
        })?;

        let mut builder = Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, object.content_type)
            .header(CACHE_CONTROL, CACHE_CONTROL_VALUE)
            .header(CONTENT_LENGTH, object.size);

        if let Some(etag) = object
            .etag
            .as_deref()
            .and_then(|etag| HeaderValue::from_str(etag).ok())
        {
            builder = builder.header(ETAG, etag);
        }

        builder
            .body(Body::from_stream(object.body))
            .map_err(|e| EdgeError::Store(e.to_string()))
    }
}
