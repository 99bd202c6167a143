// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::Caller,
    error::{ErrorBody, IssueError},
    state::IssuerState,
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayTokenRequest {
    /// Identifier of the movie to play
    pub movie_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayTokenResponse {
    /// Bearer token for the edge gate, valid for two hours
    pub token: String,
    /// Edge gate URL; object keys are appended as paths
    pub base_url: String,
}

#[utoipa::path(
    post,
    path = "/v1/play-token",
    request_body = PlayTokenRequest,
    tag = "Playback",
    security(("bearer" = [])),
    responses(
        (status = 200, body = PlayTokenResponse),
        (status = 400, description = "Missing movieId or incomplete movie record", body = ErrorBody),
        (status = 401, description = "Caller is not signed in", body = ErrorBody),
        (status = 403, description = "Caller is not on the allowlist", body = ErrorBody),
        (status = 404, description = "Unknown movie", body = ErrorBody),
        (status = 500, body = ErrorBody)
    )
)]
pub async fn create_play_token(
    State(state): State<IssuerState>,
    Caller(identity): Caller,
    payload: Result<Json<PlayTokenRequest>, JsonRejection>,
) -> Result<Json<PlayTokenResponse>, IssueError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected play-token request body");
            return Err(IssueError::invalid_argument("Missing movieId."));
        }
    };

    let issued = state
        .issuer
        .issue(identity.allowlist_identity(), request.movie_id.as_deref())
        .await?;

    Ok(Json(PlayTokenResponse {
        token: issued.token,
        base_url: issued.base_url,
    }))
}
