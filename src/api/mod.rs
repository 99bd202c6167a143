// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::HeaderName,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{error::ErrorBody, state::IssuerState};

pub mod health;
pub mod play_token;

/// Header carrying the per-request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: IssuerState) -> Router {
    let v1_routes = Router::new()
        .route("/play-token", post(play_token::create_play_token))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    with_request_tracing(
        Router::new()
            .nest("/v1", v1_routes)
            .merge(health_routes)
            .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
            .layer(CorsLayer::permissive()),
    )
}

/// Attach request ids and HTTP tracing. Shared by the issuer and edge routers.
pub fn with_request_tracing(router: Router) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    router
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        play_token::create_play_token,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            play_token::PlayTokenRequest,
            play_token::PlayTokenResponse,
            ErrorBody,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Playback", description = "Play token issuance"),
        (name = "Health", description = "Liveness and readiness checks")
    )
)]
struct ApiDoc;
