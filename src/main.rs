// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vod_gate::{
    api,
    config::{
        ConfigError, EdgeSettings, IssuerSettings, LogFormat, RoleSettings, ServerConfig,
        Settings, DEFAULT_LOG_FILTER, LOG_FORMAT_ENV,
    },
    edge::{self, EdgeGate},
    issuer::TokenIssuer,
    media::{MediaStore, MediaStoreError},
    policy::{AccessPolicyStore, DocumentPaths, DocumentPolicyStore},
    state::{EdgeState, IssuerState},
    tls,
};

/// How long in-flight requests may run after a shutdown signal.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("media store error: {0}")]
    Media(#[from] MediaStoreError),
    #[error("TLS error: {0}")]
    Tls(#[source] std::io::Error),
    #[error("server error: {0}")]
    Server(#[source] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    tls::install_crypto_provider();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // Settings validate LOG_FORMAT later; an invalid value falls back here
    let format: LogFormat = std::env::var(LOG_FORMAT_ENV)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn run() -> Result<(), StartupError> {
    let settings = Settings::from_env()?;

    let app = match settings.role {
        RoleSettings::Issuer(issuer) => issuer_app(issuer).await,
        RoleSettings::Edge(edge) => edge_app(edge).await?,
    };

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    serve(app, &settings.server, shutdown).await
}

async fn issuer_app(settings: IssuerSettings) -> Router {
    let policy = DocumentPolicyStore::new(DocumentPaths::new(&settings.policy_root));
    if let Err(e) = policy.health_check().await {
        tracing::warn!(
            root = %settings.policy_root.display(),
            error = %e,
            "Policy store is not reachable yet"
        );
    }
    if settings.identity.jwks.is_none() {
        tracing::warn!("No identity provider configured; callers cannot be authenticated");
    }

    let issuer = TokenIssuer::new(Arc::new(policy), settings.issuer);
    tracing::info!("Starting token issuer (docs at /docs)");
    api::router(IssuerState::new(issuer, settings.identity))
}

async fn edge_app(settings: EdgeSettings) -> Result<Router, StartupError> {
    let media = MediaStore::from_config(&settings.object_store, settings.fetch_timeout).await?;
    tracing::info!(
        allow_unscoped_tokens = settings.gate.allow_unscoped_tokens,
        "Starting edge gate"
    );
    Ok(edge::router(EdgeState::new(EdgeGate::new(
        media,
        settings.gate,
    ))))
}

async fn serve(
    app: Router,
    server: &ServerConfig,
    shutdown: CancellationToken,
) -> Result<(), StartupError> {
    match &server.tls {
        Some(paths) => {
            let tls_config = tls::load_rustls_config(paths)
                .await
                .map_err(StartupError::Tls)?;

            let handle = axum_server::Handle::new();
            let shutdown_handle = handle.clone();
            tokio::spawn(async move {
                shutdown.cancelled().await;
                shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
            });

            tracing::info!(addr = %server.addr, "Listening on https");
            axum_server::bind_rustls(server.addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .map_err(StartupError::Server)?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(server.addr)
                .await
                .map_err(StartupError::Server)?;

            tracing::info!(addr = %server.addr, "Listening on http");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
                .map_err(StartupError::Server)?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Cancel `shutdown` on Ctrl-C or SIGTERM.
async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Received shutdown signal");
    shutdown.cancel();
}
