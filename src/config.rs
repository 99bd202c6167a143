// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup. Invalid
//! values fail startup with a [`ConfigError`]; a missing signing secret or
//! base URL does not, since the services report those per request.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `APP_ROLE` | `issuer` or `edge` | `issuer` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `PLAY_TOKEN_SECRET` | HMAC secret shared by issuer and edge | Required |
//! | `EDGE_BASE_URL` | Edge URL handed to clients (issuer) | Required for issuer |
//! | `PLAY_TOKEN_TTL_SECS` | Play token lifetime | `7200` |
//! | `POLICY_DATA_DIR` | Root of the allowlist and movie documents | `/data/policy` |
//! | `POLICY_READ_TIMEOUT_SECS` | Bound on policy store reads | `10` |
//! | `IDP_JWKS_URL` | Identity provider JWKS endpoint | Required for production |
//! | `IDP_ISSUER` | Expected ID token issuer claim | Optional |
//! | `IDP_AUDIENCE` | Expected ID token audience claim | Optional |
//! | `OBJECT_STORE` | `memory`, `local` or `s3` (edge) | `local` |
//! | `OBJECT_STORE_PATH` | Root directory for `local` | `/data/media` |
//! | `S3_ENDPOINT`, `S3_BUCKET`, `S3_ACCESS_KEY`, `S3_SECRET_KEY` | `s3` backend | Required for `s3` |
//! | `S3_REGION` | `s3` region | `auto` |
//! | `OBJECT_FETCH_TIMEOUT_SECS` | Bound on object fetches | `30` |
//! | `ALLOW_UNSCOPED_TOKENS` | Edge serves any key to prefix-less tokens | `false` |
//! | `TLS_CERT_PATH`, `TLS_KEY_PATH` | PEM files; both or neither | Plain HTTP |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::auth::IdentityConfig;
use crate::edge::EdgeConfig;
use crate::issuer::{IssuerConfig, DEFAULT_POLICY_READ_TIMEOUT, DEFAULT_TOKEN_TTL};
use crate::media::{ObjectStoreConfig, DEFAULT_FETCH_TIMEOUT};
use crate::policy::paths::DEFAULT_POLICY_ROOT;
use crate::token::SigningSecret;

pub const APP_ROLE_ENV: &str = "APP_ROLE";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const PLAY_TOKEN_SECRET_ENV: &str = "PLAY_TOKEN_SECRET";
pub const EDGE_BASE_URL_ENV: &str = "EDGE_BASE_URL";
pub const PLAY_TOKEN_TTL_ENV: &str = "PLAY_TOKEN_TTL_SECS";
pub const POLICY_DATA_DIR_ENV: &str = "POLICY_DATA_DIR";
pub const POLICY_READ_TIMEOUT_ENV: &str = "POLICY_READ_TIMEOUT_SECS";
pub const IDP_JWKS_URL_ENV: &str = "IDP_JWKS_URL";
pub const IDP_ISSUER_ENV: &str = "IDP_ISSUER";
pub const IDP_AUDIENCE_ENV: &str = "IDP_AUDIENCE";
pub const OBJECT_STORE_ENV: &str = "OBJECT_STORE";
pub const OBJECT_STORE_PATH_ENV: &str = "OBJECT_STORE_PATH";
pub const S3_ENDPOINT_ENV: &str = "S3_ENDPOINT";
pub const S3_BUCKET_ENV: &str = "S3_BUCKET";
pub const S3_ACCESS_KEY_ENV: &str = "S3_ACCESS_KEY";
pub const S3_SECRET_KEY_ENV: &str = "S3_SECRET_KEY";
pub const S3_REGION_ENV: &str = "S3_REGION";
pub const OBJECT_FETCH_TIMEOUT_ENV: &str = "OBJECT_FETCH_TIMEOUT_SECS";
pub const ALLOW_UNSCOPED_TOKENS_ENV: &str = "ALLOW_UNSCOPED_TOKENS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MEDIA_ROOT: &str = "/data/media";

/// Default `RUST_LOG` filter.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is required")]
    Missing { var: &'static str },

    #[error("invalid {var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Which service this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppRole {
    #[default]
    Issuer,
    Edge,
}

impl FromStr for AppRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "issuer" => Ok(AppRole::Issuer),
            "edge" => Ok(AppRole::Edge),
            _ => Err("expected `issuer` or `edge`".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err("expected `json` or `pretty`".to_string()),
        }
    }
}

/// PEM certificate chain and private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub tls: Option<TlsPaths>,
}

/// Issuer role settings.
#[derive(Debug, Clone)]
pub struct IssuerSettings {
    pub issuer: IssuerConfig,
    pub identity: IdentityConfig,
    pub policy_root: PathBuf,
}

/// Edge role settings.
#[derive(Debug, Clone)]
pub struct EdgeSettings {
    pub gate: EdgeConfig,
    pub object_store: ObjectStoreConfig,
    pub fetch_timeout: Duration,
}

#[derive(Debug, Clone)]
pub enum RoleSettings {
    Issuer(IssuerSettings),
    Edge(EdgeSettings),
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_format: LogFormat,
    pub server: ServerConfig,
    pub role: RoleSettings,
}

impl Settings {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let role: AppRole = env.parse_or(APP_ROLE_ENV, AppRole::default())?;
        let log_format: LogFormat = env.parse_or(LOG_FORMAT_ENV, LogFormat::default())?;
        let server = server_config(&env)?;

        let role = match role {
            AppRole::Issuer => RoleSettings::Issuer(issuer_settings(&env)?),
            AppRole::Edge => RoleSettings::Edge(edge_settings(&env)?),
        };

        Ok(Self {
            log_format,
            server,
            role,
        })
    }
}

/// Variable lookup with empty values treated as unset.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    fn get(&self, var: &str) -> Option<String> {
        (self.0)(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn require(&self, var: &'static str) -> Result<String, ConfigError> {
        self.get(var).ok_or(ConfigError::Missing { var })
    }

    fn parse_or<T>(&self, var: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(var) {
            Some(value) => value
                .parse()
                .map_err(|e: T::Err| ConfigError::invalid(var, &value, e.to_string())),
            None => Ok(default),
        }
    }

    fn seconds_or(&self, var: &'static str, default: Duration) -> Result<Duration, ConfigError> {
        let secs: u64 = self.parse_or(var, default.as_secs())?;
        if secs == 0 || i64::try_from(secs).is_err() {
            return Err(ConfigError::invalid(
                var,
                &secs.to_string(),
                format!("must be between 1 and {}", i64::MAX),
            ));
        }
        Ok(Duration::from_secs(secs))
    }

    fn flag(&self, var: &'static str) -> Result<bool, ConfigError> {
        match self.get(var) {
            None => Ok(false),
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::invalid(var, &value, "expected a boolean")),
            },
        }
    }

    fn secret(&self) -> Option<SigningSecret> {
        let secret = self.get(PLAY_TOKEN_SECRET_ENV).and_then(SigningSecret::new);
        if secret.is_none() {
            tracing::warn!("{PLAY_TOKEN_SECRET_ENV} is not set; play tokens cannot be used");
        }
        secret
    }
}

fn server_config(env: &Env<'_>) -> Result<ServerConfig, ConfigError> {
    let host = env.get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port: u16 = env.parse_or(PORT_ENV, DEFAULT_PORT)?;

    let addr = format!("{host}:{port}")
        .parse()
        .map_err(|_| ConfigError::invalid(HOST_ENV, &host, "not a valid bind address"))?;

    let tls = match (env.get(TLS_CERT_PATH_ENV), env.get(TLS_KEY_PATH_ENV)) {
        (Some(cert), Some(key)) => Some(TlsPaths {
            cert: cert.into(),
            key: key.into(),
        }),
        (None, None) => None,
        (Some(_), None) => return Err(ConfigError::Missing { var: TLS_KEY_PATH_ENV }),
        (None, Some(_)) => return Err(ConfigError::Missing { var: TLS_CERT_PATH_ENV }),
    };

    Ok(ServerConfig { addr, tls })
}

fn issuer_settings(env: &Env<'_>) -> Result<IssuerSettings, ConfigError> {
    let base_url = env
        .get(EDGE_BASE_URL_ENV)
        .map(|url| validate_base_url(&url))
        .transpose()?;
    if base_url.is_none() {
        tracing::warn!("{EDGE_BASE_URL_ENV} is not set; play tokens cannot be issued");
    }

    let issuer = IssuerConfig {
        secret: env.secret(),
        base_url,
        token_ttl: env.seconds_or(PLAY_TOKEN_TTL_ENV, DEFAULT_TOKEN_TTL)?,
        policy_read_timeout: env.seconds_or(POLICY_READ_TIMEOUT_ENV, DEFAULT_POLICY_READ_TIMEOUT)?,
    };

    let mut identity = match env.get(IDP_JWKS_URL_ENV) {
        Some(url) => {
            Url::parse(&url).map_err(|e| ConfigError::invalid(IDP_JWKS_URL_ENV, &url, e.to_string()))?;
            IdentityConfig::new(url)
        }
        None => IdentityConfig::default(),
    };
    if let Some(iss) = env.get(IDP_ISSUER_ENV) {
        identity = identity.with_issuer(iss);
    }
    if let Some(aud) = env.get(IDP_AUDIENCE_ENV) {
        identity = identity.with_audience(aud);
    }

    let policy_root = env
        .get(POLICY_DATA_DIR_ENV)
        .unwrap_or_else(|| DEFAULT_POLICY_ROOT.to_string())
        .into();

    Ok(IssuerSettings {
        issuer,
        identity,
        policy_root,
    })
}

fn edge_settings(env: &Env<'_>) -> Result<EdgeSettings, ConfigError> {
    let gate = EdgeConfig {
        secret: env.secret(),
        allow_unscoped_tokens: env.flag(ALLOW_UNSCOPED_TOKENS_ENV)?,
    };

    let backend = env
        .get(OBJECT_STORE_ENV)
        .unwrap_or_else(|| "local".to_string());
    let object_store = match backend.to_ascii_lowercase().as_str() {
        "memory" => ObjectStoreConfig::Memory,
        "local" => ObjectStoreConfig::Local {
            path: env
                .get(OBJECT_STORE_PATH_ENV)
                .unwrap_or_else(|| DEFAULT_MEDIA_ROOT.to_string())
                .into(),
        },
        "s3" => ObjectStoreConfig::S3 {
            endpoint: env.require(S3_ENDPOINT_ENV)?,
            bucket: env.require(S3_BUCKET_ENV)?,
            access_key: env.require(S3_ACCESS_KEY_ENV)?,
            secret_key: env.require(S3_SECRET_KEY_ENV)?,
            region: env.get(S3_REGION_ENV),
        },
        _ => {
            return Err(ConfigError::invalid(
                OBJECT_STORE_ENV,
                &backend,
                "expected `memory`, `local` or `s3`",
            ))
        }
    };

    Ok(EdgeSettings {
        gate,
        object_store,
        fetch_timeout: env.seconds_or(OBJECT_FETCH_TIMEOUT_ENV, DEFAULT_FETCH_TIMEOUT)?,
    })
}

/// Validate an edge base URL and strip trailing slashes.
pub fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::invalid(EDGE_BASE_URL_ENV, raw, e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::invalid(
            EDGE_BASE_URL_ENV,
            raw,
            "expected an http(s) URL",
        ));
    }

    Ok(raw.trim_end_matches('/').to_string())
}
