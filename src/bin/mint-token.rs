// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Mint a play token for manual edge testing.
//!
//! ```text
//! PLAY_TOKEN_SECRET=... mint-token [prefix]
//! ```
//!
//! The token goes to stdout; the prefix and lifetime go to stderr so the
//! output can be captured directly, e.g.
//! `curl -H "Authorization: Bearer $(mint-token movies/test/)" ...`.

use std::process::ExitCode;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

use vod_gate::config::PLAY_TOKEN_SECRET_ENV;
use vod_gate::issuer::DEFAULT_TOKEN_TTL;
use vod_gate::token::{self, PlayClaims, SigningSecret, TokenError};

/// Prefix used when none is given on the command line.
const DEFAULT_PREFIX: &str = "movies/test/";

#[derive(Debug, Error, PartialEq, Eq)]
enum MintError {
    #[error("PLAY_TOKEN_SECRET must be set to the edge gate's signing secret")]
    MissingSecret,
    #[error(transparent)]
    Token(#[from] TokenError),
}

#[derive(Debug, PartialEq, Eq)]
struct MintedToken {
    token: String,
    prefix: String,
    expires_at: i64,
}

fn mint_test_token(
    secret: Option<&str>,
    prefix: Option<&str>,
    ttl: Duration,
    now: i64,
) -> Result<MintedToken, MintError> {
    let secret = secret
        .and_then(SigningSecret::new)
        .ok_or(MintError::MissingSecret)?;
    let prefix = prefix
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PREFIX)
        .to_string();

    let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    let expires_at = now.saturating_add(ttl);
    let token = token::mint(&PlayClaims::scoped(expires_at, prefix.clone()), &secret)?;

    Ok(MintedToken {
        token,
        prefix,
        expires_at,
    })
}

fn main() -> ExitCode {
    let secret = std::env::var(PLAY_TOKEN_SECRET_ENV).ok();
    let prefix = std::env::args().nth(1);

    match mint_test_token(
        secret.as_deref(),
        prefix.as_deref(),
        DEFAULT_TOKEN_TTL,
        Utc::now().timestamp(),
    ) {
        Ok(minted) => {
            println!("{}", minted.token);
            eprintln!(
                "prefix: {} | expires in {} min (at {})",
                minted.prefix,
                DEFAULT_TOKEN_TTL.as_secs() / 60,
                minted.expires_at
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
