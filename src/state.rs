// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::IdentityConfig;
use crate::edge::EdgeGate;
use crate::issuer::TokenIssuer;

/// Shared state for the issuer router.
#[derive(Clone)]
pub struct IssuerState {
    pub issuer: Arc<TokenIssuer>,
    /// How callers are authenticated
    pub identity: IdentityConfig,
}

impl IssuerState {
    pub fn new(issuer: TokenIssuer, identity: IdentityConfig) -> Self {
        Self {
            issuer: Arc::new(issuer),
            identity,
        }
    }
}

/// Shared state for the edge router.
#[derive(Clone)]
pub struct EdgeState {
    pub gate: Arc<EdgeGate>,
}

impl EdgeState {
    pub fn new(gate: EdgeGate) -> Self {
        Self {
            gate: Arc::new(gate),
        }
    }
}
