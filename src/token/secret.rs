// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared HMAC signing secret.

use std::fmt;
use std::sync::Arc;

/// Symmetric secret shared by the issuer and the edge gate.
///
/// Immutable for the lifetime of the process and cheap to clone.
/// `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(Arc<[u8]>);

impl SigningSecret {
    /// Wrap a secret. Returns `None` for an empty secret, which is treated
    /// the same as an unconfigured one.
    pub fn new(secret: impl AsRef<[u8]>) -> Option<Self> {
        let bytes = secret.as_ref();
        if bytes.is_empty() {
            None
        } else {
            Some(Self(Arc::from(bytes)))
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_is_none() {
        assert!(SigningSecret::new("").is_none());
        assert!(SigningSecret::new(b"").is_none());
    }

    #[test]
    fn debug_is_redacted() {
        let secret = SigningSecret::new("hunter2").unwrap();
        let debug = format!("{secret:?}");
        assert!(!debug.contains("hunter2"));
    }
}
