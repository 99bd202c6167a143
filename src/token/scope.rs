// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Storage-key scopes.
//!
//! A scope is derived from an asset's manifest path when a token is issued
//! and enforced against each requested key at the edge.

use thiserror::Error;

/// Path separator used by object keys.
pub const SEPARATOR: char = '/';

/// Manifest file suffix (matched case-insensitively).
pub const MANIFEST_SUFFIX: &str = ".m3u8";

/// Why a manifest path cannot be turned into a scope.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrefixError {
    #[error("manifest path is empty")]
    Empty,
    #[error("manifest {0} is not inside a directory")]
    NoDirectory(String),
}

/// Derive the token prefix for a manifest path.
///
/// `movies/space-trip/master.m3u8` yields `movies/space-trip/`. A path whose
/// last component is not an `.m3u8` manifest is a single-object asset and is
/// its own scope.
pub fn derive_prefix(manifest_path: &str) -> Result<String, PrefixError> {
    let path = manifest_path.trim_start_matches(SEPARATOR);
    if path.is_empty() {
        return Err(PrefixError::Empty);
    }

    let (directory, file_name) = match path.rfind(SEPARATOR) {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    };

    if !is_manifest(file_name) {
        return Ok(path.to_string());
    }

    let directory = directory.trim_end_matches(SEPARATOR);
    if directory.is_empty() {
        return Err(PrefixError::NoDirectory(path.to_string()));
    }

    Ok(format!("{directory}{SEPARATOR}"))
}

fn is_manifest(file_name: &str) -> bool {
    file_name.len() > MANIFEST_SUFFIX.len()
        && file_name
            .get(file_name.len() - MANIFEST_SUFFIX.len()..)
            .is_some_and(|suffix| suffix.eq_ignore_ascii_case(MANIFEST_SUFFIX))
}

/// Authorization scope of a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// Prefix forced to end with a separator.
    directory: String,
}

impl Scope {
    pub fn new(prefix: &str) -> Self {
        let directory = if prefix.ends_with(SEPARATOR) {
            prefix.to_string()
        } else {
            format!("{prefix}{SEPARATOR}")
        };
        Self { directory }
    }

    /// The normalized prefix, always ending with a separator.
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// Whether `key` falls under this scope: it either lives below the
    /// directory or names the prefix itself.
    pub fn permits(&self, key: &str) -> bool {
        key.starts_with(&self.directory)
            || key == self.directory.trim_end_matches(SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_directory_becomes_prefix() {
        assert_eq!(
            derive_prefix("movies/space-trip/master.m3u8").unwrap(),
            "movies/space-trip/"
        );
    }

    #[test]
    fn manifest_suffix_is_case_insensitive() {
        assert_eq!(
            derive_prefix("movies/space-trip/Master.M3U8").unwrap(),
            "movies/space-trip/"
        );
    }

    #[test]
    fn leading_separators_are_ignored() {
        assert_eq!(
            derive_prefix("/movies/space-trip/master.m3u8").unwrap(),
            "movies/space-trip/"
        );
    }

    #[test]
    fn nested_directories_are_kept() {
        assert_eq!(
            derive_prefix("movies/2024/space-trip/hls/index.m3u8").unwrap(),
            "movies/2024/space-trip/hls/"
        );
    }

    #[test]
    fn non_manifest_path_is_its_own_scope() {
        assert_eq!(
            derive_prefix("movies/short/film.mp4").unwrap(),
            "movies/short/film.mp4"
        );
    }

    #[test]
    fn root_level_manifest_is_rejected() {
        assert_eq!(
            derive_prefix("master.m3u8"),
            Err(PrefixError::NoDirectory("master.m3u8".to_string()))
        );
        assert!(matches!(
            derive_prefix("/master.m3u8"),
            Err(PrefixError::NoDirectory(_))
        ));
    }

    #[test]
    fn empty_manifest_is_rejected() {
        assert_eq!(derive_prefix(""), Err(PrefixError::Empty));
        assert_eq!(derive_prefix("///"), Err(PrefixError::Empty));
    }

    #[test]
    fn bare_suffix_is_not_a_manifest_name() {
        assert_eq!(derive_prefix("movies/.m3u8").unwrap(), "movies/.m3u8");
    }

    #[test]
    fn scope_permits_keys_below_prefix() {
        let scope = Scope::new("movies/space-trip/");
        assert!(scope.permits("movies/space-trip/master.m3u8"));
        assert!(scope.permits("movies/space-trip/720p/seg3.ts"));
        assert!(scope.permits("movies/space-trip"));
    }

    #[test]
    fn scope_rejects_siblings_and_parents() {
        let scope = Scope::new("movies/space-trip/");
        assert!(!scope.permits("movies/other-film/master.m3u8"));
        assert!(!scope.permits("movies/space-trip-2/master.m3u8"));
        assert!(!scope.permits("movies/"));
        assert!(!scope.permits(""));
    }

    #[test]
    fn scope_normalizes_missing_separator() {
        let scope = Scope::new("movies/short/film.mp4");
        assert_eq!(scope.directory(), "movies/short/film.mp4/");
        assert!(scope.permits("movies/short/film.mp4"));
        assert!(!scope.permits("movies/short/film.mp4.bak"));
    }
}
