// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path layout for the on-disk policy documents.
//!
//! ```text
//! <root>/
//!   config/
//!     allowedEmails.json   # {"emails": {"<email>": true}}
//!   movies/
//!     {movie_id}.json      # {"manifestPath": "movies/<id>/master.m3u8", ...}
//! ```

use std::path::{Path, PathBuf};

/// Default root when `POLICY_DATA_DIR` is unset.
pub const DEFAULT_POLICY_ROOT: &str = "/data/policy";

/// Storage path utilities for the policy documents.
#[derive(Debug, Clone)]
pub struct DocumentPaths {
    root: PathBuf,
}

impl Default for DocumentPaths {
    fn default() -> Self {
        Self::new(DEFAULT_POLICY_ROOT)
    }
}

impl DocumentPaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Configuration Documents ==========

    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    /// Path to the allowlist document.
    pub fn allowlist(&self) -> PathBuf {
        self.config_dir().join("allowedEmails.json")
    }

    // ========== Asset Documents ==========

    pub fn movies_dir(&self) -> PathBuf {
        self.root.join("movies")
    }

    /// Path to an asset document, or `None` if `movie_id` is not a single
    /// plain path segment.
    pub fn movie(&self, movie_id: &str) -> Option<PathBuf> {
        if !is_plain_segment(movie_id) {
            return None;
        }
        Some(self.movies_dir().join(format!("{movie_id}.json")))
    }
}

fn is_plain_segment(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_use_policy_root() {
        let paths = DocumentPaths::default();
        assert_eq!(paths.root(), Path::new("/data/policy"));
        assert_eq!(
            paths.allowlist(),
            PathBuf::from("/data/policy/config/allowedEmails.json")
        );
    }

    #[test]
    fn movie_paths_are_correct() {
        let paths = DocumentPaths::new("/tmp/policy");
        assert_eq!(
            paths.movie("space-trip"),
            Some(PathBuf::from("/tmp/policy/movies/space-trip.json"))
        );
    }

    #[test]
    fn movie_ids_cannot_escape_the_directory() {
        let paths = DocumentPaths::new("/tmp/policy");
        assert_eq!(paths.movie("../config/allowedEmails"), None);
        assert_eq!(paths.movie(".."), None);
        assert_eq!(paths.movie("a\\b"), None);
        assert_eq!(paths.movie(""), None);
    }
}
