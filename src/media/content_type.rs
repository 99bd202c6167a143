// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Media type by object key suffix.

pub const HLS_PLAYLIST: &str = "application/vnd.apple.mpegurl";
pub const MPEG_TS: &str = "video/MP2T";
pub const MP4: &str = "video/mp4";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content type served for `key`.
pub fn content_type_for(key: &str) -> &'static str {
    if key.ends_with(".m3u8") {
        HLS_PLAYLIST
    } else if key.ends_with(".ts") {
        MPEG_TS
    } else if key.ends_with(".mp4") {
        MP4
    } else {
        OCTET_STREAM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_suffixes() {
        assert_eq!(content_type_for("movies/a/master.m3u8"), HLS_PLAYLIST);
        assert_eq!(content_type_for("movies/a/720p/seg3.ts"), MPEG_TS);
        assert_eq!(content_type_for("movies/a/film.mp4"), MP4);
    }

    #[test]
    fn unknown_suffix_is_binary() {
        assert_eq!(content_type_for("movies/a/poster.jpg"), OCTET_STREAM);
        assert_eq!(content_type_for("movies/a/ts"), OCTET_STREAM);
        assert_eq!(content_type_for("movies/a/"), OCTET_STREAM);
    }
}
