use crate::models::{Track, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const MAX_PLAYLIST_ID_LEN: usize = 7;
pub const MAX_PLAYLIST_NAME_LEN: usize = 25;

/// A named, ordered, user-owned sequence of tracks. Insertion order is
/// playback order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub tracks: Vec<Track>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Playlist {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            tracks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn size(&self) -> usize {
        self.tracks.len()
    }
}

/// One user's playlists, keyed by playlist id. `num` tracks the map length.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPlaylists {
    pub list: HashMap<String, Playlist>,
    pub num: usize,
}

/// Read-only export of a playlist for external rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistSnapshot {
    pub id: String,
    pub name: String,
    pub owner: UserId,
    pub size: usize,
    pub tracks: Vec<Track>,
}

impl PlaylistSnapshot {
    /// JSON form handed to external renderers (e.g. a downloadable document).
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Trims a display name and collapses internal whitespace runs to single
/// spaces.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provider;

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_name("  My   Cool \t List "), "My Cool List");
        assert_eq!(normalize_name("plain"), "plain");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn size_tracks_sequence_length() {
        let mut playlist = Playlist::new("mix", "My Mix");
        assert_eq!(playlist.size(), 0);
        playlist
            .tracks
            .push(Track::new("a", "https://yt/a", Provider::YouTube));
        assert_eq!(playlist.size(), 1);
    }
}
