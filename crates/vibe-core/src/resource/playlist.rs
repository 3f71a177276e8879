use serde::{Deserialize, Serialize};

/// A curated playlist owned by one linked account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub account_display_name: String,
    #[serde(default)]
    pub size: u32,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reshuffle_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_reshuffle_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlaylistList {
    #[serde(default)]
    pub playlists: Vec<Playlist>,
}

/// Request to create a batch of playlists for an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePlaylistsRequest {
    pub account_id: String,
    pub count: u32,
    #[serde(default)]
    pub prefix: String,
    pub interval_days: u32,
}

/// Request to reshuffle playlists; no ids means every playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReshuffleRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}
