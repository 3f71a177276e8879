use serde::{Deserialize, Serialize};

/// Server-side curation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub playlist_size: u32,
    pub reshuffle_interval_days: u32,
    pub cooldown_days: u32,
    pub max_playlists_per_account: u32,
    pub artist_cap: u32,
    pub default_prefix: String,
}
