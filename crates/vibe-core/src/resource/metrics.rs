use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OverviewStats {
    pub accounts_connected: Option<u32>,
    pub playlists_active: Option<u32>,
    pub tracks_total: Option<u64>,
    pub tracks_usable: Option<u64>,
    pub next_reshuffle_in_days: Option<f64>,
    pub last_sync_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedValue {
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyValue {
    pub week: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistPlays {
    pub artist: String,
    pub plays: u64,
}

/// Dashboard overview metrics; every section is optional on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OverviewMetrics {
    #[serde(default)]
    pub stats: Option<OverviewStats>,
    #[serde(default)]
    pub playlist_growth: Vec<DatedValue>,
    #[serde(default)]
    pub reshuffle_volume: Vec<WeeklyValue>,
    #[serde(default)]
    pub account_load: Vec<NamedValue>,
    #[serde(default)]
    pub top_artists: Vec<ArtistPlays>,
}
