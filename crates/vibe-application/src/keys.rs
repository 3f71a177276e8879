//! Cache keys of the dashboard resources.
//!
//! Prefix relationships matter: invalidating `accounts()` also hits the list
//! and every user's active pointer.

use vibe_core::query::QueryKey;
use vibe_core::query_key;
use vibe_core::resource::AlbumFilter;
use vibe_core::session::Identity;

pub fn accounts() -> QueryKey {
    query_key!["accounts"]
}

pub fn accounts_list() -> QueryKey {
    query_key!["accounts", "list"]
}

pub fn accounts_active_all() -> QueryKey {
    query_key!["accounts", "active"]
}

pub fn accounts_active(identity: &Identity) -> QueryKey {
    query_key!["accounts", "active", identity.username.as_str()]
}

pub fn playlists() -> QueryKey {
    query_key!["playlists"]
}

pub fn playlists_list() -> QueryKey {
    query_key!["playlists", "list"]
}

pub fn metrics_overview() -> QueryKey {
    query_key!["metrics", "overview"]
}

pub fn jobs() -> QueryKey {
    query_key!["jobs"]
}

pub fn jobs_list() -> QueryKey {
    query_key!["jobs", "list"]
}

pub fn job_history(job_name: &str) -> QueryKey {
    query_key!["jobs", "history", job_name]
}

pub fn settings() -> QueryKey {
    query_key!["settings"]
}

pub fn albums(filter: &AlbumFilter) -> QueryKey {
    query_key![
        "library",
        "albums",
        filter.search.as_str(),
        filter.only_usable
    ]
}

pub fn tracks(album_id: Option<&str>) -> QueryKey {
    query_key!["library", "tracks", album_id]
}
