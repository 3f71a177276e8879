//! Remote API route table.
//!
//! Every path is relative to the configured API base URL.

pub const AUTH_STATUS: &str = "/api/v1/auth/dev-status";
pub const AUTH_LOGIN: &str = "/api/v1/auth/dev-login";
pub const AUTH_LOGOUT: &str = "/api/v1/auth/dev-logout";

pub const ACCOUNTS_LIST: &str = "/api/v1/accounts/list";
pub const ACCOUNTS_ACTIVE_GET: &str = "/api/v1/accounts/active/get";
pub const ACCOUNTS_ACTIVE_SET: &str = "/api/v1/accounts/active/set";
pub const ACCOUNTS_PREFIX: &str = "/api/v1/accounts/prefix";

pub const PLAYLISTS_LIST: &str = "/api/v1/playlists/list";
pub const PLAYLISTS_CREATE: &str = "/api/v1/playlists/create";
pub const PLAYLISTS_RESHUFFLE_BULK: &str = "/api/v1/playlists/reshuffle-bulk";

pub const METRICS_OVERVIEW: &str = "/api/v1/metrics/overview";

pub const JOBS_LIST: &str = "/api/v1/jobs/list";
pub const JOBS_UPDATE: &str = "/api/v1/jobs/update";
pub const JOBS_HISTORY: &str = "/api/v1/jobs/history";

pub const SETTINGS: &str = "/api/v1/settings";

pub const ALBUMS_LIST: &str = "/api/v1/albums/list";
pub const TRACKS_LIST: &str = "/api/v1/tracks/list";

pub fn account_refresh(account_id: &str) -> String {
    format!("/api/v1/accounts/{}/refresh", account_id)
}

pub fn account_remove(account_id: &str) -> String {
    format!("/api/v1/accounts/{}/remove", account_id)
}

pub fn playlist(playlist_id: &str) -> String {
    format!("/api/v1/playlists/{}", playlist_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameterized_routes() {
        assert_eq!(account_refresh("acc-1"), "/api/v1/accounts/acc-1/refresh");
        assert_eq!(account_remove("acc-1"), "/api/v1/accounts/acc-1/remove");
        assert_eq!(playlist("pl-9"), "/api/v1/playlists/pl-9");
    }
}
