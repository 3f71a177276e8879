//! Typed dashboard resource API.
//!
//! Binds every resource to its route, cache key and invalidation set. Reads
//! are gated on the session: while not authenticated they are idle and
//! never reach the network.

use super::fetch::fetch_json;
use crate::account::ActiveAccountResolver;
use crate::keys;
use crate::query::{QueryCache, QuerySubscription};
use crate::session::SessionManager;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use vibe_core::Result;
use vibe_core::account::{AccountList, AccountSummary};
use vibe_core::query::{CachedResult, KeyFilter, QueryKey, QueryPolicy};
use vibe_core::resource::{
    AlbumFilter, AlbumList, CreatePlaylistsRequest, JobHistory, JobList, JobUpdateRequest,
    OverviewMetrics, PlaylistList, ReshuffleRequest, Settings, TrackList,
};
use vibe_core::routes;
use vibe_core::transport::{ApiRequest, Transport, TransportExt};

pub struct DashboardApi {
    transport: Arc<dyn Transport>,
    cache: QueryCache,
    session: Arc<SessionManager>,
    accounts: Arc<ActiveAccountResolver>,
    metrics_refetch_interval: Duration,
}

impl DashboardApi {
    pub fn new(
        transport: Arc<dyn Transport>,
        cache: QueryCache,
        session: Arc<SessionManager>,
        accounts: Arc<ActiveAccountResolver>,
        metrics_refetch_interval: Duration,
    ) -> Self {
        Self {
            transport,
            cache,
            session,
            accounts,
            metrics_refetch_interval,
        }
    }

    fn policy(&self) -> QueryPolicy {
        self.cache
            .default_policy()
            .enabled(self.session.is_authenticated())
    }

    fn metrics_policy(&self) -> QueryPolicy {
        self.policy().refetch_every(self.metrics_refetch_interval)
    }

    fn query<T>(&self, key: QueryKey, policy: QueryPolicy, request: ApiRequest) -> CachedResult<T>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.cache
            .read(key, policy, fetch_json::<T>(&self.transport, request))
    }

    async fn fetch<T>(&self, key: QueryKey, policy: QueryPolicy, request: ApiRequest) -> Result<Arc<T>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.cache
            .ensure(key, policy, fetch_json::<T>(&self.transport, request))
            .await
    }

    async fn write(&self, request: ApiRequest, invalidates: &[KeyFilter]) -> Result<()> {
        tracing::debug!("[DashboardApi] {}", request);
        self.cache
            .mutate_and_invalidate(self.transport.send_unit(request), invalidates)
            .await
    }

    // ============================================================================
    // Accounts
    // ============================================================================

    pub fn accounts_query(&self) -> CachedResult<AccountList> {
        self.accounts.accounts_query()
    }

    pub async fn accounts(&self) -> Result<Arc<AccountList>> {
        self.accounts.accounts().await
    }

    pub async fn active_account(&self) -> Result<Option<AccountSummary>> {
        self.accounts.get_active().await
    }

    pub async fn set_active_account(&self, account_id: Option<&str>) -> Result<()> {
        self.accounts.set_active(account_id).await
    }

    pub async fn remove_account(&self, account_id: &str) -> Result<()> {
        self.accounts.remove_account(account_id).await
    }

    pub async fn update_account_prefix(&self, account_id: &str, prefix: &str) -> Result<()> {
        self.accounts.update_prefix(account_id, prefix).await
    }

    pub async fn refresh_account(&self, account_id: &str) -> Result<()> {
        self.accounts.refresh(account_id).await
    }

    // ============================================================================
    // Playlists
    // ============================================================================

    pub fn playlists_query(&self) -> CachedResult<PlaylistList> {
        self.query(
            keys::playlists_list(),
            self.policy(),
            ApiRequest::get(routes::PLAYLISTS_LIST),
        )
    }

    pub async fn playlists(&self) -> Result<Arc<PlaylistList>> {
        self.fetch(
            keys::playlists_list(),
            self.policy(),
            ApiRequest::get(routes::PLAYLISTS_LIST),
        )
        .await
    }

    pub async fn create_playlists(&self, request: &CreatePlaylistsRequest) -> Result<()> {
        self.write(
            ApiRequest::post(routes::PLAYLISTS_CREATE).with_json(request)?,
            &[KeyFilter::Exact(keys::playlists_list())],
        )
        .await
    }

    pub async fn reshuffle_playlists(&self, request: &ReshuffleRequest) -> Result<()> {
        self.write(
            ApiRequest::post(routes::PLAYLISTS_RESHUFFLE_BULK).with_json(request)?,
            &[KeyFilter::Prefix(keys::playlists())],
        )
        .await
    }

    pub async fn delete_playlist(&self, playlist_id: &str) -> Result<()> {
        self.write(
            ApiRequest::delete(routes::playlist(playlist_id)),
            &[KeyFilter::Exact(keys::playlists_list())],
        )
        .await
    }

    // ============================================================================
    // Metrics
    // ============================================================================

    pub fn metrics_overview_query(&self) -> CachedResult<OverviewMetrics> {
        self.query(
            keys::metrics_overview(),
            self.metrics_policy(),
            ApiRequest::get(routes::METRICS_OVERVIEW),
        )
    }

    pub async fn metrics_overview(&self) -> Result<Arc<OverviewMetrics>> {
        self.fetch(
            keys::metrics_overview(),
            self.metrics_policy(),
            ApiRequest::get(routes::METRICS_OVERVIEW),
        )
        .await
    }

    /// Live view of the overview metrics, refreshed on the configured
    /// interval for as long as the subscription is held.
    pub fn watch_metrics_overview(&self) -> QuerySubscription<OverviewMetrics> {
        self.cache.subscribe(
            keys::metrics_overview(),
            self.metrics_policy(),
            fetch_json::<OverviewMetrics>(
                &self.transport,
                ApiRequest::get(routes::METRICS_OVERVIEW),
            ),
        )
    }

    // ============================================================================
    // Jobs
    // ============================================================================

    pub fn jobs_query(&self) -> CachedResult<JobList> {
        self.query(
            keys::jobs_list(),
            self.policy(),
            ApiRequest::get(routes::JOBS_LIST),
        )
    }

    pub async fn jobs(&self) -> Result<Arc<JobList>> {
        self.fetch(
            keys::jobs_list(),
            self.policy(),
            ApiRequest::get(routes::JOBS_LIST),
        )
        .await
    }

    fn job_history_request(job_name: &str) -> ApiRequest {
        ApiRequest::get(routes::JOBS_HISTORY).with_query("job_name", job_name)
    }

    pub fn job_history_query(&self, job_name: &str) -> CachedResult<JobHistory> {
        self.query(
            keys::job_history(job_name),
            self.policy(),
            Self::job_history_request(job_name),
        )
    }

    pub async fn job_history(&self, job_name: &str) -> Result<Arc<JobHistory>> {
        self.fetch(
            keys::job_history(job_name),
            self.policy(),
            Self::job_history_request(job_name),
        )
        .await
    }

    pub async fn set_job_enabled(&self, job_name: &str, enabled: bool) -> Result<()> {
        self.write(
            ApiRequest::post(routes::JOBS_UPDATE)
                .with_json(&JobUpdateRequest::set_enabled(job_name, enabled))?,
            &[KeyFilter::Exact(keys::jobs_list())],
        )
        .await
    }

    /// Triggers a job immediately; both the job list and its history change.
    pub async fn run_job_now(&self, job_name: &str) -> Result<()> {
        self.write(
            ApiRequest::post(routes::JOBS_UPDATE).with_json(&JobUpdateRequest::run_now(job_name))?,
            &[KeyFilter::Prefix(keys::jobs())],
        )
        .await
    }

    // ============================================================================
    // Settings
    // ============================================================================

    pub fn settings_query(&self) -> CachedResult<Settings> {
        self.query(
            keys::settings(),
            self.policy(),
            ApiRequest::get(routes::SETTINGS),
        )
    }

    pub async fn settings(&self) -> Result<Arc<Settings>> {
        self.fetch(
            keys::settings(),
            self.policy(),
            ApiRequest::get(routes::SETTINGS),
        )
        .await
    }

    pub async fn update_settings(&self, settings: &Settings) -> Result<()> {
        self.write(
            ApiRequest::post(routes::SETTINGS).with_json(settings)?,
            &[KeyFilter::Exact(keys::settings())],
        )
        .await
    }

    // ============================================================================
    // Library
    // ============================================================================

    fn albums_request(filter: &AlbumFilter) -> ApiRequest {
        let mut request =
            ApiRequest::get(routes::ALBUMS_LIST).with_query("usable", filter.only_usable);
        if !filter.search.is_empty() {
            request = request.with_query("query", &filter.search);
        }
        request
    }

    pub fn albums_query(&self, filter: &AlbumFilter) -> CachedResult<AlbumList> {
        self.query(
            keys::albums(filter),
            self.policy(),
            Self::albums_request(filter),
        )
    }

    pub async fn albums(&self, filter: &AlbumFilter) -> Result<Arc<AlbumList>> {
        self.fetch(
            keys::albums(filter),
            self.policy(),
            Self::albums_request(filter),
        )
        .await
    }

    fn tracks_request(album_id: Option<&str>) -> ApiRequest {
        let request = ApiRequest::get(routes::TRACKS_LIST);
        match album_id {
            Some(id) => request.with_query("album_id", id),
            None => request,
        }
    }

    pub fn tracks_query(&self, album_id: Option<&str>) -> CachedResult<TrackList> {
        self.query(
            keys::tracks(album_id),
            self.policy(),
            Self::tracks_request(album_id),
        )
    }

    pub async fn tracks(&self, album_id: Option<&str>) -> Result<Arc<TrackList>> {
        self.fetch(
            keys::tracks(album_id),
            self.policy(),
            Self::tracks_request(album_id),
        )
        .await
    }
}
