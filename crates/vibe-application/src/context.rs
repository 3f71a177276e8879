//! Coordination object wiring the synchronization layer together.

use crate::account::ActiveAccountResolver;
use crate::api::DashboardApi;
use crate::notification::NotificationQueue;
use crate::query::QueryCache;
use crate::session::SessionManager;
use std::sync::Arc;
use vibe_core::config::ClientConfig;
use vibe_core::session::SessionSnapshot;
use vibe_core::transport::Transport;

/// Owns one cache, session manager, active-account resolver, notification
/// queue and resource API, all sharing a single transport.
///
/// Consumers receive the context by reference (or behind an `Arc`); there is
/// no global state.
pub struct DashboardContext {
    config: ClientConfig,
    cache: QueryCache,
    session: Arc<SessionManager>,
    accounts: Arc<ActiveAccountResolver>,
    notifications: NotificationQueue,
    api: DashboardApi,
}

impl DashboardContext {
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let cache = QueryCache::new(config.default_stale_after());
        let session = SessionManager::new(Arc::clone(&transport), cache.clone());
        let accounts = Arc::new(ActiveAccountResolver::new(
            Arc::clone(&transport),
            cache.clone(),
            Arc::clone(&session),
        ));
        let notifications = NotificationQueue::new(config.notification_timeout());
        let api = DashboardApi::new(
            transport,
            cache.clone(),
            Arc::clone(&session),
            Arc::clone(&accounts),
            config.metrics_refetch_interval(),
        );

        Self {
            config,
            cache,
            session,
            accounts,
            notifications,
            api,
        }
    }

    /// Resolves the initial session state with a status probe.
    pub async fn init(&self) -> SessionSnapshot {
        tracing::debug!("[DashboardContext] Probing session at {}", self.config.api_base_url);
        self.session.probe_status().await
    }

    /// Drops cached resources and pending notifications.
    pub fn teardown(&self) {
        self.cache.clear();
        self.notifications.clear();
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn accounts(&self) -> &Arc<ActiveAccountResolver> {
        &self.accounts
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn api(&self) -> &DashboardApi {
        &self.api
    }
}
