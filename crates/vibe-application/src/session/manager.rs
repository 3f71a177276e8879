//! Session state machine.
//!
//! Owns the client's view of authentication. Every transition into
//! `Unauthenticated` clears the resource cache; a successful login purges it
//! before the state flips, so no value fetched under a previous session is
//! ever served afterwards.

use crate::query::QueryCache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use vibe_core::routes;
use vibe_core::session::{AuthState, Identity, LoginRequest, SessionSnapshot, SessionStatus};
use vibe_core::transport::{ApiRequest, Transport, TransportExt};
use vibe_core::{Result, SyncError};

pub struct SessionManager {
    transport: Arc<dyn Transport>,
    cache: QueryCache,
    state: watch::Sender<SessionSnapshot>,
    /// Bumped by every login/logout/forced transition; stale probes compare against it.
    epoch: AtomicU64,
}

impl SessionManager {
    /// Creates a manager in the `Unknown` state and registers it as the
    /// cache's unauthorized handler.
    pub fn new(transport: Arc<dyn Transport>, cache: QueryCache) -> Arc<Self> {
        let (state, _) = watch::channel(SessionSnapshot::unknown());
        let manager = Arc::new(Self {
            transport,
            cache: cache.clone(),
            state,
            epoch: AtomicU64::new(0),
        });

        let weak: Weak<Self> = Arc::downgrade(&manager);
        cache.set_unauthorized_handler(Arc::new(move || {
            if let Some(manager) = weak.upgrade() {
                manager.expire();
            }
        }));

        manager
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().state()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Observes every transition. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Asks the server whether the session is valid.
    ///
    /// Fails closed: any error yields `Unauthenticated`. The result is
    /// discarded if a login, logout or forced expiry happened meanwhile.
    pub async fn probe_status(&self) -> SessionSnapshot {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let next = match self.fetch_status().await {
            Ok(status) => SessionSnapshot::from_status(status, None),
            Err(e) => {
                tracing::warn!("[SessionManager] Status probe failed: {}", e);
                SessionSnapshot::unauthenticated()
            }
        };

        let mut previous = AuthState::Unknown;
        let mut superseded = false;
        let applied = self.state.send_if_modified(|current| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                superseded = true;
                return false;
            }
            previous = current.state();
            if *current == next {
                return false;
            }
            *current = next.clone();
            true
        });

        if superseded {
            tracing::debug!("[SessionManager] Discarding probe result superseded by a transition");
        } else if applied {
            tracing::info!(
                "[SessionManager] Session {:?} -> {:?}",
                previous,
                next.state()
            );
            if !next.is_authenticated() && previous != AuthState::Unauthenticated {
                self.cache.clear();
            }
        }

        self.snapshot()
    }

    /// Logs in with credentials.
    ///
    /// On failure the state is unchanged and the server's error is returned
    /// as-is. On success the cache is purged, then the identity is read back
    /// from the status endpoint, falling back to `username`.
    ///
    /// # Errors
    ///
    /// - the login request's error (e.g. [`SyncError::Validation`] carrying `detail`)
    /// - [`SyncError::Unauthorized`] if the server denies the session right after
    ///   login, or the session ended before the login completed
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionSnapshot> {
        let request = ApiRequest::post(routes::AUTH_LOGIN).with_json(&LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })?;

        if let Err(e) = self.transport.send_unit(request).await {
            tracing::debug!("[SessionManager] Login rejected: {}", e);
            return Err(e);
        }

        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.cache.purge();

        let next = match self.fetch_status().await {
            Ok(status) if !status.authenticated => {
                self.set_unauthenticated("server reports no session after login");
                return Err(SyncError::unauthorized(
                    "Login succeeded but the server reports no active session",
                ));
            }
            Ok(status) => SessionSnapshot::from_status(status, Some(username)),
            Err(e) if e.is_unauthorized() => {
                self.set_unauthenticated("status probe rejected after login");
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(
                    "[SessionManager] Identity probe failed after login, using submitted username: {}",
                    e
                );
                SessionSnapshot::authenticated(Identity::new(username))
            }
        };

        // A logout or forced expiry during the status check wins
        let mut applied = false;
        self.state.send_if_modified(|current| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            self.epoch.fetch_add(1, Ordering::SeqCst);
            *current = next.clone();
            applied = true;
            true
        });
        if !applied {
            tracing::debug!("[SessionManager] Login superseded by a session transition");
            return Err(SyncError::unauthorized(
                "Session ended while the login was completing",
            ));
        }

        tracing::info!(
            "[SessionManager] Logged in as {}",
            next.identity().map(|i| i.username.as_str()).unwrap_or(username)
        );
        Ok(next)
    }

    /// Logs out. Best effort: a failed request is logged, and the client
    /// always ends up `Unauthenticated` with an empty cache.
    pub async fn logout(&self) {
        if let Err(e) = self
            .transport
            .send_unit(ApiRequest::post(routes::AUTH_LOGOUT))
            .await
        {
            tracing::warn!("[SessionManager] Logout request failed: {}", e);
        }
        self.set_unauthenticated("logout");
    }

    /// Forced transition after a 401 observed anywhere in the cache.
    pub fn expire(&self) {
        self.set_unauthenticated("request rejected with 401");
    }

    fn set_unauthenticated(&self, reason: &str) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.cache.clear();
        let previous = self.state.send_replace(SessionSnapshot::unauthenticated());
        tracing::info!(
            "[SessionManager] Session {:?} -> Unauthenticated ({})",
            previous.state(),
            reason
        );
    }

    async fn fetch_status(&self) -> Result<SessionStatus> {
        self.transport
            .send_json::<SessionStatus>(ApiRequest::get(routes::AUTH_STATUS))
            .await
    }
}
