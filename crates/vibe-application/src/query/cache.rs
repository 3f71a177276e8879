//! Resource query cache.
//!
//! Keyed, typed cache of server-derived values with stale-while-revalidate
//! reads, request de-duplication, subscriber-driven periodic refresh and
//! mutation-triggered invalidation.
//!
//! All entry state sits behind one `std::sync::Mutex`. The lock is never held
//! across an `.await`, so every check-and-set (notably "is a fetch already in
//! flight for this key?") is atomic. Each fetch runs in its own spawned task
//! and writes its outcome back itself, so a background refresh lands in the
//! cache even when no caller awaits it.

use super::subscription::QuerySubscription;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use vibe_core::query::{
    CachedResult, DEFAULT_STALE_AFTER, KeyFilter, QueryKey, QueryPolicy, QueryStatus,
};
use vibe_core::{Result, SyncError};

const EVENT_CAPACITY: usize = 64;

type AnyValue = Arc<dyn Any + Send + Sync>;
type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, Result<AnyValue>> + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<AnyValue>>>;

/// Callback invoked when any cache-mediated request fails with 401.
pub type UnauthorizedHandler = Arc<dyn Fn() + Send + Sync>;

/// Change notifications published by the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// A fetch for the key completed (successfully or not).
    Updated(QueryKey),
    /// The key was marked stale.
    Invalidated(QueryKey),
    /// The entry was removed.
    Evicted(QueryKey),
    /// Every value was dropped; live keys are being re-fetched.
    Purged,
    /// Every entry was removed.
    Cleared,
}

impl CacheEvent {
    /// Returns true if a consumer of `key` should re-read after this event.
    pub fn concerns(&self, key: &QueryKey) -> bool {
        match self {
            CacheEvent::Updated(k) | CacheEvent::Invalidated(k) | CacheEvent::Evicted(k) => {
                k == key
            }
            CacheEvent::Purged | CacheEvent::Cleared => true,
        }
    }
}

struct InFlight {
    id: u64,
    shared: SharedFetch,
    abort: AbortHandle,
}

struct Entry {
    /// Distinguishes this entry from earlier ones stored under the same key.
    id: u64,
    value: Option<AnyValue>,
    fetched_at: Option<DateTime<Utc>>,
    attempted_at: Option<Instant>,
    error: Option<SyncError>,
    invalidated: bool,
    in_flight: Option<InFlight>,
    /// An invalidation arrived while a fetch was in flight.
    refetch_after_flight: bool,
    fetcher: Option<Fetcher>,
    policy: QueryPolicy,
    subscribers: usize,
    schedule: Option<CancellationToken>,
}

impl Entry {
    fn new(id: u64, policy: QueryPolicy) -> Self {
        Self {
            id,
            value: None,
            fetched_at: None,
            attempted_at: None,
            error: None,
            invalidated: false,
            in_flight: None,
            refetch_after_flight: false,
            fetcher: None,
            policy,
            subscribers: 0,
            schedule: None,
        }
    }

    fn is_stale(&self, now: Instant, stale_after: Duration) -> bool {
        match self.attempted_at {
            None => true,
            Some(at) => self.invalidated || now.duration_since(at) >= stale_after,
        }
    }

    fn is_fresh(&self, now: Instant, stale_after: Duration) -> bool {
        self.value.is_some() && self.error.is_none() && !self.is_stale(now, stale_after)
    }

    /// Drops values and cancels background work, keeping subscriber bookkeeping.
    fn reset(&mut self) {
        if let Some(flight) = self.in_flight.take() {
            flight.abort.abort();
        }
        self.value = None;
        self.fetched_at = None;
        self.attempted_at = None;
        self.error = None;
        self.invalidated = false;
        self.refetch_after_flight = false;
    }

    fn shutdown(&mut self) {
        self.reset();
        if let Some(token) = self.schedule.take() {
            token.cancel();
        }
    }

    fn snapshot<T: Send + Sync + 'static>(
        &self,
        key: &QueryKey,
        now: Instant,
        enabled: bool,
    ) -> CachedResult<T> {
        let value = match &self.value {
            Some(any) => match Arc::clone(any).downcast::<T>() {
                Ok(value) => Some(value),
                Err(_) => {
                    return CachedResult {
                        status: QueryStatus::Error,
                        error: Some(SyncError::TypeMismatch {
                            key: key.to_string(),
                        }),
                        ..CachedResult::idle()
                    };
                }
            },
            None => None,
        };

        let status = if !enabled {
            QueryStatus::Idle
        } else if value.is_some() {
            QueryStatus::Success
        } else if self.error.is_some() {
            QueryStatus::Error
        } else {
            QueryStatus::Pending
        };

        CachedResult {
            status,
            value,
            fetched_at: self.fetched_at,
            is_fetching: enabled && self.in_flight.is_some(),
            is_stale: self.is_stale(now, self.policy.stale_after),
            error: self.error.clone(),
        }
    }
}

struct CacheInner {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    /// Bumped by `clear` and `purge`; fetches started earlier are discarded.
    generation: AtomicU64,
    next_fetch_id: AtomicU64,
    next_entry_id: AtomicU64,
    events: broadcast::Sender<CacheEvent>,
    unauthorized: Mutex<Option<UnauthorizedHandler>>,
    default_stale_after: Duration,
}

impl CacheInner {
    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn new_entry(&self, policy: QueryPolicy) -> Entry {
        Entry::new(self.next_entry_id.fetch_add(1, Ordering::SeqCst), policy)
    }

    fn emit(&self, event: CacheEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn escalate_unauthorized(&self) {
        let handler = self
            .unauthorized
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match handler {
            Some(handler) => handler(),
            None => tracing::debug!("[QueryCache] 401 observed with no handler registered"),
        }
    }

    /// Starts a fetch for `key` and records it as the entry's in-flight request.
    ///
    /// Must be called with the entries lock held (`entry` borrowed from it).
    fn start_fetch(self: &Arc<Self>, key: &QueryKey, entry: &mut Entry, fetcher: Fetcher) {
        let generation = self.generation.load(Ordering::SeqCst);
        let id = self.next_fetch_id.fetch_add(1, Ordering::SeqCst);
        let weak = Arc::downgrade(self);
        let task_key = key.clone();

        tracing::debug!("[QueryCache] Fetch #{} started for {}", id, key);

        let task = tokio::spawn(async move {
            let outcome = fetcher().await;
            if let Some(inner) = weak.upgrade() {
                inner.complete(&task_key, generation, id, &outcome);
            }
            outcome
        });
        let abort = task.abort_handle();
        let shared = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) if e.is_cancelled() => Err(SyncError::Cancelled),
                Err(e) => Err(SyncError::internal(format!("Fetch task failed: {}", e))),
            }
        }
        .boxed()
        .shared();

        entry.in_flight = Some(InFlight { id, shared, abort });
    }

    /// Writes a fetch outcome back, unless the fetch was superseded.
    fn complete(self: &Arc<Self>, key: &QueryKey, generation: u64, id: u64, outcome: &Result<AnyValue>) {
        let escalate = {
            let mut entries = self.entries();
            if self.generation.load(Ordering::SeqCst) != generation {
                tracing::debug!("[QueryCache] Discarding fetch #{} for {} (cache reset)", id, key);
                return;
            }
            let Some(entry) = entries.get_mut(key) else {
                tracing::debug!("[QueryCache] Discarding fetch #{} for {} (evicted)", id, key);
                return;
            };
            if entry.in_flight.as_ref().map(|f| f.id) != Some(id) {
                return;
            }

            entry.in_flight = None;
            entry.attempted_at = Some(Instant::now());
            entry.invalidated = false;
            let escalate = match outcome {
                Ok(value) => {
                    tracing::debug!("[QueryCache] Fetch #{} succeeded for {}", id, key);
                    entry.value = Some(Arc::clone(value));
                    entry.fetched_at = Some(Utc::now());
                    entry.error = None;
                    false
                }
                Err(e) => {
                    tracing::debug!("[QueryCache] Fetch #{} failed for {}: {}", id, key, e);
                    entry.error = Some(e.clone());
                    e.is_unauthorized()
                }
            };

            if entry.refetch_after_flight {
                entry.refetch_after_flight = false;
                match entry.fetcher.clone() {
                    Some(fetcher) if entry.subscribers > 0 && !escalate => {
                        self.start_fetch(key, entry, fetcher);
                    }
                    _ => entry.invalidated = true,
                }
            }
            escalate
        };

        self.emit(CacheEvent::Updated(key.clone()));
        if escalate {
            self.escalate_unauthorized();
        }
    }

    /// Scheduled refresh of a subscribed key; skipped while a fetch is in flight.
    fn refresh(self: &Arc<Self>, key: &QueryKey) {
        let mut entries = self.entries();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        if entry.in_flight.is_some() || !entry.policy.enabled {
            return;
        }
        if let Some(fetcher) = entry.fetcher.clone() {
            self.start_fetch(key, entry, fetcher);
        }
    }

    fn spawn_schedule(self: &Arc<Self>, key: QueryKey, period: Duration) -> CancellationToken {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let weak: Weak<Self> = Arc::downgrade(self);

        tracing::debug!("[QueryCache] Refetching {} every {:?}", key, period);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(inner) = weak.upgrade() else { break };
                        inner.refresh(&key);
                    }
                }
            }
            tracing::debug!("[QueryCache] Schedule for {} stopped", key);
        });

        token
    }
}

/// Process-wide cache of server-derived resources.
///
/// Cheap to clone; clones share the same entries. Methods that may start a
/// fetch must be called from within a tokio runtime.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl QueryCache {
    /// Creates a cache whose default policy goes stale after `default_stale_after`.
    pub fn new(default_stale_after: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(CacheInner {
                entries: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
                next_fetch_id: AtomicU64::new(1),
                next_entry_id: AtomicU64::new(1),
                events,
                unauthorized: Mutex::new(None),
                default_stale_after,
            }),
        }
    }

    /// Enabled policy with the configured staleness window and no interval.
    pub fn default_policy(&self) -> QueryPolicy {
        QueryPolicy::new(self.inner.default_stale_after)
    }

    /// Registers the callback run whenever a request reports 401.
    pub fn set_unauthorized_handler(&self, handler: UnauthorizedHandler) {
        *self
            .inner
            .unauthorized
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    pub fn events(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }

    fn erase<T, F, Fut>(fetcher: F) -> Fetcher
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Arc::new(move || {
            let fut = fetcher();
            async move { fut.await.map(|value| Arc::new(value) as AnyValue) }.boxed()
        })
    }

    /// Non-blocking read with stale-while-revalidate semantics.
    ///
    /// Returns whatever is cached and, when the entry is missing, stale or
    /// invalidated, starts a background fetch unless one is already in
    /// flight. A disabled policy returns an empty idle result and never
    /// fetches.
    pub fn read<T, F, Fut>(&self, key: QueryKey, policy: QueryPolicy, fetcher: F) -> CachedResult<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        if !policy.enabled {
            return CachedResult::idle();
        }

        let now = Instant::now();
        let mut entries = self.inner.entries();
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| self.inner.new_entry(policy));
        let fetcher = Self::erase(fetcher);
        entry.fetcher = Some(Arc::clone(&fetcher));
        entry.policy = policy;

        if entry.in_flight.is_none() && entry.is_stale(now, policy.stale_after) {
            self.inner.start_fetch(&key, entry, fetcher);
        }
        entry.snapshot(&key, now, true)
    }

    /// Awaits a fresh value for `key`.
    ///
    /// Returns the cached value when fresh; otherwise joins the in-flight
    /// fetch or starts one. Concurrent callers share a single request.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Disabled`] when `policy.enabled` is false
    /// - [`SyncError::TypeMismatch`] when the key holds another type
    /// - the fetch error, or [`SyncError::Cancelled`] if the cache was reset
    pub async fn ensure<T, F, Fut>(&self, key: QueryKey, policy: QueryPolicy, fetcher: F) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        if !policy.enabled {
            return Err(SyncError::Disabled {
                key: key.to_string(),
            });
        }

        let shared = {
            let now = Instant::now();
            let mut entries = self.inner.entries();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| self.inner.new_entry(policy));
            let fetcher = Self::erase(fetcher);
            entry.fetcher = Some(Arc::clone(&fetcher));
            entry.policy = policy;

            if entry.in_flight.is_none() && entry.is_fresh(now, policy.stale_after) {
                let cached = entry.value.clone();
                drop(entries);
                return Self::downcast(&key, cached);
            }
            if entry.in_flight.is_none() {
                self.inner.start_fetch(&key, entry, fetcher);
            }
            match &entry.in_flight {
                Some(flight) => flight.shared.clone(),
                None => return Err(SyncError::internal("fetch was not started")),
            }
        };

        let value = shared.await?;
        Self::downcast(&key, Some(value))
    }

    fn downcast<T: Send + Sync + 'static>(key: &QueryKey, value: Option<AnyValue>) -> Result<Arc<T>> {
        value
            .and_then(|any| any.downcast::<T>().ok())
            .ok_or_else(|| SyncError::TypeMismatch {
                key: key.to_string(),
            })
    }

    /// Registers a live consumer of `key`.
    ///
    /// Performs a [`read`](Self::read) and, while at least one subscription
    /// is alive and the policy has a `refetch_interval`, re-fetches the key on
    /// that period. Dropping the subscription unregisters it.
    pub fn subscribe<T, F, Fut>(&self, key: QueryKey, policy: QueryPolicy, fetcher: F) -> QuerySubscription<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let events = self.events();
        self.read::<T, _, _>(key.clone(), policy, fetcher);

        let entry_id = if policy.enabled {
            let mut entries = self.inner.entries();
            entries.get_mut(&key).map(|entry| {
                entry.subscribers += 1;
                if entry.schedule.is_none()
                    && let Some(period) = policy.refetch_interval
                {
                    entry.schedule = Some(self.inner.spawn_schedule(key.clone(), period));
                }
                entry.id
            })
        } else {
            None
        };

        QuerySubscription::new(self.clone(), key, policy, events, entry_id)
    }

    /// Releases a subscription taken on entry `entry_id`. A handle outliving
    /// its entry (cleared, evicted) must not touch the entry that replaced it.
    pub(super) fn unsubscribe(&self, key: &QueryKey, entry_id: u64) {
        let mut entries = self.inner.entries();
        if let Some(entry) = entries.get_mut(key)
            && entry.id == entry_id
        {
            entry.subscribers = entry.subscribers.saturating_sub(1);
            if entry.subscribers == 0
                && let Some(token) = entry.schedule.take()
            {
                token.cancel();
            }
        }
    }

    /// Snapshot of `key` without triggering a fetch.
    pub fn peek<T: Send + Sync + 'static>(&self, key: &QueryKey, policy: QueryPolicy) -> CachedResult<T> {
        let entries = self.inner.entries();
        match entries.get(key) {
            Some(entry) => entry.snapshot(key, Instant::now(), policy.enabled),
            None if policy.enabled => CachedResult {
                status: QueryStatus::Pending,
                ..CachedResult::idle()
            },
            None => CachedResult::idle(),
        }
    }

    /// Last successfully fetched value of `key`, stale or not.
    pub fn cached<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let entries = self.inner.entries();
        entries
            .get(key)
            .and_then(|entry| entry.value.clone())
            .and_then(|any| any.downcast::<T>().ok())
    }

    /// Returns true if `key` has at least one live subscription.
    pub fn has_subscribers(&self, key: &QueryKey) -> bool {
        let entries = self.inner.entries();
        entries.get(key).is_some_and(|entry| entry.subscribers > 0)
    }

    /// Marks matching entries stale.
    ///
    /// Entries with live subscribers re-fetch now, or right after their
    /// in-flight fetch completes; the rest re-fetch on their next read.
    pub fn invalidate(&self, filter: &KeyFilter) {
        let invalidated: Vec<QueryKey> = {
            let mut entries = self.inner.entries();
            let mut keys = Vec::new();
            for (key, entry) in entries.iter_mut().filter(|(key, _)| filter.matches(key)) {
                entry.invalidated = true;
                if entry.in_flight.is_some() {
                    entry.refetch_after_flight = true;
                } else if entry.subscribers > 0
                    && entry.policy.enabled
                    && let Some(fetcher) = entry.fetcher.clone()
                {
                    self.inner.start_fetch(key, entry, fetcher);
                }
                keys.push(key.clone());
            }
            keys
        };

        tracing::debug!(
            "[QueryCache] Invalidated {} entries ({})",
            invalidated.len(),
            filter
        );
        for key in invalidated {
            self.inner.emit(CacheEvent::Invalidated(key));
        }
    }

    /// Drops the values and errors of matching entries.
    ///
    /// Unlike [`invalidate`](Self::invalidate), nothing cached before the call
    /// is returned afterwards. Subscribed entries keep their subscriptions and
    /// re-fetch now; the rest are removed.
    pub fn discard(&self, filter: &KeyFilter) {
        let mut kept = Vec::new();
        let mut removed = Vec::new();
        {
            let mut entries = self.inner.entries();
            entries.retain(|key, entry| {
                if !filter.matches(key) {
                    return true;
                }
                entry.reset();
                if entry.subscribers > 0 {
                    kept.push(key.clone());
                    true
                } else {
                    removed.push(key.clone());
                    false
                }
            });
            for key in &kept {
                if let Some(entry) = entries.get_mut(key)
                    && entry.policy.enabled
                    && let Some(fetcher) = entry.fetcher.clone()
                {
                    self.inner.start_fetch(key, entry, fetcher);
                }
            }
        }

        tracing::debug!(
            "[QueryCache] Discarded {} entries ({})",
            kept.len() + removed.len(),
            filter
        );
        for key in removed {
            self.inner.emit(CacheEvent::Evicted(key));
        }
        for key in kept {
            self.inner.emit(CacheEvent::Invalidated(key));
        }
    }

    /// Runs a write. Cached values are untouched; a 401 is escalated.
    pub async fn mutate<T, Fut>(&self, mutation: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let outcome = mutation.await;
        if let Err(e) = &outcome
            && e.is_unauthorized()
        {
            self.inner.escalate_unauthorized();
        }
        outcome
    }

    /// Runs a write and, only once it succeeds, invalidates `filters`.
    pub async fn mutate_and_invalidate<T, Fut>(&self, mutation: Fut, filters: &[KeyFilter]) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let value = self.mutate(mutation).await?;
        for filter in filters {
            self.invalidate(filter);
        }
        Ok(value)
    }

    /// Drops every cached value and error and aborts in-flight fetches.
    ///
    /// Subscriptions and their schedules survive; subscribed keys are
    /// re-fetched immediately. Nothing cached before the purge is ever
    /// returned after it.
    pub fn purge(&self) {
        {
            let mut entries = self.inner.entries();
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            entries.retain(|_, entry| {
                entry.reset();
                entry.subscribers > 0
            });
            for (key, entry) in entries.iter_mut() {
                if entry.policy.enabled
                    && let Some(fetcher) = entry.fetcher.clone()
                {
                    self.inner.start_fetch(key, entry, fetcher);
                }
            }
            tracing::debug!("[QueryCache] Purged; {} live keys re-fetching", entries.len());
        }
        self.inner.emit(CacheEvent::Purged);
    }

    /// Removes every entry, aborting fetches and cancelling schedules.
    pub fn clear(&self) {
        {
            let mut entries = self.inner.entries();
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            for entry in entries.values_mut() {
                entry.shutdown();
            }
            entries.clear();
        }
        tracing::debug!("[QueryCache] Cleared");
        self.inner.emit(CacheEvent::Cleared);
    }

    /// Removes one entry with the same cleanup as [`clear`](Self::clear).
    pub fn evict(&self, key: &QueryKey) {
        let removed = self.inner.entries().remove(key);
        if let Some(mut entry) = removed {
            entry.shutdown();
            tracing::debug!("[QueryCache] Evicted {}", key);
            self.inner.emit(CacheEvent::Evicted(key.clone()));
        }
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.inner.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_AFTER)
    }
}
