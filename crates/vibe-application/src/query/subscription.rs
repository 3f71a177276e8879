use super::cache::{CacheEvent, QueryCache};
use std::marker::PhantomData;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use vibe_core::query::{CachedResult, QueryKey, QueryPolicy};

/// A live consumer of one cache key.
///
/// Keeps the key's refetch schedule running while alive. Dropping the last
/// subscription for a key cancels the schedule.
pub struct QuerySubscription<T> {
    cache: QueryCache,
    key: QueryKey,
    policy: QueryPolicy,
    events: broadcast::Receiver<CacheEvent>,
    /// Entry this subscription is counted on; `None` when disabled.
    entry_id: Option<u64>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> QuerySubscription<T> {
    pub(super) fn new(
        cache: QueryCache,
        key: QueryKey,
        policy: QueryPolicy,
        events: broadcast::Receiver<CacheEvent>,
        entry_id: Option<u64>,
    ) -> Self {
        Self {
            cache,
            key,
            policy,
            events,
            entry_id,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Current state of the key; never starts a fetch.
    pub fn current(&self) -> CachedResult<T> {
        self.cache.peek(&self.key, self.policy)
    }

    /// Waits until the key changes (fetch completed, invalidated, evicted,
    /// or the whole cache was purged or cleared).
    ///
    /// Returns false once the cache itself is gone.
    pub async fn changed(&mut self) -> bool {
        loop {
            match self.events.recv().await {
                Ok(event) if event.concerns(&self.key) => return true,
                Ok(_) => continue,
                // Missed events may have concerned us
                Err(RecvError::Lagged(_)) => return true,
                Err(RecvError::Closed) => return false,
            }
        }
    }
}

impl<T> Drop for QuerySubscription<T> {
    fn drop(&mut self) {
        if let Some(entry_id) = self.entry_id {
            self.cache.unsubscribe(&self.key, entry_id);
        }
    }
}
