use crate::error::SyncError;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Lifecycle of a cached query as seen by a consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// The query is disabled; nothing will be fetched.
    Idle,
    /// No value yet; a fetch is pending or in flight.
    Pending,
    /// A value is available (it may be stale or re-fetching).
    Success,
    /// The last fetch failed and no value was ever fetched.
    Error,
}

/// Snapshot of one cache entry returned by a non-blocking read.
#[derive(Debug, Clone)]
pub struct CachedResult<T> {
    pub status: QueryStatus,
    /// Last successfully fetched payload; survives later failures.
    pub value: Option<Arc<T>>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub is_fetching: bool,
    pub is_stale: bool,
    /// Error of the most recent attempt, cleared by the next success.
    pub error: Option<SyncError>,
}

impl<T> CachedResult<T> {
    /// Result for a disabled query with nothing cached.
    pub fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            value: None,
            fetched_at: None,
            is_fetching: false,
            is_stale: true,
            error: None,
        }
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_deref()
    }

    pub fn is_idle(&self) -> bool {
        self.status == QueryStatus::Idle
    }

    pub fn is_pending(&self) -> bool {
        self.status == QueryStatus::Pending
    }

    /// True when a previous value is displayed alongside a failed refresh.
    pub fn is_stale_error(&self) -> bool {
        self.value.is_some() && self.error.is_some()
    }
}

impl<T> Default for CachedResult<T> {
    fn default() -> Self {
        Self::idle()
    }
}
