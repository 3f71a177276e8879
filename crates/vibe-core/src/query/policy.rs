use std::time::Duration;

/// Default staleness window when no configuration is supplied.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_millis(5_000);

/// Freshness and scheduling policy for one cached query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicy {
    /// When false, reads return an idle result and never touch the network.
    pub enabled: bool,
    /// Age after which the entry is considered stale and re-fetched on read.
    pub stale_after: Duration,
    /// Period of background re-fetches while the key has live subscribers.
    pub refetch_interval: Option<Duration>,
}

impl QueryPolicy {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            enabled: true,
            stale_after,
            refetch_interval: None,
        }
    }

    /// Gates the query, typically on the session being authenticated.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn refetch_every(mut self, interval: Duration) -> Self {
        self.refetch_interval = Some(interval);
        self
    }
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_AFTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let policy = QueryPolicy::default()
            .enabled(false)
            .refetch_every(Duration::from_secs(30));
        assert!(!policy.enabled);
        assert_eq!(policy.stale_after, DEFAULT_STALE_AFTER);
        assert_eq!(policy.refetch_interval, Some(Duration::from_secs(30)));
    }
}
