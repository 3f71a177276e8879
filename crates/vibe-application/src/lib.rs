//! The Vibe dashboard synchronization layer.
//!
//! - [`QueryCache`]: keyed resource cache with staleness, de-duplicated
//!   fetches, periodic refresh and invalidation
//! - [`SessionManager`]: authentication state and its effect on the cache
//! - [`ActiveAccountResolver`]: server-backed active account pointer
//! - [`NotificationQueue`]: transient notifications with expiry timers
//! - [`DashboardApi`]: typed resource reads and writes
//! - [`DashboardContext`]: wires all of the above around one transport

pub mod account;
pub mod api;
pub mod context;
pub mod keys;
pub mod notification;
pub mod query;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use account::ActiveAccountResolver;
pub use api::DashboardApi;
pub use context::DashboardContext;
pub use notification::NotificationQueue;
pub use query::{CacheEvent, QueryCache, QuerySubscription};
pub use session::SessionManager;
