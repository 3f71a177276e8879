//! Resource query cache and its subscriptions.

mod cache;
mod subscription;

pub use cache::{CacheEvent, QueryCache, UnauthorizedHandler};
pub use subscription::QuerySubscription;

#[cfg(test)]
mod tests;
