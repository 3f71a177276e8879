//! Session management: authentication state and its effect on the cache.

mod manager;

pub use manager::SessionManager;
