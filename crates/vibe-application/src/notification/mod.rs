//! Transient operator notifications.

mod queue;

pub use queue::{DEFAULT_NOTIFICATION_TIMEOUT, NotificationQueue};
