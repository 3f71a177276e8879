//! Notification domain module.

mod model;

pub use model::{NewNotification, Notification, NotificationId, Severity};
