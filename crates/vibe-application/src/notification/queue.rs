//! Transient notification queue.
//!
//! Every notification carries its own expiry timer. Reads filter on the
//! deadline too, so a notification is never observed past its lifetime even
//! if its timer task has not run yet.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use vibe_core::SyncError;
use vibe_core::notification::{NewNotification, Notification, NotificationId, Severity};

pub const DEFAULT_NOTIFICATION_TIMEOUT: Duration = Duration::from_millis(4_000);

struct Pending {
    notification: Notification,
    expires_at: Instant,
    timer: Option<AbortHandle>,
}

struct QueueInner {
    timeout: Duration,
    items: Mutex<Vec<Pending>>,
    published: watch::Sender<Vec<Notification>>,
}

impl QueueInner {
    fn items(&self) -> MutexGuard<'_, Vec<Pending>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn visible(items: &[Pending], now: Instant) -> Vec<Notification> {
        items
            .iter()
            .filter(|p| p.expires_at > now)
            .map(|p| p.notification.clone())
            .collect()
    }

    fn publish(&self, items: &[Pending]) {
        self.published.send_replace(Self::visible(items, Instant::now()));
    }

    fn expire(&self, id: &str) {
        let mut items = self.items();
        let before = items.len();
        items.retain(|p| p.notification.id != id);
        if items.len() != before {
            tracing::debug!("[Notifications] Expired {}", id);
            self.publish(&items);
        }
    }
}

/// Queue of transient notifications with independent expiry timers.
///
/// Cheap to clone; clones share one queue. None of the operations can fail.
#[derive(Clone)]
pub struct NotificationQueue {
    inner: Arc<QueueInner>,
}

impl NotificationQueue {
    pub fn new(timeout: Duration) -> Self {
        let (published, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(QueueInner {
                timeout,
                items: Mutex::new(Vec::new()),
                published,
            }),
        }
    }

    /// Appends a notification and schedules its removal.
    ///
    /// Outside a tokio runtime no timer is spawned; the notification still
    /// disappears from reads once its deadline passes.
    pub fn enqueue(&self, request: NewNotification) -> NotificationId {
        let notification = Notification::create(request);
        let id = notification.id.clone();
        let expires_at = Instant::now() + self.inner.timeout;

        let mut items = self.inner.items();
        let timer = tokio::runtime::Handle::try_current().ok().map(|runtime| {
            let weak: Weak<QueueInner> = Arc::downgrade(&self.inner);
            let timer_id = id.clone();
            runtime
                .spawn(async move {
                    tokio::time::sleep_until(expires_at).await;
                    if let Some(inner) = weak.upgrade() {
                        inner.expire(&timer_id);
                    }
                })
                .abort_handle()
        });

        tracing::debug!(
            "[Notifications] Enqueued {} ({:?}): {}",
            id,
            notification.severity,
            notification.title
        );
        items.push(Pending {
            notification,
            expires_at,
            timer,
        });
        self.inner.publish(&items);
        id
    }

    /// Removes a notification now and cancels its timer. Unknown ids are ignored.
    pub fn dismiss(&self, id: &str) {
        let mut items = self.inner.items();
        let Some(position) = items.iter().position(|p| p.notification.id == id) else {
            return;
        };
        let removed = items.remove(position);
        if let Some(timer) = removed.timer {
            timer.abort();
        }
        tracing::debug!("[Notifications] Dismissed {}", id);
        self.inner.publish(&items);
    }

    /// Active notifications in insertion order.
    pub fn snapshot(&self) -> Vec<Notification> {
        let items = self.inner.items();
        QueueInner::visible(&items, Instant::now())
    }

    /// Observes every change. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
        self.inner.published.subscribe()
    }

    /// Removes everything and cancels all timers.
    pub fn clear(&self) {
        let mut items = self.inner.items();
        for pending in items.drain(..) {
            if let Some(timer) = pending.timer {
                timer.abort();
            }
        }
        self.inner.publish(&items);
    }

    pub fn success(&self, title: impl Into<String>) -> NotificationId {
        self.enqueue(NewNotification::new(title).with_severity(Severity::Success))
    }

    pub fn warning(&self, title: impl Into<String>) -> NotificationId {
        self.enqueue(NewNotification::new(title).with_severity(Severity::Warning))
    }

    pub fn error(&self, title: impl Into<String>, description: impl Into<String>) -> NotificationId {
        self.enqueue(
            NewNotification::new(title)
                .with_description(description)
                .with_severity(Severity::Error),
        )
    }

    /// Reports a failed operation with the error's operator-facing message.
    pub fn notify_failure(&self, title: impl Into<String>, error: &SyncError) -> NotificationId {
        self.error(title, error.user_message())
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TIMEOUT)
    }
}
