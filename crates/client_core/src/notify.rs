use tokio::sync::broadcast;
use tracing::{error, info};

use crate::{
    types::{Notification, Severity},
    NotificationSink,
};

/// Writes notifications to the log. Default sink for headless front ends.
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Info => info!(
                title = %notification.title,
                "notify: {}",
                notification.description
            ),
            Severity::Error => error!(
                title = %notification.title,
                "notify: {}",
                notification.description
            ),
        }
    }
}

/// Publishes notifications to every subscribed view.
#[derive(Clone)]
pub struct BroadcastNotificationSink {
    events: broadcast::Sender<Notification>,
}

impl BroadcastNotificationSink {
    /// `capacity` below one is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self { events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }
}

impl Default for BroadcastNotificationSink {
    fn default() -> Self {
        Self::new(64)
    }
}

impl NotificationSink for BroadcastNotificationSink {
    fn notify(&self, notification: Notification) {
        // No subscribers is fine; toasts are not replayed.
        let _ = self.events.send(notification);
    }
}

pub struct NoopNotificationSink;

impl NotificationSink for NoopNotificationSink {
    fn notify(&self, _notification: Notification) {}
}
