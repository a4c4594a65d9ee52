use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use shared::domain::{Review, ReviewId, Session, UserId};
use tokio::sync::oneshot;

use crate::{types::Notification, NotificationSink, RemoteResult};

#[derive(Default)]
pub(crate) struct RecordingSink {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub(crate) fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.lock())
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }
}

/// One scripted answer for a fake remote call. `Gated` answers resolve when
/// the test sends on the paired channel.
pub(crate) enum Scripted<T> {
    Ready(RemoteResult<T>),
    Gated(oneshot::Receiver<RemoteResult<T>>),
}

pub(crate) struct Script<T> {
    queue: Mutex<VecDeque<Scripted<T>>>,
    calls: Mutex<u32>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            calls: Mutex::new(0),
        }
    }
}

impl<T> Script<T> {
    pub(crate) fn push(&self, result: RemoteResult<T>) {
        self.queue.lock().push_back(Scripted::Ready(result));
    }

    pub(crate) fn push_gated(&self) -> oneshot::Sender<RemoteResult<T>> {
        let (tx, rx) = oneshot::channel();
        self.queue.lock().push_back(Scripted::Gated(rx));
        tx
    }

    pub(crate) fn calls(&self) -> u32 {
        *self.calls.lock()
    }

    pub(crate) async fn next(&self) -> RemoteResult<T> {
        *self.calls.lock() += 1;
        let scripted = self
            .queue
            .lock()
            .pop_front()
            .expect("unexpected remote call");
        match scripted {
            Scripted::Ready(result) => result,
            Scripted::Gated(rx) => rx.await.expect("gate dropped"),
        }
    }
}

pub(crate) fn timestamp() -> DateTime<Utc> {
    "2024-03-01T09:30:00Z".parse().expect("timestamp")
}

pub(crate) fn review(id: &str, author_name: &str) -> Review {
    Review {
        id: ReviewId::from(id),
        author_name: author_name.to_string(),
        rating: 5,
        comment: format!("{author_name} was treated kindly"),
        created_at: timestamp(),
    }
}

pub(crate) fn session(id: &str) -> Session {
    Session {
        id: UserId::from(id),
        email: Some(format!("{id}@clinic.test")),
        access_token: format!("token-{id}"),
        expires_at: None,
    }
}
