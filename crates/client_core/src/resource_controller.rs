use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    error::RemoteError,
    in_flight::{InFlight, TicketBook, Tracked},
    resources::Resource,
    types::{Notification, ResourceState},
    NotificationSink, RemoteResult, ResourceApi,
};

const ERROR_TITLE: &str = "Error";
const SUCCESS_TITLE: &str = "Success";

/// State container for one backend collection.
///
/// `refresh` and `get_one` are ticketed: `items` only accept the result of
/// the most recently issued refresh, and `error` only accepts writes from a
/// ticket at least as new as its last writer. `loading` is true while any
/// ticketed call is pending.
pub struct ResourceController<R: Resource> {
    api: Arc<dyn ResourceApi<R>>,
    sink: Arc<dyn NotificationSink>,
    inner: Mutex<ControllerInner<R::Item>>,
    state_tx: watch::Sender<ResourceState<R::Item>>,
    started: AtomicBool,
}

struct ControllerInner<T> {
    state: ResourceState<T>,
    tickets: TicketBook,
    latest_refresh: u64,
    error_stamp: u64,
    stopped: bool,
}

impl<T> ControllerInner<T> {
    fn accepts_refresh(&self, ticket: u64) -> bool {
        !self.stopped && ticket == self.latest_refresh
    }

    fn record_error(&mut self, ticket: u64, error: Option<String>) -> bool {
        if self.stopped || ticket < self.error_stamp {
            return false;
        }
        self.error_stamp = ticket;
        self.state.error = error;
        true
    }
}

impl<R: Resource> ResourceController<R> {
    pub fn new(api: Arc<dyn ResourceApi<R>>, sink: Arc<dyn NotificationSink>) -> Self {
        let (state_tx, _) = watch::channel(ResourceState::default());
        Self {
            api,
            sink,
            inner: Mutex::new(ControllerInner {
                state: ResourceState::default(),
                tickets: TicketBook::default(),
                latest_refresh: 0,
                error_stamp: 0,
                stopped: false,
            }),
            state_tx,
            started: AtomicBool::new(false),
        }
    }

    /// Builds the controller and runs its initial refresh.
    pub async fn start(api: Arc<dyn ResourceApi<R>>, sink: Arc<dyn NotificationSink>) -> Self {
        let controller = Self::new(api, sink);
        controller.on_start().await;
        controller
    }

    /// Performs the one automatic refresh. Later calls are no-ops.
    pub async fn on_start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        self.refresh().await;
    }

    /// Detaches the controller: results of calls still pending are dropped
    /// without touching state or notifying.
    pub fn on_stop(&self) {
        let mut guard = self.inner.lock();
        guard.stopped = true;
        debug!(
            "resource: stopped collection={} in_flight={}",
            R::COLLECTION,
            guard.tickets.is_busy()
        );
    }

    pub fn state(&self) -> ResourceState<R::Item> {
        self.inner.lock().state.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<R::Item>> {
        self.state_tx.subscribe()
    }

    /// Reloads the full collection. Failures are recorded and notified,
    /// never returned.
    pub async fn refresh(&self) {
        let call = self.begin(true);
        let ticket = call.ticket();

        match self.api.list().await {
            Ok(items) => {
                let count = items.len();
                let applied = self.update(|inner| {
                    if !inner.accepts_refresh(ticket) {
                        return false;
                    }
                    inner.state.items = items;
                    inner.record_error(ticket, None);
                    true
                });
                if applied {
                    info!(
                        "resource: refresh ok collection={} count={count}",
                        R::COLLECTION
                    );
                } else {
                    debug!(
                        "resource: discarding superseded refresh collection={} ticket={ticket}",
                        R::COLLECTION
                    );
                }
            }
            Err(err) => {
                let message = err.display_message();
                let applied = self.update(|inner| {
                    inner.accepts_refresh(ticket) && inner.record_error(ticket, Some(message))
                });
                if applied {
                    warn!(
                        "resource: refresh failed collection={} error={err}",
                        R::COLLECTION
                    );
                    self.sink.notify(Notification::error(
                        ERROR_TITLE,
                        format!("Failed to load {}", R::COLLECTION),
                    ));
                }
            }
        }
    }

    /// Fetches one item without touching `items`.
    pub async fn get_one(&self, id: &str) -> RemoteResult<R::Item> {
        let call = self.begin(false);
        let ticket = call.ticket();

        let result = if id.trim().is_empty() {
            Err(RemoteError::validation(format!(
                "{} id must not be empty",
                R::SINGULAR
            )))
        } else {
            self.api.get_by_id(id).await
        };

        if let Err(err) = &result {
            let message = err.display_message();
            let applied = self.update(|inner| inner.record_error(ticket, Some(message)));
            warn!(
                "resource: get failed collection={} id={id} error={err}",
                R::COLLECTION
            );
            if applied {
                self.sink.notify(Notification::error(
                    ERROR_TITLE,
                    format!("Failed to load {}", R::SINGULAR),
                ));
            }
        }

        result
    }

    /// Submits a new item. The collection is not reloaded afterwards.
    pub async fn create(&self, payload: R::Payload) -> RemoteResult<Option<R::Item>> {
        let result = self.api.create(payload).await;
        let stopped = self.inner.lock().stopped;

        match &result {
            Ok(_) => {
                info!("resource: create ok collection={}", R::COLLECTION);
                if !stopped {
                    self.sink.notify(Notification::info(
                        SUCCESS_TITLE,
                        format!("Your {} was submitted", R::SINGULAR),
                    ));
                }
            }
            Err(err) => {
                warn!(
                    "resource: create failed collection={} error={err}",
                    R::COLLECTION
                );
                if !stopped {
                    self.sink.notify(Notification::error(
                        ERROR_TITLE,
                        format!("Failed to submit {}", R::SINGULAR),
                    ));
                }
            }
        }

        result
    }

    fn begin(&self, is_refresh: bool) -> InFlight<'_, Self> {
        let mut guard = self.inner.lock();
        let ticket = guard.tickets.issue();
        if is_refresh {
            guard.latest_refresh = ticket;
        }
        guard.state.loading = true;
        self.state_tx.send_replace(guard.state.clone());
        InFlight::new(self, ticket)
    }

    fn update(&self, apply: impl FnOnce(&mut ControllerInner<R::Item>) -> bool) -> bool {
        let mut guard = self.inner.lock();
        let applied = apply(&mut guard);
        if applied {
            self.state_tx.send_replace(guard.state.clone());
        }
        applied
    }
}

impl<R: Resource> Tracked for ResourceController<R> {
    fn finish(&self, _ticket: u64) {
        let mut guard = self.inner.lock();
        if guard.tickets.release() {
            guard.state.loading = false;
            self.state_tx.send_replace(guard.state.clone());
        }
    }
}

#[cfg(test)]
#[path = "tests/resource_controller_tests.rs"]
mod tests;
