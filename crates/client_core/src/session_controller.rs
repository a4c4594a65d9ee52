use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use parking_lot::Mutex;
use shared::domain::{Credentials, Session};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    in_flight::{InFlight, TicketBook, Tracked},
    types::{Notification, SessionState},
    NotificationSink, RemoteResult, SessionApi,
};

/// The one authentication state of a client. Every consumer holds the same
/// `Arc<SessionStore>` and reads through it.
pub struct SessionStore {
    inner: Mutex<StoreInner>,
    state_tx: watch::Sender<SessionState>,
}

struct StoreInner {
    state: SessionState,
    tickets: TicketBook,
    applied: u64,
}

impl SessionStore {
    pub fn new() -> Arc<Self> {
        let (state_tx, _) = watch::channel(SessionState::unknown());
        Arc::new(Self {
            inner: Mutex::new(StoreInner {
                state: SessionState::unknown(),
                tickets: TicketBook::default(),
                applied: 0,
            }),
            state_tx,
        })
    }

    pub fn snapshot(&self) -> SessionState {
        self.inner.lock().state.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.lock().state.is_authenticated()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.inner.lock().state.session().cloned()
    }

    fn issue(&self) -> u64 {
        let mut guard = self.inner.lock();
        let ticket = guard.tickets.issue();
        guard.state.set_loading(true);
        self.state_tx.send_replace(guard.state.clone());
        ticket
    }

    /// Replaces the state unless a newer ticket already wrote it.
    fn apply(&self, ticket: u64, next: SessionState) -> bool {
        let mut guard = self.inner.lock();
        if ticket < guard.applied {
            return false;
        }
        guard.applied = ticket;
        let busy = guard.tickets.is_busy();
        guard.state = next;
        guard.state.set_loading(busy);
        self.state_tx.send_replace(guard.state.clone());
        true
    }

    fn release(&self) {
        let mut guard = self.inner.lock();
        if guard.tickets.release() && guard.state.loading() {
            guard.state.set_loading(false);
            self.state_tx.send_replace(guard.state.clone());
        }
    }
}

/// Drives [`SessionStore`] through `Unknown -> {Authenticated, Unauthenticated}`.
pub struct SessionController {
    api: Arc<dyn SessionApi>,
    sink: Arc<dyn NotificationSink>,
    store: Arc<SessionStore>,
    started: AtomicBool,
    stopped: AtomicBool,
}

impl SessionController {
    pub fn new(
        api: Arc<dyn SessionApi>,
        sink: Arc<dyn NotificationSink>,
        store: Arc<SessionStore>,
    ) -> Self {
        Self {
            api,
            sink,
            store,
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    /// Builds the controller and resolves the initial session.
    pub async fn start(
        api: Arc<dyn SessionApi>,
        sink: Arc<dyn NotificationSink>,
        store: Arc<SessionStore>,
    ) -> Self {
        let controller = Self::new(api, sink, store);
        controller.on_start().await;
        controller
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn state(&self) -> SessionState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.store.subscribe()
    }

    /// Validates the locally known session once. Later calls are no-ops.
    pub async fn on_start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let call = self.begin();
        let ticket = call.ticket();

        let Some(local) = self.api.current_session_local() else {
            debug!("session: no local session");
            self.settle(ticket, SessionState::unauthenticated(None));
            return;
        };

        match self.api.validate_session().await {
            Ok(true) => {
                info!("session: restored user={}", local.id);
                self.settle(ticket, SessionState::authenticated(local));
            }
            Ok(false) => {
                info!("session: local session rejected user={}", local.id);
                self.settle(ticket, SessionState::unauthenticated(None));
            }
            Err(err) => {
                warn!("session: validation failed user={} error={err}", local.id);
                let applied = self.settle(
                    ticket,
                    SessionState::unauthenticated(Some(err.display_message())),
                );
                if applied {
                    self.sink.notify(Notification::error(
                        "Session error",
                        "Could not verify your session. Please sign in again.",
                    ));
                }
            }
        }
    }

    /// Late results of pending calls are dropped after this, except logout.
    pub fn on_stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub async fn login(&self, identifier: &str, secret: &str) -> RemoteResult<Session> {
        let call = self.begin();
        let ticket = call.ticket();

        let credentials = Credentials {
            identifier: identifier.to_string(),
            secret: secret.to_string(),
        };
        match self.api.login(&credentials).await {
            Ok(session) => {
                let applied = self.settle(ticket, SessionState::authenticated(session.clone()));
                if applied {
                    info!("session: login ok user={}", session.id);
                    self.sink.notify(Notification::info(
                        "Signed in",
                        format!("Welcome back, {identifier}"),
                    ));
                } else {
                    debug!("session: discarding superseded login user={}", session.id);
                }
                Ok(session)
            }
            Err(err) => {
                warn!("session: login failed identifier={identifier} error={err}");
                let applied = self.settle(
                    ticket,
                    SessionState::unauthenticated(Some(err.display_message())),
                );
                if applied {
                    self.sink
                        .notify(Notification::error("Login failed", err.display_message()));
                }
                Err(err)
            }
        }
    }

    /// Always ends unauthenticated. Remote failures are logged and dropped.
    pub async fn logout(&self) {
        let call = self.begin();
        let _reset = LogoutReset {
            store: &self.store,
            ticket: call.ticket(),
        };

        match self.api.logout().await {
            Ok(()) => info!("session: logout ok"),
            Err(err) => warn!("session: remote logout failed error={err}"),
        }

        if !self.stopped.load(Ordering::SeqCst) {
            self.sink
                .notify(Notification::info("Signed out", "You have been signed out"));
        }
    }

    fn begin(&self) -> InFlight<'_, Self> {
        InFlight::new(self, self.store.issue())
    }

    fn settle(&self, ticket: u64, next: SessionState) -> bool {
        if self.stopped.load(Ordering::SeqCst) {
            return false;
        }
        self.store.apply(ticket, next)
    }
}

impl Tracked for SessionController {
    fn finish(&self, _ticket: u64) {
        self.store.release();
    }
}

/// Applies the unauthenticated state on drop, so logout is terminal even
/// when the remote call errors or the future is abandoned.
struct LogoutReset<'a> {
    store: &'a SessionStore,
    ticket: u64,
}

impl Drop for LogoutReset<'_> {
    fn drop(&mut self) {
        self.store
            .apply(self.ticket, SessionState::unauthenticated(None));
    }
}

#[cfg(test)]
#[path = "tests/session_controller_tests.rs"]
mod tests;
