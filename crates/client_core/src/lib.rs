use async_trait::async_trait;
use shared::domain::{Credentials, Session};

pub mod config;
pub mod error;
mod in_flight;
pub mod notify;
mod resource_controller;
pub mod resources;
pub mod session_cache;
mod session_controller;
pub mod transport;
pub mod types;

pub use error::{RemoteError, FALLBACK_ERROR_MESSAGE};
pub use notify::{BroadcastNotificationSink, NoopNotificationSink, TracingNotificationSink};
pub use resource_controller::ResourceController;
pub use resources::{Resource, Reviews, Symptoms};
pub use session_cache::SessionCache;
pub use session_controller::{SessionController, SessionStore};
pub use transport::{HttpResourceApi, HttpSessionApi};
pub use types::{Notification, ResourceState, SessionState, SessionStatus, Severity};

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Collection-oriented operations the backend exposes for one resource.
#[async_trait]
pub trait ResourceApi<R: Resource>: Send + Sync {
    async fn list(&self) -> RemoteResult<Vec<R::Item>>;
    async fn get_by_id(&self, id: &str) -> RemoteResult<R::Item>;
    /// Returns the stored item when the backend echoes it back.
    async fn create(&self, payload: R::Payload) -> RemoteResult<Option<R::Item>>;
}

#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Locally persisted session, if any. Never touches the network.
    fn current_session_local(&self) -> Option<Session>;
    async fn validate_session(&self) -> RemoteResult<bool>;
    async fn login(&self, credentials: &Credentials) -> RemoteResult<Session>;
    /// Callers treat this as terminal even when it fails.
    async fn logout(&self) -> RemoteResult<()>;
}

/// Fire-and-forget side channel for user-facing messages.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
