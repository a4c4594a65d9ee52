use serde::Serialize;
use shared::domain::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Info,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Error,
        }
    }
}

/// Snapshot of a collection controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceState<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Authentication state. Only [`SessionState::authenticated`] produces an
/// authenticated state, so an authenticated state always carries a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    session: Option<Session>,
    status: SessionStatus,
    loading: bool,
    error: Option<String>,
}

impl SessionState {
    pub fn unknown() -> Self {
        Self {
            session: None,
            status: SessionStatus::Unknown,
            loading: true,
            error: None,
        }
    }

    pub(crate) fn authenticated(session: Session) -> Self {
        Self {
            session: Some(session),
            status: SessionStatus::Authenticated,
            loading: false,
            error: None,
        }
    }

    pub(crate) fn unauthenticated(error: Option<String>) -> Self {
        Self {
            session: None,
            status: SessionStatus::Unauthenticated,
            loading: false,
            error,
        }
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::unknown()
    }
}
