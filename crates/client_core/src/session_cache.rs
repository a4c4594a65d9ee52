use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use shared::domain::Session;
use tracing::warn;

/// Locally known session. Kept in memory and, when a path is configured,
/// mirrored to a JSON file so it survives restarts.
pub struct SessionCache {
    path: Option<PathBuf>,
    current: RwLock<Option<Session>>,
}

impl SessionCache {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            current: RwLock::new(None),
        }
    }

    /// Opens the cache at `path`. A missing file means no session; an
    /// unreadable or corrupt one is logged and treated the same way.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match read_session_file(&path) {
            Ok(session) => session,
            Err(err) => {
                warn!(
                    "session cache: ignoring unreadable file path={} error={err:#}",
                    path.display()
                );
                None
            }
        };
        Self {
            path: Some(path),
            current: RwLock::new(current),
        }
    }

    pub fn get(&self) -> Option<Session> {
        self.current.read().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.current
            .read()
            .as_ref()
            .map(|session| session.access_token.clone())
    }

    pub fn store(&self, session: Session) -> Result<()> {
        if let Some(path) = &self.path {
            write_session_file(path, &session)?;
        }
        *self.current.write() = Some(session);
        Ok(())
    }

    pub fn clear(&self) {
        *self.current.write() = None;
        if let Some(path) = &self.path {
            if let Err(err) = fs::remove_file(path) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!(
                        "session cache: failed to remove path={} error={err}",
                        path.display()
                    );
                }
            }
        }
    }
}

fn read_session_file(path: &Path) -> Result<Option<Session>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };
    let session = serde_json::from_str(&raw)
        .with_context(|| format!("invalid session file '{}'", path.display()))?;
    Ok(Some(session))
}

fn write_session_file(path: &Path, session: &Session) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create parent directory '{}'", parent.display())
            })?;
        }
    }
    let body = serde_json::to_string_pretty(session)?;
    fs::write(path, body).with_context(|| format!("failed to write '{}'", path.display()))
}
