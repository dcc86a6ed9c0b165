use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::{Session, SessionError, SessionStore};

/// On-disk layout: the two keys `token` and `role`, nothing else.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Session {
            token: stored.token,
            role: stored.role.and_then(|r| r.parse().ok()),
        }
    }
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        StoredSession {
            token: session.token.clone(),
            role: session.role.map(|r| r.as_str().to_string()),
        }
    }
}

/// Session kept in process memory, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Session>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        MemoryStore {
            inner: RwLock::new(session),
        }
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<Session, SessionError> {
        let session = self.inner.read().map_err(|_| SessionError::Poisoned)?;
        Ok(session.clone())
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        let mut current = self.inner.write().map_err(|_| SessionError::Poisoned)?;
        *current = session.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut current = self.inner.write().map_err(|_| SessionError::Poisoned)?;
        *current = Session::default();
        Ok(())
    }
}

/// Session persisted as a small JSON file, surviving between CLI runs.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "session".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStore for FileStore {
    fn load(&self) -> Result<Session, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Session::default()),
            Err(e) => return Err(e.into()),
        };

        if raw.trim().is_empty() {
            return Ok(Session::default());
        }

        let stored: StoredSession = serde_json::from_str(&raw)?;
        Ok(stored.into())
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(&StoredSession::from(session))?;

        // owner-only temp file, renamed over the session so readers never see a partial write
        let tmp = self.tmp_path();
        match fs::remove_file(&tmp) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let written = options.open(&tmp).and_then(|mut file| {
            file.write_all(json.as_bytes())?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|()| fs::rename(&tmp, &self.path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        tracing::debug!("Session saved to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!("Session file {} removed", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
