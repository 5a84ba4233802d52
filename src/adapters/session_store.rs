use crate::domain::ports::SessionStore;
use crate::domain::request::SessionRecord;
use crate::utils::error::{CheckoutError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

fn check_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(CheckoutError::validation(
            "session",
            format!("'{}' is not a valid session id", session_id),
        ));
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<SessionRecord> {
        check_session_id(session_id)?;
        let sessions = self.sessions.lock().await;
        Ok(sessions.get(session_id).cloned().unwrap_or_default())
    }

    async fn save(&self, session_id: &str, record: &SessionRecord) -> Result<()> {
        check_session_id(session_id)?;
        let mut sessions = self.sessions.lock().await;
        sessions.insert(session_id.to_string(), record.clone());
        Ok(())
    }
}

/// One JSON file per session under `base_path`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    base_path: PathBuf,
}

impl FileSessionStore {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", session_id))
    }
}

impl SessionStore for FileSessionStore {
    async fn load(&self, session_id: &str) -> Result<SessionRecord> {
        check_session_id(session_id)?;
        let path = self.session_path(session_id);
        if !path.exists() {
            tracing::debug!("No session file at {}, starting a new session", path.display());
            return Ok(SessionRecord::default());
        }
        let data = fs::read(&path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    async fn save(&self, session_id: &str, record: &SessionRecord) -> Result<()> {
        check_session_id(session_id)?;
        let path = self.session_path(session_id);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, serde_json::to_vec_pretty(record)?)?;
        tracing::debug!("Session saved to {}", path.display());
        Ok(())
    }
}
