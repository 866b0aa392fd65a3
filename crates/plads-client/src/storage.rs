use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// The single durable session entry. `expiration` round-trips as an
/// ISO-8601 timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub user_id: Uuid,
    pub token: String,
    pub expiration: DateTime<Utc>,
}

/// File-backed storage for the session entry
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read the stored entry. A missing or unreadable entry is treated
    /// as absent, never an error: a stale cache must not break startup.
    pub fn load(&self) -> Option<StoredSession> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("Ignoring corrupt session entry: {}", e);
                None
            }
        }
    }

    pub fn save(&self, session: &StoredSession) -> Result<()> {
        let raw = serde_json::to_string(session).context("Failed to serialize session")?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write session to {}", self.path.display()))
    }

    /// Remove the entry; a missing file is fine
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to clear session at {}", self.path.display()))
            }
        }
    }
}
