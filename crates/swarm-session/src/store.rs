use crate::session::{SessionStatus, SwarmSession};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use swarm_core::{SwarmError, SwarmResult};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Listing entry for a stored session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session id.
    pub session_id: String,
    /// Feature text, truncated.
    pub feature: String,
    /// Session status.
    pub status: SessionStatus,
    /// Time of the last save.
    pub updated_at: DateTime<Utc>,
}

/// Durable storage of session aggregates, keyed by session id.
///
/// `save` is a full overwrite; a failed save must surface as an error because
/// a silently lost mutation breaks resume.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Overwrite the stored record of `session`.
    async fn save(&self, session: &SwarmSession) -> SwarmResult<()>;
    /// Load a session. `None` if it was never saved.
    async fn get(&self, session_id: &str) -> SwarmResult<Option<SwarmSession>>;
    /// Every stored session, most recently updated first.
    async fn list(&self) -> SwarmResult<Vec<SessionSummary>>;
}

/// Reject ids that are not a plain file stem.
pub fn validate_session_id(session_id: &str) -> SwarmResult<()> {
    let valid = !session_id.is_empty()
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(SwarmError::Session(format!(
            "Invalid session id: {session_id:?}"
        )))
    }
}

fn sort_newest_first(summaries: &mut [SessionSummary]) {
    summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

/// File-based session store: one pretty-printed JSON file per session.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Open a store over `dir`, creating it if needed.
    pub async fn new(dir: PathBuf) -> SwarmResult<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.json"))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save(&self, session: &SwarmSession) -> SwarmResult<()> {
        validate_session_id(&session.session_id)?;
        let path = self.session_path(&session.session_id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(session)?;
        // Write-then-rename so a crash never leaves a half-written record.
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(session_id = %session.session_id, "Session saved");
        Ok(())
    }

    async fn get(&self, session_id: &str) -> SwarmResult<Option<SwarmSession>> {
        validate_session_id(session_id)?;
        let path = self.session_path(session_id);
        if !path.exists() {
            return Ok(None);
        }
        let data = tokio::fs::read_to_string(path).await?;
        let session: SwarmSession = serde_json::from_str(&data)
            .map_err(|e| SwarmError::Session(format!("Failed to parse session: {e}")))?;
        Ok(Some(session))
    }

    async fn list(&self) -> SwarmResult<Vec<SessionSummary>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = tokio::fs::read_to_string(&path)
                .await
                .map_err(SwarmError::from)
                .and_then(|data| {
                    serde_json::from_str::<SwarmSession>(&data).map_err(SwarmError::from)
                });
            match parsed {
                Ok(session) => summaries.push(session.summary()),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable session file");
                }
            }
        }
        sort_newest_first(&mut summaries);
        Ok(summaries)
    }
}

/// In-memory session store for tests and throwaway runs.
///
/// Sessions are kept serialized so a reload exercises the same round trip as
/// the file store.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, String>>,
}

impl InMemorySessionStore {
    /// An empty store.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, session: &SwarmSession) -> SwarmResult<()> {
        validate_session_id(&session.session_id)?;
        let json = serde_json::to_string(session)?;
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.session_id.clone(), json);
        Ok(())
    }

    async fn get(&self, session_id: &str) -> SwarmResult<Option<SwarmSession>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .map(|json| serde_json::from_str(json).map_err(SwarmError::from))
            .transpose()
    }

    async fn list(&self) -> SwarmResult<Vec<SessionSummary>> {
        let sessions = self.sessions.read().await;
        let mut summaries = sessions
            .values()
            .map(|json| serde_json::from_str::<SwarmSession>(json).map(|s| s.summary()))
            .collect::<Result<Vec<_>, _>>()?;
        sort_newest_first(&mut summaries);
        Ok(summaries)
    }
}
