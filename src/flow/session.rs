use super::response::GenerationResult;
use crate::{Error, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tracing::{debug, info};
use uuid::Uuid;

/// What one browser session has been shown so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub input_image_url: Option<String>,
    pub output_image_url: Option<String>,
    pub description: String,
    pub chinese_description: String,
}

impl SessionState {
    /// Overwrites all four fields.
    pub fn apply(&mut self, result: GenerationResult) {
        self.input_image_url = result.input_image_url;
        self.output_image_url = result.output_image_url;
        self.description = result.description;
        self.chinese_description = result.chinese_description;
    }
}

#[derive(Debug, Clone)]
struct SessionEntry {
    state: SessionState,
    created_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

/// Per-session state keyed by the id carried in the session cookie.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<Uuid, SessionEntry>>>,
    ttl: Option<TimeDelta>,
}

/// Converts a configured TTL, rejecting zero and values chrono cannot hold.
pub fn ttl_from_secs(secs: u64) -> Result<TimeDelta> {
    if secs == 0 {
        return Err(Error::config("server.session_ttl_secs must be greater than 0"));
    }
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(|| {
            Error::config(format!("server.session_ttl_secs is out of range: {secs}"))
        })
}

impl SessionStore {
    pub fn new(ttl_secs: Option<u64>) -> Result<Self> {
        Ok(Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl: ttl_secs.map(ttl_from_secs).transpose()?,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, SessionEntry>>> {
        self.sessions
            .lock()
            .map_err(|e| Error::internal(format!("Mutex lock failed: {e}")))
    }

    /// Starts a new session with empty state and returns its id.
    pub fn create(&self) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut sessions = self.lock()?;
        sessions.insert(
            id,
            SessionEntry {
                state: SessionState::default(),
                created_at: now,
                last_seen: now,
            },
        );
        info!("Created session {} ({} active)", id, sessions.len());
        Ok(id)
    }

    /// Returns a copy of the session's state and marks it as seen.
    pub fn get(&self, id: &Uuid) -> Result<SessionState> {
        let mut sessions = self.lock()?;
        let entry = sessions.get_mut(id).ok_or_else(|| Error::SessionNotFound {
            session_id: id.to_string(),
        })?;
        entry.last_seen = Utc::now();
        Ok(entry.state.clone())
    }

    pub fn contains(&self, id: &Uuid) -> Result<bool> {
        Ok(self.lock()?.contains_key(id))
    }

    pub fn put(&self, id: &Uuid, state: SessionState) -> Result<()> {
        let mut sessions = self.lock()?;
        let entry = sessions.get_mut(id).ok_or_else(|| Error::SessionNotFound {
            session_id: id.to_string(),
        })?;
        entry.state = state;
        entry.last_seen = Utc::now();
        debug!(
            "Stored state for session {} (age {}s)",
            id,
            (entry.last_seen - entry.created_at).num_seconds()
        );
        Ok(())
    }

    /// Drops sessions idle for longer than the TTL. Returns how many went.
    pub fn prune_expired(&self) -> Result<usize> {
        self.prune_idle_since(Utc::now())
    }

    fn prune_idle_since(&self, now: DateTime<Utc>) -> Result<usize> {
        let Some(ttl) = self.ttl else {
            return Ok(0);
        };
        let mut sessions = self.lock()?;
        let before = sessions.len();
        sessions.retain(|_, entry| now - entry.last_seen <= ttl);
        let removed = before - sessions.len();
        if removed > 0 {
            info!("Pruned {} idle sessions", removed);
        }
        Ok(removed)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }
}
