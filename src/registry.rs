//! Process-wide registry of live staging sessions.
//!
//! Explicit state with a defined initialization (constructed with a provider
//! and a default store location) and teardown (`shutdown` force-closes every
//! live session). Boundary layers hold the registry by reference; there is
//! no implicit global. Sessions do not persist across process restarts.

use crate::error::{not_found, EngineResult};
use crate::model::{SessionId, WorkspaceLocation};
use crate::session::StagingSession;
use crate::workspace::WorkspaceProvider;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Registry mapping session ids to live sessions.
///
/// Each entry is wrapped in a mutex so at most one operation is in flight
/// per session; operations on different sessions run in parallel.
pub struct SessionRegistry {
    provider: Arc<dyn WorkspaceProvider>,
    default_location: WorkspaceLocation,
    sessions: DashMap<SessionId, Arc<Mutex<StagingSession>>>,
}

impl SessionRegistry {
    pub fn new(provider: Arc<dyn WorkspaceProvider>, default_location: WorkspaceLocation) -> Self {
        Self {
            provider,
            default_location,
            sessions: DashMap::new(),
        }
    }

    pub fn default_location(&self) -> &WorkspaceLocation {
        &self.default_location
    }

    /// Creates and opens a new session against `location` (or the default),
    /// registers it, and returns its id.
    pub fn create_session(&self, location: Option<WorkspaceLocation>) -> EngineResult<SessionId> {
        let location = location.unwrap_or_else(|| self.default_location.clone());
        let mut session = StagingSession::new(self.provider.clone(), location);
        session.open()?;
        let id = session.id().clone();
        self.sessions
            .insert(id.clone(), Arc::new(Mutex::new(session)));
        info!(session = %id, "created session");
        Ok(id)
    }

    /// Fails with `NotFound` when no live session has this id.
    pub fn get_session(&self, id: &SessionId) -> EngineResult<Arc<Mutex<StagingSession>>> {
        self.sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| not_found(format!("session '{id}' not found")))
    }

    /// Closes the session (rolling back its temporary tables) and removes it.
    pub fn destroy_session(&self, id: &SessionId) -> EngineResult<()> {
        let (_, session) = self
            .sessions
            .remove(id)
            .ok_or_else(|| not_found(format!("session '{id}' not found")))?;
        session.lock().close();
        info!(session = %id, "destroyed session");
        Ok(())
    }

    /// Ids of all live sessions, order unspecified.
    pub fn list_sessions(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|e| e.key().clone()).collect()
    }

    /// Force-closes every live session; for process shutdown.
    pub fn shutdown(&self) {
        let ids: Vec<SessionId> = self.list_sessions();
        for id in ids {
            if let Some((_, session)) = self.sessions.remove(&id) {
                session.lock().close();
            }
        }
    }
}
