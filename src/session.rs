//! Staging session lifecycle and temporary-table bookkeeping.
//!
//! A session owns one workspace handle and the set of table names it created
//! that are not yet permanent. Committing renames a table into permanence;
//! rolling back drops every tracked table. Closing always rolls back first,
//! so an abandoned session leaves nothing behind.

use crate::dataset::{Dataset, Schema};
use crate::error::{invalid_argument, EngineError, EngineResult};
use crate::model::{SessionId, TableInfo, WorkspaceLocation};
use crate::workspace::{Workspace, WorkspaceProvider};
use std::collections::HashSet;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

/// One interactive staging session against a shared spatial store.
///
/// States: open (handle held) and closed (terminal). A closed session
/// rejects every table operation with a precondition error.
pub struct StagingSession {
    id: SessionId,
    location: WorkspaceLocation,
    created_at: OffsetDateTime,
    temp_tables: HashSet<String>,
    workspace: Option<Box<dyn Workspace>>,
    provider: Arc<dyn WorkspaceProvider>,
}

impl StagingSession {
    /// Creates a closed session; call [`open`](Self::open) before use.
    pub fn new(provider: Arc<dyn WorkspaceProvider>, location: WorkspaceLocation) -> Self {
        Self {
            id: SessionId::new(),
            location,
            created_at: OffsetDateTime::now_utc(),
            temp_tables: HashSet::new(),
            workspace: None,
            provider,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn location(&self) -> &WorkspaceLocation {
        &self.location
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn is_open(&self) -> bool {
        self.workspace.is_some()
    }

    /// Names currently tracked as temporary, order unspecified.
    pub fn temp_tables(&self) -> impl Iterator<Item = &str> {
        self.temp_tables.iter().map(String::as_str)
    }

    pub fn is_tracked(&self, table: &str) -> bool {
        self.temp_tables.contains(table)
    }

    /// Acquires the workspace handle. Opening an already-open session is a
    /// precondition violation.
    pub fn open(&mut self) -> EngineResult<()> {
        if self.workspace.is_some() {
            return Err(invalid_argument(format!(
                "session {} is already open",
                self.id
            )));
        }
        self.workspace = Some(self.provider.open(&self.location)?);
        Ok(())
    }

    fn closed_error(&self) -> EngineError {
        invalid_argument(format!("session {} is closed", self.id))
    }

    fn workspace(&self) -> EngineResult<&dyn Workspace> {
        self.workspace.as_deref().ok_or_else(|| self.closed_error())
    }

    /// Unique temporary table name: `temp_{prefix}_{8-hex}`.
    ///
    /// Collision probability is negligible but not zero; the store rejects a
    /// duplicate name, so callers treat collision as a reportable failure.
    pub fn generate_temp_table_name(&self, prefix: &str) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("temp_{prefix}_{}", &suffix[..8])
    }

    /// Writes `dataset` under `destination` (or a generated name) and tracks
    /// the result as temporary. The name is registered only after the store
    /// write succeeds.
    pub fn ingest(&mut self, dataset: &Dataset, destination: Option<&str>) -> EngineResult<String> {
        let name = match destination {
            Some(name) => name.to_string(),
            None => self.generate_temp_table_name("stage"),
        };
        let Some(workspace) = self.workspace.as_deref_mut() else {
            return Err(invalid_argument(format!("session {} is closed", self.id)));
        };
        workspace.ingest(dataset, &name)?;
        self.temp_tables.insert(name.clone());
        info!(session = %self.id, table = %name, rows = dataset.len(), "staged temporary table");
        Ok(name)
    }

    /// Reads a table, temporary or persistent.
    pub fn read_table(&self, table: &str) -> EngineResult<Dataset> {
        self.workspace()?.read_table(table)
    }

    /// Promotes a tracked temporary table to permanent under `final_name`.
    ///
    /// Fails without touching the store when `temp_name` is untracked; on
    /// success the table is durably renamed and no longer tracked.
    pub fn commit(&mut self, temp_name: &str, final_name: &str) -> EngineResult<()> {
        if !self.temp_tables.contains(temp_name) {
            return Err(invalid_argument(format!(
                "'{temp_name}' is not a tracked temporary table"
            )));
        }
        let Some(workspace) = self.workspace.as_deref_mut() else {
            return Err(invalid_argument(format!("session {} is closed", self.id)));
        };
        workspace.rename_table(temp_name, final_name)?;
        self.temp_tables.remove(temp_name);
        info!(session = %self.id, from = %temp_name, to = %final_name, "committed table");
        Ok(())
    }

    /// Drops every tracked temporary table, best-effort: an individual drop
    /// failure is logged and the remaining drops continue. The tracking set
    /// is cleared unconditionally. Idempotent.
    pub fn rollback(&mut self) {
        let names: Vec<String> = self.temp_tables.iter().cloned().collect();
        if let Some(workspace) = self.workspace.as_deref_mut() {
            for name in &names {
                match workspace.drop_table(name) {
                    Ok(()) => info!(session = %self.id, table = %name, "dropped temporary table"),
                    Err(err) => {
                        warn!(session = %self.id, table = %name, error = %err, "failed to drop temporary table")
                    }
                }
            }
        }
        self.temp_tables.clear();
    }

    /// Rolls back any still-temporary tables and releases the workspace
    /// handle. Safe to call repeatedly; a closed session stays closed.
    pub fn close(&mut self) {
        if self.workspace.is_some() {
            self.rollback();
            self.workspace = None;
            info!(session = %self.id, "session closed");
        }
    }

    /// Metadata for every table at this location.
    ///
    /// With `include_temporary` unset, tables tracked by this session are
    /// omitted.
    pub fn list_tables(&self, include_temporary: bool) -> EngineResult<Vec<TableInfo>> {
        let workspace = self.workspace()?;
        let mut infos = Vec::new();
        for name in workspace.list_tables()? {
            let is_temporary = self.temp_tables.contains(&name);
            if is_temporary && !include_temporary {
                continue;
            }
            let dataset = workspace.read_table(&name)?;
            infos.push(TableInfo {
                name,
                schema: dataset.schema.clone(),
                row_count: dataset.len() as u64,
                is_temporary,
                geometry: dataset
                    .features
                    .iter()
                    .find_map(|f| f.geometry.as_ref())
                    .map(|g| g.kind()),
            });
        }
        Ok(infos)
    }

    pub fn table_exists(&self, table: &str) -> EngineResult<bool> {
        Ok(self.workspace()?.list_tables()?.iter().any(|t| t == table))
    }

    pub fn table_schema(&self, table: &str) -> EngineResult<Schema> {
        Ok(self.read_table(table)?.schema)
    }
}

impl Drop for StagingSession {
    // Cleanup must run even when the owning scope exits via an error.
    fn drop(&mut self) {
        self.close();
    }
}
