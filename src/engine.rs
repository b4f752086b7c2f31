//! The surface handed to a boundary layer.
//!
//! `StagingEngine` bundles the session registry with the dataset catalog and
//! exposes exactly the calls a web layer forwards: session lifecycle,
//! operation execution, commit/rollback, and table introspection. Operation
//! failures come back embedded in the `OperationResult`; only an unknown
//! session id is a hard error here.

use crate::catalog::DatasetCatalog;
use crate::dataset::Schema;
use crate::error::EngineResult;
use crate::executors::execute_operation;
use crate::model::{Operation, OperationResult, SessionId, TableInfo, WorkspaceLocation};
use crate::registry::SessionRegistry;
use crate::workspace::WorkspaceProvider;
use std::sync::Arc;

pub struct StagingEngine {
    registry: SessionRegistry,
    catalog: Arc<dyn DatasetCatalog>,
}

impl StagingEngine {
    pub fn new(
        provider: Arc<dyn WorkspaceProvider>,
        default_location: WorkspaceLocation,
        catalog: Arc<dyn DatasetCatalog>,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(provider, default_location),
            catalog,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &dyn DatasetCatalog {
        self.catalog.as_ref()
    }

    /// Opens a session against the default location and returns its id.
    pub fn create_session(&self) -> EngineResult<SessionId> {
        self.registry.create_session(None)
    }

    /// Opens a session against an explicit location.
    pub fn create_session_at(&self, location: WorkspaceLocation) -> EngineResult<SessionId> {
        self.registry.create_session(Some(location))
    }

    pub fn destroy_session(&self, id: &SessionId) -> EngineResult<()> {
        self.registry.destroy_session(id)
    }

    pub fn list_sessions(&self) -> Vec<SessionId> {
        self.registry.list_sessions()
    }

    /// Runs one operation inside the session's serialization lock.
    pub fn execute(&self, id: &SessionId, operation: &Operation) -> EngineResult<OperationResult> {
        let session = self.registry.get_session(id)?;
        let mut session = session.lock();
        Ok(execute_operation(
            &mut session,
            self.catalog.as_ref(),
            operation,
        ))
    }

    pub fn commit_table(
        &self,
        id: &SessionId,
        temp_name: &str,
        final_name: &str,
    ) -> EngineResult<()> {
        let session = self.registry.get_session(id)?;
        let mut session = session.lock();
        session.commit(temp_name, final_name)
    }

    pub fn rollback_session(&self, id: &SessionId) -> EngineResult<()> {
        let session = self.registry.get_session(id)?;
        session.lock().rollback();
        Ok(())
    }

    pub fn list_tables(
        &self,
        id: &SessionId,
        include_temporary: bool,
    ) -> EngineResult<Vec<TableInfo>> {
        let session = self.registry.get_session(id)?;
        let session = session.lock();
        session.list_tables(include_temporary)
    }

    pub fn table_exists(&self, id: &SessionId, table: &str) -> EngineResult<bool> {
        let session = self.registry.get_session(id)?;
        let session = session.lock();
        session.table_exists(table)
    }

    pub fn table_schema(&self, id: &SessionId, table: &str) -> EngineResult<Schema> {
        let session = self.registry.get_session(id)?;
        let session = session.lock();
        session.table_schema(table)
    }
}
