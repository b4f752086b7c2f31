//! Contract of the backing spatial table store.
//!
//! The staging core treats the store as an opaque collaborator: a provider
//! opens connection-scoped handles, handles expose the narrow table surface,
//! and dropping a handle releases the connection on every exit path.

use crate::dataset::Dataset;
use crate::error::EngineResult;
use crate::model::WorkspaceLocation;

/// A connection-scoped handle onto one store location.
pub trait Workspace: Send {
    /// Writes a named table. Repeated calls with different names must not
    /// corrupt prior tables; a duplicate name is an error.
    fn ingest(&mut self, dataset: &Dataset, table: &str) -> EngineResult<()>;

    /// Reads a table; fails with `NotFound` when absent.
    fn read_table(&self, table: &str) -> EngineResult<Dataset>;

    /// Names of every table at this location.
    fn list_tables(&self) -> EngineResult<Vec<String>>;

    /// Durably renames a table. Fails when the source is absent or the
    /// target name is occupied.
    fn rename_table(&mut self, from: &str, to: &str) -> EngineResult<()>;

    /// Removes a table; fails with `NotFound` when absent.
    fn drop_table(&mut self, table: &str) -> EngineResult<()>;
}

/// Opens workspace handles for sessions.
pub trait WorkspaceProvider: Send + Sync + 'static {
    fn open(&self, location: &WorkspaceLocation) -> EngineResult<Box<dyn Workspace>>;
}
