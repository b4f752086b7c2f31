//! In-memory workspace backend.
//!
//! Tables are shared per location: every handle opened on the same
//! `WorkspaceLocation` sees the same table map, so committed writes from one
//! session are visible to sessions opened later, and write isolation across
//! concurrent sessions comes from the per-location lock.

use crate::dataset::Dataset;
use crate::error::{execution, not_found, EngineResult};
use crate::model::WorkspaceLocation;
use crate::workspace::{Workspace, WorkspaceProvider};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Default)]
struct MemoryDatabase {
    tables: RwLock<BTreeMap<String, Dataset>>,
}

/// Provider handing out handles onto shared in-memory databases.
#[derive(Default)]
pub struct InMemoryWorkspaceProvider {
    databases: DashMap<WorkspaceLocation, Arc<MemoryDatabase>>,
}

impl InMemoryWorkspaceProvider {
    /// Constructs a provider with no databases; locations materialize on
    /// first open.
    pub fn new() -> Self {
        Self::default()
    }

    fn database(&self, location: &WorkspaceLocation) -> Arc<MemoryDatabase> {
        self.databases
            .entry(location.clone())
            .or_default()
            .clone()
    }
}

impl WorkspaceProvider for InMemoryWorkspaceProvider {
    fn open(&self, location: &WorkspaceLocation) -> EngineResult<Box<dyn Workspace>> {
        Ok(Box::new(MemoryWorkspace {
            database: self.database(location),
        }))
    }
}

struct MemoryWorkspace {
    database: Arc<MemoryDatabase>,
}

impl Workspace for MemoryWorkspace {
    fn ingest(&mut self, dataset: &Dataset, table: &str) -> EngineResult<()> {
        let mut tables = self.database.tables.write();
        if tables.contains_key(table) {
            return Err(execution(format!("table '{table}' already exists")));
        }
        tables.insert(table.to_string(), dataset.clone());
        Ok(())
    }

    fn read_table(&self, table: &str) -> EngineResult<Dataset> {
        self.database
            .tables
            .read()
            .get(table)
            .cloned()
            .ok_or_else(|| not_found(format!("table '{table}' not found")))
    }

    fn list_tables(&self) -> EngineResult<Vec<String>> {
        Ok(self.database.tables.read().keys().cloned().collect())
    }

    fn rename_table(&mut self, from: &str, to: &str) -> EngineResult<()> {
        let mut tables = self.database.tables.write();
        if tables.contains_key(to) {
            return Err(execution(format!(
                "cannot rename '{from}': table '{to}' already exists"
            )));
        }
        match tables.remove(from) {
            Some(dataset) => {
                tables.insert(to.to_string(), dataset);
                Ok(())
            }
            None => Err(not_found(format!("table '{from}' not found"))),
        }
    }

    fn drop_table(&mut self, table: &str) -> EngineResult<()> {
        match self.database.tables.write().remove(table) {
            Some(_) => Ok(()),
            None => Err(not_found(format!("table '{table}' not found"))),
        }
    }
}
