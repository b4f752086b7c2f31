//! Named-dataset catalog.
//!
//! Ingest operations refer to server-side datasets by name; the catalog maps
//! those names to file locations the loaders can read.

use crate::error::{not_found, EngineResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;

/// Resolves registered dataset names to file locations.
pub trait DatasetCatalog: Send + Sync + 'static {
    /// Fails with `NotFound` for unregistered names.
    fn resolve(&self, name: &str) -> EngineResult<PathBuf>;

    /// Registered names, order unspecified.
    fn names(&self) -> Vec<String>;
}

/// Catalog backed by explicit name → path registrations.
#[derive(Default)]
pub struct FileCatalog {
    entries: RwLock<HashMap<String, PathBuf>>,
}

impl FileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a dataset entry.
    pub fn register(&self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.entries.write().insert(name.into(), path.into());
    }
}

impl DatasetCatalog for FileCatalog {
    fn resolve(&self, name: &str) -> EngineResult<PathBuf> {
        self.entries
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(format!("dataset '{name}' is not registered")))
    }

    fn names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_unknown_dataset_fails() {
        let catalog = FileCatalog::new();
        catalog.register("water_points", "/data/water_points.geojson");
        assert!(catalog.resolve("water_points").is_ok());
        let err = catalog.resolve("sewer_lines").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::NotFound);
    }
}
