#![forbid(unsafe_code)]

//! Staging sessions, operation executors, and the node registry for a
//! geospatial ETL workflow engine.
//!
//! A [`StagingSession`] accumulates temporary tables in a shared spatial
//! store; committing renames a table to permanence, rolling back drops it.
//! [`StagingEngine`] is the surface a web layer forwards requests to.

pub mod catalog;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod executors;
pub mod geom;
pub mod graph;
pub mod inmemory;
pub mod model;
pub mod nodes;
pub mod registry;
pub mod session;
pub mod value;
pub mod workspace;

pub use catalog::{DatasetCatalog, FileCatalog};
pub use dataset::{Column, Dataset, Feature, Schema};
pub use engine::StagingEngine;
pub use error::{EngineError, EngineResult, ErrorKind};
pub use geom::Geometry;
pub use inmemory::InMemoryWorkspaceProvider;
pub use model::{
    Filter, FilterOperator, Operation, OperationResult, SessionId, SourceRef, TableInfo, TableRef,
    WorkspaceLocation,
};
pub use nodes::{NodeExecutor, NodeRegistry};
pub use registry::SessionRegistry;
pub use session::StagingSession;
pub use value::{ColumnKind, Value};
pub use workspace::{Workspace, WorkspaceProvider};
