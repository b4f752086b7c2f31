//! Boundary-facing value types: identifiers, table references, declarative
//! operations, and operation results. Everything here is serde-serializable
//! so a web layer can pass these through verbatim.

use crate::dataset::Schema;
use crate::geom::GeometryKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a staging session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generates a fresh session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Names a backing table store (a path or logical database name).
///
/// Two sessions opened on the same location share one table namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceLocation(pub String);

impl WorkspaceLocation {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Discriminated pointer to a table.
///
/// Persistent tables live outside any session; temporary tables are read
/// through the owning session and must not outlive it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableRef {
    Persistent { name: String },
    Temporary { name: String, session_id: SessionId },
}

impl TableRef {
    pub fn name(&self) -> &str {
        match self {
            TableRef::Persistent { name } => name,
            TableRef::Temporary { name, .. } => name,
        }
    }
}

/// Where an ingest operation pulls data from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceRef {
    /// A server-side registered dataset, resolved through the catalog.
    Dataset { name: String },
    /// A direct file path.
    File { path: String },
}

/// Comparison operator of one column filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    In,
    NotIn,
    GreaterThan,
    LessThan,
    Contains,
}

/// One conjunctive filter clause.
///
/// The comparison value stays untyped JSON until it meets the column's
/// declared kind inside the executor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub operator: FilterOperator,
    pub value: serde_json::Value,
}

/// A declarative data transformation step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    Ingest {
        source: SourceRef,
        #[serde(default)]
        filters: Vec<Filter>,
        #[serde(default)]
        destination: Option<String>,
    },
    Filter {
        input: TableRef,
        #[serde(default)]
        filters: Vec<Filter>,
        #[serde(default)]
        destination: Option<String>,
    },
    Buffer {
        input: TableRef,
        /// Required; reported as an invalid argument when absent.
        #[serde(default)]
        distance: Option<f64>,
        #[serde(default)]
        destination: Option<String>,
    },
}

/// Outcome of one executed operation.
///
/// Failures are embedded (`success == false`, `output == None`) rather than
/// raised, so the boundary layer can always render a result body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    pub output: Option<TableRef>,
    pub row_count: Option<u64>,
    pub message: String,
    pub error: Option<String>,
}

impl OperationResult {
    pub(crate) fn succeeded(output: TableRef, row_count: u64, message: String) -> Self {
        Self {
            success: true,
            output: Some(output),
            row_count: Some(row_count),
            message,
            error: None,
        }
    }

    pub(crate) fn failed(error: crate::error::EngineError) -> Self {
        Self {
            success: false,
            output: None,
            row_count: None,
            message: "operation failed".to_string(),
            error: Some(error.to_string()),
        }
    }
}

/// Table metadata for pickers and debugging surfaces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub schema: Schema,
    pub row_count: u64,
    pub is_temporary: bool,
    pub geometry: Option<GeometryKind>,
}
