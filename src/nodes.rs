//! Node executors for the legacy graph-execution path.
//!
//! Each node type exposes execution, config validation, a JSON config schema
//! for the editor UI, and its available tool tags. Unrecognized operation or
//! condition tags are reported errors, never silent pass-throughs.

use crate::dataset::{load_csv, load_geojson, Dataset};
use crate::error::{invalid_argument, EngineResult};
use crate::geom;
use crate::model::{Filter, FilterOperator, WorkspaceLocation};
use crate::workspace::WorkspaceProvider;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Node configuration as it arrives from a stored workflow definition.
pub type NodeConfig = serde_json::Map<String, serde_json::Value>;

/// Data flowing along a workflow edge.
#[derive(Clone, Debug)]
pub struct NodeData {
    pub dataset: Dataset,
}

/// One node type's executor.
pub trait NodeExecutor: Send + Sync {
    /// Runs the node over its upstream output.
    fn execute(&self, input: Option<NodeData>, config: &NodeConfig) -> EngineResult<NodeData>;

    /// Cheap structural check used before execution and by editors.
    fn validate_config(&self, config: &NodeConfig) -> bool;

    /// JSON schema describing the node's configuration.
    fn config_schema(&self) -> serde_json::Value;

    /// Tool tags this node type can dispatch on.
    fn available_tools(&self) -> &'static [&'static str];
}

fn config_str<'a>(config: &'a NodeConfig, key: &str) -> Option<&'a str> {
    config.get(key).and_then(|v| v.as_str())
}

fn config_f64(config: &NodeConfig, key: &str) -> Option<f64> {
    config.get(key).and_then(|v| v.as_f64())
}

fn require_input(input: Option<NodeData>, node: &str) -> EngineResult<NodeData> {
    input.ok_or_else(|| invalid_argument(format!("{node} node has no input data")))
}

/// Reads a file by its declared source kind.
pub struct DataLoaderNode;

impl NodeExecutor for DataLoaderNode {
    fn execute(&self, _input: Option<NodeData>, config: &NodeConfig) -> EngineResult<NodeData> {
        let source_type = config_str(config, "source_type").unwrap_or("geojson");
        let path = config_str(config, "path").unwrap_or_default();
        let dataset = match source_type {
            "geojson" => load_geojson(Path::new(path))?,
            "csv" => load_csv(Path::new(path))?,
            other => {
                return Err(invalid_argument(format!(
                    "unsupported source type: {other}"
                )))
            }
        };
        Ok(NodeData { dataset })
    }

    fn validate_config(&self, config: &NodeConfig) -> bool {
        config.contains_key("source_type") && config.contains_key("path")
    }

    fn config_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "source_type": {
                    "type": "string",
                    "enum": ["geojson", "csv"],
                    "default": "geojson"
                },
                "path": {"type": "string", "description": "File path"}
            },
            "required": ["source_type", "path"]
        })
    }

    fn available_tools(&self) -> &'static [&'static str] {
        &["geojson", "csv"]
    }
}

/// Writes the upstream dataset into a workspace location.
pub struct IngestNode {
    provider: Arc<dyn WorkspaceProvider>,
}

impl IngestNode {
    pub fn new(provider: Arc<dyn WorkspaceProvider>) -> Self {
        Self { provider }
    }
}

impl NodeExecutor for IngestNode {
    fn execute(&self, input: Option<NodeData>, config: &NodeConfig) -> EngineResult<NodeData> {
        let data = require_input(input, "ingest")?;
        let Some(location) = config_str(config, "location") else {
            return Err(invalid_argument("ingest node requires a location"));
        };
        let table = config_str(config, "table").unwrap_or("layer");
        let mut workspace = self.provider.open(&WorkspaceLocation::new(location))?;
        workspace.ingest(&data.dataset, table)?;
        Ok(data)
    }

    fn validate_config(&self, config: &NodeConfig) -> bool {
        config.contains_key("location")
    }

    fn config_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "location": {"type": "string", "description": "Workspace location"},
                "table": {"type": "string", "default": "layer"}
            },
            "required": ["location"]
        })
    }

    fn available_tools(&self) -> &'static [&'static str] {
        &["ingest"]
    }
}

/// Dispatches one transformation over the upstream dataset.
pub struct TransformerNode;

impl NodeExecutor for TransformerNode {
    fn execute(&self, input: Option<NodeData>, config: &NodeConfig) -> EngineResult<NodeData> {
        let data = require_input(input, "transformer")?;
        let operation = config_str(config, "operation").unwrap_or("identity");
        match operation {
            "buffer" => {
                // The legacy default distance for the node path.
                let distance = config_f64(config, "distance").unwrap_or(10.0);
                let mut out = data.dataset.empty_like();
                for feature in &data.dataset.features {
                    let geometry = match &feature.geometry {
                        Some(g) => Some(g.buffer(distance)?),
                        None => None,
                    };
                    out.push_feature(feature.values.clone(), geometry)?;
                }
                Ok(NodeData { dataset: out })
            }
            "reproject" => {
                let target = config_str(config, "target_crs").unwrap_or("EPSG:4326");
                let mut out = data.dataset.empty_like();
                out.crs = target.to_string();
                for feature in &data.dataset.features {
                    let geometry = match &feature.geometry {
                        Some(g) => Some(geom::reproject(g, &data.dataset.crs, target)?),
                        None => None,
                    };
                    out.push_feature(feature.values.clone(), geometry)?;
                }
                Ok(NodeData { dataset: out })
            }
            "filter" => {
                let Some(field) = config_str(config, "field") else {
                    return Err(invalid_argument("transformer filter requires a field"));
                };
                let value = config.get("value").cloned().unwrap_or(json!(""));
                let filtered = crate::executors::apply_filters(
                    data.dataset,
                    &[Filter {
                        column: field.to_string(),
                        operator: FilterOperator::Equals,
                        value,
                    }],
                )?;
                Ok(NodeData { dataset: filtered })
            }
            "identity" => Ok(data),
            other => Err(invalid_argument(format!(
                "unsupported transformer operation: {other}"
            ))),
        }
    }

    fn validate_config(&self, config: &NodeConfig) -> bool {
        config.contains_key("operation")
    }

    fn config_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["buffer", "reproject", "filter", "identity"],
                    "default": "identity"
                },
                "distance": {"type": "number", "default": 10},
                "target_crs": {"type": "string", "default": "EPSG:4326"},
                "field": {"type": "string"},
                "value": {"type": "string"}
            },
            "required": ["operation"]
        })
    }

    fn available_tools(&self) -> &'static [&'static str] {
        &["buffer", "reproject", "filter", "identity"]
    }
}

/// Keeps rows by condition: pass everything, or clip to a spatial extent.
pub struct FilterNode;

impl NodeExecutor for FilterNode {
    fn execute(&self, input: Option<NodeData>, config: &NodeConfig) -> EngineResult<NodeData> {
        let data = require_input(input, "filter")?;
        let condition = config_str(config, "condition").unwrap_or("all");
        match condition {
            "all" => Ok(data),
            "bbox" => {
                let clip = geom::BoundingBox {
                    min_x: config_f64(config, "minx").unwrap_or(-180.0),
                    min_y: config_f64(config, "miny").unwrap_or(-90.0),
                    max_x: config_f64(config, "maxx").unwrap_or(180.0),
                    max_y: config_f64(config, "maxy").unwrap_or(90.0),
                };
                let mut out = data.dataset.empty_like();
                for feature in &data.dataset.features {
                    let keep = feature
                        .geometry
                        .as_ref()
                        .and_then(|g| g.bounding_box())
                        .map(|b| b.intersects(&clip))
                        .unwrap_or(false);
                    if keep {
                        out.push_feature(feature.values.clone(), feature.geometry.clone())?;
                    }
                }
                Ok(NodeData { dataset: out })
            }
            other => Err(invalid_argument(format!(
                "unsupported filter condition: {other}"
            ))),
        }
    }

    fn validate_config(&self, config: &NodeConfig) -> bool {
        config.contains_key("condition")
    }

    fn config_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "condition": {"type": "string", "enum": ["all", "bbox"], "default": "all"},
                "minx": {"type": "number"},
                "miny": {"type": "number"},
                "maxx": {"type": "number"},
                "maxy": {"type": "number"}
            },
            "required": ["condition"]
        })
    }

    fn available_tools(&self) -> &'static [&'static str] {
        &["bbox", "all"]
    }
}

/// Metadata one node type advertises to editors.
#[derive(Clone, Debug, serde::Serialize)]
pub struct NodeTypeInfo {
    #[serde(rename = "type")]
    pub node_type: String,
    pub label: String,
    pub description: String,
    pub config_schema: serde_json::Value,
    pub tools: Vec<String>,
}

/// Fixed mapping from node-type tag to executor.
pub struct NodeRegistry {
    executors: BTreeMap<&'static str, Box<dyn NodeExecutor>>,
}

impl NodeRegistry {
    pub fn new(provider: Arc<dyn WorkspaceProvider>) -> Self {
        let mut executors: BTreeMap<&'static str, Box<dyn NodeExecutor>> = BTreeMap::new();
        executors.insert("data_loader", Box::new(DataLoaderNode));
        executors.insert("ingest", Box::new(IngestNode::new(provider)));
        executors.insert("transformer", Box::new(TransformerNode));
        executors.insert("filter", Box::new(FilterNode));
        Self { executors }
    }

    pub fn get(&self, node_type: &str) -> Option<&dyn NodeExecutor> {
        self.executors.get(node_type).map(Box::as_ref)
    }

    /// All registered node types with their schemas and tools.
    pub fn node_types(&self) -> Vec<NodeTypeInfo> {
        self.executors
            .iter()
            .map(|(tag, executor)| NodeTypeInfo {
                node_type: tag.to_string(),
                label: title_case(tag),
                description: format!("{tag} node executor"),
                config_schema: executor.config_schema(),
                tools: executor
                    .available_tools()
                    .iter()
                    .map(|t| t.to_string())
                    .collect(),
            })
            .collect()
    }
}

fn title_case(tag: &str) -> String {
    tag.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
