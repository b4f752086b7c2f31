//! Legacy graph execution: run a stored workflow definition through the node
//! registry, one node at a time in dependency order.

use crate::error::{invalid_argument, EngineResult};
use crate::nodes::{NodeConfig, NodeData, NodeRegistry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// One node of a stored workflow.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub config: NodeConfig,
}

/// A directed edge between two nodes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// A stored workflow definition.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WorkflowSpec {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

/// Executes a workflow, threading each node's output into its successor.
///
/// The graph must be acyclic with at most one inbound edge per node; every
/// node type must be registered and every config must validate. Returns the
/// output of each executed node, keyed by node id.
pub fn run_workflow(
    registry: &NodeRegistry,
    workflow: &WorkflowSpec,
) -> EngineResult<BTreeMap<String, NodeData>> {
    let mut ids = HashSet::new();
    for node in &workflow.nodes {
        if !ids.insert(node.id.as_str()) {
            return Err(invalid_argument(format!("duplicate node id '{}'", node.id)));
        }
        if registry.get(&node.node_type).is_none() {
            return Err(invalid_argument(format!(
                "unknown node type '{}' for node '{}'",
                node.node_type, node.id
            )));
        }
    }

    let mut upstream: HashMap<&str, &str> = HashMap::new();
    let mut downstream: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in &workflow.edges {
        if !ids.contains(edge.source.as_str()) || !ids.contains(edge.target.as_str()) {
            return Err(invalid_argument(format!(
                "edge '{}' references an unknown node",
                edge.id
            )));
        }
        if upstream
            .insert(edge.target.as_str(), edge.source.as_str())
            .is_some()
        {
            return Err(invalid_argument(format!(
                "node '{}' has more than one input",
                edge.target
            )));
        }
        downstream
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
    }

    // Kahn's ordering over the single-input graph.
    let mut ready: VecDeque<&NodeSpec> = workflow
        .nodes
        .iter()
        .filter(|n| !upstream.contains_key(n.id.as_str()))
        .collect();
    let by_id: HashMap<&str, &NodeSpec> = workflow
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n))
        .collect();

    let mut outputs: BTreeMap<String, NodeData> = BTreeMap::new();
    let mut executed = 0usize;
    while let Some(node) = ready.pop_front() {
        let Some(executor) = registry.get(&node.node_type) else {
            return Err(invalid_argument(format!(
                "unknown node type '{}' for node '{}'",
                node.node_type, node.id
            )));
        };
        if !executor.validate_config(&node.config) {
            return Err(invalid_argument(format!(
                "invalid config for node '{}'",
                node.id
            )));
        }
        let input = upstream
            .get(node.id.as_str())
            .and_then(|src| outputs.get(*src))
            .cloned();
        let output = executor.execute(input, &node.config)?;
        outputs.insert(node.id.clone(), output);
        executed += 1;
        for next in downstream.get(node.id.as_str()).into_iter().flatten() {
            if let Some(&spec) = by_id.get(next) {
                ready.push_back(spec);
            }
        }
    }

    if executed != workflow.nodes.len() {
        return Err(invalid_argument("workflow contains a cycle"));
    }
    Ok(outputs)
}
