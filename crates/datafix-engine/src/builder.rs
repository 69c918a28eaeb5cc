//! Fluent builder for node graphs
//!
//! Nodes are declared by name and linked by name; ids are only allocated
//! when the graph is built, so declarations can appear in any order.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::engine::DemandEngine;
use crate::error::{EngineError, Result};
use crate::graph::NodeGraph;
use crate::node::ProcessConfig;
use crate::operation::Operation;
use crate::types::{DataType, NodeId, NodeKind, DEFAULT_ATTR};

enum Declaration {
    Literal(Value),
    Process(Arc<dyn Operation>),
    Collector(Arc<dyn Operation>, Option<DataType>),
    Validator(Arc<dyn Operation>, Option<DataType>),
    Sequence(NodeKind),
}

struct DeclaredNode {
    name: String,
    declaration: Declaration,
    config: Option<ProcessConfig>,
    disabled: bool,
}

struct DeclaredEdge {
    source: String,
    out_attr: String,
    target: String,
    in_attr: String,
}

/// Fluent builder for [`NodeGraph`]s
///
/// # Example
///
/// ```ignore
/// let built = GraphBuilder::new()
///     .literal("a", json!(1))
///     .literal("b", json!(2))
///     .process("sum", add)
///     .edge_attr("a", DEFAULT_ATTR, "sum", "a")
///     .edge_attr("b", DEFAULT_ATTR, "sum", "b")
///     .build()?;
/// let mut engine = built.into_engine();
/// ```
#[derive(Default)]
pub struct GraphBuilder {
    nodes: Vec<DeclaredNode>,
    children: Vec<(String, String)>,
    edges: Vec<DeclaredEdge>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn declare(mut self, name: impl Into<String>, declaration: Declaration) -> Self {
        self.nodes.push(DeclaredNode {
            name: name.into(),
            declaration,
            config: None,
            disabled: false,
        });
        self
    }

    /// Add a node holding a literal value
    pub fn literal(self, name: impl Into<String>, data: Value) -> Self {
        self.declare(name, Declaration::Literal(data))
    }

    /// Add a process node
    pub fn process(self, name: impl Into<String>, operation: Arc<dyn Operation>) -> Self {
        self.declare(name, Declaration::Process(operation))
    }

    /// Add a collector (pipeline defaults unless configured)
    pub fn collector(
        self,
        name: impl Into<String>,
        operation: Arc<dyn Operation>,
        data_type: Option<DataType>,
    ) -> Self {
        self.declare(name, Declaration::Collector(operation, data_type))
    }

    /// Add a validator (pipeline defaults unless configured)
    pub fn validator(
        self,
        name: impl Into<String>,
        operation: Arc<dyn Operation>,
        required_type: Option<DataType>,
    ) -> Self {
        self.declare(name, Declaration::Validator(operation, required_type))
    }

    /// Add a session container
    pub fn session(self, name: impl Into<String>) -> Self {
        self.declare(name, Declaration::Sequence(NodeKind::Session))
    }

    /// Set the config of the most recently declared node
    ///
    /// Ignored for literal nodes.
    pub fn with_config(mut self, config: ProcessConfig) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.config = Some(config);
        }
        self
    }

    /// Disable the most recently declared node
    pub fn disabled(mut self) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.disabled = true;
        }
        self
    }

    /// Make `child` the next child of `parent`
    pub fn child(mut self, parent: impl Into<String>, child: impl Into<String>) -> Self {
        self.children.push((parent.into(), child.into()));
        self
    }

    /// Connect the default attributes of two nodes
    pub fn edge(self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.edge_attr(source, DEFAULT_ATTR, target, DEFAULT_ATTR)
    }

    /// Connect `source.out_attr` to `target.in_attr`
    pub fn edge_attr(
        mut self,
        source: impl Into<String>,
        out_attr: impl Into<String>,
        target: impl Into<String>,
        in_attr: impl Into<String>,
    ) -> Self {
        self.edges.push(DeclaredEdge {
            source: source.into(),
            out_attr: out_attr.into(),
            target: target.into(),
            in_attr: in_attr.into(),
        });
        self
    }

    /// Create every node and link
    ///
    /// Fails on duplicate or unknown names and on any link the graph
    /// refuses (cycles, self-edges).
    pub fn build(self) -> Result<BuiltGraph> {
        let mut graph = NodeGraph::new();
        let mut names = HashMap::new();

        for node in self.nodes {
            if names.contains_key(&node.name) {
                return Err(EngineError::invalid_connection(format!(
                    "node name '{}' is declared twice",
                    node.name
                )));
            }
            let id = match node.declaration {
                Declaration::Literal(data) => graph.add_literal(node.name.clone(), data),
                Declaration::Process(op) => {
                    graph.add_process(node.name.clone(), op, node.config.unwrap_or_default())
                }
                Declaration::Collector(op, data_type) => graph.add_collector(
                    node.name.clone(),
                    op,
                    data_type,
                    node.config.unwrap_or_else(ProcessConfig::pipeline),
                ),
                Declaration::Validator(op, required_type) => graph.add_validator(
                    node.name.clone(),
                    op,
                    required_type,
                    node.config.unwrap_or_else(ProcessConfig::pipeline),
                ),
                Declaration::Sequence(kind) => graph.add_sequence(
                    node.name.clone(),
                    kind,
                    node.config.unwrap_or_else(ProcessConfig::pipeline),
                ),
            };
            if node.disabled {
                graph.disable(id)?;
            }
            names.insert(node.name, id);
        }

        let lookup = |names: &HashMap<String, NodeId>, name: &str| {
            names.get(name).copied().ok_or_else(|| {
                EngineError::invalid_connection(format!("unknown node name '{}'", name))
            })
        };
        for (parent, child) in &self.children {
            graph.attach_child(lookup(&names, parent)?, lookup(&names, child)?)?;
        }
        for edge in &self.edges {
            graph.connect(
                lookup(&names, &edge.source)?,
                lookup(&names, &edge.target)?,
                &edge.out_attr,
                &edge.in_attr,
            )?;
        }

        Ok(BuiltGraph { graph, names })
    }
}

/// A built graph with its name table
pub struct BuiltGraph {
    graph: NodeGraph,
    names: HashMap<String, NodeId>,
}

impl BuiltGraph {
    /// Id of a declared node
    pub fn id(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn into_graph(self) -> NodeGraph {
        self.graph
    }

    /// Wrap the graph in a fresh engine
    pub fn into_engine(self) -> DemandEngine {
        DemandEngine::with_graph(self.graph)
    }
}
