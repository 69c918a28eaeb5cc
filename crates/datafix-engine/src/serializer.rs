//! Flat node-list / edge-list form of a graph
//!
//! [`export_graph`] walks a node and everything transitively linked to it
//! (dataflow, ownership and data/result links) and records one
//! [`NodeRecord`] per node plus one [`EdgeRecord`] per dataflow link.
//! Runtime links are diagnostic and are not exported.
//!
//! [`import_graph`] rebuilds the graph from such a document. Nodes whose id
//! already exists are reused: they keep their operation and state, and only
//! take the recorded name and data. Every other node is created without an
//! operation, with the recorded kind and state. Process state and cached
//! data are therefore best-effort across a round-trip, and re-evaluating an
//! imported pipeline requires binding operations again. Ownership chains and
//! dataflow edges always survive.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EngineError, Result};
use crate::graph::NodeGraph;
use crate::node::{NodeRole, ProcessConfig};
use crate::state::NodeState;
use crate::types::{NodeId, NodeKind, DEFAULT_ATTR};

/// Serialized graph: nodes, dataflow edges and the node the export started from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    pub root: NodeId,
}

/// Shallow copy of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub data: Value,
    pub state: NodeState,
    #[serde(default, skip_serializing_if = "is_false")]
    pub warning: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_node: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One dataflow link, serialized as `[source, in_attr, target]`
///
/// A fourth element carries the producer attribute when it is not the
/// default one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EdgeTuple", into = "EdgeTuple")]
pub struct EdgeRecord {
    pub source: NodeId,
    pub in_attr: String,
    pub target: NodeId,
    pub out_attr: String,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum EdgeTuple {
    WithOutput(NodeId, String, NodeId, String),
    Plain(NodeId, String, NodeId),
}

impl From<EdgeTuple> for EdgeRecord {
    fn from(tuple: EdgeTuple) -> Self {
        match tuple {
            EdgeTuple::WithOutput(source, in_attr, target, out_attr) => Self {
                source,
                in_attr,
                target,
                out_attr,
            },
            EdgeTuple::Plain(source, in_attr, target) => Self {
                source,
                in_attr,
                target,
                out_attr: DEFAULT_ATTR.to_string(),
            },
        }
    }
}

impl From<EdgeRecord> for EdgeTuple {
    fn from(edge: EdgeRecord) -> Self {
        if edge.out_attr == DEFAULT_ATTR {
            EdgeTuple::Plain(edge.source, edge.in_attr, edge.target)
        } else {
            EdgeTuple::WithOutput(edge.source, edge.in_attr, edge.target, edge.out_attr)
        }
    }
}

/// Export `root` and every node transitively linked to it
///
/// Each node is visited once, in breadth-first order from `root`.
pub fn export_graph(graph: &NodeGraph, root: NodeId) -> Result<GraphDocument> {
    graph.node(root)?;

    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::from([root]);
    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        let node = graph.node(id)?;

        nodes.push(NodeRecord {
            id,
            name: node.name().to_string(),
            kind: node.kind(),
            data: node.data().clone(),
            state: node.stored_state(),
            warning: node.warning(),
            parent: node.parent(),
            children: node.children().to_vec(),
            data_node: node.data_node(),
            error: node.error().map(str::to_string),
        });
        for link in node.input_links() {
            edges.push(EdgeRecord {
                source: link.producer,
                in_attr: link.in_attr.clone(),
                target: id,
                out_attr: link.out_attr.clone(),
            });
        }

        let mut neighbours = graph.connected_nodes(id)?;
        neighbours.extend(node.parent());
        neighbours.extend(node.children().iter().copied());
        neighbours.extend(node.data_node());
        neighbours.extend(node.result_nodes().iter().copied());
        queue.extend(neighbours.into_iter().filter(|n| !visited.contains(n)));
    }

    log::debug!(
        "Exported {} node(s) and {} edge(s) from {}",
        nodes.len(),
        edges.len(),
        root
    );
    Ok(GraphDocument { nodes, edges, root })
}

/// Rebuild a document into `graph`; returns the document's root
///
/// The import is all-or-nothing: it runs against a copy of `graph`, which
/// replaces `graph` only once every node, link and edge was accepted.
pub fn import_graph(graph: &mut NodeGraph, document: &GraphDocument) -> Result<NodeId> {
    let mut staged = graph.clone();
    let root = import_into(&mut staged, document)?;
    *graph = staged;
    Ok(root)
}

fn import_into(graph: &mut NodeGraph, document: &GraphDocument) -> Result<NodeId> {
    let recorded: BTreeSet<NodeId> = document.nodes.iter().map(|r| r.id).collect();
    let mut created = 0;

    for record in &document.nodes {
        if graph.contains(record.id) {
            let node = graph.node_mut(record.id)?;
            node.name = record.name.clone();
            node.data = record.data.clone();
            continue;
        }

        let role = match (record.kind, record.data_node) {
            (NodeKind::Data, _) => NodeRole::Data {
                result_nodes: Vec::new(),
            },
            (NodeKind::Result, Some(data_node)) => NodeRole::Result { data_node },
            (NodeKind::Session, _) => NodeRole::Sequence(ProcessConfig::pipeline()),
            _ => NodeRole::Literal,
        };
        graph.insert_with_id(record.id, record.name.clone(), record.kind, role)?;
        let node = graph.node_mut(record.id)?;
        node.data = record.data.clone();
        let (state, warning) = match record.state {
            NodeState::Warning => (NodeState::Failed, true),
            state => (state, record.warning),
        };
        node.state = state;
        node.warning = warning;
        node.error = record.error.clone();
        created += 1;
    }

    // Ownership: children in recorded order, then parents outside the document
    for record in &document.nodes {
        for child in &record.children {
            if recorded.contains(child) || graph.contains(*child) {
                graph.attach_child(record.id, *child)?;
            }
        }
    }
    for record in &document.nodes {
        let Some(parent) = record.parent else {
            continue;
        };
        if graph.node(record.id)?.parent() != Some(parent) {
            if !graph.contains(parent) {
                return Err(EngineError::NodeNotFound(parent));
            }
            graph.attach_child(parent, record.id)?;
        }
    }

    for record in &document.nodes {
        let Some(data_node) = record.data_node else {
            continue;
        };
        let data = graph.node_mut(data_node)?;
        match &mut data.role {
            NodeRole::Data { result_nodes } => {
                if !result_nodes.contains(&record.id) {
                    result_nodes.push(record.id);
                }
            }
            _ => {
                return Err(EngineError::WrongRole {
                    node: data_node,
                    expected: "data node",
                })
            }
        }
    }

    for edge in &document.edges {
        graph.connect(edge.source, edge.target, &edge.out_attr, &edge.in_attr)?;
    }
    if !graph.contains(document.root) {
        return Err(EngineError::NodeNotFound(document.root));
    }

    log::debug!(
        "Imported {} node(s) ({} new) and {} edge(s)",
        document.nodes.len(),
        created,
        document.edges.len()
    );
    Ok(document.root)
}

/// Export straight to pretty-printed JSON
pub fn to_json(graph: &NodeGraph, root: NodeId) -> Result<String> {
    let document = export_graph(graph, root)?;
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Parse a document from JSON and import it
pub fn from_json(graph: &mut NodeGraph, json: &str) -> Result<NodeId> {
    let document: GraphDocument = serde_json::from_str(json)?;
    import_graph(graph, &document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DemandEngine;
    use crate::error::EngineError;
    use crate::integrity::check_graph;
    use crate::operation;
    use serde_json::json;

    /// session -> [collector -> [data...], validator -> [result...]], plus a dataflow pair
    fn pipeline() -> (DemandEngine, NodeId) {
        let mut engine = DemandEngine::new();
        let graph = engine.graph_mut();
        let session = graph.add_sequence("session", NodeKind::Session, ProcessConfig::pipeline());
        let collector = graph.add_collector(
            "items",
            operation::constant(json!(["a", "b"])),
            None,
            ProcessConfig::pipeline(),
        );
        let validator = graph.add_validator(
            "is_a",
            operation::pure(|inputs| {
                if inputs.item()? == &json!("a") {
                    Ok(Value::Null)
                } else {
                    Err(EngineError::failed("not a"))
                }
            }),
            None,
            ProcessConfig::pipeline(),
        );
        graph.attach_child(session, collector).unwrap();
        graph.attach_child(session, validator).unwrap();

        let threshold = graph.add_literal("threshold", json!({"max": 3}));
        graph.connect(threshold, validator, "max", "limit").unwrap();

        engine.evaluate(session, Vec::new()).unwrap();
        (engine, session)
    }

    #[test]
    fn test_export_visits_every_linked_node_once() {
        let (engine, session) = pipeline();
        let graph = engine.graph();
        let document = export_graph(graph, session).unwrap();

        // session, collector, validator, threshold, 2 data nodes, 2 results
        assert_eq!(document.nodes.len(), 8);
        let ids: BTreeSet<NodeId> = document.nodes.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 8);
        assert_eq!(document.nodes[0].id, session);
        assert_eq!(document.root, session);
        assert_eq!(document.edges.len(), 1);
        assert_eq!(document.edges[0].out_attr, "max");
    }

    #[test]
    fn test_export_from_a_leaf_reaches_the_root() {
        let (engine, session) = pipeline();
        let graph = engine.graph();
        let threshold = graph.find_by_name("threshold").unwrap();
        let document = export_graph(graph, threshold).unwrap();
        assert!(document.nodes.iter().any(|r| r.id == session));
        assert_eq!(document.nodes.len(), 8);
    }

    #[test]
    fn test_round_trip_into_empty_graph() {
        let (engine, session) = pipeline();
        let source = engine.graph();
        let json = to_json(source, session).unwrap();

        let mut rebuilt = NodeGraph::new();
        let root = from_json(&mut rebuilt, &json).unwrap();
        assert_eq!(root, session);
        assert_eq!(rebuilt.len(), source.len());

        for node in source.nodes() {
            assert_eq!(
                rebuilt.parent_chain(node.id()).unwrap(),
                source.parent_chain(node.id()).unwrap()
            );
            assert_eq!(rebuilt.node(node.id()).unwrap().input_links(), node.input_links());
            assert_eq!(rebuilt.status(node.id()).unwrap(), source.status(node.id()).unwrap());
        }
        assert!(check_graph(&rebuilt).is_empty());

        // Imported nodes carry no operation
        let collector = rebuilt.find_by_name("items").unwrap();
        assert!(!rebuilt.node(collector).unwrap().is_process());

        // New nodes are allocated past the imported ids
        let fresh = rebuilt.add_literal("fresh", json!(null));
        assert!(fresh.raw() > source.ids().map(|id| id.raw()).max().unwrap());
    }

    #[test]
    fn test_import_reuses_existing_nodes() {
        let (mut engine, session) = pipeline();
        let mut document = export_graph(engine.graph(), session).unwrap();
        let collector = engine.graph().find_by_name("items").unwrap();
        for record in &mut document.nodes {
            if record.id == collector {
                record.name = "renamed".to_string();
            }
        }

        let before = engine.graph().len();
        import_graph(engine.graph_mut(), &document).unwrap();
        let graph = engine.graph();
        assert_eq!(graph.len(), before);
        let node = graph.node(collector).unwrap();
        assert_eq!(node.name(), "renamed");
        assert!(node.is_collector());
        assert_eq!(node.stored_state(), NodeState::Succeeded);
        assert!(check_graph(graph).is_empty());
    }

    #[test]
    fn test_edge_wire_format() {
        let plain = EdgeRecord {
            source: NodeId::new(1),
            in_attr: "x".to_string(),
            target: NodeId::new(2),
            out_attr: DEFAULT_ATTR.to_string(),
        };
        assert_eq!(serde_json::to_value(&plain).unwrap(), json!([1, "x", 2]));

        let named: EdgeRecord = serde_json::from_value(json!([1, "x", 2, "max"])).unwrap();
        assert_eq!(named.out_attr, "max");
        assert_eq!(serde_json::to_value(&named).unwrap(), json!([1, "x", 2, "max"]));

        let parsed: EdgeRecord = serde_json::from_value(json!([1, "x", 2])).unwrap();
        assert_eq!(parsed, plain);
    }

    #[test]
    fn test_record_wire_format() {
        let record: NodeRecord = serde_json::from_value(json!({
            "id": 4,
            "name": "mesh",
            "kind": "data",
            "data": "body_geo",
            "state": "warning"
        }))
        .unwrap();
        assert_eq!(record.state, NodeState::Warning);
        assert!(record.children.is_empty());

        let mut graph = NodeGraph::new();
        import_graph(
            &mut graph,
            &GraphDocument {
                nodes: vec![record],
                edges: Vec::new(),
                root: NodeId::new(4),
            },
        )
        .unwrap();
        let node = graph.node(NodeId::new(4)).unwrap();
        assert_eq!(node.stored_state(), NodeState::Failed);
        assert!(node.warning());
    }

    #[test]
    fn test_import_rejects_missing_parent() {
        let document = GraphDocument {
            nodes: vec![NodeRecord {
                id: NodeId::new(2),
                name: "orphan".to_string(),
                kind: NodeKind::Node,
                data: Value::Null,
                state: NodeState::Init,
                warning: false,
                parent: Some(NodeId::new(1)),
                children: Vec::new(),
                data_node: None,
                error: None,
            }],
            edges: Vec::new(),
            root: NodeId::new(2),
        };
        let mut graph = NodeGraph::new();
        assert!(matches!(
            import_graph(&mut graph, &document),
            Err(EngineError::NodeNotFound(id)) if id == NodeId::new(1)
        ));
        assert_eq!(graph.len(), 0);
    }

    fn record(id: u64, name: &str, kind: NodeKind) -> NodeRecord {
        NodeRecord {
            id: NodeId::new(id),
            name: name.to_string(),
            kind,
            data: Value::Null,
            state: NodeState::Init,
            warning: false,
            parent: None,
            children: Vec::new(),
            data_node: None,
            error: None,
        }
    }

    #[test]
    fn test_rejected_edge_leaves_graph_unchanged() {
        let mut graph = NodeGraph::new();
        let a = graph.add_literal("a", json!(1));
        let b = graph.add_literal("b", json!(2));
        graph.connect_default(a, b).unwrap();

        // Renames a, adds c, and closes the loop b -> a
        let mut renamed = record(a.raw(), "renamed", NodeKind::Node);
        renamed.children = vec![NodeId::new(100)];
        let document = GraphDocument {
            nodes: vec![renamed, record(100, "c", NodeKind::Node)],
            edges: vec![EdgeRecord {
                source: b,
                in_attr: DEFAULT_ATTR.to_string(),
                target: a,
                out_attr: DEFAULT_ATTR.to_string(),
            }],
            root: a,
        };

        assert!(matches!(
            import_graph(&mut graph, &document),
            Err(EngineError::InvalidConnection(_))
        ));
        assert_eq!(graph.len(), 2);
        assert!(!graph.contains(NodeId::new(100)));
        let node = graph.node(a).unwrap();
        assert_eq!(node.name(), "a");
        assert!(node.children().is_empty());
        assert!(node.input_links().is_empty());
        assert_eq!(graph.output_nodes(a).unwrap(), vec![b]);
        assert!(check_graph(&graph).is_empty());
    }

    #[test]
    fn test_result_must_point_at_a_data_node() {
        let mut result = record(2, "result", NodeKind::Result);
        result.data_node = Some(NodeId::new(1));
        let document = GraphDocument {
            nodes: vec![record(1, "plain", NodeKind::Node), result],
            edges: Vec::new(),
            root: NodeId::new(2),
        };

        let mut graph = NodeGraph::new();
        assert!(matches!(
            import_graph(&mut graph, &document),
            Err(EngineError::WrongRole { node, .. }) if node == NodeId::new(1)
        ));
        assert!(graph.is_empty());
    }
}
