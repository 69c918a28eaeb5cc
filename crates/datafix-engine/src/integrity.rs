//! Structural integrity checks for a node graph
//!
//! Every link in the graph is stored on both of its ends. These checks
//! confirm both halves agree, that every referenced id exists, and that the
//! dataflow edges form a DAG. The graph API maintains all of this itself;
//! the checks exist for imported documents and for tests.

use std::collections::{BTreeMap, VecDeque};

use crate::graph::NodeGraph;
use crate::types::NodeId;

/// A violated structural invariant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// A link names a node that is not in the graph
    DanglingReference { node: NodeId, missing: NodeId },
    /// `child` is listed under `parent` but points elsewhere, or vice versa
    ParentMismatch { parent: NodeId, child: NodeId },
    /// An input link has no matching output link (or the reverse)
    DataflowMismatch {
        producer: NodeId,
        consumer: NodeId,
        in_attr: String,
    },
    /// A data node and one of its result nodes disagree
    ResultMismatch { data_node: NodeId, result: NodeId },
    /// A runtime link is recorded on only one side
    RuntimeMismatch { from: NodeId, to: NodeId },
    /// An action is not listed on its target
    ActionMismatch { action: NodeId, target: NodeId },
    /// Dataflow edges contain a cycle through these nodes
    CycleDetected { nodes: Vec<NodeId> },
}

impl std::fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DanglingReference { node, missing } => {
                write!(f, "Node {} references missing node {}", node, missing)
            }
            Self::ParentMismatch { parent, child } => {
                write!(f, "Parent link {} -> {} is not symmetric", parent, child)
            }
            Self::DataflowMismatch {
                producer,
                consumer,
                in_attr,
            } => write!(
                f,
                "Dataflow edge {} -> {}.{} is not symmetric",
                producer, consumer, in_attr
            ),
            Self::ResultMismatch { data_node, result } => {
                write!(f, "Result {} and data node {} disagree", result, data_node)
            }
            Self::RuntimeMismatch { from, to } => {
                write!(f, "Runtime link {} -> {} is not symmetric", from, to)
            }
            Self::ActionMismatch { action, target } => {
                write!(f, "Action {} is not listed on target {}", action, target)
            }
            Self::CycleDetected { nodes } => {
                let ids: Vec<String> = nodes.iter().map(|n| n.to_string()).collect();
                write!(f, "Dataflow cycle through {}", ids.join(", "))
            }
        }
    }
}

impl std::error::Error for IntegrityError {}

/// Check every structural invariant of `graph`
///
/// Returns all errors found (not just the first).
pub fn check_graph(graph: &NodeGraph) -> Vec<IntegrityError> {
    let mut errors = Vec::new();

    check_ownership(graph, &mut errors);
    check_dataflow(graph, &mut errors);
    check_results(graph, &mut errors);
    check_runtime_links(graph, &mut errors);
    detect_cycles(graph, &mut errors);

    errors
}

fn check_ownership(graph: &NodeGraph, errors: &mut Vec<IntegrityError>) {
    for node in graph.nodes() {
        if let Some(parent) = node.parent() {
            match graph.get(parent) {
                None => errors.push(IntegrityError::DanglingReference {
                    node: node.id(),
                    missing: parent,
                }),
                Some(p) if !p.children().contains(&node.id()) => {
                    errors.push(IntegrityError::ParentMismatch {
                        parent,
                        child: node.id(),
                    })
                }
                Some(_) => {}
            }
        }
        for child in node.children() {
            match graph.get(*child) {
                None => errors.push(IntegrityError::DanglingReference {
                    node: node.id(),
                    missing: *child,
                }),
                Some(c) if c.parent() != Some(node.id()) => {
                    errors.push(IntegrityError::ParentMismatch {
                        parent: node.id(),
                        child: *child,
                    })
                }
                Some(_) => {}
            }
        }
        if let Some(target) = node.action_target() {
            match graph.get(target) {
                None => errors.push(IntegrityError::DanglingReference {
                    node: node.id(),
                    missing: target,
                }),
                Some(t) if !t.actions().contains(&node.id()) => {
                    errors.push(IntegrityError::ActionMismatch {
                        action: node.id(),
                        target,
                    })
                }
                Some(_) => {}
            }
        }
    }
}

fn check_dataflow(graph: &NodeGraph, errors: &mut Vec<IntegrityError>) {
    for node in graph.nodes() {
        for link in node.input_links() {
            let mirrored = graph.get(link.producer).map(|p| {
                p.output_links()
                    .get(&link.out_attr)
                    .map(|outs| {
                        outs.iter()
                            .any(|o| o.consumer == node.id() && o.in_attr == link.in_attr)
                    })
                    .unwrap_or(false)
            });
            match mirrored {
                None => errors.push(IntegrityError::DanglingReference {
                    node: node.id(),
                    missing: link.producer,
                }),
                Some(false) => errors.push(IntegrityError::DataflowMismatch {
                    producer: link.producer,
                    consumer: node.id(),
                    in_attr: link.in_attr.clone(),
                }),
                Some(true) => {}
            }
        }

        for (out_attr, outs) in node.output_links() {
            for out in outs {
                let mirrored = graph.get(out.consumer).map(|c| {
                    c.input_links().iter().any(|l| {
                        l.producer == node.id() && l.in_attr == out.in_attr && &l.out_attr == out_attr
                    })
                });
                match mirrored {
                    None => errors.push(IntegrityError::DanglingReference {
                        node: node.id(),
                        missing: out.consumer,
                    }),
                    Some(false) => errors.push(IntegrityError::DataflowMismatch {
                        producer: node.id(),
                        consumer: out.consumer,
                        in_attr: out.in_attr.clone(),
                    }),
                    Some(true) => {}
                }
            }
        }
    }
}

fn check_results(graph: &NodeGraph, errors: &mut Vec<IntegrityError>) {
    for node in graph.nodes() {
        for result in node.result_nodes() {
            match graph.get(*result) {
                None => errors.push(IntegrityError::DanglingReference {
                    node: node.id(),
                    missing: *result,
                }),
                Some(r) if r.data_node() != Some(node.id()) => {
                    errors.push(IntegrityError::ResultMismatch {
                        data_node: node.id(),
                        result: *result,
                    })
                }
                Some(_) => {}
            }
        }
        if let Some(data_node) = node.data_node() {
            match graph.get(data_node) {
                None => errors.push(IntegrityError::DanglingReference {
                    node: node.id(),
                    missing: data_node,
                }),
                Some(d) if !d.result_nodes().contains(&node.id()) => {
                    errors.push(IntegrityError::ResultMismatch {
                        data_node,
                        result: node.id(),
                    })
                }
                Some(_) => {}
            }
        }
    }
}

fn check_runtime_links(graph: &NodeGraph, errors: &mut Vec<IntegrityError>) {
    for node in graph.nodes() {
        for other in node.runtime_links() {
            match graph.get(*other) {
                None => errors.push(IntegrityError::DanglingReference {
                    node: node.id(),
                    missing: *other,
                }),
                Some(o) if !o.runtime_links().contains(&node.id()) => {
                    errors.push(IntegrityError::RuntimeMismatch {
                        from: node.id(),
                        to: *other,
                    })
                }
                Some(_) => {}
            }
        }
    }
}

/// Detect dataflow cycles using Kahn's algorithm (topological sort)
///
/// Only edges present on both ends are considered; one-sided edges are
/// reported by [`check_dataflow`].
fn detect_cycles(graph: &NodeGraph, errors: &mut Vec<IntegrityError>) {
    let mut edges: Vec<(NodeId, NodeId)> = Vec::new();
    for node in graph.nodes() {
        for link in node.input_links() {
            let mirrored = graph
                .get(link.producer)
                .and_then(|p| p.output_links().get(&link.out_attr))
                .map(|outs| {
                    outs.iter()
                        .any(|o| o.consumer == node.id() && o.in_attr == link.in_attr)
                })
                .unwrap_or(false);
            if mirrored {
                edges.push((link.producer, node.id()));
            }
        }
    }

    let mut in_degree: BTreeMap<NodeId, usize> = graph.ids().map(|id| (id, 0)).collect();
    for (_, consumer) in &edges {
        *in_degree.entry(*consumer).or_insert(0) += 1;
    }

    let mut queue: VecDeque<NodeId> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();

    while let Some(id) = queue.pop_front() {
        for (producer, consumer) in &edges {
            if *producer == id {
                if let Some(deg) = in_degree.get_mut(consumer) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(*consumer);
                    }
                }
            }
        }
    }

    let remaining: Vec<NodeId> = in_degree
        .into_iter()
        .filter(|(_, deg)| *deg > 0)
        .map(|(id, _)| id)
        .collect();
    if !remaining.is_empty() {
        errors.push(IntegrityError::CycleDetected { nodes: remaining });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ProcessConfig;
    use crate::operation;
    use crate::types::{InputLink, OutputLink, DEFAULT_ATTR};
    use serde_json::json;

    fn process(graph: &mut NodeGraph, name: &str) -> NodeId {
        graph.add_process(name, operation::constant(json!(null)), ProcessConfig::default())
    }

    #[test]
    fn test_consistent_graph_passes() {
        let mut graph = NodeGraph::new();
        let a = graph.add_literal("a", json!(1));
        let b = process(&mut graph, "b");
        let c = process(&mut graph, "c");
        graph.connect_default(a, b).unwrap();
        graph.connect(b, c, DEFAULT_ATTR, "x").unwrap();
        graph.attach_child(c, a).unwrap();
        graph.link_runtime(b, c).unwrap();

        assert!(check_graph(&graph).is_empty());
    }

    #[test]
    fn test_parent_asymmetry_is_reported() {
        let mut graph = NodeGraph::new();
        let parent = graph.add_literal("parent", json!(1));
        let child = graph.add_literal("child", json!(2));
        graph.attach_child(parent, child).unwrap();
        graph.node_mut(child).unwrap().parent = None;

        assert_eq!(
            check_graph(&graph),
            vec![IntegrityError::ParentMismatch { parent, child }]
        );
    }

    #[test]
    fn test_one_sided_edge_is_reported() {
        let mut graph = NodeGraph::new();
        let a = graph.add_literal("a", json!(1));
        let b = process(&mut graph, "b");
        graph.node_mut(b).unwrap().inputs.push(InputLink {
            in_attr: DEFAULT_ATTR.to_string(),
            producer: a,
            out_attr: DEFAULT_ATTR.to_string(),
        });

        let errors = check_graph(&graph);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            IntegrityError::DataflowMismatch { producer, consumer, .. } if producer == a && consumer == b
        ));
    }

    #[test]
    fn test_dangling_child_is_reported() {
        let mut graph = NodeGraph::new();
        let parent = graph.add_literal("parent", json!(1));
        let ghost = NodeId::new(99);
        graph.node_mut(parent).unwrap().children.push(ghost);

        assert_eq!(
            check_graph(&graph),
            vec![IntegrityError::DanglingReference {
                node: parent,
                missing: ghost
            }]
        );
    }

    #[test]
    fn test_cycle_is_detected() {
        let mut graph = NodeGraph::new();
        let a = process(&mut graph, "a");
        let b = process(&mut graph, "b");
        let c = process(&mut graph, "c");
        graph.connect_default(a, b).unwrap();
        graph.connect_default(b, c).unwrap();

        // Bypass the API, which refuses cycles
        graph.node_mut(a).unwrap().inputs.push(InputLink {
            in_attr: DEFAULT_ATTR.to_string(),
            producer: c,
            out_attr: DEFAULT_ATTR.to_string(),
        });
        graph
            .node_mut(c)
            .unwrap()
            .outputs
            .entry(DEFAULT_ATTR.to_string())
            .or_default()
            .push(OutputLink {
                consumer: a,
                in_attr: DEFAULT_ATTR.to_string(),
            });

        assert_eq!(
            check_graph(&graph),
            vec![IntegrityError::CycleDetected { nodes: vec![a, b, c] }]
        );
    }

    #[test]
    fn test_error_display() {
        let err = IntegrityError::RuntimeMismatch {
            from: NodeId::new(1),
            to: NodeId::new(2),
        };
        assert_eq!(err.to_string(), "Runtime link #1 -> #2 is not symmetric");
    }
}
