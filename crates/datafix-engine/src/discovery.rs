//! Evaluation context and runtime dependency discovery
//!
//! The engine keeps an explicit stack of the nodes currently evaluating.
//! When a node starts evaluating while another node is on top of the stack
//! and is not one of that node's declared inputs, the two are linked with a
//! runtime link. Runtime links are diagnostic only; they never affect
//! evaluation order and are not exported.
//!
//! Operations reach other nodes only through [`EvalContext::pull`], so every
//! dependency an operation uses passes through the engine and is seen here.

use serde_json::Value;

use crate::engine::DemandEngine;
use crate::error::Result;
use crate::graph::NodeGraph;
use crate::types::NodeId;

/// Handle given to an operation while its node evaluates
pub struct EvalContext<'a> {
    engine: &'a mut DemandEngine,
    node: NodeId,
}

impl<'a> EvalContext<'a> {
    pub(crate) fn new(engine: &'a mut DemandEngine, node: NodeId) -> Self {
        Self { engine, node }
    }

    /// The node whose operation is running
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Evaluate another node and return its value
    ///
    /// The pulled node is recorded as a runtime link of the running node
    /// unless it is already a declared input.
    pub fn pull(&mut self, dependency: NodeId) -> Result<Option<Value>> {
        self.engine.evaluate(dependency, Vec::new())
    }

    /// Evaluate another node with explicit arguments
    pub fn pull_with(&mut self, dependency: NodeId, args: Vec<Value>) -> Result<Option<Value>> {
        self.engine.evaluate(dependency, args)
    }

    /// Read-only view of the graph
    pub fn graph(&self) -> &NodeGraph {
        self.engine.graph()
    }

    /// Held value of a node, without evaluating it
    pub fn data(&self, id: NodeId) -> Result<&Value> {
        Ok(self.engine.graph().node(id)?.data())
    }
}

/// Nodes currently evaluating, innermost last
#[derive(Debug, Default)]
pub(crate) struct EvalStack {
    frames: Vec<NodeId>,
}

impl EvalStack {
    pub(crate) fn push(&mut self, id: NodeId) {
        self.frames.push(id);
    }

    pub(crate) fn pop(&mut self) -> Option<NodeId> {
        self.frames.pop()
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.frames.contains(&id)
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The active node a newly starting evaluation of `id` should be linked to
    ///
    /// Declared inputs and children of the active node are already known
    /// links and are not reported.
    pub(crate) fn caller_of(&self, graph: &NodeGraph, id: NodeId) -> Option<NodeId> {
        let caller = *self.frames.last()?;
        if caller == id {
            return None;
        }
        let known = graph
            .get(caller)
            .map(|node| {
                node.children().contains(&id) || node.input_links().iter().any(|l| l.producer == id)
            })
            .unwrap_or(false);
        (!known).then_some(caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ProcessConfig;
    use crate::operation;
    use serde_json::json;

    #[test]
    fn test_empty_stack_has_no_caller() {
        let mut graph = NodeGraph::new();
        let a = graph.add_literal("a", json!(1));
        let stack = EvalStack::default();
        assert_eq!(stack.caller_of(&graph, a), None);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_declared_inputs_are_not_discovered() {
        let mut graph = NodeGraph::new();
        let input = graph.add_literal("input", json!(1));
        let other = graph.add_literal("other", json!(2));
        let consumer = graph.add_process(
            "consumer",
            operation::constant(json!(null)),
            ProcessConfig::default(),
        );
        graph.connect_default(input, consumer).unwrap();

        let mut stack = EvalStack::default();
        stack.push(consumer);
        assert_eq!(stack.caller_of(&graph, input), None);
        assert_eq!(stack.caller_of(&graph, other), Some(consumer));
        assert_eq!(stack.caller_of(&graph, consumer), None);

        graph.attach_child(consumer, other).unwrap();
        assert_eq!(stack.caller_of(&graph, other), None);
        assert!(stack.contains(consumer));
        assert_eq!(stack.pop(), Some(consumer));
    }
}
