//! Node arena and connection bookkeeping
//!
//! All nodes live in one arena addressed by [`NodeId`]; links between nodes
//! are ids, never references. Two kinds of links are tracked:
//!
//! - **Ownership**: a node has at most one parent and an ordered list of
//!   children. `attach_child` and `detach` keep both sides in sync.
//! - **Dataflow**: a consumer maps each input attribute to one
//!   `(producer, out_attr)`; the producer lists its consumers per output
//!   attribute. `connect` and `disconnect` keep both sides in sync.
//!
//! Cycles are rejected in both link kinds at the time the link is made.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;

use serde_json::Value;

use crate::error::{EngineError, Result};
use crate::node::{item_name, Behavior, Node, NodeRole, ProcessConfig, ProcessSpec};
use crate::operation::Operation;
use crate::state::NodeState;
use crate::types::{DataType, InputLink, NodeId, NodeKind, OutputLink, DEFAULT_ATTR};

/// Arena of nodes with ownership and dataflow links
#[derive(Clone)]
pub struct NodeGraph {
    nodes: BTreeMap<NodeId, Node>,
    next_id: u64,
}

impl NodeGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn allocate(&mut self) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, kind: NodeKind, role: NodeRole) -> NodeId {
        let id = self.allocate();
        self.nodes.insert(id, Node::new(id, name, kind, role));
        id
    }

    /// Insert a node under a caller-chosen id (used by import)
    pub(crate) fn insert_with_id(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        kind: NodeKind,
        role: NodeRole,
    ) -> Result<()> {
        if self.nodes.contains_key(&id) {
            return Err(EngineError::invalid_connection(format!(
                "node id {} is already in use",
                id
            )));
        }
        self.nodes.insert(id, Node::new(id, name, kind, role));
        self.next_id = self.next_id.max(id.raw() + 1);
        Ok(())
    }

    /// Add a node holding a literal value
    pub fn add_literal(&mut self, name: impl Into<String>, data: Value) -> NodeId {
        let id = self.insert(name, NodeKind::Node, NodeRole::Literal);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.data = data;
        }
        id
    }

    /// Add a process node bound to an operation
    pub fn add_process(
        &mut self,
        name: impl Into<String>,
        operation: Arc<dyn Operation>,
        config: ProcessConfig,
    ) -> NodeId {
        self.insert_process(name, NodeKind::Process, operation, config, Behavior::Plain)
    }

    /// Add a collector; every item its operation returns becomes a data node child
    pub fn add_collector(
        &mut self,
        name: impl Into<String>,
        operation: Arc<dyn Operation>,
        data_type: Option<DataType>,
        config: ProcessConfig,
    ) -> NodeId {
        self.insert_process(
            name,
            NodeKind::Collector,
            operation,
            config,
            Behavior::Collector { data_type },
        )
    }

    /// Add a validator; its operation runs once per data node of its sources
    pub fn add_validator(
        &mut self,
        name: impl Into<String>,
        operation: Arc<dyn Operation>,
        required_type: Option<DataType>,
        config: ProcessConfig,
    ) -> NodeId {
        self.insert_process(
            name,
            NodeKind::Validator,
            operation,
            config,
            Behavior::Validator {
                required_type,
                sources: None,
            },
        )
    }

    /// Add a container that evaluates its children in order
    pub fn add_sequence(&mut self, name: impl Into<String>, kind: NodeKind, config: ProcessConfig) -> NodeId {
        self.insert(name, kind, NodeRole::Sequence(config))
    }

    /// Attach an action to a target node
    ///
    /// Actions are kept in the target's action list, not among its children,
    /// so they never take part in rollup.
    pub fn add_action(
        &mut self,
        target: NodeId,
        name: impl Into<String>,
        operation: Arc<dyn Operation>,
        config: ProcessConfig,
    ) -> Result<NodeId> {
        self.node(target)?;
        let id = self.insert_process(
            name,
            NodeKind::Action,
            operation,
            config,
            Behavior::Action { target },
        );
        self.node_mut(target)?.actions.push(id);
        Ok(id)
    }

    fn insert_process(
        &mut self,
        name: impl Into<String>,
        kind: NodeKind,
        operation: Arc<dyn Operation>,
        config: ProcessConfig,
        behavior: Behavior,
    ) -> NodeId {
        self.insert(
            name,
            kind,
            NodeRole::Process(ProcessSpec {
                operation,
                config,
                behavior,
            }),
        )
    }

    /// Wrap a collected item in a data node owned by the collector
    pub(crate) fn add_data_node(&mut self, collector: NodeId, item: Value) -> Result<NodeId> {
        let id = self.insert(
            item_name(&item),
            NodeKind::Data,
            NodeRole::Data {
                result_nodes: Vec::new(),
            },
        );
        if let Some(node) = self.nodes.get_mut(&id) {
            node.data = item;
        }
        self.attach_child(collector, id)?;
        Ok(id)
    }

    /// Record a validation outcome, linked both ways with its data node
    pub(crate) fn add_result_node(
        &mut self,
        validator: NodeId,
        data_node: NodeId,
        outcome: NodeState,
        warning: bool,
        error: Option<String>,
        index: Option<usize>,
    ) -> Result<NodeId> {
        let name = self.node(data_node)?.name.clone();
        let id = self.insert(name, NodeKind::Result, NodeRole::Result { data_node });
        if let Some(node) = self.nodes.get_mut(&id) {
            node.state = outcome;
            node.warning = warning;
            node.error = error;
        }
        self.attach_child_at(validator, id, index)?;
        if let NodeRole::Data { result_nodes } = &mut self.node_mut(data_node)?.role {
            result_nodes.push(id);
        }
        Ok(id)
    }

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(EngineError::NodeNotFound(id))
    }

    /// Get a node by id, if present
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(EngineError::NodeNotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids in allocation order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// All nodes in allocation order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    /// Find the first node with the given name
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.values().find(|n| n.name == name).map(|n| n.id)
    }

    // ---------------------------------------------------------------------
    // Ownership links
    // ---------------------------------------------------------------------

    /// Make `child` the last child of `parent`, detaching it from any previous parent
    pub fn attach_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.attach_child_at(parent, child, None)
    }

    pub(crate) fn attach_child_at(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: Option<usize>,
    ) -> Result<()> {
        self.node(parent)?;
        self.node(child)?;
        if parent == child {
            return Err(EngineError::invalid_connection(format!(
                "node {} cannot be its own parent",
                child
            )));
        }
        if self.ancestors(parent)?.contains(&child) {
            return Err(EngineError::invalid_connection(format!(
                "attaching {} under {} would make it its own ancestor",
                child, parent
            )));
        }

        self.detach(child)?;
        let parent_node = self.node_mut(parent)?;
        match index {
            Some(i) if i < parent_node.children.len() => parent_node.children.insert(i, child),
            _ => parent_node.children.push(child),
        }
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Remove `child` from its parent; returns the former parent
    pub fn detach(&mut self, child: NodeId) -> Result<Option<NodeId>> {
        let parent = self.node_mut(child)?.parent.take();
        if let Some(parent) = parent {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.children.retain(|c| *c != child);
            }
        }
        Ok(parent)
    }

    /// Parent, grandparent, ... up to the root
    pub fn ancestors(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut chain = Vec::new();
        let mut current = self.node(id)?.parent;
        while let Some(parent) = current {
            if chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = self.node(parent)?.parent;
        }
        Ok(chain)
    }

    /// The node followed by its ancestors
    pub fn parent_chain(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut chain = vec![id];
        chain.extend(self.ancestors(id)?);
        Ok(chain)
    }

    // ---------------------------------------------------------------------
    // Dataflow links
    // ---------------------------------------------------------------------

    /// Connect `producer.out_attr` to `consumer.in_attr`
    ///
    /// Any existing link on `consumer.in_attr` is replaced. Connecting the
    /// same pair twice is a no-op. Fails with `InvalidConnection` if the edge
    /// would make a node its own (transitive) input; the graph is left
    /// unchanged in that case.
    pub fn connect(
        &mut self,
        producer: NodeId,
        consumer: NodeId,
        out_attr: &str,
        in_attr: &str,
    ) -> Result<()> {
        self.node(producer)?;
        let existing = self
            .node(consumer)?
            .inputs
            .iter()
            .position(|l| l.in_attr == in_attr);

        if producer == consumer {
            return Err(EngineError::invalid_connection(format!(
                "node {} cannot be its own input",
                producer
            )));
        }
        if let Some(pos) = existing {
            let link = &self.node(consumer)?.inputs[pos];
            if link.producer == producer && link.out_attr == out_attr {
                return Ok(());
            }
        }
        if self.reaches(consumer, producer) {
            return Err(EngineError::invalid_connection(format!(
                "connecting {} -> {} would create a cycle",
                producer, consumer
            )));
        }

        self.disconnect(consumer, in_attr)?;
        let link = InputLink {
            in_attr: in_attr.to_string(),
            producer,
            out_attr: out_attr.to_string(),
        };
        let consumer_node = self.node_mut(consumer)?;
        match existing {
            Some(pos) if pos <= consumer_node.inputs.len() => consumer_node.inputs.insert(pos, link),
            _ => consumer_node.inputs.push(link),
        }
        self.node_mut(producer)?
            .outputs
            .entry(out_attr.to_string())
            .or_default()
            .push(OutputLink {
                consumer,
                in_attr: in_attr.to_string(),
            });

        log::debug!(
            "Connected {}.{} -> {}.{}",
            producer,
            out_attr,
            consumer,
            in_attr
        );
        Ok(())
    }

    /// Connect on the default attributes of both sides
    pub fn connect_default(&mut self, producer: NodeId, consumer: NodeId) -> Result<()> {
        self.connect(producer, consumer, DEFAULT_ATTR, DEFAULT_ATTR)
    }

    /// Remove the input link on `consumer.in_attr`; returns whether one existed
    pub fn disconnect(&mut self, consumer: NodeId, in_attr: &str) -> Result<bool> {
        let consumer_node = self.node_mut(consumer)?;
        let Some(pos) = consumer_node.inputs.iter().position(|l| l.in_attr == in_attr) else {
            return Ok(false);
        };
        let link = consumer_node.inputs.remove(pos);

        if let Some(producer) = self.nodes.get_mut(&link.producer) {
            if let Some(consumers) = producer.outputs.get_mut(&link.out_attr) {
                consumers.retain(|o| !(o.consumer == consumer && o.in_attr == in_attr));
                if consumers.is_empty() {
                    producer.outputs.remove(&link.out_attr);
                }
            }
        }
        Ok(true)
    }

    /// Remove every dataflow link into and out of a node
    pub fn disconnect_all(&mut self, id: NodeId) -> Result<()> {
        let node = self.node(id)?;
        let in_attrs: Vec<String> = node.inputs.iter().map(|l| l.in_attr.clone()).collect();
        let outgoing: Vec<OutputLink> = node.outputs.values().flatten().cloned().collect();

        for in_attr in in_attrs {
            self.disconnect(id, &in_attr)?;
        }
        for link in outgoing {
            self.disconnect(link.consumer, &link.in_attr)?;
        }
        Ok(())
    }

    /// Producers feeding this node, in declaration order, without duplicates
    pub fn input_nodes(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut seen = HashSet::new();
        Ok(self
            .node(id)?
            .inputs
            .iter()
            .map(|l| l.producer)
            .filter(|p| seen.insert(*p))
            .collect())
    }

    /// Consumers of this node, without duplicates
    pub fn output_nodes(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut seen = HashSet::new();
        Ok(self
            .node(id)?
            .outputs
            .values()
            .flatten()
            .map(|l| l.consumer)
            .filter(|c| seen.insert(*c))
            .collect())
    }

    /// Union of input and output nodes, without duplicates
    pub fn connected_nodes(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut nodes = self.input_nodes(id)?;
        for consumer in self.output_nodes(id)? {
            if !nodes.contains(&consumer) {
                nodes.push(consumer);
            }
        }
        Ok(nodes)
    }

    /// Whether `to` is reachable from `from` following dataflow direction
    fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            if current == to {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(node) = self.nodes.get(&current) {
                queue.extend(node.outputs.values().flatten().map(|l| l.consumer));
            }
        }
        false
    }

    /// Record a discovered runtime link on both nodes; returns whether it is new
    pub(crate) fn link_runtime(&mut self, a: NodeId, b: NodeId) -> Result<bool> {
        self.node(b)?;
        let node_a = self.node_mut(a)?;
        if node_a.runtime_links.contains(&b) {
            return Ok(false);
        }
        node_a.runtime_links.push(b);
        self.node_mut(b)?.runtime_links.push(a);
        Ok(true)
    }

    // ---------------------------------------------------------------------
    // State
    // ---------------------------------------------------------------------

    /// Move a node to a new stored state, validated against the transition table
    pub fn transition(&mut self, id: NodeId, to: NodeState) -> Result<()> {
        let node = self.node_mut(id)?;
        if matches!(node.role, NodeRole::Data { .. }) {
            return Err(EngineError::WrongRole {
                node: id,
                expected: "node with a stored state",
            });
        }
        if !node.state.can_transition_to(to) {
            return Err(EngineError::InvalidTransition {
                node: id,
                from: node.state,
                to,
            });
        }
        node.state = to;
        Ok(())
    }

    /// Overwrite the stored state without checking the transition table
    pub(crate) fn set_state_unchecked(&mut self, id: NodeId, state: NodeState, warning: bool) -> Result<()> {
        let node = self.node_mut(id)?;
        node.state = state;
        node.warning = warning;
        Ok(())
    }

    /// Disable a node that has not run; it will be skipped permanently
    pub fn disable(&mut self, id: NodeId) -> Result<()> {
        self.transition(id, NodeState::Disabled)
    }

    /// Return a node to `Init`, dropping what its last run produced
    ///
    /// Collectors lose their data nodes and validators their result nodes.
    pub fn reset(&mut self, id: NodeId) -> Result<()> {
        let node = self.node(id)?;
        if matches!(node.state, NodeState::Disabled | NodeState::Running) {
            return Err(EngineError::InvalidTransition {
                node: id,
                from: node.state,
                to: NodeState::Init,
            });
        }
        let owned_outputs: Vec<NodeId> = match &node.role {
            NodeRole::Process(ProcessSpec {
                behavior: Behavior::Collector { .. } | Behavior::Validator { .. },
                ..
            }) => node.children.clone(),
            _ => Vec::new(),
        };
        let clears_data = node.is_process();

        for child in owned_outputs {
            if self.contains(child) {
                self.remove_node(child)?;
            }
        }
        let node = self.node_mut(id)?;
        node.state = NodeState::Init;
        node.error = None;
        if clears_data {
            node.data = Value::Null;
        }
        Ok(())
    }

    /// Mark failures of a node as non-fatal (displayed as `Warning`)
    pub fn set_warning(&mut self, id: NodeId, warning: bool) -> Result<()> {
        self.node_mut(id)?.warning = warning;
        Ok(())
    }

    /// Replace the value held by a literal or data node
    pub fn set_data(&mut self, id: NodeId, data: Value) -> Result<()> {
        let node = self.node_mut(id)?;
        match node.role {
            NodeRole::Literal | NodeRole::Data { .. } => {
                node.data = data;
                Ok(())
            }
            _ => Err(EngineError::WrongRole {
                node: id,
                expected: "literal or data node",
            }),
        }
    }

    /// Displayed state of a node
    ///
    /// Data nodes derive it from their result nodes: `Failed` if any failed,
    /// else `Warning` if any warned, else `Succeeded`.
    pub fn status(&self, id: NodeId) -> Result<NodeState> {
        let node = self.node(id)?;
        match &node.role {
            NodeRole::Data { result_nodes } => {
                let mut warned = false;
                for result in result_nodes {
                    match self.status(*result)? {
                        NodeState::Failed => return Ok(NodeState::Failed),
                        NodeState::Warning => warned = true,
                        _ => {}
                    }
                }
                Ok(if warned {
                    NodeState::Warning
                } else {
                    NodeState::Succeeded
                })
            }
            _ => Ok(NodeState::display(node.state, node.warning)),
        }
    }

    // ---------------------------------------------------------------------
    // Removal
    // ---------------------------------------------------------------------

    /// Remove a node together with everything it owns
    ///
    /// Owned nodes are its children, its actions and, for data nodes, the
    /// result nodes that validated them. Every link from a surviving node to
    /// a removed one is severed. Returns the removed ids.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        self.node(id)?;

        let mut doomed: Vec<NodeId> = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if doomed.contains(&current) {
                continue;
            }
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            doomed.push(current);
            stack.extend(node.children.iter().copied());
            stack.extend(node.actions.iter().copied());
            stack.extend(node.result_nodes().iter().copied());
        }

        for &current in &doomed {
            self.detach(current)?;
            self.disconnect_all(current)?;

            let node = self.node_mut(current)?;
            let runtime = std::mem::take(&mut node.runtime_links);
            let data_node = node.data_node();
            let action_target = node.action_target();

            for other in runtime {
                if let Some(other_node) = self.nodes.get_mut(&other) {
                    other_node.runtime_links.retain(|n| *n != current);
                }
            }
            if let Some(data_node) = data_node {
                if let Some(NodeRole::Data { result_nodes }) =
                    self.nodes.get_mut(&data_node).map(|n| &mut n.role)
                {
                    result_nodes.retain(|r| *r != current);
                }
            }
            if let Some(target) = action_target {
                if let Some(target_node) = self.nodes.get_mut(&target) {
                    target_node.actions.retain(|a| *a != current);
                }
            }
        }

        for current in &doomed {
            self.nodes.remove(current);
        }
        log::debug!("Removed {} node(s) rooted at {}", doomed.len(), id);
        Ok(doomed)
    }
}

impl Default for NodeGraph {
    fn default() -> Self {
        Self::new()
    }
}
