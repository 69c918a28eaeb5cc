//! Node entity stored in the graph arena
//!
//! A node has an identity, a held `data` value, a stored state and two
//! independent connection sets: ownership (parent/children) and dataflow
//! (input/output links). Fields are crate-private; every mutation goes
//! through [`NodeGraph`](crate::graph::NodeGraph) so both halves of each
//! link stay consistent.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapter::AdapterMatch;
use crate::operation::Operation;
use crate::state::NodeState;
use crate::types::{DataType, InputLink, NodeId, NodeKind, OutputLink};

/// Error-handling policy of a process node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessConfig {
    /// Keep going when a dependency (or this node) fails
    pub continue_on_error: bool,
    /// Propagate operation errors to the caller instead of only recording them
    pub raise_exception: bool,
    /// Display failures as `Warning`
    pub warning: bool,
}

impl ProcessConfig {
    /// Defaults for collectors, validators and sessions: failures never abort siblings
    pub fn pipeline() -> Self {
        Self {
            continue_on_error: true,
            ..Self::default()
        }
    }

    pub fn with_continue_on_error(mut self, value: bool) -> Self {
        self.continue_on_error = value;
        self
    }

    pub fn with_raise_exception(mut self, value: bool) -> Self {
        self.raise_exception = value;
        self
    }

    pub fn with_warning(mut self, value: bool) -> Self {
        self.warning = value;
        self
    }
}

/// A resolved validator source: one collector and how its items are adapted
#[derive(Debug, Clone)]
pub struct SourceBinding {
    pub collector: NodeId,
    pub adapter: AdapterMatch,
}

/// What a process node does with the value its operation returns
#[derive(Clone)]
pub(crate) enum Behavior {
    /// Cache the value in `data`
    Plain,
    /// Wrap every returned item in a data node child
    Collector { data_type: Option<DataType> },
    /// Run the operation once per data node of the resolved sources
    Validator {
        required_type: Option<DataType>,
        sources: Option<Vec<SourceBinding>>,
    },
    /// Run against the target node's data
    Action { target: NodeId },
}

#[derive(Clone)]
pub(crate) struct ProcessSpec {
    pub(crate) operation: Arc<dyn Operation>,
    pub(crate) config: ProcessConfig,
    pub(crate) behavior: Behavior,
}

/// Role-specific part of a node
#[derive(Clone)]
pub(crate) enum NodeRole {
    /// Holds a literal value
    Literal,
    /// Callable unit
    Process(ProcessSpec),
    /// Container that evaluates its children in order
    Sequence(ProcessConfig),
    /// Collected item; state derived from its result nodes
    Data { result_nodes: Vec<NodeId> },
    /// Validation outcome for one data node
    Result { data_node: NodeId },
}

/// A node in the graph arena
#[derive(Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
    pub(crate) data: Value,
    pub(crate) state: NodeState,
    pub(crate) warning: bool,
    pub(crate) error: Option<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) inputs: Vec<InputLink>,
    pub(crate) outputs: BTreeMap<String, Vec<OutputLink>>,
    pub(crate) runtime_links: Vec<NodeId>,
    pub(crate) actions: Vec<NodeId>,
    pub(crate) role: NodeRole,
}

impl Node {
    pub(crate) fn new(id: NodeId, name: impl Into<String>, kind: NodeKind, role: NodeRole) -> Self {
        let warning = match &role {
            NodeRole::Process(spec) => spec.config.warning,
            NodeRole::Sequence(config) => config.warning,
            _ => false,
        };
        Self {
            id,
            name: name.into(),
            kind,
            data: Value::Null,
            state: NodeState::Init,
            warning,
            error: None,
            parent: None,
            children: Vec::new(),
            inputs: Vec::new(),
            outputs: BTreeMap::new(),
            runtime_links: Vec::new(),
            actions: Vec::new(),
            role,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Held value: a literal, a collected item, or a cached result
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// The stored state (never `Warning`)
    pub fn stored_state(&self) -> NodeState {
        self.state
    }

    /// Whether failures of this node display as `Warning`
    pub fn warning(&self) -> bool {
        self.warning
    }

    /// Message of the last recorded failure
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Input links in declaration order
    pub fn input_links(&self) -> &[InputLink] {
        &self.inputs
    }

    /// Output links grouped by producer attribute
    pub fn output_links(&self) -> &BTreeMap<String, Vec<OutputLink>> {
        &self.outputs
    }

    /// Nodes discovered while evaluating (diagnostic only)
    pub fn runtime_links(&self) -> &[NodeId] {
        &self.runtime_links
    }

    /// Actions attached to this node
    pub fn actions(&self) -> &[NodeId] {
        &self.actions
    }

    /// Whether this node carries an operation
    pub fn is_process(&self) -> bool {
        matches!(self.role, NodeRole::Process(_))
    }

    /// Whether this node evaluates its children in order
    pub fn is_sequence(&self) -> bool {
        matches!(self.role, NodeRole::Sequence(_))
    }

    /// Whether this node turns its operation's items into data nodes
    pub fn is_collector(&self) -> bool {
        matches!(self.behavior(), Some(Behavior::Collector { .. }))
    }

    /// Whether this node validates data nodes into result nodes
    pub fn is_validator(&self) -> bool {
        matches!(self.behavior(), Some(Behavior::Validator { .. }))
    }

    pub(crate) fn behavior(&self) -> Option<&Behavior> {
        match &self.role {
            NodeRole::Process(spec) => Some(&spec.behavior),
            _ => None,
        }
    }

    pub(crate) fn operation(&self) -> Option<Arc<dyn Operation>> {
        match &self.role {
            NodeRole::Process(spec) => Some(Arc::clone(&spec.operation)),
            _ => None,
        }
    }

    /// Error-handling policy for process and sequence nodes
    pub fn config(&self) -> Option<&ProcessConfig> {
        match &self.role {
            NodeRole::Process(spec) => Some(&spec.config),
            NodeRole::Sequence(config) => Some(config),
            _ => None,
        }
    }

    /// Declared data type of a collector
    pub fn data_type(&self) -> Option<&DataType> {
        match &self.role {
            NodeRole::Process(ProcessSpec {
                behavior: Behavior::Collector { data_type },
                ..
            }) => data_type.as_ref(),
            _ => None,
        }
    }

    /// Required input type of a validator
    pub fn required_type(&self) -> Option<&DataType> {
        match &self.role {
            NodeRole::Process(ProcessSpec {
                behavior: Behavior::Validator { required_type, .. },
                ..
            }) => required_type.as_ref(),
            _ => None,
        }
    }

    /// The data node a result node validated
    pub fn data_node(&self) -> Option<NodeId> {
        match &self.role {
            NodeRole::Result { data_node } => Some(*data_node),
            _ => None,
        }
    }

    /// Result nodes that reference this data node
    pub fn result_nodes(&self) -> &[NodeId] {
        match &self.role {
            NodeRole::Data { result_nodes } => result_nodes,
            _ => &[],
        }
    }

    /// Target node of an action
    pub fn action_target(&self) -> Option<NodeId> {
        match &self.role {
            NodeRole::Process(ProcessSpec {
                behavior: Behavior::Action { target },
                ..
            }) => Some(*target),
            _ => None,
        }
    }

    /// Label used in reports, e.g. `Collector(collect_meshes)`
    pub fn label(&self) -> String {
        format!("{}({})", self.kind.type_name(), self.name)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("warning", &self.warning)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("inputs", &self.inputs)
            .finish_non_exhaustive()
    }
}

/// Render an item as a node name: strings unquoted, everything else as JSON
pub(crate) fn item_name(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pipeline_config_continues_on_error() {
        let config = ProcessConfig::pipeline();
        assert!(config.continue_on_error);
        assert!(!config.raise_exception);
        assert!(!ProcessConfig::default().continue_on_error);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: ProcessConfig = serde_json::from_str(r#"{"warning": true}"#).unwrap();
        assert!(config.warning);
        assert!(!config.continue_on_error);
    }

    #[test]
    fn test_label_and_item_name() {
        let node = Node::new(NodeId::new(1), "hello", NodeKind::Data, NodeRole::Literal);
        assert_eq!(node.label(), "DataNode(hello)");
        assert_eq!(item_name(&json!("Hello")), "Hello");
        assert_eq!(item_name(&json!(3)), "3");
    }
}
