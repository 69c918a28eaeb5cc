//! Error types for the datafix engine

use thiserror::Error;

use crate::state::NodeState;
use crate::types::NodeId;

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while building or evaluating a node graph
#[derive(Debug, Error)]
pub enum EngineError {
    /// Raised from inside an operation body
    #[error("Operation error: {0}")]
    Failed(String),

    /// An operation error attributed to the node that raised it
    #[error("Operation on node {node} failed: {message}")]
    Operation { node: NodeId, message: String },

    /// A dependency ended in `Failed` and the consumer does not continue on error
    #[error("Dependency {dependency} of node {node} failed")]
    DependencyFailed { node: NodeId, dependency: NodeId },

    /// An edge would create a cycle or break the single-parent invariant
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    /// Rollup requested before all children finished
    #[error("Rollup of node {node} requested before all children finished ({pending} pending)")]
    Aggregation { node: NodeId, pending: usize },

    /// A state change outside the legal transition table
    #[error("Invalid state transition on node {node}: {from} -> {to}")]
    InvalidTransition {
        node: NodeId,
        from: NodeState,
        to: NodeState,
    },

    /// Node id is not in the graph
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// The node exists but does not play the role the operation needs
    #[error("Node {node} is not a {expected}")]
    WrongRole { node: NodeId, expected: &'static str },

    /// No registration for the requested node type
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// Adapter failed to convert a collected item
    #[error("Adapter error: {0}")]
    Adapter(String),

    /// Evaluation was cancelled through the cancel token
    #[error("Evaluation cancelled")]
    Cancelled,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Create an operation error with a message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Create an invalid connection error with a message
    pub fn invalid_connection(msg: impl Into<String>) -> Self {
        Self::InvalidConnection(msg.into())
    }

    /// Attribute this error to a node, keeping structural errors as they are
    pub(crate) fn on_node(self, node: NodeId) -> Self {
        match self {
            Self::Failed(message) => Self::Operation { node, message },
            Self::Adapter(message) => Self::Operation { node, message },
            other => other,
        }
    }

    /// Errors that always reach the caller, whatever `raise_exception` says
    pub(crate) fn always_raised(&self) -> bool {
        matches!(
            self,
            Self::InvalidConnection(_) | Self::Aggregation { .. } | Self::Cancelled
        )
    }

    /// The message recorded on a node when this error fails it
    pub(crate) fn node_message(&self) -> String {
        match self {
            Self::Failed(message) | Self::Adapter(message) => message.clone(),
            Self::Operation { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
