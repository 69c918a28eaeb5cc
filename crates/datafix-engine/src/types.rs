//! Core identifier and link types
//!
//! These types identify nodes, name their role in a pipeline, and describe
//! the dataflow links between them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Attribute name used when a connection does not name one
pub const DEFAULT_ATTR: &str = "__default__";

/// Unique identifier for a node within a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Wrap a raw id
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric id
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The type of a node, used for reports and serialized records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Plain node holding a literal value
    Node,
    /// Callable unit with a bound operation
    Process,
    /// Process node whose result items become data nodes
    Collector,
    /// Process node that validates data nodes into result nodes
    Validator,
    /// Holds one collected item
    Data,
    /// One validator's outcome for one data node
    Result,
    /// Root container that runs its children in order
    Session,
    /// Process node run on demand against a target node
    Action,
}

impl NodeKind {
    /// Type name shown in reports
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Node => "Node",
            NodeKind::Process => "ProcessNode",
            NodeKind::Collector => "Collector",
            NodeKind::Validator => "Validator",
            NodeKind::Data => "DataNode",
            NodeKind::Result => "ResultNode",
            NodeKind::Session => "Session",
            NodeKind::Action => "Action",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Tag naming the type of collected data (e.g. "path", "string")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataType(String);

impl DataType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DataType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Consumer-side half of a dataflow edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputLink {
    /// Attribute on the consumer that receives the value
    pub in_attr: String,
    /// Node producing the value
    pub producer: NodeId,
    /// Attribute on the producer the value is read from
    pub out_attr: String,
}

/// Producer-side half of a dataflow edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLink {
    /// Node consuming the value
    pub consumer: NodeId,
    /// Attribute on the consumer that receives the value
    pub in_attr: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_serializes_as_number() {
        let json = serde_json::to_string(&NodeId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, NodeId::new(42));
    }

    #[test]
    fn test_kind_type_names() {
        assert_eq!(NodeKind::Data.type_name(), "DataNode");
        assert_eq!(NodeKind::Result.to_string(), "ResultNode");
        let json = serde_json::to_string(&NodeKind::Collector).unwrap();
        assert_eq!(json, "\"collector\"");
    }
}
