//! Node type registry for building nodes by type name
//!
//! This module maps node type strings (e.g. `"paths-in-folder"`) to a
//! descriptor and a factory. A factory turns JSON settings into a
//! [`NodeTemplate`], which is inserted into a graph under a chosen name.
//!
//! Node crates self-register at link time:
//!
//! ```ignore
//! inventory::submit!(datafix_engine::NodeRegistration {
//!     descriptor: PathsInFolder::descriptor,
//!     build: PathsInFolder::build,
//! });
//!
//! let registry = NodeRegistry::with_builtins();
//! let template = registry.build("paths-in-folder", &json!({"folder": "assets"}))?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EngineError, Result};
use crate::graph::NodeGraph;
use crate::node::ProcessConfig;
use crate::operation::Operation;
use crate::types::{DataType, NodeId, NodeKind};

/// Trait for node types that can describe themselves
pub trait Describe {
    /// Get the static descriptor for this node type
    fn descriptor() -> NodeDescriptor
    where
        Self: Sized;
}

/// Complete description of a registrable node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    /// Unique type identifier (e.g., "paths-in-folder")
    pub node_type: String,
    /// Kind of node the factory builds
    pub kind: NodeKind,
    /// Human-readable label
    pub label: String,
    /// Description of what the node does
    pub description: String,
    /// Data type of collected items (collectors)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    /// Item type the node expects (validators)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_type: Option<DataType>,
}

impl NodeDescriptor {
    fn new(
        node_type: impl Into<String>,
        kind: NodeKind,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            node_type: node_type.into(),
            kind,
            label: label.into(),
            description: description.into(),
            data_type: None,
            required_type: None,
        }
    }

    pub fn process(
        node_type: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(node_type, NodeKind::Process, label, description)
    }

    pub fn collector(
        node_type: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(node_type, NodeKind::Collector, label, description)
    }

    pub fn validator(
        node_type: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(node_type, NodeKind::Validator, label, description)
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(DataType::new(data_type));
        self
    }

    pub fn with_required_type(mut self, required_type: impl Into<String>) -> Self {
        self.required_type = Some(DataType::new(required_type));
        self
    }
}

/// A node ready to be inserted into a graph
pub enum NodeTemplate {
    Process {
        operation: Arc<dyn Operation>,
        config: ProcessConfig,
    },
    Collector {
        operation: Arc<dyn Operation>,
        data_type: Option<DataType>,
        config: ProcessConfig,
    },
    Validator {
        operation: Arc<dyn Operation>,
        required_type: Option<DataType>,
        config: ProcessConfig,
    },
}

impl NodeTemplate {
    /// Collector template with pipeline defaults
    pub fn collector(operation: Arc<dyn Operation>, data_type: Option<DataType>) -> Self {
        Self::Collector {
            operation,
            data_type,
            config: ProcessConfig::pipeline(),
        }
    }

    /// Validator template with pipeline defaults
    pub fn validator(operation: Arc<dyn Operation>, required_type: Option<DataType>) -> Self {
        Self::Validator {
            operation,
            required_type,
            config: ProcessConfig::pipeline(),
        }
    }

    /// Plain process template with default configuration
    pub fn process(operation: Arc<dyn Operation>) -> Self {
        Self::Process {
            operation,
            config: ProcessConfig::default(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Process { .. } => NodeKind::Process,
            Self::Collector { .. } => NodeKind::Collector,
            Self::Validator { .. } => NodeKind::Validator,
        }
    }

    pub fn config_mut(&mut self) -> &mut ProcessConfig {
        match self {
            Self::Process { config, .. }
            | Self::Collector { config, .. }
            | Self::Validator { config, .. } => config,
        }
    }

    /// Insert the node into a graph under `name`
    pub fn insert(self, graph: &mut NodeGraph, name: impl Into<String>) -> NodeId {
        match self {
            Self::Process { operation, config } => graph.add_process(name, operation, config),
            Self::Collector {
                operation,
                data_type,
                config,
            } => graph.add_collector(name, operation, data_type, config),
            Self::Validator {
                operation,
                required_type,
                config,
            } => graph.add_validator(name, operation, required_type, config),
        }
    }
}

/// Builds a node template from JSON settings
pub type NodeFactory = Arc<dyn Fn(&Value) -> Result<NodeTemplate> + Send + Sync>;

/// Link-time registration of a node type
///
/// Submitted with `inventory::submit!` by crates that ship node types.
pub struct NodeRegistration {
    pub descriptor: fn() -> NodeDescriptor,
    pub build: fn(&Value) -> Result<NodeTemplate>,
}

inventory::collect!(NodeRegistration);

/// A registration entry combining a descriptor with an optional factory
struct RegistryEntry {
    descriptor: NodeDescriptor,
    factory: Option<NodeFactory>,
}

/// Registry of node types with their descriptors and factories
///
/// # Composability
///
/// Registries can be composed by merging:
/// ```ignore
/// let mut registry = NodeRegistry::with_builtins();
/// registry.merge(studio_registry); // Add host-specific nodes
/// ```
pub struct NodeRegistry {
    entries: HashMap<String, RegistryEntry>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registry holding every node type submitted through `inventory`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for registration in inventory::iter::<NodeRegistration> {
            let build = registration.build;
            registry.register((registration.descriptor)(), Arc::new(build));
        }
        registry
    }

    /// Register a node type with a descriptor and a factory
    pub fn register(&mut self, descriptor: NodeDescriptor, factory: NodeFactory) {
        log::debug!("Registering node type '{}'", descriptor.node_type);
        self.entries.insert(
            descriptor.node_type.clone(),
            RegistryEntry {
                descriptor,
                factory: Some(factory),
            },
        );
    }

    /// Register a node type whose factory is a closure
    pub fn register_fn<F>(&mut self, descriptor: NodeDescriptor, factory: F)
    where
        F: Fn(&Value) -> Result<NodeTemplate> + Send + Sync + 'static,
    {
        self.register(descriptor, Arc::new(factory));
    }

    /// Register a node type with a descriptor only (no factory)
    ///
    /// Used for listing node types that are built elsewhere.
    pub fn register_metadata(&mut self, descriptor: NodeDescriptor) {
        self.entries.insert(
            descriptor.node_type.clone(),
            RegistryEntry {
                descriptor,
                factory: None,
            },
        );
    }

    /// Get the descriptor of a node type
    pub fn get_descriptor(&self, node_type: &str) -> Option<&NodeDescriptor> {
        self.entries.get(node_type).map(|e| &e.descriptor)
    }

    /// All registered descriptors, sorted by node type
    pub fn all_descriptors(&self) -> Vec<&NodeDescriptor> {
        let mut all: Vec<&NodeDescriptor> = self.entries.values().map(|e| &e.descriptor).collect();
        all.sort_by(|a, b| a.node_type.cmp(&b.node_type));
        all
    }

    /// Descriptors grouped by node kind
    pub fn descriptors_by_kind(&self) -> HashMap<NodeKind, Vec<&NodeDescriptor>> {
        let mut grouped: HashMap<NodeKind, Vec<&NodeDescriptor>> = HashMap::new();
        for descriptor in self.all_descriptors() {
            grouped.entry(descriptor.kind).or_default().push(descriptor);
        }
        grouped
    }

    /// Check if a node type is registered
    pub fn has_node_type(&self, node_type: &str) -> bool {
        self.entries.contains_key(node_type)
    }

    /// List all registered node type strings, sorted
    pub fn node_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.entries.keys().map(|s| s.as_str()).collect();
        types.sort_unstable();
        types
    }

    /// Build a template for a node type from its settings
    pub fn build(&self, node_type: &str, settings: &Value) -> Result<NodeTemplate> {
        let entry = self
            .entries
            .get(node_type)
            .ok_or_else(|| EngineError::UnknownNodeType(node_type.to_string()))?;
        let factory = entry.factory.as_ref().ok_or_else(|| {
            EngineError::failed(format!("Node type '{}' has no factory", node_type))
        })?;
        factory(settings)
    }

    /// Merge another registry into this one
    ///
    /// Entries from `other` override entries in `self` if they share the same node_type.
    pub fn merge(&mut self, other: NodeRegistry) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a required setting from a node's JSON settings
pub fn required_setting<T: DeserializeOwned>(settings: &Value, key: &str) -> Result<T> {
    optional_setting(settings, key)?
        .ok_or_else(|| EngineError::failed(format!("Missing required setting '{}'", key)))
}

/// Read an optional setting; `null` counts as absent
pub fn optional_setting<T: DeserializeOwned>(settings: &Value, key: &str) -> Result<Option<T>> {
    match settings.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| EngineError::failed(format!("Invalid setting '{}': {}", key, e))),
    }
}
