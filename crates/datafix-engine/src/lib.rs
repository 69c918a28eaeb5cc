//! Datafix Engine - node execution graph for validation pipelines
//!
//! This crate provides a demand-driven, lazy evaluation engine over a graph
//! of nodes. It supports:
//!
//! - A per-node state machine with non-fatal (`Warning`) failures
//! - Ownership trees and attribute-addressed dataflow edges, both acyclic
//! - Pull evaluation: a node runs at most once, after its inputs
//! - Discovery of dependencies an operation pulls at runtime
//! - Status rollup from children to parents
//! - Collect / validate pipelines with typed adapters and per-item results
//! - Flat JSON export and import of a graph
//!
//! # Architecture
//!
//! - `NodeGraph`: arena of nodes addressed by `NodeId`, owning every link
//! - `DemandEngine`: evaluates nodes on demand and caches their results
//! - `Session`: root container that runs collectors and validators in order
//! - `EventSink`: generic event streaming, independent of any transport
//!
//! # Example
//!
//! ```ignore
//! use datafix_engine::{operation, ReportOptions, Session};
//!
//! let mut session = Session::new("check");
//! session.add_collector("names", operation::constant(json!(["a", ""])), None)?;
//! session.add_validator("not_empty", not_empty, None)?;
//! session.run()?;
//! print!("{}", session.report(&ReportOptions::default())?);
//! ```

pub mod adapter;
pub mod builder;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod events;
pub mod graph;
pub mod integrity;
pub mod node;
pub mod operation;
pub mod registry;
pub mod report;
mod rollup;
pub mod serializer;
pub mod session;
pub mod state;
pub mod types;

// Re-export key types
pub use adapter::{adapter_fn, Adapter, AdapterMatch, AdapterRegistration, AdapterRegistry};
pub use builder::{BuiltGraph, GraphBuilder};
pub use discovery::EvalContext;
pub use engine::{DemandEngine, EngineStats};
pub use error::{EngineError, Result};
pub use events::{EventError, EventSink, LogEventSink, NodeEvent, NullEventSink, VecEventSink};
pub use graph::NodeGraph;
pub use integrity::{check_graph, IntegrityError};
pub use node::{Node, ProcessConfig, SourceBinding};
pub use operation::{Operation, OperationInputs};
pub use registry::{
    optional_setting, required_setting, Describe, NodeDescriptor, NodeFactory, NodeRegistration,
    NodeRegistry, NodeTemplate,
};
pub use report::{report, ReportOptions};
pub use serializer::{export_graph, import_graph, EdgeRecord, GraphDocument, NodeRecord};
pub use session::Session;
pub use state::NodeState;
pub use types::{DataType, NodeId, NodeKind, DEFAULT_ATTR};
