//! Validation sessions
//!
//! A session is the root container of a validation pipeline. Collectors and
//! validators are registered as its children, in order; running the session
//! evaluates them in that order and caches the rolled-up result into the
//! session node.
//!
//! # Example
//!
//! ```ignore
//! let mut session = Session::new("asset_check");
//! let meshes = session.add_collector("meshes", collect_meshes, Some("mesh".into()))?;
//! session.add_validator("no_ngons", check_ngons, Some("mesh".into()))?;
//! let state = session.run()?;
//! println!("{}", session.report(&ReportOptions::default())?);
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::engine::DemandEngine;
use crate::error::Result;
use crate::events::NodeEvent;
use crate::graph::NodeGraph;
use crate::node::ProcessConfig;
use crate::operation::Operation;
use crate::registry::NodeRegistry;
use crate::report::{report, ReportOptions};
use crate::state::NodeState;
use crate::types::{DataType, NodeId, NodeKind};

/// Root container of a validation pipeline
pub struct Session {
    engine: DemandEngine,
    root: NodeId,
    registry: NodeRegistry,
}

impl Session {
    /// Create a session with a fresh engine
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_engine(DemandEngine::new(), name)
    }

    /// Create a session over an existing engine
    pub fn with_engine(mut engine: DemandEngine, name: impl Into<String>) -> Self {
        let root = engine
            .graph_mut()
            .add_sequence(name, NodeKind::Session, ProcessConfig::pipeline());
        Self {
            engine,
            root,
            registry: NodeRegistry::new(),
        }
    }

    /// Use a registry for [`Session::add_from_registry`]
    pub fn with_registry(mut self, registry: NodeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// The session node
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn engine(&self) -> &DemandEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut DemandEngine {
        &mut self.engine
    }

    pub fn graph(&self) -> &NodeGraph {
        self.engine.graph()
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Register a collector with pipeline defaults
    pub fn add_collector(
        &mut self,
        name: impl Into<String>,
        operation: Arc<dyn Operation>,
        data_type: Option<DataType>,
    ) -> Result<NodeId> {
        self.add_collector_with(name, operation, data_type, ProcessConfig::pipeline())
    }

    pub fn add_collector_with(
        &mut self,
        name: impl Into<String>,
        operation: Arc<dyn Operation>,
        data_type: Option<DataType>,
        config: ProcessConfig,
    ) -> Result<NodeId> {
        let id = self
            .engine
            .graph_mut()
            .add_collector(name, operation, data_type, config);
        self.adopt(id)
    }

    /// Register a validator with pipeline defaults
    ///
    /// Unless it is connected to collectors explicitly, it validates the
    /// items of every collector in the session.
    pub fn add_validator(
        &mut self,
        name: impl Into<String>,
        operation: Arc<dyn Operation>,
        required_type: Option<DataType>,
    ) -> Result<NodeId> {
        self.add_validator_with(name, operation, required_type, ProcessConfig::pipeline())
    }

    pub fn add_validator_with(
        &mut self,
        name: impl Into<String>,
        operation: Arc<dyn Operation>,
        required_type: Option<DataType>,
        config: ProcessConfig,
    ) -> Result<NodeId> {
        let id = self
            .engine
            .graph_mut()
            .add_validator(name, operation, required_type, config);
        self.adopt(id)
    }

    /// Register a node built by the session's registry
    ///
    /// The node is named after its type unless a name is given.
    pub fn add_from_registry(
        &mut self,
        node_type: &str,
        name: Option<&str>,
        settings: &Value,
    ) -> Result<NodeId> {
        let template = self.registry.build(node_type, settings)?;
        let id = template.insert(self.engine.graph_mut(), name.unwrap_or(node_type));
        self.adopt(id)
    }

    /// Attach an existing node as the last child of the session
    pub fn adopt(&mut self, id: NodeId) -> Result<NodeId> {
        self.engine.graph_mut().attach_child(self.root, id)?;
        Ok(id)
    }

    /// Run every child in registration order and return the session's state
    ///
    /// A session runs once; call [`Session::reset`] to run it again.
    pub fn run(&mut self) -> Result<NodeState> {
        let execution_id = self.engine.execution_id().to_string();
        log::info!(
            "Running session '{}' ({})",
            self.graph().node(self.root)?.name(),
            execution_id
        );
        self.engine.emit(NodeEvent::RunStarted {
            root: self.root,
            execution_id: execution_id.clone(),
        });

        let outcome = self.engine.evaluate(self.root, Vec::new());
        let state = self.graph().status(self.root)?;
        self.engine.emit(NodeEvent::RunCompleted {
            root: self.root,
            execution_id,
            state: state.as_str().to_string(),
        });
        outcome?;

        log::info!("Session finished: {}", state);
        Ok(state)
    }

    /// Displayed state of the session
    pub fn state(&self) -> Result<NodeState> {
        self.graph().status(self.root)
    }

    /// Return the session and every enabled child to `Init`
    ///
    /// Collected data nodes and recorded results are dropped.
    pub fn reset(&mut self) -> Result<()> {
        let children = self.graph().node(self.root)?.children().to_vec();
        let graph = self.engine.graph_mut();
        for child in children {
            if graph.node(child)?.stored_state() != NodeState::Disabled {
                graph.reset(child)?;
            }
        }
        graph.reset(self.root)
    }

    /// Validate one data node again with every validator that already checked it
    ///
    /// Returns the validators that were re-run with their new result state.
    pub fn revalidate(&mut self, data_node: NodeId) -> Result<Vec<(NodeId, NodeState)>> {
        let graph = self.graph();
        let mut validators = Vec::new();
        for result in graph.node(data_node)?.result_nodes() {
            if let Some(validator) = graph.node(*result)?.parent() {
                validators.push(validator);
            }
        }

        let mut outcomes = Vec::with_capacity(validators.len());
        for validator in validators {
            let state = self.engine.revalidate(validator, data_node)?;
            outcomes.push((validator, state));
        }
        Ok(outcomes)
    }

    /// Data nodes collected so far, in collector order
    pub fn data_nodes(&self) -> Result<Vec<NodeId>> {
        let graph = self.graph();
        let mut nodes = Vec::new();
        for child in graph.node(self.root)?.children() {
            let node = graph.node(*child)?;
            if node.is_collector() {
                nodes.extend(node.children().iter().copied());
            }
        }
        Ok(nodes)
    }

    /// Render the session tree as text
    pub fn report(&self, options: &ReportOptions) -> Result<String> {
        report(self.graph(), self.root, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::events::VecEventSink;
    use crate::integrity::check_graph;
    use crate::operation;
    use crate::registry::{NodeDescriptor, NodeTemplate};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn is_pass() -> Arc<dyn Operation> {
        operation::pure(|inputs| {
            if inputs.item()? == &json!("pass") {
                Ok(Value::Null)
            } else {
                Err(EngineError::failed("expected 'pass'"))
            }
        })
    }

    #[test]
    fn test_failed_collector_does_not_stop_siblings() {
        let mut session = Session::new("session");
        let broken = session
            .add_collector(
                "broken",
                operation::pure(|_| Err(EngineError::failed("scene not loaded"))),
                None,
            )
            .unwrap();
        let healthy = session
            .add_collector("healthy", operation::constant(json!(["pass"])), None)
            .unwrap();

        assert_eq!(session.run().unwrap(), NodeState::Failed);

        let graph = session.graph();
        assert_eq!(graph.status(broken).unwrap(), NodeState::Failed);
        assert!(graph.node(broken).unwrap().children().is_empty());
        assert_eq!(graph.status(healthy).unwrap(), NodeState::Succeeded);
        assert_eq!(graph.node(healthy).unwrap().children().len(), 1);
        assert!(check_graph(graph).is_empty());
    }

    #[test]
    fn test_failure_without_continue_aborts_remaining_children() {
        let mut session = Session::new("session");
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);
        session
            .add_collector_with(
                "critical",
                operation::pure(|_| Err(EngineError::failed("boom"))),
                None,
                ProcessConfig::default(),
            )
            .unwrap();
        let later = session
            .add_collector(
                "later",
                operation::pure(move |_| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok(json!([]))
                }),
                None,
            )
            .unwrap();

        assert_eq!(session.run().unwrap(), NodeState::Failed);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(session.graph().status(later).unwrap(), NodeState::Init);
        let root = session.graph().node(session.root()).unwrap();
        assert!(root.error().unwrap().contains("failed"));
    }

    #[test]
    fn test_session_runs_validators_over_sibling_collectors() {
        let sink = Arc::new(VecEventSink::new());
        let mut session = Session::with_engine(
            DemandEngine::new().with_event_sink(sink.clone()),
            "session",
        );
        session
            .add_collector("items", operation::constant(json!(["pass", "pass"])), None)
            .unwrap();
        let validator = session.add_validator("is_pass", is_pass(), None).unwrap();

        assert_eq!(session.run().unwrap(), NodeState::Succeeded);
        assert_eq!(session.graph().node(validator).unwrap().children().len(), 2);

        let events = sink.events();
        assert!(matches!(events.first(), Some(NodeEvent::RunStarted { .. })));
        match events.last() {
            Some(NodeEvent::RunCompleted { state, .. }) => assert_eq!(state, "succeeded"),
            other => panic!("Expected RunCompleted event, got {:?}", other),
        }
    }

    #[test]
    fn test_warning_validator_makes_session_warn() {
        let mut session = Session::new("session");
        session
            .add_collector("items", operation::constant(json!(["pass", "fail"])), None)
            .unwrap();
        session
            .add_validator_with(
                "is_pass",
                is_pass(),
                None,
                ProcessConfig::pipeline().with_warning(true),
            )
            .unwrap();

        assert_eq!(session.run().unwrap(), NodeState::Warning);
    }

    #[test]
    fn test_revalidate_one_item() {
        let mut session = Session::new("session");
        session
            .add_collector("items", operation::constant(json!(["A", "B"])), None)
            .unwrap();
        let validator = session.add_validator("is_pass", is_pass(), None).unwrap();
        assert_eq!(session.run().unwrap(), NodeState::Failed);

        let data = session.data_nodes().unwrap();
        let result_b = session.graph().node(data[1]).unwrap().result_nodes()[0];

        session.engine_mut().graph_mut().set_data(data[0], json!("pass")).unwrap();
        let outcomes = session.revalidate(data[0]).unwrap();
        assert_eq!(outcomes, vec![(validator, NodeState::Succeeded)]);

        let graph = session.graph();
        let result_a = graph.node(data[0]).unwrap().result_nodes()[0];
        assert_eq!(graph.status(result_a).unwrap(), NodeState::Succeeded);
        assert_eq!(graph.status(result_b).unwrap(), NodeState::Failed);
        assert_eq!(graph.status(data[0]).unwrap(), NodeState::Succeeded);
        assert_eq!(session.state().unwrap(), NodeState::Failed);

        // Fixing B as well clears the session
        session.engine_mut().graph_mut().set_data(data[1], json!("pass")).unwrap();
        session.revalidate(data[1]).unwrap();
        assert_eq!(session.state().unwrap(), NodeState::Succeeded);
        assert!(check_graph(session.graph()).is_empty());
    }

    #[test]
    fn test_disabled_validator_is_ignored() {
        let mut session = Session::new("session");
        session
            .add_collector("items", operation::constant(json!(["fail"])), None)
            .unwrap();
        let validator = session.add_validator("is_pass", is_pass(), None).unwrap();
        session.engine_mut().graph_mut().disable(validator).unwrap();

        assert_eq!(session.run().unwrap(), NodeState::Succeeded);
        assert!(session.graph().node(validator).unwrap().children().is_empty());
    }

    #[test]
    fn test_reset_allows_second_run() {
        let mut session = Session::new("session");
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);
        let collector = session
            .add_collector(
                "items",
                operation::pure(move |_| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok(json!(["x"]))
                }),
                None,
            )
            .unwrap();

        session.run().unwrap();
        session.run().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        session.reset().unwrap();
        assert_eq!(session.state().unwrap(), NodeState::Init);
        session.run().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(session.graph().node(collector).unwrap().children().len(), 1);
    }

    #[test]
    fn test_add_from_registry() {
        let mut registry = NodeRegistry::new();
        registry.register_fn(
            NodeDescriptor::collector("fixed", "Fixed", "Fixed items"),
            |settings| {
                Ok(NodeTemplate::collector(
                    operation::constant(settings.get("items").cloned().unwrap_or(json!([]))),
                    None,
                ))
            },
        );
        let mut session = Session::new("session").with_registry(registry);

        let id = session
            .add_from_registry("fixed", None, &json!({"items": [1, 2, 3]}))
            .unwrap();
        assert_eq!(session.graph().node(id).unwrap().name(), "fixed");
        assert!(matches!(
            session.add_from_registry("nope", Some("x"), &Value::Null),
            Err(EngineError::UnknownNodeType(_))
        ));

        session.run().unwrap();
        assert_eq!(session.data_nodes().unwrap().len(), 3);
    }

    #[test]
    fn test_report_lists_tree() {
        let mut session = Session::new("check");
        session
            .add_collector("items", operation::constant(json!(["pass"])), None)
            .unwrap();
        session.add_validator("is_pass", is_pass(), None).unwrap();
        session.run().unwrap();

        let text = session.report(&ReportOptions::default()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Session(check): succeeded");
        assert_eq!(lines[1], "  Collector(items): succeeded");
        assert_eq!(lines[2], "    DataNode(pass): succeeded");
        assert_eq!(lines[3], "  Validator(is_pass): succeeded");
        assert_eq!(lines[4], "    ResultNode(pass): succeeded");
    }
}
