//! Demand-driven lazy evaluation engine
//!
//! Evaluation is pull-based: asking for a node's value evaluates, in
//! declaration order, whichever of its inputs have not run yet, then runs
//! the node's own operation once and caches the result in the node.
//!
//! # Key Concepts
//!
//! - **Run once**: a `Succeeded` node returns its cached value; a `Failed`
//!   node stays failed until it is reset
//! - **Short-circuit**: a failed input fails the consumer without running it,
//!   unless the consumer continues on error
//! - **Validation**: collectors turn their items into data nodes, validators
//!   record one result node per data node and roll the outcome up
//! - **Discovery**: nodes pulled from inside an operation are recorded as
//!   runtime links (see [`crate::discovery`])

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};

use crate::adapter::{AdapterMatch, AdapterRegistry};
use crate::discovery::{EvalContext, EvalStack};
use crate::error::{EngineError, Result};
use crate::events::{EventSink, NodeEvent, NullEventSink};
use crate::graph::NodeGraph;
use crate::node::{Behavior, NodeRole, ProcessConfig, ProcessSpec, SourceBinding};
use crate::operation::{Operation, OperationInputs};
use crate::state::NodeState;
use crate::types::{NodeId, NodeKind, DEFAULT_ATTR};

/// Demand-driven evaluation engine owning a node graph
pub struct DemandEngine {
    graph: NodeGraph,
    adapters: AdapterRegistry,
    stack: EvalStack,
    event_sink: Arc<dyn EventSink>,
    /// Execution ID for events
    execution_id: String,
    cancel: Arc<AtomicBool>,
    stats: EngineStats,
}

impl DemandEngine {
    /// Create an engine over an empty graph
    pub fn new() -> Self {
        Self::with_graph(NodeGraph::new())
    }

    /// Create an engine over an existing graph
    pub fn with_graph(graph: NodeGraph) -> Self {
        Self {
            graph,
            adapters: AdapterRegistry::new(),
            stack: EvalStack::default(),
            event_sink: Arc::new(NullEventSink),
            execution_id: uuid::Uuid::new_v4().to_string(),
            cancel: Arc::new(AtomicBool::new(false)),
            stats: EngineStats::default(),
        }
    }

    pub fn with_adapters(mut self, adapters: AdapterRegistry) -> Self {
        self.adapters = adapters;
        self
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    pub fn with_execution_id(mut self, execution_id: impl Into<String>) -> Self {
        self.execution_id = execution_id.into();
        self
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut NodeGraph {
        &mut self.graph
    }

    pub fn into_graph(self) -> NodeGraph {
        self.graph
    }

    pub fn adapters(&self) -> &AdapterRegistry {
        &self.adapters
    }

    pub fn adapters_mut(&mut self) -> &mut AdapterRegistry {
        &mut self.adapters
    }

    /// Get the execution ID
    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    /// Counters accumulated since the engine was created
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Shared flag that aborts evaluation with `Cancelled` once set
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Re-arm the engine after a cancellation
    pub fn clear_cancel(&self) {
        self.cancel.store(false, Ordering::SeqCst);
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.load(Ordering::SeqCst) {
            return Err(EngineError::Cancelled);
        }
        Ok(())
    }

    /// Send an event, logging (not propagating) sink failures
    pub(crate) fn emit(&self, event: NodeEvent) {
        if let Err(e) = self.event_sink.send(event) {
            log::debug!("Dropped event: {}", e);
        }
    }

    // ---------------------------------------------------------------------
    // Evaluation
    // ---------------------------------------------------------------------

    /// Evaluate a node and return its value
    ///
    /// Literal, data and result nodes return their held value. Process nodes
    /// run at most once; `Ok(None)` means the node is disabled or failed
    /// (its error is recorded on the node). Errors are returned only when
    /// the node raises exceptions, on cancellation, or for structural errors
    /// such as a runtime cycle.
    pub fn evaluate(&mut self, id: NodeId, args: Vec<Value>) -> Result<Option<Value>> {
        self.note_caller(id)?;
        let node = self.graph.node(id)?;
        if node.is_process() {
            self.evaluate_process(id, args)
        } else if node.is_sequence() {
            self.evaluate_sequence(id)
        } else {
            Ok(Some(node.data().clone()))
        }
    }

    /// Record a runtime link between the active node and `id`
    fn note_caller(&mut self, id: NodeId) -> Result<()> {
        if let Some(caller) = self.stack.caller_of(&self.graph, id) {
            if self.graph.link_runtime(caller, id)? {
                self.stats.runtime_links += 1;
                log::debug!("Discovered runtime link {} -> {}", caller, id);
                self.emit(NodeEvent::RuntimeLinkDiscovered {
                    from: caller,
                    to: id,
                    execution_id: self.execution_id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Common entry checks; returns `Some(result)` when the node must not run
    fn cached_outcome(&mut self, id: NodeId) -> Result<Option<Option<Value>>> {
        let node = self.graph.node(id)?;
        match node.stored_state() {
            NodeState::Disabled => {
                log::debug!("Skipping disabled node {}", node.label());
                self.stats.skipped += 1;
                self.emit(NodeEvent::NodeSkipped {
                    node: id,
                    execution_id: self.execution_id.clone(),
                });
                Ok(Some(None))
            }
            NodeState::Succeeded => {
                let data = node.data().clone();
                self.stats.cache_hits += 1;
                Ok(Some(Some(data)))
            }
            NodeState::Failed | NodeState::Warning => Ok(Some(None)),
            NodeState::Running => Err(EngineError::invalid_connection(format!(
                "node {} was pulled while it is evaluating",
                id
            ))),
            NodeState::Init if self.stack.contains(id) => Err(EngineError::invalid_connection(
                format!("node {} was pulled while its inputs are evaluating", id),
            )),
            NodeState::Init => Ok(None),
        }
    }

    fn evaluate_process(&mut self, id: NodeId, args: Vec<Value>) -> Result<Option<Value>> {
        if let Some(outcome) = self.cached_outcome(id)? {
            return Ok(outcome);
        }
        self.check_cancelled()?;

        self.stack.push(id);
        let result = self.run_process(id, args);
        self.stack.pop();
        result
    }

    fn run_process(&mut self, id: NodeId, args: Vec<Value>) -> Result<Option<Value>> {
        let config = self.config_of(id)?;

        for dependency in self.graph.input_nodes(id)? {
            let dep = self.graph.node(dependency)?;
            if (dep.is_process() || dep.is_sequence()) && dep.stored_state() == NodeState::Init {
                self.check_cancelled()?;
                self.evaluate(dependency, Vec::new())?;
            }
            if self.graph.node(dependency)?.stored_state() == NodeState::Failed
                && !config.continue_on_error
            {
                return self.short_circuit(id, dependency, config);
            }
        }

        let inputs = self.gather_inputs(id, args)?;
        self.graph.transition(id, NodeState::Running)?;
        log::debug!(
            "Evaluating {} (depth {})",
            self.graph.node(id)?.label(),
            self.stack.depth()
        );
        self.emit(NodeEvent::NodeStarted {
            node: id,
            execution_id: self.execution_id.clone(),
        });

        match self.run_behavior(id, &inputs, config) {
            Ok(value) => self.finish_success(id, value),
            Err(err) => self.finish_failure(id, err, config),
        }
    }

    /// Fail `id` without running it because `dependency` failed
    fn short_circuit(
        &mut self,
        id: NodeId,
        dependency: NodeId,
        config: ProcessConfig,
    ) -> Result<Option<Value>> {
        self.graph.transition(id, NodeState::Failed)?;
        let node = self.graph.node_mut(id)?;
        node.error = Some(format!("dependency {} failed", dependency));
        let (label, warning) = (node.label(), node.warning());
        if warning {
            log::warn!("{} skipped: dependency {} failed", label, dependency);
        } else {
            log::error!("{} skipped: dependency {} failed", label, dependency);
        }
        self.stats.failures += 1;
        self.emit(NodeEvent::DependencyFailed {
            node: id,
            dependency,
            execution_id: self.execution_id.clone(),
        });

        if config.raise_exception {
            return Err(EngineError::DependencyFailed {
                node: id,
                dependency,
            });
        }
        Ok(None)
    }

    /// Values of the node's connected inputs, keyed by input attribute
    ///
    /// Inputs whose producer is disabled or did not succeed are omitted.
    fn gather_inputs(&self, id: NodeId, args: Vec<Value>) -> Result<OperationInputs> {
        let mut inputs = OperationInputs::from_args(args);
        for link in self.graph.node(id)?.input_links() {
            let producer = self.graph.node(link.producer)?;
            let available = if producer.is_process() || producer.is_sequence() {
                producer.stored_state() == NodeState::Succeeded
            } else {
                producer.stored_state() != NodeState::Disabled
            };
            if available {
                inputs
                    .inputs
                    .insert(link.in_attr.clone(), select_attr(producer.data(), &link.out_attr));
            }
        }
        Ok(inputs)
    }

    fn run_behavior(
        &mut self,
        id: NodeId,
        inputs: &OperationInputs,
        config: ProcessConfig,
    ) -> Result<Value> {
        let node = self.graph.node(id)?;
        let (validates, collects) = (node.is_validator(), node.is_collector());
        let operation = self.operation_of(id)?;
        if validates {
            self.run_validator(id, config)
        } else if collects {
            let value = self.run_operation(id, &operation, inputs)?;
            self.collect_items(id, &value)?;
            Ok(value)
        } else {
            self.run_operation(id, &operation, inputs)
        }
    }

    fn run_operation(
        &mut self,
        id: NodeId,
        operation: &Arc<dyn Operation>,
        inputs: &OperationInputs,
    ) -> Result<Value> {
        self.stats.operations_run += 1;
        let mut ctx = EvalContext::new(self, id);
        operation.run(&mut ctx, inputs)
    }

    fn finish_success(&mut self, id: NodeId, value: Value) -> Result<Option<Value>> {
        let node = self.graph.node_mut(id)?;
        node.data = value;
        node.error = None;
        self.graph.transition(id, NodeState::Succeeded)?;
        self.emit(NodeEvent::NodeSucceeded {
            node: id,
            execution_id: self.execution_id.clone(),
        });

        if self.graph.node(id)?.is_validator() {
            self.graph.store_rollup(id)?;
        }
        let node = self.graph.node(id)?;
        log::debug!("{} finished: {}", node.label(), self.graph.status(id)?);
        Ok((node.stored_state() == NodeState::Succeeded).then(|| node.data().clone()))
    }

    fn finish_failure(
        &mut self,
        id: NodeId,
        err: EngineError,
        config: ProcessConfig,
    ) -> Result<Option<Value>> {
        let message = err.node_message();
        self.graph.node_mut(id)?.error = Some(message.clone());
        self.graph.transition(id, NodeState::Failed)?;
        self.stats.failures += 1;

        let node = self.graph.node(id)?;
        let warning = node.warning();
        if warning {
            log::warn!("{} failed: {}", node.label(), message);
        } else {
            log::error!("{} failed: {}", node.label(), message);
        }
        self.emit(NodeEvent::NodeFailed {
            node: id,
            execution_id: self.execution_id.clone(),
            error: message,
            warning,
        });

        if config.raise_exception || err.always_raised() {
            return Err(err.on_node(id));
        }
        Ok(None)
    }

    fn config_of(&self, id: NodeId) -> Result<ProcessConfig> {
        Ok(self.graph.node(id)?.config().copied().unwrap_or_default())
    }

    fn operation_of(&self, id: NodeId) -> Result<Arc<dyn Operation>> {
        self.graph.node(id)?.operation().ok_or(EngineError::WrongRole {
            node: id,
            expected: "process node",
        })
    }

    // ---------------------------------------------------------------------
    // Containers
    // ---------------------------------------------------------------------

    fn evaluate_sequence(&mut self, id: NodeId) -> Result<Option<Value>> {
        if let Some(outcome) = self.cached_outcome(id)? {
            return Ok(outcome);
        }
        self.check_cancelled()?;
        self.plan(id)?;

        self.graph.transition(id, NodeState::Running)?;
        self.emit(NodeEvent::NodeStarted {
            node: id,
            execution_id: self.execution_id.clone(),
        });
        self.stack.push(id);
        let outcome = self.run_children(id);
        self.stack.pop();

        match outcome {
            Ok(None) => {
                self.graph.transition(id, NodeState::Succeeded)?;
                if let Err(err) = self.graph.store_rollup(id) {
                    self.fail_container(id, err.node_message())?;
                    return Err(err);
                }
            }
            Ok(Some(stopped_at)) => {
                self.fail_container(id, format!("child {} failed", stopped_at))?;
            }
            Err(err) => {
                self.fail_container(id, err.node_message())?;
                return Err(err);
            }
        }

        let node = self.graph.node(id)?;
        Ok((node.stored_state() == NodeState::Succeeded).then(|| node.data().clone()))
    }

    /// Evaluate children in order; returns the child that stopped the run, if any
    fn run_children(&mut self, id: NodeId) -> Result<Option<NodeId>> {
        let children = self.graph.node(id)?.children().to_vec();
        for child in children {
            self.check_cancelled()?;
            self.evaluate(child, Vec::new())?;

            let node = self.graph.node(child)?;
            let continues = node.config().map(|c| c.continue_on_error).unwrap_or(true);
            if node.stored_state() == NodeState::Failed && !continues {
                log::warn!("{} failed; skipping remaining children", node.label());
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    fn fail_container(&mut self, id: NodeId, message: String) -> Result<()> {
        let warning = self.graph.node(id)?.warning();
        self.graph.set_state_unchecked(id, NodeState::Failed, warning)?;
        self.graph.node_mut(id)?.error = Some(message.clone());
        self.emit(NodeEvent::NodeFailed {
            node: id,
            execution_id: self.execution_id.clone(),
            error: message,
            warning,
        });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Collectors and validators
    // ---------------------------------------------------------------------

    fn collect_items(&mut self, collector: NodeId, value: &Value) -> Result<usize> {
        let Value::Array(items) = value else {
            return Err(EngineError::failed(format!(
                "collector must return a list of items, got {}",
                value
            )));
        };
        for item in items {
            self.graph.add_data_node(collector, item.clone())?;
        }
        log::info!(
            "{} collected {} item(s)",
            self.graph.node(collector)?.label(),
            items.len()
        );
        self.emit(NodeEvent::DataCollected {
            collector,
            execution_id: self.execution_id.clone(),
            count: items.len(),
        });
        Ok(items.len())
    }

    /// Resolve the sources of every validator under `root`
    ///
    /// Returns the number of validators planned. Sources are resolved once
    /// and cached on the validator; planning an already planned validator
    /// re-resolves it.
    pub fn plan(&mut self, root: NodeId) -> Result<usize> {
        let mut planned = 0;
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let node = self.graph.node(current)?;
            stack.extend(node.children().iter().rev().copied());
            if node.is_validator() {
                self.resolve_sources(current)?;
                planned += 1;
            }
        }
        Ok(planned)
    }

    /// Resolve which collectors feed a validator and how their items are adapted
    ///
    /// Sources are the validator's declared producers that are collectors or,
    /// when it has none, the collectors among its siblings.
    pub fn resolve_sources(&mut self, validator: NodeId) -> Result<Vec<SourceBinding>> {
        let node = self.graph.node(validator)?;
        if !node.is_validator() {
            return Err(EngineError::WrongRole {
                node: validator,
                expected: "validator",
            });
        }
        let required = node.required_type().cloned();
        let is_collector = |id: &NodeId| self.graph.get(*id).is_some_and(|n| n.is_collector());

        let declared: Vec<NodeId> = self
            .graph
            .input_nodes(validator)?
            .into_iter()
            .filter(is_collector)
            .collect();
        let candidates = if !declared.is_empty() {
            declared
        } else if let Some(parent) = node.parent() {
            self.graph
                .node(parent)?
                .children()
                .iter()
                .copied()
                .filter(|c| *c != validator && is_collector(c))
                .collect()
        } else {
            Vec::new()
        };

        let mut bindings = Vec::with_capacity(candidates.len());
        for collector in candidates {
            let collector_node = self.graph.node(collector)?;
            let adapter = self
                .adapters
                .resolve(collector_node.data_type(), required.as_ref());
            if !adapter.is_compatible() {
                log::info!(
                    "{} cannot validate items of {}; source skipped",
                    self.graph.node(validator)?.label(),
                    collector_node.label()
                );
            }
            bindings.push(SourceBinding { collector, adapter });
        }

        if let NodeRole::Process(ProcessSpec {
            behavior: Behavior::Validator { sources, .. },
            ..
        }) = &mut self.graph.node_mut(validator)?.role
        {
            *sources = Some(bindings.clone());
        }
        Ok(bindings)
    }

    fn sources_of(&mut self, validator: NodeId) -> Result<Vec<SourceBinding>> {
        if let Some(Behavior::Validator {
            sources: Some(sources),
            ..
        }) = self.graph.node(validator)?.behavior()
        {
            return Ok(sources.clone());
        }
        self.resolve_sources(validator)
    }

    fn run_validator(&mut self, id: NodeId, config: ProcessConfig) -> Result<Value> {
        for source in self.sources_of(id)? {
            if !source.adapter.is_compatible() {
                continue;
            }
            if self.graph.node(source.collector)?.stored_state() == NodeState::Init {
                self.check_cancelled()?;
                self.evaluate(source.collector, Vec::new())?;
            }
            let collector = self.graph.node(source.collector)?;
            if collector.stored_state() != NodeState::Succeeded {
                log::debug!("{} has no items to validate", collector.label());
                continue;
            }

            let items: Vec<NodeId> = collector
                .children()
                .iter()
                .copied()
                .filter(|c| self.graph.get(*c).is_some_and(|n| n.kind() == NodeKind::Data))
                .collect();
            for data_node in items {
                self.check_cancelled()?;
                let (_, outcome) = self.validate_data_node(id, data_node, &source.adapter, None)?;
                if outcome == NodeState::Failed && !config.continue_on_error {
                    return Err(EngineError::failed(format!(
                        "validation of '{}' failed",
                        self.graph.node(data_node)?.name()
                    )));
                }
            }
        }
        self.validation_summary(id)
    }

    /// Run the validator's operation on one data node and record a result node
    ///
    /// The result is inserted among the validator's children at `index`, or
    /// appended.
    fn validate_data_node(
        &mut self,
        validator: NodeId,
        data_node: NodeId,
        adapter: &AdapterMatch,
        index: Option<usize>,
    ) -> Result<(NodeId, NodeState)> {
        let operation = self.operation_of(validator)?;
        let config = self.config_of(validator)?;
        let item = self.graph.node(data_node)?.data().clone();

        let outcome = match adapter.apply(&item) {
            Ok(adapted) => {
                self.run_operation(validator, &operation, &OperationInputs::from_args(vec![adapted]))
            }
            Err(err) => Err(err),
        };
        let (state, failure) = match outcome {
            Ok(_) => (NodeState::Succeeded, None),
            Err(err) if err.always_raised() => return Err(err),
            Err(err) => (NodeState::Failed, Some(err)),
        };

        let error = failure.as_ref().map(EngineError::node_message);
        let result = self.graph.add_result_node(
            validator,
            data_node,
            state,
            config.warning,
            error,
            index,
        )?;
        let shown = NodeState::display(state, config.warning);
        log::debug!(
            "{} -> {}: {}",
            self.graph.node(validator)?.label(),
            self.graph.node(data_node)?.name(),
            shown
        );
        self.emit(NodeEvent::ResultRecorded {
            validator,
            data_node,
            result,
            execution_id: self.execution_id.clone(),
            state: shown.as_str().to_string(),
        });

        match failure {
            Some(err) if config.raise_exception => Err(err.on_node(validator)),
            _ => Ok((result, state)),
        }
    }

    /// Summary stored as a validator's data: items validated and failed
    fn validation_summary(&self, validator: NodeId) -> Result<Value> {
        let mut validated = 0;
        let mut failed = 0;
        for child in self.graph.node(validator)?.children() {
            if self.graph.node(*child)?.kind() != NodeKind::Result {
                continue;
            }
            validated += 1;
            if self.graph.status(*child)?.is_failure() {
                failed += 1;
            }
        }
        Ok(json!({ "validated": validated, "failed": failed }))
    }

    /// Validate one data node again without re-running its collector
    ///
    /// The previous result of this validator for the data node is replaced in
    /// place. The validator's state is rolled up again, as are the states of
    /// the containers above it. Returns the new result's stored state.
    ///
    /// Only a validator that has finished a run can revalidate; a disabled or
    /// never-run validator is refused with `InvalidTransition`.
    pub fn revalidate(&mut self, validator: NodeId, data_node: NodeId) -> Result<NodeState> {
        let validator_node = self.graph.node(validator)?;
        if !validator_node.is_validator() {
            return Err(EngineError::WrongRole {
                node: validator,
                expected: "validator",
            });
        }
        let stored = validator_node.stored_state();
        if !stored.is_finished() {
            return Err(EngineError::InvalidTransition {
                node: validator,
                from: stored,
                to: NodeState::Running,
            });
        }
        let data = self.graph.node(data_node)?;
        if data.kind() != NodeKind::Data {
            return Err(EngineError::WrongRole {
                node: data_node,
                expected: "data node",
            });
        }
        let collector = data.parent();
        let previous = data
            .result_nodes()
            .iter()
            .copied()
            .find(|r| self.graph.get(*r).and_then(|n| n.parent()) == Some(validator));
        let index = previous.and_then(|r| {
            self.graph
                .get(validator)
                .and_then(|v| v.children().iter().position(|c| *c == r))
        });

        let adapter = match self
            .sources_of(validator)?
            .into_iter()
            .find(|s| Some(s.collector) == collector)
        {
            Some(source) => source.adapter,
            None => {
                let produced = collector
                    .and_then(|c| self.graph.get(c))
                    .and_then(|n| n.data_type());
                let required = self.graph.node(validator)?.required_type();
                self.adapters.resolve(produced, required)
            }
        };
        if !adapter.is_compatible() {
            return Err(EngineError::Adapter(format!(
                "no adapter feeds {} to validator {}",
                data_node, validator
            )));
        }

        if let Some(previous) = previous {
            self.graph.remove_node(previous)?;
        }
        self.stack.push(validator);
        let outcome = self.validate_data_node(validator, data_node, &adapter, index);
        self.stack.pop();
        let (_, state) = outcome?;

        if self.graph.node(validator)?.stored_state().is_finished() {
            let summary = self.validation_summary(validator)?;
            self.graph.node_mut(validator)?.data = summary;
        }
        self.graph.store_rollup(validator)?;
        for ancestor in self.graph.ancestors(validator)? {
            if self.graph.node(ancestor)?.is_sequence() {
                if let Err(err) = self.graph.store_rollup(ancestor) {
                    log::debug!("Rollup of {} deferred: {}", ancestor, err);
                }
            }
        }
        Ok(state)
    }

    // ---------------------------------------------------------------------
    // Actions
    // ---------------------------------------------------------------------

    /// Attach an action to a target node
    pub fn add_action(
        &mut self,
        target: NodeId,
        name: impl Into<String>,
        operation: Arc<dyn Operation>,
        config: ProcessConfig,
    ) -> Result<NodeId> {
        self.graph.add_action(target, name, operation, config)
    }

    /// Run an action against its target's current data
    ///
    /// A previously finished action is reset first, so actions can be run
    /// any number of times.
    pub fn run_action(&mut self, action: NodeId) -> Result<Option<Value>> {
        let node = self.graph.node(action)?;
        let Some(target) = node.action_target() else {
            return Err(EngineError::WrongRole {
                node: action,
                expected: "action",
            });
        };
        if node.stored_state().is_finished() {
            self.graph.reset(action)?;
        }
        let data = self.graph.node(target)?.data().clone();
        self.evaluate(action, vec![data])
    }
}

impl Default for DemandEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a named field of a producer's value; the default attribute is the whole value
fn select_attr(data: &Value, out_attr: &str) -> Value {
    if out_attr == DEFAULT_ATTR {
        return data.clone();
    }
    data.get(out_attr).cloned().unwrap_or(Value::Null)
}

/// Statistics about the demand engine's work
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Operation invocations (one per validated item for validators)
    pub operations_run: usize,
    /// Evaluations answered from a `Succeeded` node's cache
    pub cache_hits: usize,
    /// Evaluations of disabled nodes
    pub skipped: usize,
    /// Nodes that ended `Failed`
    pub failures: usize,
    /// Runtime links discovered
    pub runtime_links: usize,
}
