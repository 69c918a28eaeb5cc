//! Event types for streaming evaluation progress
//!
//! Events are sent from the engine to any observer (a CLI, a log, a test)
//! to report node state changes as evaluation proceeds. Sending is
//! best-effort: a failing sink never changes the outcome of a run.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::types::NodeId;

/// Trait for receiving evaluation events
///
/// This abstracts over the transport mechanism (channel, log, collector)
/// so the engine can be observed in different contexts.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be delivered (e.g., channel closed)
    fn send(&self, event: NodeEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

impl EventError {
    pub fn channel_closed() -> Self {
        Self {
            message: "Channel closed".to_string(),
        }
    }
}

/// Events emitted while a graph is evaluated
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeEvent {
    /// A session run started
    #[serde(rename_all = "camelCase")]
    RunStarted { root: NodeId, execution_id: String },

    /// A session run finished with the given rolled-up state
    #[serde(rename_all = "camelCase")]
    RunCompleted {
        root: NodeId,
        execution_id: String,
        state: String,
    },

    /// A node moved to `Running`
    #[serde(rename_all = "camelCase")]
    NodeStarted { node: NodeId, execution_id: String },

    /// A node's operation returned normally
    #[serde(rename_all = "camelCase")]
    NodeSucceeded { node: NodeId, execution_id: String },

    /// A node's operation raised an error
    #[serde(rename_all = "camelCase")]
    NodeFailed {
        node: NodeId,
        execution_id: String,
        error: String,
        warning: bool,
    },

    /// A disabled node was skipped
    #[serde(rename_all = "camelCase")]
    NodeSkipped { node: NodeId, execution_id: String },

    /// A node was failed without running because a dependency failed
    #[serde(rename_all = "camelCase")]
    DependencyFailed {
        node: NodeId,
        dependency: NodeId,
        execution_id: String,
    },

    /// An operation pulled a node that is not one of its declared inputs
    #[serde(rename_all = "camelCase")]
    RuntimeLinkDiscovered {
        from: NodeId,
        to: NodeId,
        execution_id: String,
    },

    /// A collector produced its data nodes
    #[serde(rename_all = "camelCase")]
    DataCollected {
        collector: NodeId,
        execution_id: String,
        count: usize,
    },

    /// A validator recorded the outcome for one data node
    #[serde(rename_all = "camelCase")]
    ResultRecorded {
        validator: NodeId,
        data_node: NodeId,
        result: NodeId,
        execution_id: String,
        state: String,
    },
}

impl NodeEvent {
    /// Node the event is about
    pub fn node(&self) -> NodeId {
        match self {
            Self::RunStarted { root, .. } | Self::RunCompleted { root, .. } => *root,
            Self::NodeStarted { node, .. }
            | Self::NodeSucceeded { node, .. }
            | Self::NodeFailed { node, .. }
            | Self::NodeSkipped { node, .. }
            | Self::DependencyFailed { node, .. } => *node,
            Self::RuntimeLinkDiscovered { from, .. } => *from,
            Self::DataCollected { collector, .. } => *collector,
            Self::ResultRecorded { validator, .. } => *validator,
        }
    }
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: NodeEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// Event sink that forwards every event to the `log` facade at debug level
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn send(&self, event: NodeEvent) -> Result<(), EventError> {
        log::debug!("{:?}", event);
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: Mutex<Vec<NodeEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<NodeEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: NodeEvent) -> Result<(), EventError> {
        let mut events = self.events.lock().map_err(|_| EventError {
            message: "Event buffer poisoned".to_string(),
        })?;
        events.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_event_sink() {
        let sink = VecEventSink::new();

        sink.send(NodeEvent::NodeFailed {
            node: NodeId::new(3),
            execution_id: "exec1".to_string(),
            error: "boom".to_string(),
            warning: true,
        })
        .unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);

        match &events[0] {
            NodeEvent::NodeFailed { node, warning, .. } => {
                assert_eq!(*node, NodeId::new(3));
                assert!(*warning);
            }
            _ => panic!("Expected NodeFailed event"),
        }

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = NodeEvent::DataCollected {
            collector: NodeId::new(2),
            execution_id: "exec".to_string(),
            count: 4,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "dataCollected");
        assert_eq!(json["executionId"], "exec");
        assert_eq!(json["count"], 4);
        assert_eq!(event.node(), NodeId::new(2));
    }

    #[test]
    fn test_null_event_sink() {
        let sink = NullEventSink;
        sink.send(NodeEvent::NodeSkipped {
            node: NodeId::new(1),
            execution_id: "exec".to_string(),
        })
        .unwrap();
    }
}
