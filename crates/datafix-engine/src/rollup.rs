//! Status rollup over the ownership tree
//!
//! `rollup` is a pure query: a node without children reports its own
//! status, a node with children reports a status derived only from them.
//! `store_rollup` additionally writes that status into the node, which is
//! how validators and sessions cache their outcome once their children
//! have finished.

use crate::error::{EngineError, Result};
use crate::graph::NodeGraph;
use crate::state::NodeState;
use crate::types::NodeId;

impl NodeGraph {
    /// Status of a node derived from its children
    ///
    /// - no children (or only disabled ones): the node's own status
    /// - any child `Failed`: `Failed`
    /// - else any child `Warning`: `Warning`
    /// - else all children `Succeeded`: `Succeeded`
    /// - anything else (a child not finished): `Aggregation` error
    ///
    /// Data nodes always report their derived status. A container's own
    /// stored state never overrides what its children roll up to.
    pub fn rollup(&self, id: NodeId) -> Result<NodeState> {
        let node = self.node(id)?;
        if !node.result_nodes().is_empty() || node.children().is_empty() {
            return self.status(id);
        }

        let mut states = Vec::with_capacity(node.children().len());
        for child in node.children() {
            let state = self.rollup(*child)?;
            if state != NodeState::Disabled {
                states.push(state);
            }
        }
        if states.is_empty() {
            return self.status(id);
        }

        if states.contains(&NodeState::Failed) {
            return Ok(NodeState::Failed);
        }
        if states.contains(&NodeState::Warning) {
            return Ok(NodeState::Warning);
        }
        let pending = states
            .iter()
            .filter(|s| **s != NodeState::Succeeded)
            .count();
        if pending > 0 {
            return Err(EngineError::Aggregation { node: id, pending });
        }
        Ok(NodeState::Succeeded)
    }

    /// Compute the rollup and cache it as the node's stored state
    ///
    /// A `Warning` rollup is stored as `Failed` with the warning flag set; a
    /// `Failed` rollup clears the flag so the failure is shown as such.
    pub fn store_rollup(&mut self, id: NodeId) -> Result<NodeState> {
        let rolled = self.rollup(id)?;
        let warning = self.node(id)?.warning();
        match rolled {
            NodeState::Warning => self.set_state_unchecked(id, NodeState::Failed, true)?,
            NodeState::Failed => self.set_state_unchecked(id, NodeState::Failed, false)?,
            other => self.set_state_unchecked(id, other, warning)?,
        }
        log::debug!("Rolled up {} to {}", id, rolled);
        Ok(rolled)
    }
}
