//! Node lifecycle states
//!
//! Every node carries one stored state. `Warning` is never stored: it is
//! the display value of a `Failed` node whose owner marked it non-fatal.
//!
//! ```text
//! Init ──> Running ──> Succeeded
//!  │  │       │
//!  │  │       └──────> Failed ──> Running (explicit retry)
//!  │  └──────────────> Failed (dependency short-circuit)
//!  └──> Disabled (terminal)
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Not run yet
    Init,
    /// Skipped permanently, set by configuration
    Disabled,
    /// Mid-evaluation
    Running,
    /// Ran and succeeded
    Succeeded,
    /// Ran and failed
    Failed,
    /// Display value for a non-fatal failure, never stored
    Warning,
}

impl NodeState {
    /// Lowercase name used in reports and serialized records
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeState::Init => "init",
            NodeState::Disabled => "disabled",
            NodeState::Running => "running",
            NodeState::Succeeded => "succeeded",
            NodeState::Failed => "failed",
            NodeState::Warning => "warning",
        }
    }

    /// Whether evaluation of a node in this state has ended
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            NodeState::Succeeded | NodeState::Failed | NodeState::Warning
        )
    }

    /// Whether this state counts as a failure (fatal or not)
    pub fn is_failure(&self) -> bool {
        matches!(self, NodeState::Failed | NodeState::Warning)
    }

    /// Check a stored-state transition against the legal transition table
    pub fn can_transition_to(&self, to: NodeState) -> bool {
        use NodeState::*;
        matches!(
            (self, to),
            (Init, Running)
                | (Init, Disabled)
                | (Init, Failed)
                | (Running, Succeeded)
                | (Running, Failed)
                | (Failed, Running)
        )
    }

    /// Resolve the displayed state from a stored state and a warning flag
    pub fn display(stored: NodeState, warning: bool) -> NodeState {
        if stored == NodeState::Failed && warning {
            NodeState::Warning
        } else {
            stored
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unknown state name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStateError(pub String);

impl fmt::Display for ParseStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown node state '{}'", self.0)
    }
}

impl std::error::Error for ParseStateError {}

impl FromStr for NodeState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(NodeState::Init),
            "disabled" => Ok(NodeState::Disabled),
            "running" => Ok(NodeState::Running),
            "succeeded" => Ok(NodeState::Succeeded),
            "failed" => Ok(NodeState::Failed),
            "warning" => Ok(NodeState::Warning),
            other => Err(ParseStateError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        assert!(NodeState::Init.can_transition_to(NodeState::Running));
        assert!(NodeState::Init.can_transition_to(NodeState::Disabled));
        assert!(NodeState::Running.can_transition_to(NodeState::Succeeded));
        assert!(NodeState::Running.can_transition_to(NodeState::Failed));
        assert!(NodeState::Failed.can_transition_to(NodeState::Running));
    }

    #[test]
    fn test_disabled_is_terminal() {
        for to in [
            NodeState::Init,
            NodeState::Running,
            NodeState::Succeeded,
            NodeState::Failed,
        ] {
            assert!(!NodeState::Disabled.can_transition_to(to));
        }
    }

    #[test]
    fn test_warning_is_never_stored() {
        assert!(!NodeState::Running.can_transition_to(NodeState::Warning));
        assert!(!NodeState::Init.can_transition_to(NodeState::Warning));
    }

    #[test]
    fn test_display_warning() {
        assert_eq!(NodeState::display(NodeState::Failed, true), NodeState::Warning);
        assert_eq!(NodeState::display(NodeState::Failed, false), NodeState::Failed);
        assert_eq!(
            NodeState::display(NodeState::Succeeded, true),
            NodeState::Succeeded
        );
    }

    #[test]
    fn test_parse_roundtrip_names() {
        assert_eq!("warning".parse::<NodeState>().unwrap(), NodeState::Warning);
        assert_eq!(NodeState::Succeeded.to_string(), "succeeded");
        assert!("exploded".parse::<NodeState>().is_err());
    }
}
