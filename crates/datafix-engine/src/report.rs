//! Plain-text report of an ownership tree
//!
//! One line per node, `{TypeName}({name}): {state}`, indented two spaces per
//! level. Containers show their rolled-up state; a container whose children
//! have not finished shows its own state instead.

use std::fmt::Write as _;

use crate::error::Result;
use crate::graph::NodeGraph;
use crate::state::NodeState;
use crate::types::NodeId;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Rendering options for [`report`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Color states with ANSI escapes
    pub color: bool,
}

impl ReportOptions {
    pub fn colored() -> Self {
        Self { color: true }
    }
}

/// Render `root` and everything it owns
pub fn report(graph: &NodeGraph, root: NodeId, options: &ReportOptions) -> Result<String> {
    let mut out = String::new();
    let mut stack = vec![(root, 0usize)];
    while let Some((id, depth)) = stack.pop() {
        let node = graph.node(id)?;
        let state = graph.rollup(id).or_else(|_| graph.status(id))?;
        let _ = writeln!(
            out,
            "{}{}: {}",
            "  ".repeat(depth),
            node.label(),
            paint(state, options)
        );
        for child in node.children().iter().rev() {
            stack.push((*child, depth + 1));
        }
    }
    Ok(out)
}

fn paint(state: NodeState, options: &ReportOptions) -> String {
    if !options.color {
        return state.to_string();
    }
    let color = match state {
        NodeState::Succeeded => GREEN,
        NodeState::Failed => RED,
        NodeState::Warning => YELLOW,
        _ => return state.to_string(),
    };
    format!("{}{}{}", color, state, RESET)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ProcessConfig;
    use crate::types::NodeKind;
    use serde_json::json;

    #[test]
    fn test_report_indents_children() {
        let mut graph = NodeGraph::new();
        let root = graph.add_sequence("root", NodeKind::Session, ProcessConfig::pipeline());
        let a = graph.add_literal("a", json!(1));
        let b = graph.add_literal("b", json!(2));
        graph.attach_child(root, a).unwrap();
        graph.attach_child(a, b).unwrap();

        let text = report(&graph, root, &ReportOptions::default()).unwrap();
        assert_eq!(text, "Session(root): init\n  Node(a): init\n    Node(b): init\n");
    }

    #[test]
    fn test_report_colors_states() {
        let mut graph = NodeGraph::new();
        let root = graph.add_sequence("root", NodeKind::Session, ProcessConfig::pipeline());
        graph.set_state_unchecked(root, NodeState::Failed, true).unwrap();

        let plain = report(&graph, root, &ReportOptions::default()).unwrap();
        assert_eq!(plain, "Session(root): warning\n");

        let colored = report(&graph, root, &ReportOptions::colored()).unwrap();
        assert_eq!(colored, format!("Session(root): {}warning{}\n", YELLOW, RESET));
    }
}
