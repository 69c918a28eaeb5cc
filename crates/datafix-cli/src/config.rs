//! Pipeline configuration
//!
//! A pipeline is described by a JSON document listing the collectors and
//! validators to run, by registered node type:
//!
//! ```json
//! {
//!   "name": "textures",
//!   "collectors": [{"type": "paths-in-folder", "settings": {"folder": "assets"}}],
//!   "validators": [{"type": "path-is-file", "warning": true}]
//! }
//! ```

use std::path::Path;

use datafix_engine::{EngineError, NodeKind, Session};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A validation pipeline loaded from disk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Session name shown in the report
    pub name: String,
    /// Collectors, run in order
    pub collectors: Vec<NodeConfig>,
    /// Validators, run in order after every collector
    pub validators: Vec<NodeConfig>,
    /// Color the report
    pub color: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "pipeline".to_string(),
            collectors: Vec::new(),
            validators: Vec::new(),
            color: true,
        }
    }
}

/// One node of a pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Registered node type (e.g. "paths-in-folder")
    #[serde(rename = "type")]
    pub node_type: String,
    /// Node name; defaults to the node type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Settings passed to the node type's factory
    #[serde(default)]
    pub settings: Value,
    /// Override of the node's continue-on-error policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continue_on_error: Option<bool>,
    /// Report failures of this node as warnings
    #[serde(default)]
    pub warning: bool,
    /// Skip this node
    #[serde(default)]
    pub disabled: bool,
}

impl PipelineConfig {
    /// Load a pipeline from a JSON file
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents).map_err(CliError::Parse)?;
        log::debug!(
            "Loaded pipeline '{}' from {:?} ({} collector(s), {} validator(s))",
            config.name,
            path,
            config.collectors.len(),
            config.validators.len()
        );
        Ok(config)
    }

    /// Build a session holding every configured node
    pub fn build_session(&self) -> Result<Session, CliError> {
        let mut session = datafix_nodes::builtin_session(self.name.clone());
        for node in &self.collectors {
            add_node(&mut session, node, NodeKind::Collector)?;
        }
        for node in &self.validators {
            add_node(&mut session, node, NodeKind::Validator)?;
        }
        Ok(session)
    }
}

fn add_node(session: &mut Session, node: &NodeConfig, expected: NodeKind) -> Result<(), CliError> {
    let mut template = session.registry().build(&node.node_type, &node.settings)?;
    if template.kind() != expected {
        return Err(CliError::Config(format!(
            "'{}' is a {}, not a {}",
            node.node_type,
            template.kind(),
            expected
        )));
    }

    let config = template.config_mut();
    if let Some(continue_on_error) = node.continue_on_error {
        config.continue_on_error = continue_on_error;
    }
    config.warning = node.warning;

    let name = node.name.as_deref().unwrap_or(&node.node_type);
    let id = template.insert(session.engine_mut().graph_mut(), name);
    session.adopt(id)?;
    if node.disabled {
        session.engine_mut().graph_mut().disable(id)?;
    }
    Ok(())
}

/// Command line errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse pipeline: {0}")]
    Parse(serde_json::Error),
    #[error("Failed to serialize: {0}")]
    Serialize(serde_json::Error),
    #[error("Invalid pipeline: {0}")]
    Config(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafix_engine::NodeState;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_applies_defaults() {
        let file = write_config(r#"{"collectors": [{"type": "current-time"}]}"#);
        let config = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(config.name, "pipeline");
        assert!(config.color);
        assert!(config.validators.is_empty());
        let node = &config.collectors[0];
        assert_eq!(node.node_type, "current-time");
        assert!(node.continue_on_error.is_none());
        assert!(!node.warning && !node.disabled);
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let file = write_config("{not json");
        assert!(matches!(
            PipelineConfig::load(file.path()),
            Err(CliError::Parse(_))
        ));
    }

    #[test]
    fn test_build_and_run_session() {
        let file = write_config(
            r#"{
                "name": "names",
                "collectors": [
                    {"type": "literal-items", "name": "names",
                     "settings": {"items": ["GEO_a", "b"], "data_type": "string"}}
                ],
                "validators": [
                    {"type": "string-prefix", "settings": {"prefix": "GEO_"}, "warning": true},
                    {"type": "not-empty", "disabled": true}
                ]
            }"#,
        );
        let config = PipelineConfig::load(file.path()).unwrap();
        let mut session = config.build_session().unwrap();
        assert_eq!(session.run().unwrap(), NodeState::Warning);

        let graph = session.graph();
        let prefix = graph.find_by_name("string-prefix").unwrap();
        assert_eq!(graph.node(prefix).unwrap().children().len(), 2);
        let not_empty = graph.find_by_name("not-empty").unwrap();
        assert_eq!(graph.status(not_empty).unwrap(), NodeState::Disabled);
    }

    #[test]
    fn test_wrong_section_is_rejected() {
        let config = PipelineConfig {
            collectors: vec![NodeConfig {
                node_type: "not-empty".to_string(),
                name: None,
                settings: Value::Null,
                continue_on_error: None,
                warning: false,
                disabled: false,
            }],
            ..PipelineConfig::default()
        };
        assert!(matches!(config.build_session(), Err(CliError::Config(_))));
    }
}
