//! Path Is File Validator
//!
//! Checks that a collected path points at an existing regular file.

use std::path::Path;

use datafix_engine::{
    operation, DataType, Describe, EngineError, NodeDescriptor, NodeTemplate, Result,
};
use serde_json::Value;

/// Path Is File Validator
///
/// Requires items of type `path`. Fails for paths that do not exist and for
/// directories.
pub struct PathIsFile;

impl PathIsFile {
    /// Data type the validator requires
    pub const REQUIRED_TYPE: &'static str = "path";

    pub fn build(_settings: &Value) -> Result<NodeTemplate> {
        Ok(NodeTemplate::validator(
            operation::pure(|inputs| {
                let item = inputs.item()?;
                let path = item.as_str().ok_or_else(|| {
                    EngineError::failed(format!("expected a path, got {}", item))
                })?;
                if Path::new(path).is_file() {
                    Ok(Value::Null)
                } else {
                    Err(EngineError::failed(format!("{} is not a file", path)))
                }
            }),
            Some(DataType::new(Self::REQUIRED_TYPE)),
        ))
    }
}

impl Describe for PathIsFile {
    fn descriptor() -> NodeDescriptor {
        NodeDescriptor::validator("path-is-file", "Path Is File", "Checks that a path is a file")
            .with_required_type(Self::REQUIRED_TYPE)
    }
}

inventory::submit!(datafix_engine::NodeRegistration {
    descriptor: PathIsFile::descriptor,
    build: PathIsFile::build,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::validate_items;
    use datafix_engine::NodeState;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_files_pass_and_folders_fail() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("scene.blend");
        std::fs::write(&file, "").unwrap();
        let missing = dir.path().join("missing.blend");

        let states = validate_items(
            PathIsFile::build(&Value::Null).unwrap(),
            json!([
                file.to_string_lossy(),
                dir.path().to_string_lossy(),
                missing.to_string_lossy()
            ]),
            Some("path"),
        );
        assert_eq!(
            states,
            vec![NodeState::Succeeded, NodeState::Failed, NodeState::Failed]
        );
    }

    #[test]
    fn test_untyped_items_are_not_validated() {
        let states = validate_items(
            PathIsFile::build(&Value::Null).unwrap(),
            json!(["/tmp"]),
            None,
        );
        assert!(states.is_empty());
    }
}
