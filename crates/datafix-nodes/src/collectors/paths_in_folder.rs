//! Paths In Folder Collector
//!
//! Lists the entries of a folder, one item per entry.

use std::path::PathBuf;
use std::sync::Arc;

use datafix_engine::{
    optional_setting, required_setting, DataType, Describe, EngineError, EvalContext,
    NodeDescriptor, NodeTemplate, Operation, OperationInputs, Result,
};
use serde_json::Value;

/// Paths In Folder Collector
///
/// # Settings
/// - `folder` (required) - Folder to list
/// - `extension` (optional) - Only keep entries with this extension
///
/// # Items
/// Entry paths as strings, sorted, tagged `path`.
#[derive(Debug, Clone)]
pub struct PathsInFolder {
    folder: PathBuf,
    extension: Option<String>,
}

impl PathsInFolder {
    /// Setting key for the folder to list
    pub const SETTING_FOLDER: &'static str = "folder";
    /// Setting key for the extension filter
    pub const SETTING_EXTENSION: &'static str = "extension";
    /// Data type of the collected items
    pub const DATA_TYPE: &'static str = "path";

    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            extension: None,
        }
    }

    /// Only collect entries with the given extension (without the dot)
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn build(settings: &Value) -> Result<NodeTemplate> {
        let folder: String = required_setting(settings, Self::SETTING_FOLDER)?;
        let mut collector = Self::new(folder);
        if let Some(extension) = optional_setting::<String>(settings, Self::SETTING_EXTENSION)? {
            collector = collector.with_extension(extension.trim_start_matches('.'));
        }
        Ok(NodeTemplate::collector(
            Arc::new(collector),
            Some(DataType::new(Self::DATA_TYPE)),
        ))
    }

    fn keeps(&self, path: &std::path::Path) -> bool {
        match &self.extension {
            Some(wanted) => path
                .extension()
                .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(wanted))
                .unwrap_or(false),
            None => true,
        }
    }
}

impl Describe for PathsInFolder {
    fn descriptor() -> NodeDescriptor {
        NodeDescriptor::collector(
            "paths-in-folder",
            "Paths In Folder",
            "Collects the paths of every entry in a folder",
        )
        .with_data_type(Self::DATA_TYPE)
    }
}

inventory::submit!(datafix_engine::NodeRegistration {
    descriptor: PathsInFolder::descriptor,
    build: PathsInFolder::build,
});

impl Operation for PathsInFolder {
    fn run(&self, _ctx: &mut EvalContext<'_>, _inputs: &OperationInputs) -> Result<Value> {
        if !self.folder.is_dir() {
            return Err(EngineError::failed(format!(
                "'{}' is not a folder",
                self.folder.display()
            )));
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.folder)? {
            let path = entry?.path();
            if self.keeps(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        log::debug!(
            "Listed {} path(s) in '{}'",
            paths.len(),
            self.folder.display()
        );

        Ok(Value::Array(
            paths
                .into_iter()
                .map(|p| Value::String(p.to_string_lossy().into_owned()))
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::run_collector;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_lists_sorted_entries() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let settings = json!({"folder": dir.path().to_string_lossy()});
        let items = run_collector(PathsInFolder::build(&settings).unwrap()).unwrap();
        let names: Vec<String> = items
            .iter()
            .map(|i| {
                PathBuf::from(i.as_str().unwrap())
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub"]);
    }

    #[test]
    fn test_extension_filter() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("mesh.OBJ"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        let settings = json!({"folder": dir.path().to_string_lossy(), "extension": ".obj"});
        let items = run_collector(PathsInFolder::build(&settings).unwrap()).unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].as_str().unwrap().ends_with("mesh.OBJ"));
    }

    #[test]
    fn test_missing_folder_fails() {
        let dir = tempdir().unwrap();
        let settings = json!({"folder": dir.path().join("nope").to_string_lossy()});
        let err = run_collector(PathsInFolder::build(&settings).unwrap()).unwrap_err();
        assert!(err.contains("is not a folder"));
    }

    #[test]
    fn test_folder_setting_is_required() {
        assert!(PathsInFolder::build(&json!({})).is_err());
    }
}
