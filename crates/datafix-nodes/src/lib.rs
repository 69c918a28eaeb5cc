//! Datafix Nodes
//!
//! Built-in node types and adapters for datafix validation pipelines.
//! Every type registers itself through `inventory`, so linking this crate is
//! enough for `NodeRegistry::with_builtins()` to find it.
//!
//! # Categories
//!
//! - **Collectors**: Nodes that gather items to validate
//! - **Validators**: Nodes that check one item at a time
//! - **Operators**: Nodes that compute a value from their inputs
//! - **Adapters**: Conversions between collected data types

pub mod adapters;
pub mod collectors;
pub mod operators;
pub mod setup;
pub mod validators;

// Re-export all nodes for convenience
pub use collectors::*;
pub use operators::*;
pub use setup::{builtin_adapters, builtin_engine, builtin_registry, builtin_session};
pub use validators::*;


#[cfg(test)]
mod tests {
    use super::*;
    use datafix_engine::{DataType, NodeKind, NodeState};
    use serde_json::{json, Value};

    #[test]
    fn test_inventory_collects_all_builtins() {
        let registry = builtin_registry();
        assert_eq!(registry.len(), 9, "Expected 9 built-in node types");

        let by_kind = registry.descriptors_by_kind();
        assert_eq!(by_kind[&NodeKind::Collector].len(), 3);
        assert_eq!(by_kind[&NodeKind::Validator].len(), 3);
        assert_eq!(by_kind[&NodeKind::Process].len(), 3);

        // Spot-check known types
        assert!(registry.has_node_type("paths-in-folder"));
        assert!(registry.has_node_type("path-is-file"));
        assert!(registry.has_node_type("compare"));
    }

    #[test]
    fn test_inventory_collects_all_adapters() {
        let adapters = builtin_adapters();
        assert_eq!(adapters.len(), 3);
        assert!(adapters
            .get(&DataType::new("string"), &DataType::new("int"))
            .is_some());
        assert!(adapters
            .get(&DataType::new("int"), &DataType::new("path"))
            .is_none());
    }

    #[test]
    fn test_session_adapts_strings_to_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "a").unwrap();

        let mut session = builtin_session("paths");
        session
            .add_from_registry(
                "literal-items",
                Some("names"),
                &json!({"items": [file.to_string_lossy()], "data_type": "string"}),
            )
            .unwrap();
        let validator = session
            .add_from_registry("path-is-file", None, &Value::Null)
            .unwrap();

        assert_eq!(session.run().unwrap(), NodeState::Succeeded);
        assert_eq!(session.graph().node(validator).unwrap().children().len(), 1);
    }
}
