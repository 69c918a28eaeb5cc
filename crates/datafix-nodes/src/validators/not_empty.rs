//! Not Empty Validator

use datafix_engine::{operation, Describe, EngineError, NodeDescriptor, NodeTemplate, Result};
use serde_json::Value;

/// Fails for `null`, empty strings, empty lists and empty objects
///
/// Accepts items of any type.
pub struct NotEmpty;

impl NotEmpty {
    pub fn build(_settings: &Value) -> Result<NodeTemplate> {
        Ok(NodeTemplate::validator(
            operation::pure(|inputs| {
                let item = inputs.item()?;
                if is_empty(item) {
                    Err(EngineError::failed(format!("item is empty: {}", item)))
                } else {
                    Ok(Value::Null)
                }
            }),
            None,
        ))
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

impl Describe for NotEmpty {
    fn descriptor() -> NodeDescriptor {
        NodeDescriptor::validator("not-empty", "Not Empty", "Checks that items are not empty")
    }
}

inventory::submit!(datafix_engine::NodeRegistration {
    descriptor: NotEmpty::descriptor,
    build: NotEmpty::build,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::validate_items;
    use datafix_engine::NodeState;
    use serde_json::json;

    #[test]
    fn test_empty_values_fail() {
        let states = validate_items(
            NotEmpty::build(&Value::Null).unwrap(),
            json!(["a", "  ", null, [], {}, 0, false]),
            Some("anything"),
        );
        use NodeState::*;
        assert_eq!(
            states,
            vec![Succeeded, Failed, Failed, Failed, Failed, Succeeded, Succeeded]
        );
    }
}
