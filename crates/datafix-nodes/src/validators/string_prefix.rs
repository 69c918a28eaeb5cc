//! String Prefix Validator
//!
//! Checks naming conventions: every item must start with a given prefix.

use datafix_engine::{
    operation, optional_setting, required_setting, DataType, Describe, EngineError,
    NodeDescriptor, NodeTemplate, Result,
};
use serde_json::Value;

/// String Prefix Validator
///
/// # Settings
/// - `prefix` (required) - Prefix every item must start with
/// - `case_sensitive` (optional, default `true`)
pub struct StringPrefix;

impl StringPrefix {
    /// Setting key for the prefix
    pub const SETTING_PREFIX: &'static str = "prefix";
    /// Setting key for case sensitivity
    pub const SETTING_CASE_SENSITIVE: &'static str = "case_sensitive";
    /// Data type the validator requires
    pub const REQUIRED_TYPE: &'static str = "string";

    pub fn build(settings: &Value) -> Result<NodeTemplate> {
        let prefix: String = required_setting(settings, Self::SETTING_PREFIX)?;
        let case_sensitive =
            optional_setting(settings, Self::SETTING_CASE_SENSITIVE)?.unwrap_or(true);

        Ok(NodeTemplate::validator(
            operation::pure(move |inputs| {
                let item = inputs.item()?;
                let text = item.as_str().ok_or_else(|| {
                    EngineError::failed(format!("expected a string, got {}", item))
                })?;
                let matches = if case_sensitive {
                    text.starts_with(&prefix)
                } else {
                    text.to_lowercase().starts_with(&prefix.to_lowercase())
                };
                if matches {
                    Ok(Value::Null)
                } else {
                    Err(EngineError::failed(format!(
                        "'{}' does not start with '{}'",
                        text, prefix
                    )))
                }
            }),
            Some(DataType::new(Self::REQUIRED_TYPE)),
        ))
    }
}

impl Describe for StringPrefix {
    fn descriptor() -> NodeDescriptor {
        NodeDescriptor::validator(
            "string-prefix",
            "String Prefix",
            "Checks that every item starts with a prefix",
        )
        .with_required_type(Self::REQUIRED_TYPE)
    }
}

inventory::submit!(datafix_engine::NodeRegistration {
    descriptor: StringPrefix::descriptor,
    build: StringPrefix::build,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::validate_items;
    use datafix_engine::NodeState;
    use serde_json::json;

    #[test]
    fn test_prefix() {
        let states = validate_items(
            StringPrefix::build(&json!({"prefix": "GEO_"})).unwrap(),
            json!(["GEO_body", "geo_arm", "body"]),
            Some("string"),
        );
        assert_eq!(
            states,
            vec![NodeState::Succeeded, NodeState::Failed, NodeState::Failed]
        );
    }

    #[test]
    fn test_case_insensitive() {
        let states = validate_items(
            StringPrefix::build(&json!({"prefix": "GEO_", "case_sensitive": false})).unwrap(),
            json!(["geo_arm"]),
            Some("string"),
        );
        assert_eq!(states, vec![NodeState::Succeeded]);
    }

    #[test]
    fn test_prefix_is_required() {
        assert!(StringPrefix::build(&json!({})).is_err());
    }
}
