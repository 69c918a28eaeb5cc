//! Literal Items Collector
//!
//! Collects a fixed list of items given in its settings. Useful for
//! pipelines whose inputs are known up front, and for testing validators.

use datafix_engine::{
    operation, optional_setting, required_setting, DataType, Describe, NodeDescriptor,
    NodeTemplate, Result,
};
use serde_json::Value;

/// Literal Items Collector
///
/// # Settings
/// - `items` (required) - Array of items to collect
/// - `data_type` (optional) - Data type tag of the items
pub struct LiteralItems;

impl LiteralItems {
    /// Setting key for the items
    pub const SETTING_ITEMS: &'static str = "items";
    /// Setting key for the data type tag
    pub const SETTING_DATA_TYPE: &'static str = "data_type";

    pub fn build(settings: &Value) -> Result<NodeTemplate> {
        let items: Vec<Value> = required_setting(settings, Self::SETTING_ITEMS)?;
        let data_type = optional_setting::<String>(settings, Self::SETTING_DATA_TYPE)?;
        Ok(NodeTemplate::collector(
            operation::constant(Value::Array(items)),
            data_type.map(DataType::new),
        ))
    }
}

impl Describe for LiteralItems {
    fn descriptor() -> NodeDescriptor {
        NodeDescriptor::collector(
            "literal-items",
            "Literal Items",
            "Collects a fixed list of items from its settings",
        )
    }
}

inventory::submit!(datafix_engine::NodeRegistration {
    descriptor: LiteralItems::descriptor,
    build: LiteralItems::build,
});
