//! Current Time Collector
//!
//! Collects a single item: the time at which the collector ran.

use std::sync::Arc;

use chrono::{Local, SecondsFormat, Utc};
use datafix_engine::{
    optional_setting, DataType, Describe, EvalContext, NodeDescriptor, NodeTemplate, Operation,
    OperationInputs, Result,
};
use serde_json::{json, Value};

/// Current Time Collector
///
/// # Settings
/// - `utc` (optional, default `false`) - Report UTC instead of local time
///
/// # Items
/// One RFC 3339 timestamp, tagged `time`.
#[derive(Debug, Clone, Default)]
pub struct CurrentTime {
    utc: bool,
}

impl CurrentTime {
    /// Setting key for UTC output
    pub const SETTING_UTC: &'static str = "utc";
    /// Data type of the collected item
    pub const DATA_TYPE: &'static str = "time";

    pub fn new(utc: bool) -> Self {
        Self { utc }
    }

    pub fn build(settings: &Value) -> Result<NodeTemplate> {
        let utc = optional_setting(settings, Self::SETTING_UTC)?.unwrap_or(false);
        Ok(NodeTemplate::collector(
            Arc::new(Self::new(utc)),
            Some(DataType::new(Self::DATA_TYPE)),
        ))
    }
}

impl Describe for CurrentTime {
    fn descriptor() -> NodeDescriptor {
        NodeDescriptor::collector(
            "current-time",
            "Current Time",
            "Collects the time at which the pipeline ran",
        )
        .with_data_type(Self::DATA_TYPE)
    }
}

inventory::submit!(datafix_engine::NodeRegistration {
    descriptor: CurrentTime::descriptor,
    build: CurrentTime::build,
});

impl Operation for CurrentTime {
    fn run(&self, _ctx: &mut EvalContext<'_>, _inputs: &OperationInputs) -> Result<Value> {
        let now = if self.utc {
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        } else {
            Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)
        };
        Ok(json!([now]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::run_collector;
    use chrono::DateTime;

    #[test]
    fn test_collects_one_timestamp() {
        let items = run_collector(CurrentTime::build(&json!({"utc": true})).unwrap()).unwrap();
        assert_eq!(items.len(), 1);
        let stamp = items[0].as_str().unwrap();
        assert!(stamp.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn test_descriptor() {
        let descriptor = CurrentTime::descriptor();
        assert_eq!(descriptor.node_type, "current-time");
        assert_eq!(descriptor.data_type, Some(DataType::new("time")));
    }
}
