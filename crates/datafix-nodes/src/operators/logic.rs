//! Logic Operator

use datafix_engine::{
    operation, required_setting, Describe, EngineError, NodeDescriptor, NodeTemplate,
    OperationInputs, Result,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Boolean operation applied by [`Logic`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicOp {
    And,
    Or,
    /// Negates `a`; `b` is ignored
    Not,
}

/// Logic Operator
///
/// # Settings
/// - `op` (required) - One of `and`, `or`, `not`
///
/// # Inputs
/// - `a` - Boolean
/// - `b` - Boolean (not used by `not`)
pub struct Logic;

impl Logic {
    pub const SETTING_OP: &'static str = "op";

    pub fn build(settings: &Value) -> Result<NodeTemplate> {
        let op: LogicOp = required_setting(settings, Self::SETTING_OP)?;
        Ok(NodeTemplate::process(operation::pure(move |inputs| {
            let a = require_bool(inputs, "a")?;
            let result = match op {
                LogicOp::And => a && require_bool(inputs, "b")?,
                LogicOp::Or => a || require_bool(inputs, "b")?,
                LogicOp::Not => !a,
            };
            Ok(json!(result))
        })))
    }
}

fn require_bool(inputs: &OperationInputs, name: &str) -> Result<bool> {
    let value = inputs.require(name)?;
    value.as_bool().ok_or_else(|| {
        EngineError::failed(format!("Input '{}' is not a boolean: {}", name, value))
    })
}

impl Describe for Logic {
    fn descriptor() -> NodeDescriptor {
        NodeDescriptor::process("logic", "Logic", "Combines boolean inputs with and, or, not")
    }
}

inventory::submit!(datafix_engine::NodeRegistration {
    descriptor: Logic::descriptor,
    build: Logic::build,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::run_binary;

    #[test]
    fn test_logic_ops() {
        let and = || Logic::build(&json!({"op": "and"})).unwrap();
        assert_eq!(run_binary(and(), json!(true), json!(true)), Some(json!(true)));
        assert_eq!(run_binary(and(), json!(true), json!(false)), Some(json!(false)));

        let or = Logic::build(&json!({"op": "or"})).unwrap();
        assert_eq!(run_binary(or, json!(false), json!(true)), Some(json!(true)));

        let not = Logic::build(&json!({"op": "not"})).unwrap();
        assert_eq!(run_binary(not, json!(true), Value::Null), Some(json!(false)));
    }

    #[test]
    fn test_non_boolean_input_fails() {
        let and = Logic::build(&json!({"op": "and"})).unwrap();
        assert_eq!(run_binary(and, json!(1), json!(true)), None);
    }
}
