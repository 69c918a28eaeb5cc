//! Arithmetic Operator

use datafix_engine::{
    operation, required_setting, Describe, EngineError, NodeDescriptor, NodeTemplate, Result,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Arithmetic operation applied by [`Arithmetic`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    Add,
    Sub,
}

/// Arithmetic Operator
///
/// Integer inputs give an integer result; anything else is computed as a
/// float.
///
/// # Settings
/// - `op` (required) - `add` or `sub`
///
/// # Inputs
/// - `a`, `b` - Numbers
pub struct Arithmetic;

impl Arithmetic {
    pub const SETTING_OP: &'static str = "op";

    pub fn build(settings: &Value) -> Result<NodeTemplate> {
        let op: ArithmeticOp = required_setting(settings, Self::SETTING_OP)?;
        Ok(NodeTemplate::process(operation::pure(move |inputs| {
            let a = inputs.require("a")?;
            let b = inputs.require("b")?;
            if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
                let result = match op {
                    ArithmeticOp::Add => x.checked_add(y),
                    ArithmeticOp::Sub => x.checked_sub(y),
                };
                return result
                    .map(|r| json!(r))
                    .ok_or_else(|| EngineError::failed("integer overflow"));
            }
            let x = inputs.require_f64("a")?;
            let y = inputs.require_f64("b")?;
            let result = match op {
                ArithmeticOp::Add => x + y,
                ArithmeticOp::Sub => x - y,
            };
            Ok(json!(result))
        })))
    }
}

impl Describe for Arithmetic {
    fn descriptor() -> NodeDescriptor {
        NodeDescriptor::process("arithmetic", "Arithmetic", "Adds or subtracts inputs a and b")
    }
}

inventory::submit!(datafix_engine::NodeRegistration {
    descriptor: Arithmetic::descriptor,
    build: Arithmetic::build,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::run_binary;

    #[test]
    fn test_integer_and_float() {
        let add = || Arithmetic::build(&json!({"op": "add"})).unwrap();
        assert_eq!(run_binary(add(), json!(2), json!(3)), Some(json!(5)));
        assert_eq!(run_binary(add(), json!(0.5), json!(1)), Some(json!(1.5)));

        let sub = Arithmetic::build(&json!({"op": "sub"})).unwrap();
        assert_eq!(run_binary(sub, json!(2), json!(5)), Some(json!(-3)));
    }

    #[test]
    fn test_overflow_and_bad_input_fail() {
        let add = || Arithmetic::build(&json!({"op": "add"})).unwrap();
        assert_eq!(run_binary(add(), json!(i64::MAX), json!(1)), None);
        assert_eq!(run_binary(add(), json!("2"), json!(1)), None);
    }
}
