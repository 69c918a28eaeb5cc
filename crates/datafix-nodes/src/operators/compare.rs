//! Compare Operator
//!
//! Compares the values connected on inputs `a` and `b` and returns a
//! boolean.

use std::cmp::Ordering;

use datafix_engine::{
    operation, required_setting, Describe, EngineError, NodeDescriptor, NodeTemplate, Result,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Comparison applied by [`Compare`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// `a` is an element of list `b`, a substring of string `b`, or a key of object `b`
    In,
    NotIn,
}

impl CompareOp {
    pub fn apply(&self, a: &Value, b: &Value) -> Result<bool> {
        match self {
            CompareOp::Eq => Ok(a == b),
            CompareOp::Ne => Ok(a != b),
            CompareOp::Lt => Ok(order(a, b)? == Ordering::Less),
            CompareOp::Le => Ok(order(a, b)? != Ordering::Greater),
            CompareOp::Gt => Ok(order(a, b)? == Ordering::Greater),
            CompareOp::Ge => Ok(order(a, b)? != Ordering::Less),
            CompareOp::In => contains(b, a),
            CompareOp::NotIn => contains(b, a).map(|found| !found),
        }
    }
}

fn order(a: &Value, b: &Value) -> Result<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            x.partial_cmp(&y)
                .ok_or_else(|| EngineError::failed(format!("cannot order {} and {}", x, y)))
        }
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        _ => Err(EngineError::failed(format!("cannot order {} and {}", a, b))),
    }
}

fn contains(container: &Value, needle: &Value) -> Result<bool> {
    match (container, needle) {
        (Value::Array(items), _) => Ok(items.contains(needle)),
        (Value::String(haystack), Value::String(n)) => Ok(haystack.contains(n.as_str())),
        (Value::Object(map), Value::String(key)) => Ok(map.contains_key(key)),
        _ => Err(EngineError::failed(format!(
            "cannot look for {} in {}",
            needle, container
        ))),
    }
}

/// Compare Operator
///
/// # Settings
/// - `op` (required) - One of `eq`, `ne`, `lt`, `le`, `gt`, `ge`, `in`, `not_in`
///
/// # Inputs
/// - `a`, `b` - Values to compare
pub struct Compare;

impl Compare {
    pub const SETTING_OP: &'static str = "op";
    pub const INPUT_A: &'static str = "a";
    pub const INPUT_B: &'static str = "b";

    pub fn build(settings: &Value) -> Result<NodeTemplate> {
        let op: CompareOp = required_setting(settings, Self::SETTING_OP)?;
        Ok(NodeTemplate::process(operation::pure(move |inputs| {
            let a = inputs.require(Self::INPUT_A)?;
            let b = inputs.require(Self::INPUT_B)?;
            Ok(json!(op.apply(a, b)?))
        })))
    }
}

impl Describe for Compare {
    fn descriptor() -> NodeDescriptor {
        NodeDescriptor::process("compare", "Compare", "Compares inputs a and b")
    }
}

inventory::submit!(datafix_engine::NodeRegistration {
    descriptor: Compare::descriptor,
    build: Compare::build,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::run_binary;

    #[test]
    fn test_ordering_ops() {
        assert!(CompareOp::Lt.apply(&json!(1), &json!(2.5)).unwrap());
        assert!(CompareOp::Le.apply(&json!(2), &json!(2)).unwrap());
        assert!(!CompareOp::Gt.apply(&json!("a"), &json!("b")).unwrap());
        assert!(CompareOp::Ge.apply(&json!("b"), &json!("a")).unwrap());
        assert!(CompareOp::Lt.apply(&json!(1), &json!("1")).is_err());
    }

    #[test]
    fn test_membership_ops() {
        assert!(CompareOp::In.apply(&json!(2), &json!([1, 2])).unwrap());
        assert!(CompareOp::In.apply(&json!("ell"), &json!("hello")).unwrap());
        assert!(CompareOp::In.apply(&json!("k"), &json!({"k": 1})).unwrap());
        assert!(CompareOp::NotIn.apply(&json!(3), &json!([1, 2])).unwrap());
        assert!(CompareOp::In.apply(&json!(1), &json!(1)).is_err());
    }

    #[test]
    fn test_compare_node() {
        let template = Compare::build(&json!({"op": "ne"})).unwrap();
        assert_eq!(run_binary(template, json!(1), json!(2)), Some(json!(true)));

        assert!(Compare::build(&json!({"op": "almost"})).is_err());
    }
}
