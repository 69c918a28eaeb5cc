//! Bound operations for process nodes
//!
//! An operation is a function of explicit arguments. It receives the call
//! arguments plus the values of the node's dataflow inputs, and an
//! [`EvalContext`] through which it may pull other nodes. There is no
//! implicit context: anything an operation reads arrives through these two
//! parameters.
//!
//! # Example
//!
//! ```ignore
//! use datafix_engine::operation;
//!
//! let double = operation::pure(|inputs| {
//!     let x = inputs.require_f64("x")?;
//!     Ok(serde_json::json!(x * 2.0))
//! });
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::discovery::EvalContext;
use crate::error::{EngineError, Result};
use crate::types::DEFAULT_ATTR;

/// A unit of work bound to a process node
///
/// Collector operations return a JSON array whose items become data nodes.
/// Validator operations receive one item as their first argument and either
/// return normally (pass) or return an error (fail).
pub trait Operation: Send + Sync {
    fn run(&self, ctx: &mut EvalContext<'_>, inputs: &OperationInputs) -> Result<Value>;
}

/// Arguments and input values handed to an operation
#[derive(Debug, Clone, Default)]
pub struct OperationInputs {
    /// Positional arguments given to `evaluate`
    pub args: Vec<Value>,
    /// Values of connected input nodes, keyed by input attribute
    pub inputs: HashMap<String, Value>,
}

impl OperationInputs {
    /// Inputs made of positional arguments only
    pub fn from_args(args: Vec<Value>) -> Self {
        Self {
            args,
            inputs: HashMap::new(),
        }
    }

    /// Positional argument by index
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// The item a validator or action runs on (first argument)
    pub fn item(&self) -> Result<&Value> {
        self.args
            .first()
            .ok_or_else(|| EngineError::failed("Missing item argument"))
    }

    /// Input value by attribute name
    pub fn input(&self, name: &str) -> Option<&Value> {
        self.inputs.get(name)
    }

    /// Value connected on the default attribute
    pub fn default_input(&self) -> Option<&Value> {
        self.inputs.get(DEFAULT_ATTR)
    }

    /// Input value by attribute name, failing when it is not connected
    pub fn require(&self, name: &str) -> Result<&Value> {
        self.inputs
            .get(name)
            .ok_or_else(|| EngineError::failed(format!("Missing required input: {}", name)))
    }

    /// Numeric input by attribute name
    pub fn require_f64(&self, name: &str) -> Result<f64> {
        let value = self.require(name)?;
        value.as_f64().ok_or_else(|| {
            EngineError::failed(format!("Input '{}' is not a number: {}", name, value))
        })
    }

    /// String input by attribute name
    pub fn require_str(&self, name: &str) -> Result<&str> {
        let value = self.require(name)?;
        value.as_str().ok_or_else(|| {
            EngineError::failed(format!("Input '{}' is not a string: {}", name, value))
        })
    }
}

/// Operation backed by a closure that can pull other nodes
pub struct CallbackOperation {
    callback: Box<dyn Fn(&mut EvalContext<'_>, &OperationInputs) -> Result<Value> + Send + Sync>,
}

impl Operation for CallbackOperation {
    fn run(&self, ctx: &mut EvalContext<'_>, inputs: &OperationInputs) -> Result<Value> {
        (self.callback)(ctx, inputs)
    }
}

/// Operation backed by a closure over its inputs only
pub struct PureOperation {
    callback: Box<dyn Fn(&OperationInputs) -> Result<Value> + Send + Sync>,
}

impl Operation for PureOperation {
    fn run(&self, _ctx: &mut EvalContext<'_>, inputs: &OperationInputs) -> Result<Value> {
        (self.callback)(inputs)
    }
}

/// Wrap a closure that receives the evaluation context
pub fn callback<F>(f: F) -> Arc<dyn Operation>
where
    F: Fn(&mut EvalContext<'_>, &OperationInputs) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(CallbackOperation {
        callback: Box::new(f),
    })
}

/// Wrap a closure that only reads its inputs
pub fn pure<F>(f: F) -> Arc<dyn Operation>
where
    F: Fn(&OperationInputs) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(PureOperation {
        callback: Box::new(f),
    })
}

/// Operation that returns a fixed value
pub fn constant(value: Value) -> Arc<dyn Operation> {
    pure(move |_| Ok(value.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_require_reports_missing_input() {
        let inputs = OperationInputs::default();
        let err = inputs.require("x").unwrap_err();
        assert_eq!(err.to_string(), "Operation error: Missing required input: x");
    }

    #[test]
    fn test_typed_accessors() {
        let mut inputs = OperationInputs::from_args(vec![json!("item")]);
        inputs.inputs.insert("n".to_string(), json!(2.5));
        inputs.inputs.insert("s".to_string(), json!("text"));

        assert_eq!(inputs.item().unwrap(), &json!("item"));
        assert_eq!(inputs.require_f64("n").unwrap(), 2.5);
        assert_eq!(inputs.require_str("s").unwrap(), "text");
        assert!(inputs.require_f64("s").is_err());
    }
}
