//! Operator nodes
//!
//! Plain process nodes that combine the values connected on their `a` and
//! `b` inputs.

mod arithmetic;
mod compare;
mod logic;

pub use arithmetic::{Arithmetic, ArithmeticOp};
pub use compare::{Compare, CompareOp};
pub use logic::{Logic, LogicOp};
