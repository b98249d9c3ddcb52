//! dynexpr_evaluator: Interpreter for parsed expression trees.
//!
//! Walks a typed tree produced by `dynexpr_parser` and computes its value.
//! The tree is already type-checked, so the interpreter only fails on
//! runtime conditions: null receivers, overflow in checked conversions,
//! out-of-range indexes, empty sequences, and errors raised by host members.

mod builtins;
pub mod convert;
pub mod error;
mod interpreter;
pub mod operators;

pub use convert::convert;
pub use error::{EvalError, EvalResult};
pub use interpreter::{evaluate, evaluate_expr, order_by, Interpreter};
