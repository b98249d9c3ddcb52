//! Arithmetic, comparison and unary operators on values.
//!
//! Operands arrive already promoted to a common type. A null operand makes
//! an arithmetic result null. Equality treats two nulls as equal; ordering
//! comparisons involving null are false. Integer arithmetic wraps, and
//! integer division by zero fails. Decimal arithmetic is checked.

use crate::error::{EvalError, EvalResult};
use chrono::{Duration, NaiveDateTime};
use dynexpr_ast::{BinaryOp, UnaryOp};
use dynexpr_types::value::{max_date_time, min_date_time};
use dynexpr_types::{Decimal, Value};
use std::cmp::Ordering;

fn mismatch(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    EvalError::Unsupported(format!(
        "operator '{}' on {} and {}",
        op.symbol(),
        left.type_of(),
        right.type_of()
    ))
}

macro_rules! integer_op {
    ($op:expr, $a:expr, $b:expr, $variant:ident) => {{
        let (a, b) = ($a, $b);
        match $op {
            BinaryOp::Add => Value::$variant(a.wrapping_add(b)),
            BinaryOp::Subtract => Value::$variant(a.wrapping_sub(b)),
            BinaryOp::Multiply => Value::$variant(a.wrapping_mul(b)),
            BinaryOp::Divide if b == 0 => return Err(EvalError::DivideByZero),
            BinaryOp::Divide => Value::$variant(a.checked_div(b).ok_or(EvalError::Overflow)?),
            BinaryOp::Modulo if b == 0 => return Err(EvalError::DivideByZero),
            BinaryOp::Modulo => Value::$variant(a.checked_rem(b).unwrap_or(0)),
            _ => return Err(EvalError::Unsupported(format!("operator '{}'", $op.symbol()))),
        }
    }};
}

macro_rules! float_op {
    ($op:expr, $a:expr, $b:expr, $variant:ident) => {{
        let (a, b) = ($a, $b);
        match $op {
            BinaryOp::Add => Value::$variant(a + b),
            BinaryOp::Subtract => Value::$variant(a - b),
            BinaryOp::Multiply => Value::$variant(a * b),
            BinaryOp::Divide => Value::$variant(a / b),
            BinaryOp::Modulo => Value::$variant(a % b),
            _ => return Err(EvalError::Unsupported(format!("operator '{}'", $op.symbol()))),
        }
    }};
}

fn decimal_op(op: BinaryOp, a: Decimal, b: Decimal) -> EvalResult<Value> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Subtract => a.checked_sub(b),
        BinaryOp::Multiply => a.checked_mul(b),
        BinaryOp::Divide | BinaryOp::Modulo if b.is_zero() => return Err(EvalError::DivideByZero),
        BinaryOp::Divide => a.checked_div(b),
        BinaryOp::Modulo => a.checked_rem(b),
        _ => return Err(EvalError::Unsupported(format!("operator '{}'", op.symbol()))),
    };
    result.map(Value::Decimal).ok_or(EvalError::Overflow)
}

/// A date result, or an overflow when it falls outside the representable
/// range.
pub(crate) fn checked_date(value: Option<NaiveDateTime>) -> EvalResult<Value> {
    match (value, min_date_time(), max_date_time()) {
        (Some(dt), Some(min), Some(max)) if dt >= min && dt <= max => Ok(Value::DateTime(dt)),
        _ => Err(EvalError::Overflow),
    }
}

/// `+ - * / %` on promoted operands.
pub fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> EvalResult<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    Ok(match (left, right) {
        (Value::Int32(a), Value::Int32(b)) => integer_op!(op, *a, *b, Int32),
        (Value::UInt32(a), Value::UInt32(b)) => integer_op!(op, *a, *b, UInt32),
        (Value::Int64(a), Value::Int64(b)) => integer_op!(op, *a, *b, Int64),
        (Value::UInt64(a), Value::UInt64(b)) => integer_op!(op, *a, *b, UInt64),
        (Value::Single(a), Value::Single(b)) => float_op!(op, *a, *b, Single),
        (Value::Double(a), Value::Double(b)) => float_op!(op, *a, *b, Double),
        (Value::Decimal(a), Value::Decimal(b)) => decimal_op(op, *a, *b)?,
        (Value::DateTime(a), Value::TimeSpan(b)) => match op {
            BinaryOp::Add => checked_date(a.checked_add_signed(*b))?,
            BinaryOp::Subtract => checked_date(a.checked_sub_signed(*b))?,
            _ => return Err(mismatch(op, left, right)),
        },
        (Value::DateTime(a), Value::DateTime(b)) if op == BinaryOp::Subtract => {
            Value::TimeSpan(a.signed_duration_since(*b))
        }
        (Value::TimeSpan(a), Value::TimeSpan(b)) => match op {
            BinaryOp::Add => Value::TimeSpan(a.checked_add(b).ok_or(EvalError::Overflow)?),
            BinaryOp::Subtract => Value::TimeSpan(a.checked_sub(b).ok_or(EvalError::Overflow)?),
            _ => return Err(mismatch(op, left, right)),
        },
        _ => return Err(mismatch(op, left, right)),
    })
}

/// `== != < <= > >=` on promoted operands.
pub fn compare(op: BinaryOp, left: &Value, right: &Value) -> EvalResult<Value> {
    let result = match op {
        BinaryOp::Equal => left == right,
        BinaryOp::NotEqual => left != right,
        _ if left.is_null() || right.is_null() => false,
        _ => {
            let ordering = left.compare(right).ok_or_else(|| mismatch(op, left, right))?;
            match op {
                BinaryOp::LessThan => ordering == Ordering::Less,
                BinaryOp::LessThanOrEqual => ordering != Ordering::Greater,
                BinaryOp::GreaterThan => ordering == Ordering::Greater,
                BinaryOp::GreaterThanOrEqual => ordering != Ordering::Less,
                _ => return Err(mismatch(op, left, right)),
            }
        }
    };
    Ok(Value::Boolean(result))
}

pub fn unary(op: UnaryOp, operand: &Value) -> EvalResult<Value> {
    Ok(match (op, operand) {
        (_, Value::Null) => Value::Null,
        (UnaryOp::Not, Value::Boolean(b)) => Value::Boolean(!b),
        (UnaryOp::Negate, Value::Int32(v)) => Value::Int32(v.wrapping_neg()),
        (UnaryOp::Negate, Value::Int64(v)) => Value::Int64(v.wrapping_neg()),
        (UnaryOp::Negate, Value::Single(v)) => Value::Single(-v),
        (UnaryOp::Negate, Value::Double(v)) => Value::Double(-v),
        (UnaryOp::Negate, Value::Decimal(v)) => Value::Decimal(-*v),
        (UnaryOp::Negate, Value::TimeSpan(d)) => Value::TimeSpan(Duration::zero() - *d),
        (op, v) => return Err(EvalError::Unsupported(format!("{:?} on {}", op, v.type_of()))),
    })
}
