//! Runtime value conversions.
//!
//! Implicit conversions inserted by the parser never fail. Explicit
//! numeric and enum conversions are checked: a value outside the target's
//! range raises [`EvalError::Overflow`] instead of wrapping.

use crate::error::{EvalError, EvalResult};
use dynexpr_types::conversion::is_numeric;
use dynexpr_types::{Decimal, Type, Value};
use rust_decimal::prelude::ToPrimitive;

pub(crate) fn invalid_cast(value: &Value, target: &Type) -> EvalError {
    EvalError::InvalidCast {
        from: value.type_of().to_string(),
        to: target.to_string(),
    }
}

/// Convert `value` to `target`.
pub fn convert(value: Value, target: &Type, checked: bool) -> EvalResult<Value> {
    match target {
        Type::Nullable(inner) => {
            if value.is_null() {
                Ok(Value::Null)
            } else {
                convert(value, inner, checked)
            }
        }
        t if !t.is_value_type() => {
            if value.is_null() || value.conforms_to(t) {
                Ok(value)
            } else {
                Err(invalid_cast(&value, t))
            }
        }
        _ if value.is_null() => Err(EvalError::NoValue),
        Type::Enum(e) => {
            let raw = integral_of(&value, target, checked)?;
            let underlying = from_i128(raw, &e.underlying, checked)?;
            let v = underlying.as_i128().ok_or_else(|| invalid_cast(&value, target))?;
            Ok(Value::Enum(e.clone(), v as i64))
        }
        t if is_numeric(t) => match t {
            Type::Single => Ok(Value::Single(float_of(&value, t)? as f32)),
            Type::Double => Ok(Value::Double(float_of(&value, t)?)),
            Type::Decimal => value.as_decimal().map(Value::Decimal).ok_or(EvalError::Overflow),
            _ => from_i128(integral_of(&value, t, checked)?, t, checked),
        },
        t => {
            if value.conforms_to(t) {
                Ok(value)
            } else {
                Err(invalid_cast(&value, t))
            }
        }
    }
}

fn float_of(value: &Value, target: &Type) -> EvalResult<f64> {
    value.as_f64().ok_or_else(|| invalid_cast(value, target))
}

/// The integral value of a numeric, char or enum value. Floating values
/// truncate toward zero.
fn integral_of(value: &Value, target: &Type, checked: bool) -> EvalResult<i128> {
    match value {
        Value::Single(_) | Value::Double(_) => {
            let f = float_of(value, target)?.trunc();
            if checked && !f.is_finite() {
                return Err(EvalError::Overflow);
            }
            Ok(f as i128)
        }
        Value::Decimal(d) => d.trunc().to_i128().ok_or(EvalError::Overflow),
        other => other.as_i128().ok_or_else(|| invalid_cast(other, target)),
    }
}

/// Narrow an integral value to `target`, wrapping unless `checked`.
pub(crate) fn from_i128(v: i128, target: &Type, checked: bool) -> EvalResult<Value> {
    macro_rules! narrow {
        ($variant:ident, $t:ty) => {
            if checked {
                <$t>::try_from(v).map(Value::$variant).map_err(|_| EvalError::Overflow)
            } else {
                Ok(Value::$variant(v as $t))
            }
        };
    }
    match target {
        Type::SByte => narrow!(SByte, i8),
        Type::Byte => narrow!(Byte, u8),
        Type::Int16 => narrow!(Int16, i16),
        Type::UInt16 => narrow!(UInt16, u16),
        Type::Int32 => narrow!(Int32, i32),
        Type::UInt32 => narrow!(UInt32, u32),
        Type::Int64 => narrow!(Int64, i64),
        Type::UInt64 => narrow!(UInt64, u64),
        Type::Single => Ok(Value::Single(v as f32)),
        Type::Double => Ok(Value::Double(v as f64)),
        Type::Decimal => Decimal::try_from_i128_with_scale(v, 0)
            .map(Value::Decimal)
            .map_err(|_| EvalError::Overflow),
        Type::Char => {
            let code = if checked {
                u16::try_from(v).map_err(|_| EvalError::Overflow)?
            } else {
                v as u16
            };
            char::from_u32(u32::from(code)).map(Value::Char).ok_or(EvalError::Overflow)
        }
        other => Err(EvalError::Unsupported(format!("conversion to {}", other))),
    }
}
