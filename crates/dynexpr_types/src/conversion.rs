//! The implicit conversion lattice.
//!
//! Numeric types fall into three kinds: floating-like (`Char`, `Single`,
//! `Double`, `Decimal`), signed integral, and unsigned integral. Implicit widening
//! follows the table in [`is_compatible_with`]; enum types convert only to
//! themselves and their underlying type; a nullable source never converts to a non-nullable target.

use crate::ty::Type;
use crate::value::Value;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::str::FromStr;

/// Numeric kind of a type, after stripping `Nullable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    None,
    Floating,
    Signed,
    Unsigned,
}

pub fn numeric_kind(ty: &Type) -> NumericKind {
    match ty.non_nullable() {
        Type::Char | Type::Single | Type::Double | Type::Decimal => NumericKind::Floating,
        Type::SByte | Type::Int16 | Type::Int32 | Type::Int64 => NumericKind::Signed,
        Type::Byte | Type::UInt16 | Type::UInt32 | Type::UInt64 => NumericKind::Unsigned,
        _ => NumericKind::None,
    }
}

#[inline]
pub fn is_numeric(ty: &Type) -> bool {
    numeric_kind(ty) != NumericKind::None
}

#[inline]
pub fn is_signed_integral(ty: &Type) -> bool {
    numeric_kind(ty) == NumericKind::Signed
}

#[inline]
pub fn is_unsigned_integral(ty: &Type) -> bool {
    numeric_kind(ty) == NumericKind::Unsigned
}

/// Whether a value of `source` converts implicitly to `target`.
pub fn is_compatible_with(source: &Type, target: &Type) -> bool {
    if source == target {
        return true;
    }
    if !target.is_value_type() {
        return target.is_assignable_from(source);
    }
    let st = source.non_nullable();
    let tt = target.non_nullable();
    if source.is_nullable() && !target.is_nullable() {
        return false;
    }
    // An enum converts to and from exactly its underlying type.
    match (st, tt) {
        (Type::Enum(_), Type::Enum(_)) => return st == tt,
        (Type::Enum(e), t) | (t, Type::Enum(e)) => return *t == e.underlying,
        _ => {}
    }
    use Type::*;
    match st {
        SByte => matches!(tt, SByte | Int16 | Int32 | Int64 | Single | Double | Decimal),
        Byte => matches!(
            tt,
            Byte | Int16 | UInt16 | Int32 | UInt32 | Int64 | UInt64 | Single | Double | Decimal
        ),
        Int16 => matches!(tt, Int16 | Int32 | Int64 | Single | Double | Decimal),
        UInt16 => matches!(tt, UInt16 | Int32 | UInt32 | Int64 | UInt64 | Single | Double | Decimal),
        Int32 => matches!(tt, Int32 | Int64 | Single | Double | Decimal),
        UInt32 => matches!(tt, UInt32 | Int64 | UInt64 | Single | Double | Decimal),
        Int64 => matches!(tt, Int64 | Single | Double | Decimal),
        UInt64 => matches!(tt, UInt64 | Single | Double | Decimal),
        Single => matches!(tt, Single | Double),
        _ => st == tt,
    }
}

/// Which of two candidate parameter types is the better target for an
/// argument of type `source`. `Greater` means `t1` is better.
pub fn compare_conversions(source: &Type, t1: &Type, t2: &Type) -> Ordering {
    if t1 == t2 {
        return Ordering::Equal;
    }
    if source == t1 {
        return Ordering::Greater;
    }
    if source == t2 {
        return Ordering::Less;
    }
    let t1t2 = is_compatible_with(t1, t2);
    let t2t1 = is_compatible_with(t2, t1);
    if t1t2 && !t2t1 {
        return Ordering::Greater;
    }
    if t2t1 && !t1t2 {
        return Ordering::Less;
    }
    if is_signed_integral(t1) && is_unsigned_integral(t2) {
        return Ordering::Greater;
    }
    if is_signed_integral(t2) && is_unsigned_integral(t1) {
        return Ordering::Less;
    }
    Ordering::Equal
}

/// Parse literal text directly as a value of `target`'s numeric type.
///
/// Enum targets parse as their underlying type and yield an enum value.
pub fn parse_number(text: &str, target: &Type) -> Option<Value> {
    let text = text.trim();
    let ty = target.non_nullable();
    if let Type::Enum(e) = ty {
        let raw = parse_number(text, &e.underlying)?;
        let v = raw.as_i128()?;
        return Some(Value::Enum(e.clone(), i64::try_from(v).ok()?));
    }
    Some(match ty {
        Type::SByte => Value::SByte(text.parse().ok()?),
        Type::Byte => Value::Byte(text.parse().ok()?),
        Type::Int16 => Value::Int16(text.parse().ok()?),
        Type::UInt16 => Value::UInt16(text.parse().ok()?),
        Type::Int32 => Value::Int32(text.parse().ok()?),
        Type::UInt32 => Value::UInt32(text.parse().ok()?),
        Type::Int64 => Value::Int64(text.parse().ok()?),
        Type::UInt64 => Value::UInt64(text.parse().ok()?),
        Type::Single => Value::Single(text.parse().ok()?),
        Type::Double => Value::Double(text.parse().ok()?),
        Type::Decimal => Value::Decimal(Decimal::from_str(text).ok()?),
        _ => return None,
    })
}

/// Resolve `name` as a member of `target` when it is an enum type.
pub fn parse_enum(name: &str, target: &Type) -> Option<Value> {
    match target.non_nullable() {
        Type::Enum(e) => e.member(name).map(|v| Value::Enum(e.clone(), v)),
        _ => None,
    }
}
