//! Runtime values.
//!
//! Equality and hashing are structural: two doubles that are both NaN are
//! equal, records compare field by field, and sequences element by
//! element. Host instances compare by identity.

use crate::record::RecordInstance;
use crate::ty::{ClassType, EnumType, Type};
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use dynexpr_core::CaseInsensitiveMap;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Boolean(bool),
    Char(char),
    String(Arc<str>),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Single(f32),
    Double(f64),
    Decimal(Decimal),
    DateTime(NaiveDateTime),
    TimeSpan(Duration),
    Guid(Uuid),
    Enum(Arc<EnumType>, i64),
    Record(Arc<RecordInstance>),
    Sequence(Arc<Vec<Value>>),
    Instance(Arc<HostInstance>),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Value {
        Value::String(Arc::from(s.as_ref()))
    }

    pub fn sequence(items: Vec<Value>) -> Value {
        Value::Sequence(Arc::new(items))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The default value of a type: zero for numerics, `false`, the minimum
    /// date, and null for references and nullables.
    pub fn default_for(ty: &Type) -> Value {
        match ty {
            Type::Boolean => Value::Boolean(false),
            Type::Char => Value::Char('\0'),
            Type::SByte => Value::SByte(0),
            Type::Byte => Value::Byte(0),
            Type::Int16 => Value::Int16(0),
            Type::UInt16 => Value::UInt16(0),
            Type::Int32 => Value::Int32(0),
            Type::UInt32 => Value::UInt32(0),
            Type::Int64 => Value::Int64(0),
            Type::UInt64 => Value::UInt64(0),
            Type::Single => Value::Single(0.0),
            Type::Double => Value::Double(0.0),
            Type::Decimal => Value::Decimal(Decimal::ZERO),
            Type::DateTime => min_date_time().map_or(Value::Null, Value::DateTime),
            Type::TimeSpan => Value::TimeSpan(Duration::zero()),
            Type::Guid => Value::Guid(Uuid::nil()),
            Type::Enum(e) => Value::Enum(e.clone(), 0),
            _ => Value::Null,
        }
    }

    /// The static type of a value, used when a host value is bound as a
    /// constant.
    pub fn type_of(&self) -> Type {
        match self {
            Value::Null => Type::Object,
            Value::Boolean(_) => Type::Boolean,
            Value::Char(_) => Type::Char,
            Value::String(_) => Type::String,
            Value::SByte(_) => Type::SByte,
            Value::Byte(_) => Type::Byte,
            Value::Int16(_) => Type::Int16,
            Value::UInt16(_) => Type::UInt16,
            Value::Int32(_) => Type::Int32,
            Value::UInt32(_) => Type::UInt32,
            Value::Int64(_) => Type::Int64,
            Value::UInt64(_) => Type::UInt64,
            Value::Single(_) => Type::Single,
            Value::Double(_) => Type::Double,
            Value::Decimal(_) => Type::Decimal,
            Value::DateTime(_) => Type::DateTime,
            Value::TimeSpan(_) => Type::TimeSpan,
            Value::Guid(_) => Type::Guid,
            Value::Enum(e, _) => Type::Enum(e.clone()),
            Value::Record(r) => Type::Record(r.record_type().clone()),
            Value::Sequence(_) => Type::sequence(Type::Object),
            Value::Instance(i) => Type::Class(i.class.clone()),
        }
    }

    /// Whether this value may be stored in a location of type `ty`.
    pub fn conforms_to(&self, ty: &Type) -> bool {
        match (self, ty) {
            (_, Type::Object) => true,
            (Value::Null, t) => !t.is_value_type() || t.is_nullable(),
            (v, Type::Nullable(inner)) => v.conforms_to(inner),
            (Value::Record(r), Type::Record(rt)) => Arc::ptr_eq(r.record_type(), rt),
            (Value::Sequence(_), Type::Sequence(_) | Type::Array(_)) => true,
            (Value::Instance(i), Type::Class(c)) => i.class.derives_from(c),
            (Value::Instance(i), Type::Sequence(_)) => i.items.is_some(),
            (Value::Enum(e, _), Type::Enum(t)) => Arc::ptr_eq(e, t),
            (v, t) => v.type_of() == *t,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Items of a sequence-like value.
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            Value::Instance(i) => i.items.as_deref(),
            _ => None,
        }
    }

    /// Integral value widened to `i128`; enums yield their underlying value.
    pub fn as_i128(&self) -> Option<i128> {
        Some(match self {
            Value::SByte(v) => *v as i128,
            Value::Byte(v) => *v as i128,
            Value::Int16(v) => *v as i128,
            Value::UInt16(v) => *v as i128,
            Value::Int32(v) => *v as i128,
            Value::UInt32(v) => *v as i128,
            Value::Int64(v) => *v as i128,
            Value::UInt64(v) => *v as i128,
            Value::Char(c) => *c as u32 as i128,
            Value::Enum(_, v) => *v as i128,
            _ => return None,
        })
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Single(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            Value::Decimal(v) => v.to_f64(),
            other => other.as_i128().map(|v| v as f64),
        }
    }

    /// Exact decimal view of a numeric value. Floats outside the decimal
    /// range, NaN and infinities have none.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(v) => Some(*v),
            Value::Single(v) => Decimal::from_f32(*v),
            Value::Double(v) => Decimal::from_f64(*v),
            other => Decimal::try_from_i128_with_scale(other.as_i128()?, 0).ok(),
        }
    }

    /// Ordering between two values of the same kind; `None` when they are
    /// not comparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(compare_strings(a, b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::TimeSpan(a), Value::TimeSpan(b)) => Some(a.cmp(b)),
            (Value::Guid(a), Value::Guid(b)) => Some(a.cmp(b)),
            (Value::Decimal(_), _) | (_, Value::Decimal(_)) => Some(self.as_decimal()?.cmp(&other.as_decimal()?)),
            (Value::Single(_) | Value::Double(_), _) | (_, Value::Single(_) | Value::Double(_)) => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            (a, b) => Some(a.as_i128()?.cmp(&b.as_i128()?)),
        }
    }
}

/// Culture-neutral text comparison: case-insensitive first, then ordinal.
pub fn compare_strings(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| b.cmp(a))
}

/// `DateTime.MinValue`: midnight on 0001-01-01.
pub fn min_date_time() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1, 1, 1)?.and_hms_opt(0, 0, 0)
}

/// `DateTime.MaxValue`: the last representable tick of 9999-12-31.
pub fn max_date_time() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(9999, 12, 31)?.and_hms_nano_opt(23, 59, 59, 999_999_900)
}

fn canonical_f64_bits(v: f64) -> u64 {
    if v.is_nan() {
        f64::NAN.to_bits()
    } else if v == 0.0 {
        0
    } else {
        v.to_bits()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::SByte(a), Value::SByte(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::UInt16(a), Value::UInt16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::UInt32(a), Value::UInt32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::UInt64(a), Value::UInt64(b)) => a == b,
            (Value::Single(a), Value::Single(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Double(a), Value::Double(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::TimeSpan(a), Value::TimeSpan(b)) => a == b,
            (Value::Guid(a), Value::Guid(b)) => a == b,
            (Value::Enum(ta, a), Value::Enum(tb, b)) => Arc::ptr_eq(ta, tb) && a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(v) => v.hash(state),
            Value::Char(v) => v.hash(state),
            Value::String(v) => v.hash(state),
            Value::SByte(v) => v.hash(state),
            Value::Byte(v) => v.hash(state),
            Value::Int16(v) => v.hash(state),
            Value::UInt16(v) => v.hash(state),
            Value::Int32(v) => v.hash(state),
            Value::UInt32(v) => v.hash(state),
            Value::Int64(v) => v.hash(state),
            Value::UInt64(v) => v.hash(state),
            Value::Single(v) => canonical_f64_bits(*v as f64).hash(state),
            Value::Double(v) => canonical_f64_bits(*v).hash(state),
            Value::Decimal(v) => v.normalize().hash(state),
            Value::DateTime(v) => v.hash(state),
            Value::TimeSpan(v) => v.hash(state),
            Value::Guid(v) => v.hash(state),
            Value::Enum(e, v) => {
                e.name.hash(state);
                v.hash(state);
            }
            Value::Record(r) => state.write_u64(r.structural_hash()),
            Value::Sequence(items) => items.hash(state),
            Value::Instance(i) => std::ptr::hash(Arc::as_ptr(i), state),
        }
    }
}

/// Formats a double the way the expression language prints numbers:
/// integral values without a fraction, `NaN`, and `Infinity`.
pub fn format_double(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.0}", v)
    } else {
        format!("{}", v)
    }
}

/// Formats a time span as `[-][d.]hh:mm:ss[.fffffff]`.
pub fn format_time_span(d: &Duration) -> String {
    let negative = *d < Duration::zero();
    let abs = if negative { -*d } else { *d };
    let days = abs.num_days();
    let hours = abs.num_hours() % 24;
    let minutes = abs.num_minutes() % 60;
    let seconds = abs.num_seconds() % 60;
    let ticks = abs.num_microseconds().map_or(0, |us| (us % 1_000_000) * 10);
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if days > 0 {
        out.push_str(&format!("{}.", days));
    }
    out.push_str(&format!("{:02}:{:02}:{:02}", hours, minutes, seconds));
    if ticks > 0 {
        out.push_str(&format!(".{:07}", ticks));
    }
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Boolean(true) => write!(f, "True"),
            Value::Boolean(false) => write!(f, "False"),
            Value::Char(c) => write!(f, "{}", c),
            Value::String(s) => write!(f, "{}", s),
            Value::SByte(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::UInt16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Single(v) => write!(f, "{}", format_double(*v as f64)),
            Value::Double(v) => write!(f, "{}", format_double(*v)),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::DateTime(dt) => {
                if dt.nanosecond() == 0 {
                    write!(f, "{}", dt.format("%m/%d/%Y %H:%M:%S"))
                } else {
                    write!(f, "{}", dt.format("%m/%d/%Y %H:%M:%S%.f"))
                }
            }
            Value::TimeSpan(d) => write!(f, "{}", format_time_span(d)),
            Value::Guid(g) => write!(f, "{}", g),
            Value::Enum(e, v) => match e.name_of(*v) {
                Some(name) => write!(f, "{}", name),
                None => write!(f, "{}", v),
            },
            Value::Record(r) => write!(f, "{}", r),
            Value::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Instance(i) => write!(f, "{}", i.class.name),
        }
    }
}

// ============================================================================
// Host instances
// ============================================================================

/// An instance of a host [`ClassType`]: named member values and, for
/// enumerable classes, the items.
#[derive(Debug)]
pub struct HostInstance {
    pub class: Arc<ClassType>,
    members: CaseInsensitiveMap<Value>,
    pub items: Option<Vec<Value>>,
}

impl HostInstance {
    pub fn new(class: Arc<ClassType>) -> Self {
        Self {
            class,
            members: CaseInsensitiveMap::new(),
            items: None,
        }
    }

    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.members.try_insert(name, value);
        self
    }

    pub fn with_items(mut self, items: Vec<Value>) -> Self {
        self.items = Some(items);
        self
    }

    pub fn member(&self, name: &str) -> Option<&Value> {
        self.members.get(name)
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.members.iter()
    }

    pub fn into_value(self) -> Value {
        Value::Instance(Arc::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(v: &Value) -> u64 {
        let mut h = DefaultHasher::new();
        v.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_nan_equals_nan() {
        assert_eq!(Value::Double(f64::NAN), Value::Double(f64::NAN));
        assert_eq!(hash_of(&Value::Double(f64::NAN)), hash_of(&Value::Double(f64::NAN)));
    }

    #[test]
    fn test_signed_zero_hashes_alike() {
        assert_eq!(Value::Double(0.0), Value::Double(-0.0));
        assert_eq!(hash_of(&Value::Double(0.0)), hash_of(&Value::Double(-0.0)));
    }

    #[test]
    fn test_equality_is_type_sensitive() {
        assert_ne!(Value::Int32(1), Value::Int64(1));
        assert_ne!(Value::string("1"), Value::Int32(1));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Boolean(true).to_string(), "True");
        assert_eq!(Value::Double(42.0).to_string(), "42");
        assert_eq!(Value::Double(2.5).to_string(), "2.5");
        assert_eq!(Value::TimeSpan(Duration::hours(26)).to_string(), "1.02:00:00");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Value::default_for(&Type::Int32), Value::Int32(0));
        assert_eq!(Value::default_for(&Type::nullable(Type::Int32)), Value::Null);
        assert_eq!(Value::default_for(&Type::String), Value::Null);
        assert_eq!(Value::default_for(&Type::Guid), Value::Guid(Uuid::nil()));
    }

    #[test]
    fn test_conforms_to() {
        assert!(Value::Null.conforms_to(&Type::String));
        assert!(!Value::Null.conforms_to(&Type::Int32));
        assert!(Value::Int32(3).conforms_to(&Type::nullable(Type::Int32)));
        assert!(!Value::Int32(3).conforms_to(&Type::Int64));
        assert!(Value::Double(1.0).conforms_to(&Type::Object));
    }

    #[test]
    fn test_decimal_keeps_scale_and_compares_exactly() {
        let a = Value::Decimal(Decimal::new(150, 2));
        let b = Value::Decimal(Decimal::new(15, 1));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(a.to_string(), "1.50");
        assert_eq!(a.compare(&Value::Int32(2)), Some(Ordering::Less));
        assert_eq!(Value::Decimal(Decimal::new(3, 1)).compare(&Value::Decimal(Decimal::new(3, 1))), Some(Ordering::Equal));
        assert_eq!(Value::Double(f64::NAN).as_decimal(), None);
        assert_eq!(Value::default_for(&Type::Decimal), Value::Decimal(Decimal::ZERO));
        assert_eq!(a.type_of(), Type::Decimal);
    }

    #[test]
    fn test_compare_strings() {
        assert_eq!(compare_strings("apple", "Banana"), Ordering::Less);
        assert_eq!(compare_strings("abc", "abc"), Ordering::Equal);
    }
}
