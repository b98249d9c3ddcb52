//! Members of the predefined types, and member lookup across a type's
//! base chain.
//!
//! Lookup walks [`self_and_base_types`] from the most derived type to
//! `Object`. Methods and indexers are returned layer by layer so that the
//! resolver can stop at the first layer that has an applicable candidate.

use crate::member::{Access, Builtin, MethodInfo, PropertyInfo};
use crate::ty::{Type, PREDEFINED_NAMES};
use crate::value::{max_date_time, min_date_time, Value};
use chrono::Duration;
use lazy_static::lazy_static;
use std::sync::Arc;
use uuid::Uuid;

/// The methods one type declares under a given name.
#[derive(Debug, Clone)]
pub struct MethodLayer {
    pub owner: Type,
    pub methods: Vec<Arc<MethodInfo>>,
}

/// Whether methods declared on `ty` may be called from an expression.
pub fn is_predefined(ty: &Type) -> bool {
    PREDEFINED_NAMES.iter().any(|(_, t)| t == ty)
}

/// `ty` followed by its base types, ending with `Object`. Interfaces list
/// themselves and the interfaces they extend.
pub fn self_and_base_types(ty: &Type) -> Vec<Type> {
    let mut types = Vec::new();
    match ty {
        Type::Object => {}
        Type::Class(c) if c.is_interface => {
            let mut stack = vec![c.clone()];
            while let Some(i) = stack.pop() {
                let t = Type::Class(i.clone());
                if !types.contains(&t) {
                    types.push(t);
                    stack.extend(i.interfaces.iter().rev().cloned());
                }
            }
        }
        Type::Class(c) => {
            let mut current = Some(c.clone());
            while let Some(class) = current {
                types.push(Type::Class(class.clone()));
                current = class.base.clone();
            }
        }
        other => types.push(other.clone()),
    }
    types.push(Type::Object);
    types
}

/// Find a property or field by name, ignoring case.
pub fn find_property(ty: &Type, name: &str, static_access: bool) -> Option<PropertyInfo> {
    self_and_base_types(ty).iter().find_map(|owner| {
        declared_properties(owner)
            .into_iter()
            .find(|p| p.is_static == static_access && p.name.eq_ignore_ascii_case(name))
    })
}

/// Methods named `name` (ignoring case), grouped by declaring type.
pub fn find_methods(ty: &Type, name: &str, static_access: bool) -> Vec<MethodLayer> {
    self_and_base_types(ty)
        .into_iter()
        .filter_map(|owner| {
            let methods: Vec<_> = declared_methods(&owner)
                .into_iter()
                .filter(|m| m.is_static == static_access && m.name.eq_ignore_ascii_case(name))
                .collect();
            (!methods.is_empty()).then_some(MethodLayer { owner, methods })
        })
        .collect()
}

/// Indexer getters, grouped by declaring type.
pub fn find_indexers(ty: &Type) -> Vec<MethodLayer> {
    self_and_base_types(ty)
        .into_iter()
        .filter_map(|owner| {
            let methods = match &owner {
                Type::String => vec![instance("get_Chars", &[Type::Int32], Type::Char, Builtin::StringChars)],
                Type::Class(c) => c.indexers.clone(),
                _ => Vec::new(),
            };
            (!methods.is_empty()).then_some(MethodLayer { owner, methods })
        })
        .collect()
}

pub fn constructors(ty: &Type) -> Vec<Arc<MethodInfo>> {
    match ty {
        Type::DateTime => DATE_TIME_CONSTRUCTORS.clone(),
        Type::TimeSpan => TIME_SPAN_CONSTRUCTORS.clone(),
        Type::Guid => vec![ctor(Type::Guid, &[Type::String], Builtin::GuidNew)],
        Type::Class(c) => c
            .constructors
            .iter()
            .map(|m| {
                let mut m = (**m).clone();
                m.result = Some(ty.clone());
                Arc::new(m)
            })
            .collect(),
        _ => Vec::new(),
    }
}

// ============================================================================
// Table builders
// ============================================================================

fn instance(name: &str, params: &[Type], result: Type, b: Builtin) -> Arc<MethodInfo> {
    Arc::new(MethodInfo::builtin(name, params, result, false, b))
}

fn stat(name: &str, params: &[Type], result: Type, b: Builtin) -> Arc<MethodInfo> {
    Arc::new(MethodInfo::builtin(name, params, result, true, b))
}

fn ctor(ty: Type, params: &[Type], b: Builtin) -> Arc<MethodInfo> {
    let name = ty.to_string();
    Arc::new(MethodInfo::builtin(&name, params, ty, true, b))
}

fn prop(name: &str, ty: Type, b: Builtin) -> PropertyInfo {
    PropertyInfo {
        name: name.to_string(),
        ty,
        is_static: false,
        is_field: false,
        access: Access::Builtin(b),
    }
}

fn constant(name: &str, value: Value) -> PropertyInfo {
    PropertyInfo {
        name: name.to_string(),
        ty: value.type_of(),
        is_static: true,
        is_field: true,
        access: Access::Constant(value),
    }
}

fn unary_overloads(name: &str, types: &[Type], b: Builtin) -> Vec<Arc<MethodInfo>> {
    types.iter().map(|t| stat(name, &[t.clone()], t.clone(), b)).collect()
}

fn binary_overloads(name: &str, types: &[Type], b: Builtin) -> Vec<Arc<MethodInfo>> {
    types.iter().map(|t| stat(name, &[t.clone(), t.clone()], t.clone(), b)).collect()
}

lazy_static! {
    static ref OBJECT_METHODS: Vec<Arc<MethodInfo>> = vec![
        instance("ToString", &[], Type::String, Builtin::ToString),
        instance("Equals", &[Type::Object], Type::Boolean, Builtin::Equals),
        instance("GetHashCode", &[], Type::Int32, Builtin::GetHashCode),
    ];

    static ref STRING_METHODS: Vec<Arc<MethodInfo>> = {
        use Type::{Boolean, Char, Int32, Object, String};
        vec![
            instance("Contains", &[String], Boolean, Builtin::StringContains),
            instance("StartsWith", &[String], Boolean, Builtin::StringStartsWith),
            instance("EndsWith", &[String], Boolean, Builtin::StringEndsWith),
            instance("IndexOf", &[String], Int32, Builtin::StringIndexOf),
            instance("IndexOf", &[Char], Int32, Builtin::StringIndexOf),
            instance("Substring", &[Int32], String, Builtin::StringSubstring),
            instance("Substring", &[Int32, Int32], String, Builtin::StringSubstring),
            instance("ToUpper", &[], String, Builtin::StringToUpper),
            instance("ToLower", &[], String, Builtin::StringToLower),
            instance("Trim", &[], String, Builtin::StringTrim),
            instance("Replace", &[String, String], String, Builtin::StringReplace),
            instance("Replace", &[Char, Char], String, Builtin::StringReplace),
            stat("Concat", &[Object, Object], String, Builtin::StringConcat),
            stat("Concat", &[String, String], String, Builtin::StringConcat),
            stat("Compare", &[String, String], Int32, Builtin::StringCompare),
            stat("IsNullOrEmpty", &[String], Boolean, Builtin::StringIsNullOrEmpty),
        ]
    };

    static ref CHAR_METHODS: Vec<Arc<MethodInfo>> = {
        use Type::{Boolean, Char};
        vec![
            stat("IsDigit", &[Char], Boolean, Builtin::CharIsDigit),
            stat("IsLetter", &[Char], Boolean, Builtin::CharIsLetter),
            stat("IsWhiteSpace", &[Char], Boolean, Builtin::CharIsWhiteSpace),
            stat("IsUpper", &[Char], Boolean, Builtin::CharIsUpper),
            stat("IsLower", &[Char], Boolean, Builtin::CharIsLower),
            stat("ToUpper", &[Char], Char, Builtin::CharToUpper),
            stat("ToLower", &[Char], Char, Builtin::CharToLower),
            stat("Parse", &[Type::String], Char, Builtin::Parse),
        ]
    };

    static ref MATH_METHODS: Vec<Arc<MethodInfo>> = {
        use Type::*;
        let mut methods = unary_overloads("Abs", &[SByte, Int16, Int32, Int64, Single, Double, Decimal], Builtin::MathAbs);
        let ordered = [Byte, SByte, Int16, UInt16, Int32, UInt32, Int64, UInt64, Single, Double, Decimal];
        methods.extend(binary_overloads("Max", &ordered, Builtin::MathMax));
        methods.extend(binary_overloads("Min", &ordered, Builtin::MathMin));
        methods.extend([
            stat("Round", &[Double], Double, Builtin::MathRound),
            stat("Round", &[Double, Int32], Double, Builtin::MathRound),
            stat("Floor", &[Double], Double, Builtin::MathFloor),
            stat("Ceiling", &[Double], Double, Builtin::MathCeiling),
            stat("Truncate", &[Double], Double, Builtin::MathTruncate),
            stat("Sqrt", &[Double], Double, Builtin::MathSqrt),
            stat("Pow", &[Double, Double], Double, Builtin::MathPow),
        ]);
        methods
    };

    static ref CONVERT_METHODS: Vec<Arc<MethodInfo>> = {
        use Type::*;
        vec![
            stat("ToInt32", &[Int32], Int32, Builtin::ConvertToInt32),
            stat("ToInt32", &[Int64], Int32, Builtin::ConvertToInt32),
            stat("ToInt32", &[Double], Int32, Builtin::ConvertToInt32),
            stat("ToInt32", &[Decimal], Int32, Builtin::ConvertToInt32),
            stat("ToInt32", &[Boolean], Int32, Builtin::ConvertToInt32),
            stat("ToInt32", &[String], Int32, Builtin::ConvertToInt32),
            stat("ToInt64", &[Int32], Int64, Builtin::ConvertToInt64),
            stat("ToInt64", &[Int64], Int64, Builtin::ConvertToInt64),
            stat("ToInt64", &[Double], Int64, Builtin::ConvertToInt64),
            stat("ToInt64", &[Decimal], Int64, Builtin::ConvertToInt64),
            stat("ToInt64", &[String], Int64, Builtin::ConvertToInt64),
            stat("ToDouble", &[Int32], Double, Builtin::ConvertToDouble),
            stat("ToDouble", &[Int64], Double, Builtin::ConvertToDouble),
            stat("ToDouble", &[Double], Double, Builtin::ConvertToDouble),
            stat("ToDouble", &[String], Double, Builtin::ConvertToDouble),
            stat("ToDouble", &[Decimal], Double, Builtin::ConvertToDouble),
            stat("ToDecimal", &[Int32], Decimal, Builtin::ConvertToDecimal),
            stat("ToDecimal", &[Int64], Decimal, Builtin::ConvertToDecimal),
            stat("ToDecimal", &[Double], Decimal, Builtin::ConvertToDecimal),
            stat("ToDecimal", &[Decimal], Decimal, Builtin::ConvertToDecimal),
            stat("ToDecimal", &[String], Decimal, Builtin::ConvertToDecimal),
            stat("ToString", &[Object], String, Builtin::ConvertToString),
            stat("ToBoolean", &[String], Boolean, Builtin::ConvertToBoolean),
            stat("ToBoolean", &[Int32], Boolean, Builtin::ConvertToBoolean),
        ]
    };

    static ref DATE_TIME_METHODS: Vec<Arc<MethodInfo>> = {
        use Type::*;
        vec![
            instance("AddDays", &[Double], DateTime, Builtin::DateTimeAddDays),
            instance("AddHours", &[Double], DateTime, Builtin::DateTimeAddHours),
            instance("AddMinutes", &[Double], DateTime, Builtin::DateTimeAddMinutes),
            instance("AddSeconds", &[Double], DateTime, Builtin::DateTimeAddSeconds),
            instance("AddMilliseconds", &[Double], DateTime, Builtin::DateTimeAddMilliseconds),
            instance("AddMonths", &[Int32], DateTime, Builtin::DateTimeAddMonths),
            instance("AddYears", &[Int32], DateTime, Builtin::DateTimeAddYears),
            instance("Add", &[TimeSpan], DateTime, Builtin::DateTimeAdd),
            instance("Subtract", &[DateTime], TimeSpan, Builtin::DateTimeSubtract),
            instance("Subtract", &[TimeSpan], DateTime, Builtin::DateTimeSubtract),
            stat("DaysInMonth", &[Int32, Int32], Int32, Builtin::DateTimeDaysInMonth),
            stat("IsLeapYear", &[Int32], Boolean, Builtin::DateTimeIsLeapYear),
            stat("Parse", &[String], DateTime, Builtin::Parse),
        ]
    };

    static ref TIME_SPAN_METHODS: Vec<Arc<MethodInfo>> = {
        use Type::*;
        vec![
            stat("FromDays", &[Double], TimeSpan, Builtin::TimeSpanFromDays),
            stat("FromHours", &[Double], TimeSpan, Builtin::TimeSpanFromHours),
            stat("FromMinutes", &[Double], TimeSpan, Builtin::TimeSpanFromMinutes),
            stat("FromSeconds", &[Double], TimeSpan, Builtin::TimeSpanFromSeconds),
            stat("FromMilliseconds", &[Double], TimeSpan, Builtin::TimeSpanFromMilliseconds),
            stat("Parse", &[String], TimeSpan, Builtin::Parse),
            instance("Add", &[TimeSpan], TimeSpan, Builtin::TimeSpanAdd),
            instance("Subtract", &[TimeSpan], TimeSpan, Builtin::TimeSpanSubtract),
            instance("Negate", &[], TimeSpan, Builtin::TimeSpanNegate),
            instance("Duration", &[], TimeSpan, Builtin::TimeSpanDuration),
        ]
    };

    static ref DATE_TIME_CONSTRUCTORS: Vec<Arc<MethodInfo>> = {
        use Type::Int32;
        vec![
            ctor(Type::DateTime, &[Int32, Int32, Int32], Builtin::DateTimeNew),
            ctor(Type::DateTime, &[Int32, Int32, Int32, Int32, Int32, Int32], Builtin::DateTimeNew),
        ]
    };

    static ref TIME_SPAN_CONSTRUCTORS: Vec<Arc<MethodInfo>> = {
        use Type::{Int32, Int64};
        vec![
            ctor(Type::TimeSpan, &[Int64], Builtin::TimeSpanNew),
            ctor(Type::TimeSpan, &[Int32, Int32, Int32], Builtin::TimeSpanNew),
            ctor(Type::TimeSpan, &[Int32, Int32, Int32, Int32], Builtin::TimeSpanNew),
        ]
    };
}

fn declared_methods(owner: &Type) -> Vec<Arc<MethodInfo>> {
    match owner {
        Type::Object => OBJECT_METHODS.clone(),
        Type::String => STRING_METHODS.clone(),
        Type::Char => CHAR_METHODS.clone(),
        Type::Math => MATH_METHODS.clone(),
        Type::Convert => CONVERT_METHODS.clone(),
        Type::DateTime => DATE_TIME_METHODS.clone(),
        Type::TimeSpan => TIME_SPAN_METHODS.clone(),
        Type::Boolean | Type::Guid => vec![stat("Parse", &[Type::String], owner.clone(), Builtin::Parse)],
        t if !t.is_nullable() && crate::conversion::is_numeric(t) => vec![stat("Parse", &[Type::String], t.clone(), Builtin::Parse)],
        Type::Class(c) => c.methods.clone(),
        _ => Vec::new(),
    }
}

fn numeric_limits(ty: &Type) -> Vec<PropertyInfo> {
    let (min, max) = match ty {
        Type::SByte => (Value::SByte(i8::MIN), Value::SByte(i8::MAX)),
        Type::Byte => (Value::Byte(u8::MIN), Value::Byte(u8::MAX)),
        Type::Int16 => (Value::Int16(i16::MIN), Value::Int16(i16::MAX)),
        Type::UInt16 => (Value::UInt16(u16::MIN), Value::UInt16(u16::MAX)),
        Type::Int32 => (Value::Int32(i32::MIN), Value::Int32(i32::MAX)),
        Type::UInt32 => (Value::UInt32(u32::MIN), Value::UInt32(u32::MAX)),
        Type::Int64 => (Value::Int64(i64::MIN), Value::Int64(i64::MAX)),
        Type::UInt64 => (Value::UInt64(u64::MIN), Value::UInt64(u64::MAX)),
        Type::Single => (Value::Single(f32::MIN), Value::Single(f32::MAX)),
        Type::Double => (Value::Double(f64::MIN), Value::Double(f64::MAX)),
        Type::Decimal => (Value::Decimal(rust_decimal::Decimal::MIN), Value::Decimal(rust_decimal::Decimal::MAX)),
        _ => return Vec::new(),
    };
    let mut props = vec![constant("MinValue", min), constant("MaxValue", max)];
    match ty {
        Type::Single => props.extend([
            constant("NaN", Value::Single(f32::NAN)),
            constant("PositiveInfinity", Value::Single(f32::INFINITY)),
            constant("NegativeInfinity", Value::Single(f32::NEG_INFINITY)),
        ]),
        Type::Double => props.extend([
            constant("NaN", Value::Double(f64::NAN)),
            constant("PositiveInfinity", Value::Double(f64::INFINITY)),
            constant("NegativeInfinity", Value::Double(f64::NEG_INFINITY)),
        ]),
        Type::Decimal => props.extend([
            constant("Zero", Value::Decimal(rust_decimal::Decimal::ZERO)),
            constant("One", Value::Decimal(rust_decimal::Decimal::ONE)),
            constant("MinusOne", Value::Decimal(rust_decimal::Decimal::NEGATIVE_ONE)),
        ]),
        _ => {}
    }
    props
}

fn declared_properties(owner: &Type) -> Vec<PropertyInfo> {
    use Type::{Double, Int32, Int64};
    match owner {
        Type::String => vec![
            prop("Length", Int32, Builtin::StringLength),
            constant("Empty", Value::string("")),
        ],
        Type::Boolean => vec![
            constant("TrueString", Value::string("True")),
            constant("FalseString", Value::string("False")),
        ],
        Type::Math => vec![
            constant("PI", Value::Double(std::f64::consts::PI)),
            constant("E", Value::Double(std::f64::consts::E)),
        ],
        Type::DateTime => {
            let mut props = vec![
                prop("Year", Int32, Builtin::DateTimeYear),
                prop("Month", Int32, Builtin::DateTimeMonth),
                prop("Day", Int32, Builtin::DateTimeDay),
                prop("Hour", Int32, Builtin::DateTimeHour),
                prop("Minute", Int32, Builtin::DateTimeMinute),
                prop("Second", Int32, Builtin::DateTimeSecond),
                prop("Millisecond", Int32, Builtin::DateTimeMillisecond),
                prop("DayOfYear", Int32, Builtin::DateTimeDayOfYear),
                prop("Date", Type::DateTime, Builtin::DateTimeDate),
                prop("TimeOfDay", Type::TimeSpan, Builtin::DateTimeTimeOfDay),
                prop("Ticks", Int64, Builtin::DateTimeTicks),
            ];
            props.extend(min_date_time().map(|v| constant("MinValue", Value::DateTime(v))));
            props.extend(max_date_time().map(|v| constant("MaxValue", Value::DateTime(v))));
            props
        }
        Type::TimeSpan => vec![
            prop("Days", Int32, Builtin::TimeSpanDays),
            prop("Hours", Int32, Builtin::TimeSpanHours),
            prop("Minutes", Int32, Builtin::TimeSpanMinutes),
            prop("Seconds", Int32, Builtin::TimeSpanSeconds),
            prop("Milliseconds", Int32, Builtin::TimeSpanMilliseconds),
            prop("TotalDays", Double, Builtin::TimeSpanTotalDays),
            prop("TotalHours", Double, Builtin::TimeSpanTotalHours),
            prop("TotalMinutes", Double, Builtin::TimeSpanTotalMinutes),
            prop("TotalSeconds", Double, Builtin::TimeSpanTotalSeconds),
            prop("TotalMilliseconds", Double, Builtin::TimeSpanTotalMilliseconds),
            prop("Ticks", Int64, Builtin::TimeSpanTicks),
            constant("Zero", Value::TimeSpan(Duration::zero())),
        ],
        Type::Guid => vec![constant("Empty", Value::Guid(Uuid::nil()))],
        Type::Nullable(inner) => vec![
            prop("HasValue", Type::Boolean, Builtin::HasValue),
            prop("Value", (**inner).clone(), Builtin::NullableValue),
        ],
        Type::Array(_) => vec![prop("Length", Int32, Builtin::ArrayLength)],
        Type::Record(r) => r
            .properties()
            .iter()
            .enumerate()
            .map(|(i, p)| PropertyInfo {
                name: p.name.clone(),
                ty: p.ty.clone(),
                is_static: false,
                is_field: false,
                access: Access::Field(i),
            })
            .collect(),
        Type::Class(c) => c.properties().cloned().collect(),
        t => numeric_limits(t),
    }
}
