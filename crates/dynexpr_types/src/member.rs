//! Member descriptions: properties, fields, methods, constructors, indexers.

use crate::ty::Type;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Host implementation of a method, constructor or indexer. Receives the
/// receiver (`Value::Null` for static members) and the converted arguments.
pub type HostFn = Arc<dyn Fn(&Value, &[Value]) -> Result<Value, String> + Send + Sync>;

/// How the evaluator reads a property or field.
#[derive(Debug, Clone)]
pub enum Access {
    /// Computed by the evaluator from the receiver.
    Builtin(Builtin),
    /// A static constant such as `Int32.MaxValue`.
    Constant(Value),
    /// Field `n` of a synthesized record.
    Field(usize),
    /// Looked up by name on a host instance.
    Host,
}

#[derive(Debug, Clone)]
pub struct PropertyInfo {
    pub name: String,
    pub ty: Type,
    pub is_static: bool,
    pub is_field: bool,
    pub access: Access,
}

#[derive(Debug, Clone)]
pub struct ParamInfo {
    pub ty: Type,
    /// Output-only parameters never make a candidate applicable.
    pub is_out: bool,
}

impl ParamInfo {
    pub fn new(ty: Type) -> Self {
        Self { ty, is_out: false }
    }
}

#[derive(Clone)]
pub enum MethodBody {
    Builtin(Builtin),
    Host(HostFn),
    /// An entry in an operator or aggregate signature table; never invoked.
    Signature,
}

impl fmt::Debug for MethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodBody::Builtin(b) => write!(f, "Builtin({:?})", b),
            MethodBody::Host(_) => write!(f, "Host"),
            MethodBody::Signature => write!(f, "Signature"),
        }
    }
}

/// A method, constructor, indexer getter, or signature-table entry.
#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub name: String,
    pub params: Vec<ParamInfo>,
    /// `None` for methods that return no value.
    pub result: Option<Type>,
    pub is_static: bool,
    pub body: MethodBody,
}

impl MethodInfo {
    pub fn builtin(name: &str, params: &[Type], result: Type, is_static: bool, builtin: Builtin) -> Self {
        Self {
            name: name.to_string(),
            params: params.iter().cloned().map(ParamInfo::new).collect(),
            result: Some(result),
            is_static,
            body: MethodBody::Builtin(builtin),
        }
    }

    pub fn signature(name: &str, params: &[Type]) -> Self {
        Self {
            name: name.to_string(),
            params: params.iter().cloned().map(ParamInfo::new).collect(),
            result: None,
            is_static: true,
            body: MethodBody::Signature,
        }
    }
}

/// Members of the predefined types that the evaluator implements directly.
///
/// One id may back several overloads; the evaluator dispatches on the
/// argument values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    // Object
    ToString,
    Equals,
    GetHashCode,
    // Nullable
    HasValue,
    NullableValue,
    // Arrays
    ArrayLength,
    // String
    StringLength,
    StringChars,
    StringContains,
    StringStartsWith,
    StringEndsWith,
    StringIndexOf,
    StringSubstring,
    StringToUpper,
    StringToLower,
    StringTrim,
    StringReplace,
    StringConcat,
    StringCompare,
    StringIsNullOrEmpty,
    // Char
    CharIsDigit,
    CharIsLetter,
    CharIsWhiteSpace,
    CharIsUpper,
    CharIsLower,
    CharToUpper,
    CharToLower,
    // Parsing, by the declared result type
    Parse,
    // Math
    MathAbs,
    MathMax,
    MathMin,
    MathRound,
    MathFloor,
    MathCeiling,
    MathTruncate,
    MathSqrt,
    MathPow,
    // Convert
    ConvertToInt32,
    ConvertToInt64,
    ConvertToDouble,
    ConvertToDecimal,
    ConvertToString,
    ConvertToBoolean,
    // DateTime
    DateTimeNew,
    DateTimeYear,
    DateTimeMonth,
    DateTimeDay,
    DateTimeHour,
    DateTimeMinute,
    DateTimeSecond,
    DateTimeMillisecond,
    DateTimeDayOfYear,
    DateTimeDate,
    DateTimeTimeOfDay,
    DateTimeTicks,
    DateTimeAddDays,
    DateTimeAddHours,
    DateTimeAddMinutes,
    DateTimeAddSeconds,
    DateTimeAddMilliseconds,
    DateTimeAddMonths,
    DateTimeAddYears,
    DateTimeAdd,
    DateTimeSubtract,
    DateTimeDaysInMonth,
    DateTimeIsLeapYear,
    // TimeSpan
    TimeSpanNew,
    TimeSpanDays,
    TimeSpanHours,
    TimeSpanMinutes,
    TimeSpanSeconds,
    TimeSpanMilliseconds,
    TimeSpanTotalDays,
    TimeSpanTotalHours,
    TimeSpanTotalMinutes,
    TimeSpanTotalSeconds,
    TimeSpanTotalMilliseconds,
    TimeSpanTicks,
    TimeSpanFromDays,
    TimeSpanFromHours,
    TimeSpanFromMinutes,
    TimeSpanFromSeconds,
    TimeSpanFromMilliseconds,
    TimeSpanAdd,
    TimeSpanSubtract,
    TimeSpanNegate,
    TimeSpanDuration,
    // Guid
    GuidNew,
}
