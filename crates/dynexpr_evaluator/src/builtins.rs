//! Implementations of the predefined members.
//!
//! Text positions and lengths count characters. Dates run from
//! `0001-01-01` through the last tick of `9999-12-31`; results outside
//! that range overflow.

use crate::error::{EvalError, EvalResult};
use crate::operators::checked_date;
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, Timelike};
use dynexpr_types::conversion::parse_number;
use dynexpr_types::value::{compare_strings, min_date_time};
use dynexpr_types::{Builtin, Decimal, MethodInfo, Type, Value};
use std::cmp::Ordering;
use rust_decimal::prelude::ToPrimitive;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

const MILLIS_PER_SECOND: f64 = 1_000.0;
const MILLIS_PER_MINUTE: f64 = 60_000.0;
const MILLIS_PER_HOUR: f64 = 3_600_000.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

// ============================================================================
// Argument access
// ============================================================================

fn arg(args: &[Value], i: usize) -> EvalResult<&Value> {
    args.get(i).ok_or(EvalError::ArityMismatch {
        expected: i + 1,
        found: args.len(),
    })
}

fn unexpected(value: &Value, expected: &str) -> EvalError {
    EvalError::InvalidCast {
        from: value.type_of().to_string(),
        to: expected.to_string(),
    }
}

fn text(value: &Value) -> EvalResult<&str> {
    match value {
        Value::String(s) => Ok(s),
        Value::Null => Err(EvalError::NullReference),
        other => Err(unexpected(other, "String")),
    }
}

fn int(value: &Value) -> EvalResult<i32> {
    match value {
        Value::Int32(v) => Ok(*v),
        Value::Null => Err(EvalError::NoValue),
        other => Err(unexpected(other, "Int32")),
    }
}

fn float(value: &Value) -> EvalResult<f64> {
    match value {
        Value::Null => Err(EvalError::NoValue),
        other => other.as_f64().ok_or_else(|| unexpected(other, "Double")),
    }
}

fn character(value: &Value) -> EvalResult<char> {
    match value {
        Value::Char(c) => Ok(*c),
        Value::Null => Err(EvalError::NoValue),
        other => Err(unexpected(other, "Char")),
    }
}

fn date(value: &Value) -> EvalResult<NaiveDateTime> {
    match value {
        Value::DateTime(dt) => Ok(*dt),
        Value::Null => Err(EvalError::NullReference),
        other => Err(unexpected(other, "DateTime")),
    }
}

fn span(value: &Value) -> EvalResult<Duration> {
    match value {
        Value::TimeSpan(d) => Ok(*d),
        Value::Null => Err(EvalError::NullReference),
        other => Err(unexpected(other, "TimeSpan")),
    }
}

fn int32(v: i64) -> Value {
    Value::Int32(v as i32)
}

// ============================================================================
// Properties
// ============================================================================

/// Read a computed property of `receiver`.
pub(crate) fn property(builtin: Builtin, receiver: &Value) -> EvalResult<Value> {
    match builtin {
        Builtin::HasValue => return Ok(Value::Boolean(!receiver.is_null())),
        Builtin::NullableValue if receiver.is_null() => return Err(EvalError::NoValue),
        Builtin::NullableValue => return Ok(receiver.clone()),
        _ if receiver.is_null() => return Err(EvalError::NullReference),
        _ => {}
    }
    Ok(match builtin {
        Builtin::ArrayLength => {
            let items = receiver.as_items().ok_or_else(|| unexpected(receiver, "Array"))?;
            int32(items.len() as i64)
        }
        Builtin::StringLength => int32(text(receiver)?.chars().count() as i64),
        Builtin::DateTimeYear => Value::Int32(date(receiver)?.year()),
        Builtin::DateTimeMonth => int32(i64::from(date(receiver)?.month())),
        Builtin::DateTimeDay => int32(i64::from(date(receiver)?.day())),
        Builtin::DateTimeHour => int32(i64::from(date(receiver)?.hour())),
        Builtin::DateTimeMinute => int32(i64::from(date(receiver)?.minute())),
        Builtin::DateTimeSecond => int32(i64::from(date(receiver)?.second())),
        Builtin::DateTimeMillisecond => int32(i64::from((date(receiver)?.nanosecond() / 1_000_000).min(999))),
        Builtin::DateTimeDayOfYear => int32(i64::from(date(receiver)?.ordinal())),
        Builtin::DateTimeDate => {
            let dt = date(receiver)?;
            Value::DateTime(dt.date().and_hms_opt(0, 0, 0).ok_or(EvalError::Overflow)?)
        }
        Builtin::DateTimeTimeOfDay => {
            let dt = date(receiver)?;
            let midnight = dt.date().and_hms_opt(0, 0, 0).ok_or(EvalError::Overflow)?;
            Value::TimeSpan(dt.signed_duration_since(midnight))
        }
        Builtin::DateTimeTicks => {
            let min = min_date_time().ok_or(EvalError::Overflow)?;
            Value::Int64(ticks(&date(receiver)?.signed_duration_since(min)))
        }
        Builtin::TimeSpanDays => int32(span(receiver)?.num_days()),
        Builtin::TimeSpanHours => int32(span(receiver)?.num_hours() % 24),
        Builtin::TimeSpanMinutes => int32(span(receiver)?.num_minutes() % 60),
        Builtin::TimeSpanSeconds => int32(span(receiver)?.num_seconds() % 60),
        Builtin::TimeSpanMilliseconds => int32(span(receiver)?.num_milliseconds() % 1000),
        Builtin::TimeSpanTotalDays => Value::Double(total_millis(&span(receiver)?) / MILLIS_PER_DAY),
        Builtin::TimeSpanTotalHours => Value::Double(total_millis(&span(receiver)?) / MILLIS_PER_HOUR),
        Builtin::TimeSpanTotalMinutes => Value::Double(total_millis(&span(receiver)?) / MILLIS_PER_MINUTE),
        Builtin::TimeSpanTotalSeconds => Value::Double(total_millis(&span(receiver)?) / MILLIS_PER_SECOND),
        Builtin::TimeSpanTotalMilliseconds => Value::Double(total_millis(&span(receiver)?)),
        Builtin::TimeSpanTicks => Value::Int64(ticks(&span(receiver)?)),
        other => return Err(EvalError::Unsupported(format!("{:?} as a property", other))),
    })
}

/// 100-nanosecond intervals in `d`.
fn ticks(d: &Duration) -> i64 {
    d.num_seconds() * 10_000_000 + i64::from(d.subsec_nanos()) / 100
}

fn total_millis(d: &Duration) -> f64 {
    d.num_seconds() as f64 * MILLIS_PER_SECOND + f64::from(d.subsec_nanos()) / 1_000_000.0
}

// ============================================================================
// Methods
// ============================================================================

/// Invoke a predefined method. `receiver` is `Value::Null` for statics and
/// constructors; the caller rejects null instance receivers.
pub(crate) fn call(builtin: Builtin, method: &MethodInfo, receiver: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(match builtin {
        Builtin::ToString => Value::string(receiver.to_string()),
        Builtin::Equals => Value::Boolean(receiver == arg(args, 0)?),
        Builtin::GetHashCode => {
            let mut hasher = rustc_hash::FxHasher::default();
            receiver.hash(&mut hasher);
            Value::Int32(hasher.finish() as i32)
        }

        Builtin::StringChars => {
            let index = int(arg(args, 0)?)?;
            let c = usize::try_from(index)
                .ok()
                .and_then(|i| text(receiver).ok()?.chars().nth(i))
                .ok_or(EvalError::IndexOutOfRange)?;
            Value::Char(c)
        }
        Builtin::StringContains => Value::Boolean(text(receiver)?.contains(text(arg(args, 0)?)?)),
        Builtin::StringStartsWith => Value::Boolean(text(receiver)?.starts_with(text(arg(args, 0)?)?)),
        Builtin::StringEndsWith => Value::Boolean(text(receiver)?.ends_with(text(arg(args, 0)?)?)),
        Builtin::StringIndexOf => {
            let s = text(receiver)?;
            let found = match arg(args, 0)? {
                Value::Char(c) => s.find(*c),
                other => s.find(text(other)?),
            };
            int32(found.map_or(-1, |byte| s[..byte].chars().count() as i64))
        }
        Builtin::StringSubstring => {
            let chars: Vec<char> = text(receiver)?.chars().collect();
            let start = usize::try_from(int(arg(args, 0)?)?).map_err(|_| EvalError::IndexOutOfRange)?;
            let len = match args.get(1) {
                Some(v) => usize::try_from(int(v)?).map_err(|_| EvalError::IndexOutOfRange)?,
                None => chars.len().checked_sub(start).ok_or(EvalError::IndexOutOfRange)?,
            };
            let end = start.checked_add(len).filter(|&e| e <= chars.len()).ok_or(EvalError::IndexOutOfRange)?;
            Value::string(chars[start..end].iter().collect::<String>())
        }
        Builtin::StringToUpper => Value::string(text(receiver)?.to_uppercase()),
        Builtin::StringToLower => Value::string(text(receiver)?.to_lowercase()),
        Builtin::StringTrim => Value::string(text(receiver)?.trim()),
        Builtin::StringReplace => {
            let s = text(receiver)?;
            match (arg(args, 0)?, arg(args, 1)?) {
                (Value::Char(from), Value::Char(to)) => Value::string(s.replace(*from, &to.to_string())),
                (from, to) => {
                    let from = text(from)?;
                    if from.is_empty() {
                        return Err(EvalError::InvalidArgument("String cannot be of zero length".into()));
                    }
                    let to = if to.is_null() { "" } else { text(to)? };
                    Value::string(s.replace(from, to))
                }
            }
        }
        Builtin::StringConcat => Value::string(args.iter().map(|a| a.to_string()).collect::<String>()),
        Builtin::StringCompare => {
            let ordering = match (arg(args, 0)?, arg(args, 1)?) {
                (Value::Null, Value::Null) => Ordering::Equal,
                (Value::Null, _) => Ordering::Less,
                (_, Value::Null) => Ordering::Greater,
                (a, b) => compare_strings(text(a)?, text(b)?),
            };
            Value::Int32(ordering as i32)
        }
        Builtin::StringIsNullOrEmpty => {
            let s = arg(args, 0)?;
            Value::Boolean(s.is_null() || text(s)?.is_empty())
        }

        Builtin::CharIsDigit => Value::Boolean(character(arg(args, 0)?)?.is_numeric()),
        Builtin::CharIsLetter => Value::Boolean(character(arg(args, 0)?)?.is_alphabetic()),
        Builtin::CharIsWhiteSpace => Value::Boolean(character(arg(args, 0)?)?.is_whitespace()),
        Builtin::CharIsUpper => Value::Boolean(character(arg(args, 0)?)?.is_uppercase()),
        Builtin::CharIsLower => Value::Boolean(character(arg(args, 0)?)?.is_lowercase()),
        Builtin::CharToUpper => {
            let c = character(arg(args, 0)?)?;
            Value::Char(c.to_uppercase().next().unwrap_or(c))
        }
        Builtin::CharToLower => {
            let c = character(arg(args, 0)?)?;
            Value::Char(c.to_lowercase().next().unwrap_or(c))
        }

        Builtin::Parse => {
            let ty = method.result.as_ref().ok_or_else(|| EvalError::Unsupported(method.name.clone()))?;
            parse_text(text(arg(args, 0)?)?, ty)?
        }

        Builtin::MathAbs => match arg(args, 0)? {
            Value::SByte(v) => Value::SByte(v.checked_abs().ok_or(EvalError::Overflow)?),
            Value::Int16(v) => Value::Int16(v.checked_abs().ok_or(EvalError::Overflow)?),
            Value::Int32(v) => Value::Int32(v.checked_abs().ok_or(EvalError::Overflow)?),
            Value::Int64(v) => Value::Int64(v.checked_abs().ok_or(EvalError::Overflow)?),
            Value::Single(v) => Value::Single(v.abs()),
            Value::Double(v) => Value::Double(v.abs()),
            Value::Decimal(v) => Value::Decimal(v.abs()),
            other => return Err(unexpected(other, "number")),
        },
        Builtin::MathMax => extreme(arg(args, 0)?, arg(args, 1)?, Ordering::Greater)?,
        Builtin::MathMin => extreme(arg(args, 0)?, arg(args, 1)?, Ordering::Less)?,
        Builtin::MathRound => {
            let x = float(arg(args, 0)?)?;
            let digits = match args.get(1) {
                Some(d) => int(d)?,
                None => 0,
            };
            if !(0..=15).contains(&digits) {
                return Err(EvalError::InvalidArgument("Rounding digits must be between 0 and 15".into()));
            }
            let scale = 10f64.powi(digits);
            Value::Double(round_half_even(x * scale) / scale)
        }
        Builtin::MathFloor => Value::Double(float(arg(args, 0)?)?.floor()),
        Builtin::MathCeiling => Value::Double(float(arg(args, 0)?)?.ceil()),
        Builtin::MathTruncate => Value::Double(float(arg(args, 0)?)?.trunc()),
        Builtin::MathSqrt => Value::Double(float(arg(args, 0)?)?.sqrt()),
        Builtin::MathPow => Value::Double(float(arg(args, 0)?)?.powf(float(arg(args, 1)?)?)),

        Builtin::ConvertToInt32 => {
            let v = to_integral(arg(args, 0)?)?;
            Value::Int32(i32::try_from(v).map_err(|_| EvalError::Overflow)?)
        }
        Builtin::ConvertToInt64 => {
            let v = to_integral(arg(args, 0)?)?;
            Value::Int64(i64::try_from(v).map_err(|_| EvalError::Overflow)?)
        }
        Builtin::ConvertToDouble => match arg(args, 0)? {
            Value::Null => Value::Double(0.0),
            Value::String(s) => parse_text(s, &Type::Double)?,
            other => Value::Double(float(other)?),
        },
        Builtin::ConvertToDecimal => match arg(args, 0)? {
            Value::Null => Value::Decimal(Decimal::ZERO),
            Value::String(s) => parse_text(s, &Type::Decimal)?,
            other => Value::Decimal(other.as_decimal().ok_or(EvalError::Overflow)?),
        },
        Builtin::ConvertToString => Value::string(arg(args, 0)?.to_string()),
        Builtin::ConvertToBoolean => match arg(args, 0)? {
            Value::Null => Value::Boolean(false),
            Value::Int32(v) => Value::Boolean(*v != 0),
            other => parse_text(text(other)?, &Type::Boolean)?,
        },

        Builtin::DateTimeNew => {
            let parts = args.iter().map(int).collect::<EvalResult<Vec<i32>>>()?;
            let (date_parts, time_parts) = parts.split_at(3.min(parts.len()));
            let unit = |v: i32| u32::try_from(v).ok();
            let dt = match (date_parts, time_parts) {
                ([y, m, d], []) => NaiveDate::from_ymd_opt(*y, unit(*m).unwrap_or(0), unit(*d).unwrap_or(0))
                    .and_then(|date| date.and_hms_opt(0, 0, 0)),
                ([y, m, d], [h, mi, s]) => NaiveDate::from_ymd_opt(*y, unit(*m).unwrap_or(0), unit(*d).unwrap_or(0))
                    .and_then(|date| date.and_hms_opt(unit(*h)?, unit(*mi)?, unit(*s)?)),
                _ => None,
            };
            match dt {
                Some(dt) if (1..=9999).contains(&dt.year()) => Value::DateTime(dt),
                _ => {
                    return Err(EvalError::InvalidArgument(
                        "The arguments describe an unrepresentable DateTime".into(),
                    ))
                }
            }
        }
        Builtin::DateTimeAddDays => add_scaled(receiver, arg(args, 0)?, MILLIS_PER_DAY)?,
        Builtin::DateTimeAddHours => add_scaled(receiver, arg(args, 0)?, MILLIS_PER_HOUR)?,
        Builtin::DateTimeAddMinutes => add_scaled(receiver, arg(args, 0)?, MILLIS_PER_MINUTE)?,
        Builtin::DateTimeAddSeconds => add_scaled(receiver, arg(args, 0)?, MILLIS_PER_SECOND)?,
        Builtin::DateTimeAddMilliseconds => add_scaled(receiver, arg(args, 0)?, 1.0)?,
        Builtin::DateTimeAddMonths => add_months(date(receiver)?, int(arg(args, 0)?)?)?,
        Builtin::DateTimeAddYears => {
            let months = int(arg(args, 0)?)?.checked_mul(12).ok_or(EvalError::Overflow)?;
            add_months(date(receiver)?, months)?
        }
        Builtin::DateTimeAdd => checked_date(date(receiver)?.checked_add_signed(span(arg(args, 0)?)?))?,
        Builtin::DateTimeSubtract => {
            let dt = date(receiver)?;
            match arg(args, 0)? {
                Value::DateTime(other) => Value::TimeSpan(dt.signed_duration_since(*other)),
                other => checked_date(dt.checked_sub_signed(span(other)?))?,
            }
        }
        Builtin::DateTimeDaysInMonth => {
            let (year, month) = (int(arg(args, 0)?)?, int(arg(args, 1)?)?);
            let days = u32::try_from(month).ok().and_then(|m| days_in_month(year, m));
            int32(days.ok_or_else(|| EvalError::InvalidArgument("Month must be between 1 and 12".into()))?)
        }
        Builtin::DateTimeIsLeapYear => {
            let year = int(arg(args, 0)?)?;
            if !(1..=9999).contains(&year) {
                return Err(EvalError::InvalidArgument("Year must be between 1 and 9999".into()));
            }
            Value::Boolean(year % 4 == 0 && (year % 100 != 0 || year % 400 == 0))
        }

        Builtin::TimeSpanNew => {
            let d = match args {
                [Value::Int64(t)] => t.checked_mul(100).map(Duration::nanoseconds),
                _ => {
                    let parts = args.iter().map(int).collect::<EvalResult<Vec<i32>>>()?;
                    let (d, h, m, s) = match parts.as_slice() {
                        [h, m, s] => (0, *h, *m, *s),
                        [d, h, m, s] => (*d, *h, *m, *s),
                        _ => return Err(EvalError::Unsupported("TimeSpan constructor".into())),
                    };
                    let seconds = i64::from(d) * 86_400 + i64::from(h) * 3_600 + i64::from(m) * 60 + i64::from(s);
                    Duration::try_seconds(seconds)
                }
            };
            Value::TimeSpan(d.ok_or(EvalError::Overflow)?)
        }
        Builtin::TimeSpanFromDays => Value::TimeSpan(scaled(float(arg(args, 0)?)?, MILLIS_PER_DAY)?),
        Builtin::TimeSpanFromHours => Value::TimeSpan(scaled(float(arg(args, 0)?)?, MILLIS_PER_HOUR)?),
        Builtin::TimeSpanFromMinutes => Value::TimeSpan(scaled(float(arg(args, 0)?)?, MILLIS_PER_MINUTE)?),
        Builtin::TimeSpanFromSeconds => Value::TimeSpan(scaled(float(arg(args, 0)?)?, MILLIS_PER_SECOND)?),
        Builtin::TimeSpanFromMilliseconds => Value::TimeSpan(scaled(float(arg(args, 0)?)?, 1.0)?),
        Builtin::TimeSpanAdd => {
            let sum = span(receiver)?.checked_add(&span(arg(args, 0)?)?);
            Value::TimeSpan(sum.ok_or(EvalError::Overflow)?)
        }
        Builtin::TimeSpanSubtract => {
            let difference = span(receiver)?.checked_sub(&span(arg(args, 0)?)?);
            Value::TimeSpan(difference.ok_or(EvalError::Overflow)?)
        }
        Builtin::TimeSpanNegate => Value::TimeSpan(Duration::zero() - span(receiver)?),
        Builtin::TimeSpanDuration => Value::TimeSpan(span(receiver)?.abs()),

        Builtin::GuidNew => parse_text(text(arg(args, 0)?)?, &Type::Guid)?,

        other => property(other, receiver)?,
    })
}

/// `Math.Max` / `Math.Min`. A NaN operand wins.
fn extreme(a: &Value, b: &Value, keep: Ordering) -> EvalResult<Value> {
    for v in [a, b] {
        if matches!(v, Value::Double(x) if x.is_nan()) || matches!(v, Value::Single(x) if x.is_nan()) {
            return Ok(v.clone());
        }
    }
    let ordering = a.compare(b).ok_or_else(|| unexpected(b, &a.type_of().to_string()))?;
    Ok(if ordering == keep || ordering == Ordering::Equal { a.clone() } else { b.clone() })
}

/// Round to the nearest integer, ties to even.
fn round_half_even(x: f64) -> f64 {
    if (x - x.trunc()).abs() == 0.5 {
        2.0 * (x / 2.0).round()
    } else {
        x.round()
    }
}

/// The integral value `Convert.ToInt32` / `ToInt64` start from.
fn to_integral(value: &Value) -> EvalResult<i128> {
    match value {
        Value::Null => Ok(0),
        Value::Boolean(b) => Ok(i128::from(*b)),
        Value::String(s) => s.trim().parse::<i128>().map_err(|_| EvalError::InvalidFormat(s.to_string())),
        Value::Single(_) | Value::Double(_) => {
            let x = round_half_even(float(value)?);
            if !x.is_finite() || x.abs() > 9.3e18 {
                return Err(EvalError::Overflow);
            }
            Ok(x as i128)
        }
        Value::Decimal(d) => d.round().to_i128().ok_or(EvalError::Overflow),
        other => other.as_i128().ok_or_else(|| unexpected(other, "Int64")),
    }
}

fn scaled(value: f64, millis_per_unit: f64) -> EvalResult<Duration> {
    if value.is_nan() {
        return Err(EvalError::InvalidArgument("The value is not a number".into()));
    }
    let millis = (value * millis_per_unit).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return Err(EvalError::Overflow);
    }
    Duration::try_milliseconds(millis as i64).ok_or(EvalError::Overflow)
}

fn add_scaled(receiver: &Value, amount: &Value, millis_per_unit: f64) -> EvalResult<Value> {
    let d = scaled(float(amount)?, millis_per_unit)?;
    checked_date(date(receiver)?.checked_add_signed(d))
}

fn add_months(dt: NaiveDateTime, months: i32) -> EvalResult<Value> {
    let shifted = if months >= 0 {
        dt.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        dt.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    checked_date(shifted)
}

fn days_in_month(year: i32, month: u32) -> Option<i64> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(next.signed_duration_since(first).num_days())
}

// ============================================================================
// Parsing
// ============================================================================

const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%m/%d/%Y %H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parse `text` as a value of the predefined type `ty`.
pub(crate) fn parse_text(text: &str, ty: &Type) -> EvalResult<Value> {
    let invalid = || EvalError::InvalidFormat(text.to_string());
    let trimmed = text.trim();
    match ty {
        Type::Boolean => {
            if trimmed.eq_ignore_ascii_case("true") {
                Ok(Value::Boolean(true))
            } else if trimmed.eq_ignore_ascii_case("false") {
                Ok(Value::Boolean(false))
            } else {
                Err(invalid())
            }
        }
        Type::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(invalid()),
            }
        }
        Type::DateTime => parse_date_time(trimmed).map(Value::DateTime).ok_or_else(invalid),
        Type::TimeSpan => parse_time_span(trimmed).map(Value::TimeSpan).ok_or_else(invalid),
        Type::Guid => Uuid::parse_str(trimmed).map(Value::Guid).map_err(|_| invalid()),
        t => parse_number(trimmed, t).ok_or_else(invalid),
    }
}

fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    DATE_TIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// `[-]d`, or `[-][d.]hh:mm[:ss[.fffffff]]`.
fn parse_time_span(text: &str) -> Option<Duration> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (days, clock) = match rest.find(':') {
        None => (rest.parse::<i64>().ok()?, ""),
        Some(colon) => match rest[..colon].split_once('.') {
            Some((d, _)) => (d.parse::<i64>().ok()?, &rest[d.len() + 1..]),
            None => (0, rest),
        },
    };
    let mut total = Duration::try_days(days)?;
    if !clock.is_empty() {
        let mut parts = clock.split(':');
        let hours: i64 = parts.next()?.parse().ok()?;
        let minutes: i64 = parts.next()?.parse().ok()?;
        let seconds = parts.next().unwrap_or("0");
        if parts.next().is_some() {
            return None;
        }
        let (whole, fraction) = seconds.split_once('.').unwrap_or((seconds, ""));
        let whole: i64 = whole.parse().ok()?;
        if hours > 23 || minutes > 59 || whole > 59 {
            return None;
        }
        let nanos = if fraction.is_empty() {
            0
        } else {
            if fraction.len() > 7 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            format!("{:0<9}", fraction).parse::<i64>().ok()?
        };
        total = total.checked_add(&Duration::try_seconds(hours * 3_600 + minutes * 60 + whole)?)?;
        total = total.checked_add(&Duration::nanoseconds(nanos))?;
    }
    Some(if negative { Duration::zero() - total } else { total })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_even() {
        assert_eq!(round_half_even(2.5), 2.0);
        assert_eq!(round_half_even(3.5), 4.0);
        assert_eq!(round_half_even(-2.5), -2.0);
        assert_eq!(round_half_even(2.4), 2.0);
    }

    #[test]
    fn test_parse_time_span_forms() {
        assert_eq!(parse_time_span("1.02:00:00"), Some(Duration::hours(26)));
        assert_eq!(parse_time_span("00:30"), Some(Duration::minutes(30)));
        assert_eq!(parse_time_span("-00:00:01.5"), Some(Duration::milliseconds(-1500)));
        assert_eq!(parse_time_span("3"), Some(Duration::days(3)));
        assert_eq!(parse_time_span("25:00:00"), None);
    }

    #[test]
    fn test_parse_date_time_forms() {
        let expected = NaiveDate::from_ymd_opt(2020, 3, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
        assert_eq!(parse_date_time("2020-03-01"), expected);
        assert_eq!(parse_date_time("03/01/2020"), expected);
        assert!(parse_date_time("2020-03-01T10:15:00").is_some());
        assert!(parse_date_time("yesterday").is_none());
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2020, 2), Some(29));
        assert_eq!(days_in_month(2021, 2), Some(28));
        assert_eq!(days_in_month(2021, 12), Some(31));
        assert_eq!(days_in_month(2021, 13), None);
    }

    #[test]
    fn test_text_positions_count_characters() {
        let receiver = Value::string("héllo");
        let method = MethodInfo::builtin("IndexOf", &[Type::String], Type::Int32, false, Builtin::StringIndexOf);
        let found = call(Builtin::StringIndexOf, &method, &receiver, &[Value::string("l")]).unwrap();
        assert_eq!(found, Value::Int32(2));
    }
}
