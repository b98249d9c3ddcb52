use dynexpr_types::value::{format_double, format_time_span};
use dynexpr_types::Value;
use serde_json::{Map, Number};

/// Render a runtime value as JSON.
///
/// Records become objects in field order and host instances objects of
/// their member values. Dates, time spans, GUIDs and chars are strings;
/// enums are their member name when they have one. Non-finite doubles
/// have no JSON number form and are printed as text. Decimals are written
/// as the nearest double.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Char(c) => serde_json::Value::String(c.to_string()),
        Value::String(s) => serde_json::Value::String(s.to_string()),
        Value::SByte(v) => (*v).into(),
        Value::Byte(v) => (*v).into(),
        Value::Int16(v) => (*v).into(),
        Value::UInt16(v) => (*v).into(),
        Value::Int32(v) => (*v).into(),
        Value::UInt32(v) => (*v).into(),
        Value::Int64(v) => (*v).into(),
        Value::UInt64(v) => (*v).into(),
        Value::Single(v) => float(f64::from(*v)),
        Value::Double(v) => float(*v),
        Value::Decimal(_) => value.as_f64().map_or(serde_json::Value::Null, float),
        Value::DateTime(dt) => serde_json::Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
        Value::TimeSpan(d) => serde_json::Value::String(format_time_span(d)),
        Value::Guid(g) => serde_json::Value::String(g.hyphenated().to_string()),
        Value::Enum(e, v) => match e.name_of(*v) {
            Some(name) => serde_json::Value::String(name.to_string()),
            None => (*v).into(),
        },
        Value::Record(r) => {
            let map: Map<String, serde_json::Value> = r
                .record_type()
                .properties()
                .iter()
                .zip(r.fields())
                .map(|(p, v)| (p.name.clone(), to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
        Value::Sequence(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Instance(i) => match &i.items {
            Some(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
            None => serde_json::Value::Object(i.members().map(|(k, v)| (k.to_string(), to_json(v))).collect()),
        },
    }
}

fn float(v: f64) -> serde_json::Value {
    Number::from_f64(v).map_or_else(|| serde_json::Value::String(format_double(v)), serde_json::Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert_eq!(to_json(&Value::Int32(3)), json!(3));
        assert_eq!(to_json(&Value::Double(1.5)), json!(1.5));
        assert_eq!(to_json(&Value::Double(f64::NAN)), json!("NaN"));
        assert_eq!(to_json(&Value::Null), json!(null));
        assert_eq!(to_json(&Value::Decimal(dynexpr_types::Decimal::new(125, 2))), json!(1.25));
        assert_eq!(to_json(&Value::TimeSpan(Duration::minutes(90))), json!("01:30:00"));
    }

    #[test]
    fn test_sequences() {
        let value = Value::sequence(vec![Value::string("a"), Value::Boolean(true)]);
        assert_eq!(to_json(&value), json!(["a", true]));
    }
}
