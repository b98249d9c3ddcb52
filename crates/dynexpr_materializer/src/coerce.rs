//! Scalar leaf inference.
//!
//! Every leaf is judged by its printed text, whatever JSON type it was
//! decoded as. `true` prints as `True`, which is neither numeric nor a
//! GUID, so booleans stay text.

use dynexpr_types::{Type, Value};
use uuid::Uuid;

/// The text a scalar leaf prints as, or `None` for JSON null.
pub fn leaf_text(node: &serde_json::Value) -> Option<String> {
    match node {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(true) => Some("True".to_string()),
        serde_json::Value::Bool(false) => Some("False".to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Infer the type and value of a scalar leaf: `Double` if the text parses
/// as a number, else `Guid`, else `String`. Null is a `String` leaf with a
/// null value.
pub fn coerce_leaf(node: &serde_json::Value) -> (Type, Value) {
    let Some(text) = leaf_text(node) else {
        return (Type::String, Value::Null);
    };
    if let Some(v) = parse_double(&text) {
        return (Type::Double, Value::Double(v));
    }
    if let Some(g) = parse_guid(&text) {
        return (Type::Guid, Value::Guid(g));
    }
    (Type::String, Value::string(text))
}

/// Parse a GUID in one of its five printed forms: 32 digits, hyphenated,
/// hyphenated in braces or parentheses, or the hex-field form
/// `{0x00000000,0x0000,0x0000,{0x00,0x00,0x00,0x00,0x00,0x00,0x00,0x00}}`.
/// URNs are not GUID text.
pub fn parse_guid(text: &str) -> Option<Uuid> {
    let t = text.trim();
    if let Some(inner) = t.strip_prefix('(') {
        let inner = inner.strip_suffix(')')?;
        return (inner.len() == 36).then(|| Uuid::try_parse(inner).ok()).flatten();
    }
    if t.starts_with("{0x") || t.starts_with("{0X") {
        return parse_hex_fields(t);
    }
    match t.len() {
        // simple, hyphenated, braced
        32 | 36 | 38 => Uuid::try_parse(t).ok(),
        _ => None,
    }
}

fn parse_hex_fields(text: &str) -> Option<Uuid> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let body = compact.strip_prefix('{')?.strip_suffix("}}")?;
    let (head, tail) = body.split_once(",{")?;
    let head: Vec<&str> = head.split(',').collect();
    let tail: Vec<&str> = tail.split(',').collect();
    if head.len() != 3 || tail.len() != 8 {
        return None;
    }
    let d1 = u32::from_str_radix(hex_field(head[0], 8)?, 16).ok()?;
    let d2 = u16::from_str_radix(hex_field(head[1], 4)?, 16).ok()?;
    let d3 = u16::from_str_radix(hex_field(head[2], 4)?, 16).ok()?;
    let mut d4 = [0u8; 8];
    for (byte, field) in d4.iter_mut().zip(&tail) {
        *byte = u8::from_str_radix(hex_field(field, 2)?, 16).ok()?;
    }
    Some(Uuid::from_fields(d1, d2, d3, &d4))
}

/// The digits of a `0x`-prefixed field of at most `width` hex digits.
fn hex_field(field: &str, width: usize) -> Option<&str> {
    let digits = field.strip_prefix("0x").or_else(|| field.strip_prefix("0X"))?;
    let valid = !digits.is_empty() && digits.len() <= width && digits.bytes().all(|b| b.is_ascii_hexdigit());
    valid.then_some(digits)
}

/// Parse a floating-point number: optional surrounding whitespace, a
/// leading sign, thousands separators in the integral part, a fraction and
/// an exponent. `NaN`, `Infinity` and `-Infinity` are accepted by name.
pub fn parse_double(text: &str) -> Option<f64> {
    let t = text.trim();
    match t {
        "NaN" => return Some(f64::NAN),
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    let integral_end = t.find(['.', 'e', 'E']).unwrap_or(t.len());
    let (integral, rest) = t.split_at(integral_end);
    let unsigned = integral.trim_start_matches(['+', '-']);
    if unsigned.starts_with(',') || integral.ends_with(',') {
        return None;
    }
    let digits: String = integral.chars().filter(|c| *c != ',').collect();
    let body: String = digits + rest;
    let has_digit = body.bytes().any(|b| b.is_ascii_digit());
    let well_formed = body
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !has_digit || !well_formed {
        return None;
    }
    body.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_text_becomes_double() {
        assert_eq!(coerce_leaf(&json!("42")), (Type::Double, Value::Double(42.0)));
        assert_eq!(coerce_leaf(&json!(1.5)), (Type::Double, Value::Double(1.5)));
        assert_eq!(coerce_leaf(&json!(" -3e2 ")), (Type::Double, Value::Double(-300.0)));
    }

    #[test]
    fn test_boolean_stays_text() {
        assert_eq!(coerce_leaf(&json!(true)), (Type::String, Value::string("True")));
        assert_eq!(coerce_leaf(&json!("True")), (Type::String, Value::string("True")));
    }

    #[test]
    fn test_guid_text() {
        let (ty, value) = coerce_leaf(&json!("3fa85f64-5717-4562-b3fc-2c963f66afa6"));
        assert_eq!(ty, Type::Guid);
        assert_eq!(value.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    }

    #[test]
    fn test_guid_forms() {
        let id = Uuid::parse_str("3fa85f64-5717-4562-b3fc-2c963f66afa6").unwrap();
        for text in [
            "3fa85f6457174562b3fc2c963f66afa6",
            "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "{3fa85f64-5717-4562-b3fc-2c963f66afa6}",
            "(3fa85f64-5717-4562-b3fc-2c963f66afa6)",
            " {0x3fa85f64,0x5717,0x4562,{0xb3,0xfc,0x2c,0x96,0x3f,0x66,0xaf,0xa6}} ",
            "{0x3fa85f64, 0x5717, 0x4562, {0xb3, 0xfc, 0x2c, 0x96, 0x3f, 0x66, 0xaf, 0xa6}}",
        ] {
            assert_eq!(parse_guid(text), Some(id), "{}", text);
        }
    }

    #[test]
    fn test_guid_rejects_other_shapes() {
        assert_eq!(parse_guid("urn:uuid:3fa85f64-5717-4562-b3fc-2c963f66afa6"), None);
        assert_eq!(parse_guid("(3fa85f64-5717-4562-b3fc-2c963f66afa6"), None);
        assert_eq!(parse_guid("(3fa85f6457174562b3fc2c963f66afa6)"), None);
        assert_eq!(parse_guid("{0x3fa85f64,0x5717,0x4562,{0xb3,0xfc}}"), None);
        assert_eq!(parse_guid("{0x3fa85f641,0x5717,0x4562,{0xb3,0xfc,0x2c,0x96,0x3f,0x66,0xaf,0xa6}}"), None);
        assert_eq!(
            coerce_leaf(&json!("urn:uuid:3fa85f64-5717-4562-b3fc-2c963f66afa6")).0,
            Type::String
        );
    }

    #[test]
    fn test_null_leaf() {
        assert_eq!(coerce_leaf(&json!(null)), (Type::String, Value::Null));
    }

    #[test]
    fn test_parse_double_forms() {
        assert_eq!(parse_double("1,234.5"), Some(1234.5));
        assert_eq!(parse_double("Infinity"), Some(f64::INFINITY));
        assert!(parse_double("NaN").is_some_and(f64::is_nan));
        assert_eq!(parse_double("inf"), None);
        assert_eq!(parse_double("1.2.3"), None);
        assert_eq!(parse_double(""), None);
        assert_eq!(parse_double(",5"), None);
    }
}
