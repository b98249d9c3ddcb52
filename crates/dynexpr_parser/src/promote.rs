//! Literal tracking and expression promotion.

use dynexpr_ast::{Expr, ExprRef};
use dynexpr_types::conversion::{is_compatible_with, parse_number, parse_enum};
use dynexpr_types::{Type, Value};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Constants created from literal tokens, keyed by node identity, with the
/// text they were parsed from.
///
/// A tracked literal promotes by re-reading its text in the target type,
/// so `5` becomes a `Byte` constant and `"Red"` an enum member instead of
/// a conversion of the already-typed value.
pub struct LiteralRegistry {
    literals: FxHashMap<usize, (ExprRef, String)>,
    null_literal: ExprRef,
}

#[inline]
fn key(expr: &ExprRef) -> usize {
    Arc::as_ptr(expr) as usize
}

impl LiteralRegistry {
    pub fn new() -> Self {
        Self {
            literals: FxHashMap::default(),
            null_literal: Expr::constant(Value::Null, Type::Object),
        }
    }

    /// The one `null` node of this parse.
    pub fn null_literal(&self) -> ExprRef {
        self.null_literal.clone()
    }

    #[inline]
    pub fn is_null_literal(&self, expr: &ExprRef) -> bool {
        Arc::ptr_eq(expr, &self.null_literal)
    }

    pub fn create(&mut self, value: Value, text: impl Into<String>) -> ExprRef {
        let ty = value.type_of();
        let expr = Expr::constant(value, ty);
        self.literals.insert(key(&expr), (expr.clone(), text.into()));
        expr
    }

    pub fn text_of(&self, expr: &ExprRef) -> Option<&str> {
        self.literals.get(&key(expr)).map(|(_, text)| text.as_str())
    }

    /// Convert `expr` to `target`, or `None` when no implicit conversion
    /// exists. With `exact` the result always has type `target`; otherwise
    /// a reference-typed target accepts the expression unchanged.
    pub fn promote(&self, expr: &ExprRef, target: &Type, exact: bool) -> Option<ExprRef> {
        if &expr.ty == target {
            return Some(expr.clone());
        }
        if self.is_null_literal(expr) {
            if !target.is_value_type() || target.is_nullable() {
                return Some(Expr::constant(Value::Null, target.clone()));
            }
        } else if let Some(text) = self.text_of(expr) {
            let inner = target.non_nullable();
            let value = match expr.ty {
                Type::Int32 | Type::UInt32 | Type::Int64 | Type::UInt64 => parse_number(text, inner),
                Type::Double if *inner == Type::Decimal => parse_number(text, inner),
                Type::String => parse_enum(text, inner),
                _ => None,
            };
            if let Some(value) = value {
                return Some(Expr::constant(value, target.clone()));
            }
        }
        if is_compatible_with(&expr.ty, target) {
            if target.is_value_type() || exact {
                return Some(Expr::convert(expr.clone(), target.clone()));
            }
            return Some(expr.clone());
        }
        None
    }
}

impl Default for LiteralRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynexpr_ast::ExprKind;
    use dynexpr_types::{Decimal, EnumType};

    #[test]
    fn test_literal_reparses_in_narrow_target() {
        let mut lits = LiteralRegistry::new();
        let five = lits.create(Value::Int32(5), "5");
        let promoted = lits.promote(&five, &Type::Byte, false).unwrap();
        assert_eq!(promoted.ty, Type::Byte);
        assert_eq!(promoted.as_constant(), Some(&Value::Byte(5)));
    }

    #[test]
    fn test_real_literal_reparses_as_decimal() {
        let mut lits = LiteralRegistry::new();
        let price = lits.create(Value::Double(0.1), "0.10");
        let promoted = lits.promote(&price, &Type::nullable(Type::Decimal), false).unwrap();
        assert_eq!(promoted.ty, Type::nullable(Type::Decimal));
        assert_eq!(promoted.as_constant(), Some(&Value::Decimal(Decimal::new(10, 2))));

        let big = lits.create(Value::Double(1e3), "1e3");
        assert!(lits.promote(&big, &Type::Decimal, false).is_none());
        let computed = Expr::constant(Value::Double(0.1), Type::Double);
        assert!(lits.promote(&computed, &Type::Decimal, false).is_none());
    }

    #[test]
    fn test_string_literal_promotes_to_enum_member() {
        let mut lits = LiteralRegistry::new();
        let color = EnumType::new("Color", Type::Int32, &[("Red", 0), ("Green", 1)]);
        let green = lits.create(Value::string("green"), "green");
        let promoted = lits.promote(&green, &Type::Enum(color.clone()), false).unwrap();
        assert_eq!(promoted.as_constant(), Some(&Value::Enum(color, 1)));
    }

    #[test]
    fn test_null_literal_needs_nullable_target() {
        let lits = LiteralRegistry::new();
        let null = lits.null_literal();
        assert!(lits.promote(&null, &Type::String, false).is_some());
        assert!(lits.promote(&null, &Type::nullable(Type::Int32), false).is_some());
        assert!(lits.promote(&null, &Type::Int32, false).is_none());
    }

    #[test]
    fn test_untracked_value_is_converted() {
        let lits = LiteralRegistry::new();
        let x = Expr::constant(Value::Int32(1), Type::Int32);
        let widened = lits.promote(&x, &Type::Int64, false).unwrap();
        assert!(matches!(widened.kind, ExprKind::Convert { checked: false, .. }));
        assert!(lits.promote(&x, &Type::Int16, false).is_none());
    }

    #[test]
    fn test_reference_target_keeps_expression_unless_exact() {
        let lits = LiteralRegistry::new();
        let s = Expr::constant(Value::string("a"), Type::String);
        let same = lits.promote(&s, &Type::Object, false).unwrap();
        assert!(Arc::ptr_eq(&same, &s));
        let exact = lits.promote(&s, &Type::Object, true).unwrap();
        assert_eq!(exact.ty, Type::Object);
    }
}
