//! Parser integration tests.
//!
//! Verifies literal typing, operator resolution, overload resolution,
//! identifier binding, projections and aggregates, and the error reported
//! for each kind of rejected expression.

use dynexpr_ast::{AggregateOp, BinaryOp, ExprKind, ExprRef, ParameterExpr, UnaryOp};
use dynexpr_diagnostics::{messages, DiagnosticMessage, ParseError};
use dynexpr_parser::{parse, parse_lambda, parse_lambda_it, parse_ordering, External, Parser};
use dynexpr_types::{ClassType, EnumType, HostFn, Type, TypeFactory, Value};
use indexmap::IndexMap;
use std::sync::Arc;

/// Helper: parse text with no parameters.
fn parse_expr(text: &str) -> ExprRef {
    let factory = TypeFactory::new();
    parse(&factory, None, text, &[], &[]).unwrap()
}

/// Helper: parse text over the given named parameters.
fn parse_with(params: &[(&str, Type)], text: &str) -> Result<ExprRef, ParseError> {
    let factory = TypeFactory::new();
    let params: Vec<_> = params.iter().map(|(n, t)| ParameterExpr::new(*n, t.clone())).collect();
    parse(&factory, None, text, &params, &[])
}

/// Helper: parse text that must fail, returning the error.
fn parse_error(params: &[(&str, Type)], text: &str) -> ParseError {
    match parse_with(params, text) {
        Ok(expr) => panic!("expected {:?} to fail, got {}", text, expr),
        Err(e) => e,
    }
}

fn assert_error(params: &[(&str, Type)], text: &str, expected: &DiagnosticMessage) {
    let err = parse_error(params, text);
    assert!(err.is(expected), "{:?}: unexpected error {}", text, err);
}

fn host_fn() -> HostFn {
    Arc::new(|_: &Value, _: &[Value]| -> Result<Value, String> { Ok(Value::Int32(0)) })
}

fn person() -> Type {
    Type::Class(
        ClassType::builder("Person")
            .property("Name", Type::String)
            .property("Age", Type::Int32)
            .property("Scores", Type::array(Type::Int32))
            .build(),
    )
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_small_integer_is_int32() {
    let expr = parse_expr("123");
    assert_eq!(expr.ty, Type::Int32);
    assert_eq!(expr.as_constant(), Some(&Value::Int32(123)));
}

#[test]
fn test_integer_narrows_to_smallest_fit() {
    assert_eq!(parse_expr("2147483648").ty, Type::UInt32);
    assert_eq!(parse_expr("4294967296").ty, Type::Int64);
    assert_eq!(parse_expr("18446744073709551615").ty, Type::UInt64);
}

#[test]
fn test_negative_literal_is_folded() {
    let expr = parse_expr("-123");
    assert!(matches!(expr.kind, ExprKind::Constant(Value::Int32(-123))));

    let floor = parse_expr("-2147483648");
    assert_eq!(floor.as_constant(), Some(&Value::Int32(i32::MIN)));
    assert_eq!(parse_expr("-2147483649").ty, Type::Int64);
}

#[test]
fn test_unary_minus_on_non_literal_negates() {
    let expr = parse_with(&[("x", Type::Int32)], "-x").unwrap();
    assert!(matches!(expr.kind, ExprKind::Unary { op: UnaryOp::Negate, .. }));
}

#[test]
fn test_real_literals() {
    assert_eq!(parse_expr("1.5").ty, Type::Double);
    assert_eq!(parse_expr("1e3").as_constant(), Some(&Value::Double(1000.0)));
    assert_eq!(parse_expr("2.5f").as_constant(), Some(&Value::Single(2.5)));
    assert_eq!(parse_expr("-0.5").as_constant(), Some(&Value::Double(-0.5)));
}

#[test]
fn test_integer_overflow_is_rejected() {
    let err = parse_error(&[], "99999999999999999999");
    assert!(err.is(&messages::INVALID_INTEGER_LITERAL));
    assert_eq!(err.message, "Invalid integer literal '99999999999999999999'");
}

#[test]
fn test_string_and_char_literals() {
    assert_eq!(parse_expr(r#""it""s""#).as_constant(), Some(&Value::string("it\"s")));
    assert_eq!(parse_expr("'a'").as_constant(), Some(&Value::Char('a')));
    assert_eq!(parse_expr("''''").as_constant(), Some(&Value::Char('\'')));
    assert_error(&[], "'ab'", &messages::INVALID_CHARACTER_LITERAL);
}

#[test]
fn test_keywords_ignore_case() {
    assert_eq!(parse_expr("TRUE").as_constant(), Some(&Value::Boolean(true)));
    assert_eq!(parse_expr("False").as_constant(), Some(&Value::Boolean(false)));
    assert_eq!(parse_expr("null").as_constant(), Some(&Value::Null));
}

#[test]
fn test_result_type_reparses_literal() {
    let factory = TypeFactory::new();
    let expr = parse(&factory, Some(&Type::Byte), "5", &[], &[]).unwrap();
    assert_eq!(expr.as_constant(), Some(&Value::Byte(5)));

    let widened = parse(&factory, Some(&Type::Double), "5", &[], &[]).unwrap();
    assert_eq!(widened.ty, Type::Double);
}

#[test]
fn test_result_type_mismatch() {
    let factory = TypeFactory::new();
    let err = parse(&factory, Some(&Type::Int32), r#""x""#, &[], &[]).unwrap_err();
    assert!(err.is(&messages::EXPRESSION_TYPE_MISMATCH));
    assert_eq!(err.message, "Expression of type 'Int32' expected");
    assert_eq!(err.offset, 0);
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_integer_addition() {
    let expr = parse_expr("1 + 2");
    assert_eq!(expr.ty, Type::Int32);
    assert!(matches!(expr.kind, ExprKind::Binary { op: BinaryOp::Add, .. }));
}

#[test]
fn test_text_plus_is_concatenation() {
    let expr = parse_expr(r#""a" + "b""#);
    assert_eq!(expr.ty, Type::String);
    match &expr.kind {
        ExprKind::Call { method, .. } => assert_eq!(method.name, "Concat"),
        other => panic!("expected a Concat call, got {:?}", other),
    }
}

#[test]
fn test_concatenation_boxes_value_operands() {
    let expr = parse_expr(r#""n" & 1"#);
    assert_eq!(expr.to_string(), r#"String.Concat("n", Convert(1, Object))"#);
}

#[test]
fn test_precedence_and_associativity() {
    assert_eq!(parse_expr("1 + 2 * 3").to_string(), "(1 + (2 * 3))");
    assert_eq!(parse_expr("1 - 2 - 3").to_string(), "((1 - 2) - 3)");
    assert_eq!(parse_expr("(1 + 2) * 3").to_string(), "((1 + 2) * 3)");
    assert_eq!(parse_expr("7 mod 2 = 1").to_string(), "((7 % 2) == 1)");
}

#[test]
fn test_mixed_numeric_operands_widen() {
    let expr = parse_with(&[("x", Type::Int32), ("y", Type::Int64)], "x + y").unwrap();
    assert_eq!(expr.ty, Type::Int64);
    assert_eq!(expr.to_string(), "(Convert(x, Int64) + y)");
}

#[test]
fn test_nullable_operands_lift() {
    let n = Type::nullable(Type::Int32);
    assert_eq!(parse_with(&[("n", n.clone())], "n + 1").unwrap().ty, n);
    assert_eq!(parse_with(&[("n", n.clone())], "n == null").unwrap().ty, Type::Boolean);
}

#[test]
fn test_logical_word_operators() {
    let expr = parse_expr("true and not false or false");
    assert_eq!(expr.ty, Type::Boolean);
    assert!(matches!(expr.kind, ExprKind::Binary { op: BinaryOp::OrElse, .. }));
}

#[test]
fn test_string_relational_uses_compare() {
    let expr = parse_expr(r#""a" < "b""#);
    assert_eq!(expr.ty, Type::Boolean);
    assert_eq!(expr.to_string(), r#"(String.Compare("a", "b") < 0)"#);
}

#[test]
fn test_reference_equality_converts_to_assignable_side() {
    let expr = parse_expr(r#""a" == null"#);
    assert_eq!(expr.ty, Type::Boolean);
}

#[test]
fn test_enum_compares_with_member_name() {
    let color = EnumType::new("Color", Type::Int32, &[("Red", 0), ("Green", 1)]);
    let expr = parse_with(&[("c", Type::Enum(color.clone()))], r#"c == "Green""#).unwrap();
    match &expr.kind {
        ExprKind::Binary { right, .. } => assert_eq!(right.as_constant(), Some(&Value::Enum(color, 1))),
        other => panic!("expected a comparison, got {:?}", other),
    }
}

#[test]
fn test_enum_compares_with_underlying_integer() {
    let color = EnumType::new("Color", Type::Int32, &[("Red", 0), ("Green", 1)]);
    let params = [("c", Type::Enum(color.clone())), ("i", Type::Int32), ("l", Type::Int64)];
    assert_eq!(parse_with(&params, "c == i").unwrap().ty, Type::Boolean);
    assert_eq!(parse_with(&params, "i != c").unwrap().ty, Type::Boolean);
    assert_error(&params, "c == l", &messages::INCOMPATIBLE_OPERANDS);
}

#[test]
fn test_decimal_operators() {
    let params = [("d", Type::Decimal), ("x", Type::Double), ("n", Type::nullable(Type::Decimal))];
    assert_eq!(parse_with(&params, "d + 1").unwrap().ty, Type::Decimal);
    assert_eq!(parse_with(&params, "d * 1.5").unwrap().ty, Type::Decimal);
    assert_eq!(parse_with(&params, "-d").unwrap().ty, Type::Decimal);
    assert_eq!(parse_with(&params, "n - d").unwrap().ty, Type::nullable(Type::Decimal));
    assert_eq!(parse_with(&params, "d > 0.25").unwrap().ty, Type::Boolean);
    assert_error(&params, "d + x", &messages::INCOMPATIBLE_OPERANDS);
    assert_error(&params, "d * 1e3", &messages::INCOMPATIBLE_OPERANDS);

    let prices = [("prices", Type::array(Type::Decimal))];
    assert_eq!(parse_with(&prices, "prices.Sum(it)").unwrap().ty, Type::Decimal);
    assert_eq!(parse_with(&prices, "prices.Average(it)").unwrap().ty, Type::Decimal);
    assert_eq!(parse_expr("Decimal.MaxValue").ty, Type::Decimal);
    assert_eq!(parse_expr("Convert.ToDecimal(\"2.5\")").ty, Type::Decimal);
}

#[test]
fn test_date_operators_use_own_tables() {
    let params = [("a", Type::DateTime), ("b", Type::DateTime), ("s", Type::TimeSpan)];
    assert_eq!(parse_with(&params, "a - b").unwrap().ty, Type::TimeSpan);
    assert_eq!(parse_with(&params, "a + s").unwrap().ty, Type::DateTime);
    assert_eq!(parse_with(&params, "a - s").unwrap().ty, Type::DateTime);
    assert_eq!(parse_with(&params, "a < b").unwrap().ty, Type::Boolean);
}

#[test]
fn test_incompatible_operands() {
    let err = parse_error(&[], "1 + true");
    assert!(err.is(&messages::INCOMPATIBLE_OPERANDS));
    assert_eq!(err.message, "Operator '+' incompatible with operand types 'Int32' and 'Boolean'");
    assert_eq!(err.offset, 2);
}

#[test]
fn test_incompatible_unary_operand() {
    assert_error(&[], "-true", &messages::INCOMPATIBLE_OPERAND);
    assert_error(&[("s", Type::String)], "!s", &messages::INCOMPATIBLE_OPERAND);
}

// ============================================================================
// Conditionals
// ============================================================================

#[test]
fn test_conditional_with_equal_branches() {
    assert_eq!(parse_expr("true ? 1 : 2").ty, Type::Int32);
    assert_eq!(parse_expr("iif(true, 1, 2)").ty, Type::Int32);
}

#[test]
fn test_conditional_promotes_one_branch() {
    assert_eq!(parse_expr("true ? 1 : 4294967296").ty, Type::Int64);
    assert_eq!(parse_expr(r#"false ? null : "x""#).ty, Type::String);
}

#[test]
fn test_conditional_branches_must_reconcile() {
    let err = parse_error(&[], r#"true ? 1 : "x""#);
    assert!(err.is(&messages::NEITHER_TYPE_CONVERTS_TO_OTHER));
    assert_eq!(err.message, "Neither of the types 'Int32' and 'String' converts to the other");
}

#[test]
fn test_conditional_test_must_be_boolean() {
    assert_error(&[], "1 ? 2 : 3", &messages::FIRST_EXPR_MUST_BE_BOOL);
}

#[test]
fn test_iif_arity() {
    let err = parse_error(&[], "iif(true, 1)");
    assert!(err.is(&messages::IIF_REQUIRES_THREE_ARGS));
    assert_eq!(err.offset, 0);
}

// ============================================================================
// Methods and Overloads
// ============================================================================

#[test]
fn test_unique_overload() {
    let expr = parse_expr("Math.Max(1, 2)");
    assert_eq!(expr.ty, Type::Int32);
    assert_eq!(parse_expr("Math.Max(1, 2.5)").ty, Type::Double);
}

#[test]
fn test_no_applicable_overload() {
    let err = parse_error(&[], r#"Math.Max("a", 1)"#);
    assert!(err.is(&messages::NO_APPLICABLE_METHOD));
    assert_eq!(err.message, "No applicable method 'Max' exists in type 'Math'");
}

#[test]
fn test_ambiguous_overload() {
    let widget = ClassType::builder("Widget")
        .method("M", &[Type::Int64, Type::Int32], Some(Type::Int32), host_fn())
        .method("M", &[Type::Int32, Type::Int64], Some(Type::Int32), host_fn())
        .build();
    let err = parse_error(&[("w", Type::Class(widget))], "w.M(1, 1)");
    assert!(err.is(&messages::AMBIGUOUS_METHOD_INVOCATION));
}

#[test]
fn test_host_methods_are_inaccessible() {
    let widget = ClassType::builder("Widget")
        .method("M", &[Type::Int32], Some(Type::Int32), host_fn())
        .build();
    let err = parse_error(&[("w", Type::Class(widget))], "w.M(1)");
    assert!(err.is(&messages::METHODS_ARE_INACCESSIBLE));
    assert_eq!(err.message, "Methods on type 'Widget' are not accessible");
}

#[test]
fn test_inherited_object_methods() {
    let expr = parse_with(&[("x", Type::Int32)], "x.ToString()").unwrap();
    assert_eq!(expr.ty, Type::String);
    let expr = parse_with(&[("s", Type::String)], "s.Contains(\"a\") and s.Length > 2").unwrap();
    assert_eq!(expr.ty, Type::Boolean);
}

#[test]
fn test_unknown_property() {
    let err = parse_error(&[("s", Type::String)], "s.Size");
    assert!(err.is(&messages::UNKNOWN_PROPERTY_OR_FIELD));
    assert_eq!(err.message, "No property or field 'Size' exists in type 'String'");
    assert_eq!(err.offset, 2);
}

// ============================================================================
// Types
// ============================================================================

#[test]
fn test_static_member_access() {
    let expr = parse_expr("Int32.MaxValue");
    assert_eq!(expr.ty, Type::Int32);
    assert_eq!(parse_expr("Math.PI").ty, Type::Double);
}

#[test]
fn test_constructor_call() {
    let expr = parse_expr("DateTime(2020, 1, 31)");
    assert_eq!(expr.ty, Type::DateTime);
    assert!(matches!(expr.kind, ExprKind::New { .. }));
}

#[test]
fn test_single_argument_conversion() {
    let expr = parse_with(&[("x", Type::Int64)], "Int32(x)").unwrap();
    assert!(matches!(expr.kind, ExprKind::Convert { checked: true, .. }));
    assert_eq!(parse_expr("Int32?(5)").ty, Type::nullable(Type::Int32));
    assert_error(&[], r#"Int32("a")"#, &messages::CANNOT_CONVERT_VALUE);
}

#[test]
fn test_reference_type_has_no_nullable_form() {
    let err = parse_error(&[], "String?(null)");
    assert!(err.is(&messages::TYPE_HAS_NO_NULLABLE_FORM));
    assert_eq!(err.message, "Type 'String' has no nullable form");
}

#[test]
fn test_no_matching_constructor() {
    assert_error(&[], "DateTime(1, 2)", &messages::NO_MATCHING_CONSTRUCTOR);
}

// ============================================================================
// Identifiers and Scope
// ============================================================================

#[test]
fn test_unknown_identifier() {
    let err = parse_error(&[], "foo + 1");
    assert!(err.is(&messages::UNKNOWN_IDENTIFIER));
    assert_eq!(err.message, "Unknown identifier 'foo'");
    assert_eq!(err.offset, 0);
}

#[test]
fn test_it_resolves_bare_members() {
    let factory = TypeFactory::new();
    let lambda = parse_lambda_it(&factory, person(), None, "Age > 18 and it.Name != null", &[]).unwrap();
    assert_eq!(lambda.result_type(), &Type::Boolean);
    assert_eq!(lambda.parameters.len(), 1);
}

#[test]
fn test_no_it_in_scope() {
    assert_error(&[], "it", &messages::NO_IT_IN_SCOPE);
}

#[test]
fn test_duplicate_parameter_names() {
    let err = parse_error(&[("x", Type::Int32), ("X", Type::Int32)], "x");
    assert!(err.is(&messages::DUPLICATE_IDENTIFIER));
    assert_eq!(err.offset, 0);
}

#[test]
fn test_symbols_ignore_case() {
    let expr = parse_with(&[("Total", Type::Double)], "total * 2").unwrap();
    assert_eq!(expr.ty, Type::Double);
}

#[test]
fn test_positional_values() {
    let factory = TypeFactory::new();
    let values = [External::from(Value::Int32(5)), External::from(Value::string("x"))];
    let expr = parse(&factory, None, "@0 + 1", &[], &values).unwrap();
    assert_eq!(expr.ty, Type::Int32);
    let expr = parse(&factory, None, "@1.Length", &[], &values).unwrap();
    assert_eq!(expr.ty, Type::Int32);
}

#[test]
fn test_external_symbol_table_is_case_sensitive() {
    let factory = TypeFactory::new();
    let mut table = IndexMap::new();
    table.insert("limit".to_string(), External::from(Value::Int32(10)));
    let values = [External::Symbols(table)];
    assert!(parse(&factory, None, "limit * 2", &[], &values).is_ok());
    let err = parse(&factory, None, "LIMIT * 2", &[], &values).unwrap_err();
    assert!(err.is(&messages::UNKNOWN_IDENTIFIER));
}

#[test]
fn test_lambda_symbol_is_invoked() {
    let factory = TypeFactory::new();
    let twice = parse_lambda(&factory, vec![ParameterExpr::new("x", Type::Int32)], None, "x * 2", &[]).unwrap();
    let mut table = IndexMap::new();
    table.insert("twice".to_string(), External::lambda(twice));
    let values = [External::Symbols(table)];

    let expr = parse(&factory, None, "twice(3) + 1", &[], &values).unwrap();
    assert_eq!(expr.ty, Type::Int32);

    let err = parse(&factory, None, r#"twice("a")"#, &[], &values).unwrap_err();
    assert!(err.is(&messages::ARGS_INCOMPATIBLE_WITH_LAMBDA));
}

// ============================================================================
// Projections
// ============================================================================

#[test]
fn test_projection_names_and_types() {
    let factory = TypeFactory::new();
    let lambda = parse_lambda_it(&factory, person(), None, "new(Name, Age * 2 as Doubled)", &[]).unwrap();
    match &lambda.body.kind {
        ExprKind::MemberInit { record, bindings } => {
            let names: Vec<_> = record.properties().iter().map(|p| p.name.as_str()).collect();
            assert_eq!(names, vec!["Name", "Doubled"]);
            assert_eq!(record.properties()[1].ty, Type::Int32);
            assert_eq!(bindings.len(), 2);
        }
        other => panic!("expected a projection, got {:?}", other),
    }
}

#[test]
fn test_same_projection_shares_record_type() {
    let factory = TypeFactory::new();
    let a = parse_lambda_it(&factory, person(), None, "new(Name, Age)", &[]).unwrap();
    let b = parse_lambda_it(&factory, person(), None, "new(name, age)", &[]).unwrap();
    assert_eq!(a.result_type(), b.result_type());
    assert_eq!(factory.len(), 1);
}

#[test]
fn test_projection_requires_alias_for_computed_items() {
    let factory = TypeFactory::new();
    let err = parse_lambda_it(&factory, person(), None, "new(Age * 2)", &[]).unwrap_err();
    assert!(err.is(&messages::MISSING_AS_CLAUSE));
    assert_eq!(err.offset, 4);
}

#[test]
fn test_projection_rejects_duplicate_names() {
    let factory = TypeFactory::new();
    let err = parse_lambda_it(&factory, person(), None, "new(Name, Age as name)", &[]).unwrap_err();
    assert!(err.is(&messages::INVALID_PROJECTION));
}

// ============================================================================
// Aggregates and Indexing
// ============================================================================

#[test]
fn test_aggregate_result_types() {
    let items = [("items", Type::array(Type::Int32))];
    assert_eq!(parse_with(&items, "items.Count()").unwrap().ty, Type::Int32);
    assert_eq!(parse_with(&items, "items.Any(it > 1)").unwrap().ty, Type::Boolean);
    assert_eq!(parse_with(&items, "items.Sum(it)").unwrap().ty, Type::Int32);
    assert_eq!(parse_with(&items, "items.Average(it)").unwrap().ty, Type::Double);
    assert_eq!(parse_with(&items, "items.Max(it * 2)").unwrap().ty, Type::Int32);
    assert_eq!(
        parse_with(&items, "items.Where(it > 2)").unwrap().ty,
        Type::sequence(Type::Int32)
    );
}

#[test]
fn test_aggregate_builds_selector_lambda() {
    let expr = parse_with(&[("items", Type::array(Type::Int32))], "items.Where(it > 2).Count()").unwrap();
    match &expr.kind {
        ExprKind::Aggregate { op, selector, source } => {
            assert_eq!(*op, AggregateOp::Count);
            assert!(selector.is_none());
            assert!(matches!(source.kind, ExprKind::Aggregate { op: AggregateOp::Where, selector: Some(_), .. }));
        }
        other => panic!("expected an aggregate, got {:?}", other),
    }
}

#[test]
fn test_aggregate_restores_outer_it() {
    let factory = TypeFactory::new();
    let lambda = parse_lambda_it(&factory, person(), None, "Scores.Any(it > 90) and Age > 3", &[]).unwrap();
    assert_eq!(lambda.result_type(), &Type::Boolean);
}

#[test]
fn test_unknown_aggregate() {
    let err = parse_error(&[("items", Type::array(Type::Int32))], "items.Select(it)");
    assert!(err.is(&messages::NO_APPLICABLE_AGGREGATE));
    assert_error(&[("items", Type::array(Type::Int32))], "items.Count(it)", &messages::NO_APPLICABLE_AGGREGATE);
}

#[test]
fn test_array_indexing() {
    let items = [("items", Type::array(Type::Int32))];
    let expr = parse_with(&items, "items[0]").unwrap();
    assert_eq!(expr.ty, Type::Int32);
    assert!(matches!(expr.kind, ExprKind::ArrayIndex { .. }));
    assert_error(&items, "items[0, 1]", &messages::CANNOT_INDEX_MULTI_DIM_ARRAY);
    assert_error(&items, r#"items["a"]"#, &messages::INVALID_INDEX);
}

#[test]
fn test_string_indexer() {
    let expr = parse_expr(r#""abc"[1]"#);
    assert_eq!(expr.ty, Type::Char);
    assert_error(&[("x", Type::Int32)], "x[0]", &messages::NO_APPLICABLE_INDEXER);
    let err = parse_error(&[], "1[0]");
    assert!(err.is(&messages::NO_APPLICABLE_INDEXER));
    assert!(err.message.contains("'Int32'"), "{}", err);
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_ordering_directions() {
    let factory = TypeFactory::new();
    let params = [ParameterExpr::unnamed(person())];
    let orderings = parse_ordering(&factory, &params, "Name, Age DESC, Scores.Count() ascending", &[]).unwrap();
    let directions: Vec<_> = orderings.iter().map(|o| o.ascending).collect();
    assert_eq!(directions, vec![true, false, true]);
    assert_eq!(orderings[1].selector.ty, Type::Int32);
}

// ============================================================================
// Syntax Errors
// ============================================================================

#[test]
fn test_trailing_input() {
    let err = parse_error(&[], "1 2");
    assert!(err.is(&messages::SYNTAX_ERROR));
    assert_eq!(err.offset, 2);
}

#[test]
fn test_missing_operand() {
    let err = parse_error(&[], "1 +");
    assert!(err.is(&messages::EXPRESSION_EXPECTED));
    assert_eq!(err.offset, 3);
}

#[test]
fn test_unclosed_paren() {
    assert_error(&[], "(1 + 2", &messages::CLOSE_PAREN_OR_OPERATOR_EXPECTED);
    assert_error(&[], "Math.Max(1, 2", &messages::CLOSE_PAREN_OR_COMMA_EXPECTED);
    assert_error(&[], "true ? 1", &messages::COLON_EXPECTED);
}

#[test]
fn test_lexical_error_surfaces() {
    let err = parse_error(&[], "1 # 2");
    assert!(err.is(&messages::INVALID_CHARACTER));
    assert_eq!(err.offset, 2);
}

#[test]
fn test_nesting_depth_is_bounded() {
    let factory = TypeFactory::new();
    let shallow = "((1))";
    let deep = "((((((((1))))))))";
    assert!(Parser::new(&factory, shallow, &[], &[]).unwrap().with_max_depth(5).parse(None).is_ok());
    let err = Parser::new(&factory, deep, &[], &[]).unwrap().with_max_depth(5).parse(None).unwrap_err();
    assert!(err.is(&messages::NESTING_TOO_DEEP));
    assert_eq!(err.message, "Expression nesting exceeds the maximum depth of 5");

    let very_deep = format!("{}1{}", "(".repeat(500), ")".repeat(500));
    let err = parse(&factory, None, &very_deep, &[], &[]).unwrap_err();
    assert!(err.is(&messages::NESTING_TOO_DEEP));
}
