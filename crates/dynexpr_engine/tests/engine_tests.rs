//! Engine integration tests: configuration, payload evaluation and
//! request dispatch.

use dynexpr_diagnostics::messages;
use dynexpr_engine::{DispatchError, Engine, EngineError};
use dynexpr_materializer::MaterializeError;
use dynexpr_options::EngineOptions;
use dynexpr_types::{FactoryError, Type, Value};
use serde_json::json;

/// Helper: an engine with one `Add` handler summing numeric arguments.
fn engine_with_handlers() -> Engine {
    let mut engine = Engine::default();
    engine
        .register("Add", |args: &[Value]| {
            args.iter()
                .map(|a| a.as_f64().ok_or_else(|| format!("'{}' is not a number", a)))
                .sum::<Result<f64, String>>()
                .map(Value::Double)
        })
        .unwrap();
    engine.register("Echo", |args: &[Value]| Ok(Value::sequence(args.to_vec()))).unwrap();
    engine
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_nesting_depth_comes_from_options() {
    let engine = Engine::new(EngineOptions {
        max_nesting_depth: 5,
        ..Default::default()
    });
    assert!(engine.parse(None, "((1))", &[], &[]).is_ok());
    let err = engine.parse(None, "((((((((1))))))))", &[], &[]).unwrap_err();
    assert!(err.is(&messages::NESTING_TOO_DEEP));
}

#[test]
fn test_record_type_limit_comes_from_options() {
    let engine = Engine::new(EngineOptions {
        max_record_types: Some(1),
        ..Default::default()
    });
    assert!(engine.materialize(&json!({"a": 1})).is_ok());
    assert!(engine.materialize(&json!({"a": 2})).is_ok());
    assert_eq!(
        engine.materialize(&json!({"b": 1})),
        Err(MaterializeError::Record(FactoryError::CapacityExceeded { limit: 1 }))
    );
}

// ============================================================================
// Evaluation
// ============================================================================

#[test]
fn test_evaluate_over_payload() {
    let engine = Engine::default();
    let payload = engine
        .materialize_str(r#"{"Name": "Widget", "Price": "12.5", "Qty": 4}"#)
        .unwrap();
    assert_eq!(
        engine.evaluate_over("Price * Qty", &payload, &[]),
        Ok(Value::Double(50.0))
    );
    assert_eq!(
        engine.evaluate_over(r#"Name.StartsWith("W") and Qty > 3"#, &payload, &[]),
        Ok(Value::Boolean(true))
    );
    assert!(matches!(
        engine.evaluate_over("Missing + 1", &payload, &[]),
        Err(EngineError::Parse(_))
    ));
}

#[test]
fn test_projection_over_payload_uses_engine_cache() {
    let engine = Engine::default();
    let payload = engine.materialize_str(r#"{"Name": "x", "Count": "3"}"#).unwrap();
    let before = engine.factory().len();
    let projected = engine
        .evaluate_over("new(Name, Count * 2 as Twice)", &payload, &[])
        .unwrap();
    assert_eq!(projected.to_string(), "{Name=x, Twice=6}");
    assert_eq!(engine.factory().len(), before + 1);
}

#[test]
fn test_order_materialized_records() {
    let engine = Engine::default();
    let rows = [
        json!({"Name": "b", "Rank": "2"}),
        json!({"Name": "a", "Rank": "2"}),
        json!({"Name": "c", "Rank": "1"}),
    ];
    let items: Vec<Value> = engine.materialize_batch(&rows).into_iter().map(Result::unwrap).collect();
    let item_type = items[0].type_of();
    let sorted = engine.order_by(item_type, "Rank desc, Name", &items).unwrap();
    let names: Vec<String> = sorted
        .iter()
        .map(|v| match v {
            Value::Record(r) => r.get("Name").map(|n| n.to_string()).unwrap_or_default(),
            _ => String::new(),
        })
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn test_batch_shares_one_record_type() {
    let engine = Engine::default();
    let rows: Vec<_> = (0..100).map(|i| json!({"Id": i, "Label": format!("row {}", i)})).collect();
    let results = engine.materialize_batch(&rows);
    assert!(results.iter().all(Result::is_ok));
    assert_eq!(engine.factory().len(), 1);
    assert!(matches!(&results[0], Ok(v) if v.type_of() != Type::Object));
}

// ============================================================================
// Dispatch
// ============================================================================

#[test]
fn test_dispatch_calls_registered_handler() {
    let engine = engine_with_handlers();
    let request = json!({"Function": "CallMethod", "Method": "Add", "Args": ["1.5", 2]});
    assert_eq!(engine.dispatch(&request), Ok(json!(3.5)));
}

#[test]
fn test_dispatch_materializes_object_arguments() {
    let engine = engine_with_handlers();
    let response = engine
        .dispatch_str(r#"{"Function": "CallMethod", "Method": "Echo", "Args": [{"Name": "x", "On": true}]}"#)
        .unwrap();
    assert_eq!(response, json!([{"Name": "x", "On": "True"}]));
}

#[test]
fn test_dispatch_errors_reach_the_caller() {
    let engine = engine_with_handlers();
    assert_eq!(
        engine.dispatch(&json!({"Function": "Other", "Method": "Add"})),
        Err(DispatchError::UnknownFunction("Other".into()))
    );
    assert_eq!(
        engine.dispatch(&json!({"Function": "CallMethod", "Method": "add"})),
        Err(DispatchError::UnknownMethod("add".into()))
    );
    assert!(matches!(
        engine.dispatch(&json!({"Function": "CallMethod"})),
        Err(DispatchError::Malformed(_))
    ));
    assert!(matches!(
        engine.dispatch(&json!({"Function": "CallMethod", "Method": "Add", "Args": 3})),
        Err(DispatchError::Malformed(_))
    ));
    assert_eq!(
        engine.dispatch(&json!({"Function": "CallMethod", "Method": "Add", "Args": ["x"]})),
        Err(DispatchError::Handler {
            method: "Add".into(),
            message: "'x' is not a number".into(),
        })
    );
    assert!(matches!(engine.dispatch_str("{"), Err(EngineError::Json(_))));
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let mut engine = engine_with_handlers();
    assert_eq!(
        engine.register("Add", |_: &[Value]| Ok(Value::Null)),
        Err(DispatchError::DuplicateHandler("Add".into()))
    );
    let names: Vec<_> = engine.handlers().names().collect();
    assert_eq!(names, vec!["Add", "Echo"]);
}
