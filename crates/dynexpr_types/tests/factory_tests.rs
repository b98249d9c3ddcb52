//! Record type cache tests.
//!
//! Verifies one-type-per-signature identity, order sensitivity, the
//! optional type limit, concurrent get-or-create, and structural equality
//! of record instances.

use dynexpr_types::{FactoryError, PropertyDescriptor, RecordInstance, Type, TypeFactory, Value};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

/// Helper: build a descriptor list from (name, type) pairs.
fn desc(pairs: &[(&str, Type)]) -> Vec<PropertyDescriptor> {
    pairs.iter().map(|(n, t)| PropertyDescriptor::new(*n, t.clone())).collect()
}

fn name_count() -> Vec<PropertyDescriptor> {
    desc(&[("Name", Type::String), ("Count", Type::Double)])
}

// ============================================================================
// Identity
// ============================================================================

#[test]
fn test_equal_signatures_share_one_type() {
    let factory = TypeFactory::new();
    let a = factory.get_or_create(&name_count()).unwrap();
    let b = factory.get_or_create(&name_count()).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(factory.len(), 1);
    assert_eq!(a.name(), "DynamicClass1");
}

#[test]
fn test_reordered_descriptors_are_distinct_types() {
    let factory = TypeFactory::new();
    let a = factory.get_or_create(&name_count()).unwrap();
    let b = factory
        .get_or_create(&desc(&[("Count", Type::Double), ("Name", Type::String)]))
        .unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(factory.len(), 2);
    assert_eq!(a.signature().hash_code(), b.signature().hash_code());

    // Each shape stays cached independently.
    let again = factory
        .get_or_create(&desc(&[("Count", Type::Double), ("Name", Type::String)]))
        .unwrap();
    assert!(Arc::ptr_eq(&b, &again));
}

#[test]
fn test_get_does_not_create() {
    let factory = TypeFactory::new();
    assert!(factory.get(&name_count()).is_none());
    let created = factory.get_or_create(&name_count()).unwrap();
    assert!(Arc::ptr_eq(&factory.get(&name_count()).unwrap(), &created));
    assert_eq!(factory.len(), 1);
}

#[test]
fn test_property_lookup_ignores_case() {
    let factory = TypeFactory::new();
    let ty = factory.get_or_create(&name_count()).unwrap();
    assert_eq!(ty.field_index("count"), Some(1));
    assert_eq!(ty.property("NAME").map(|p| p.ty.clone()), Some(Type::String));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_duplicate_property_is_rejected() {
    let factory = TypeFactory::new();
    let err = factory
        .get_or_create(&desc(&[("Name", Type::String), ("name", Type::Int32)]))
        .unwrap_err();
    assert_eq!(err, FactoryError::DuplicateProperty("name".to_string()));
    assert!(factory.is_empty());
}

#[test]
fn test_limit_fails_without_evicting() {
    let factory = TypeFactory::with_limit(Some(1));
    let first = factory.get_or_create(&name_count()).unwrap();
    let err = factory.get_or_create(&desc(&[("Other", Type::Int32)])).unwrap_err();
    assert_eq!(err, FactoryError::CapacityExceeded { limit: 1 });

    // Existing shapes still resolve.
    let again = factory.get_or_create(&name_count()).unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(factory.len(), 1);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_get_or_create_yields_one_type() {
    let factory = TypeFactory::new();
    let types: Vec<_> = (0..256)
        .into_par_iter()
        .map(|_| factory.get_or_create(&name_count()).unwrap())
        .collect();
    assert!(types.iter().all(|t| Arc::ptr_eq(t, &types[0])));
    assert_eq!(factory.len(), 1);
}

#[test]
fn test_concurrent_distinct_shapes_get_distinct_ids() {
    let factory = TypeFactory::new();
    std::thread::scope(|scope| {
        for t in 0..8 {
            let factory = &factory;
            scope.spawn(move || {
                for i in 0..32 {
                    let name = format!("P{}", (t * 32 + i) % 64);
                    factory.get_or_create(&desc(&[(name.as_str(), Type::Int32)])).unwrap();
                }
            });
        }
    });
    assert_eq!(factory.len(), 64);
    let ids: HashSet<u32> = (0..64)
        .map(|i| factory.get(&desc(&[(format!("P{}", i).as_str(), Type::Int32)])).unwrap().id())
        .collect();
    assert_eq!(ids.len(), 64);
}

// ============================================================================
// Instances
// ============================================================================

#[test]
fn test_instances_compare_structurally() {
    let factory = TypeFactory::new();
    let ty = factory.get_or_create(&name_count()).unwrap();
    let a = RecordInstance::with_values(ty.clone(), vec![Value::string("x"), Value::Double(42.0)]).unwrap();
    let b = RecordInstance::with_values(ty.clone(), vec![Value::string("x"), Value::Double(42.0)]).unwrap();
    let c = RecordInstance::with_values(ty, vec![Value::string("y"), Value::Double(42.0)]).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.structural_hash(), b.structural_hash());
    assert_ne!(a, c);
}

#[test]
fn test_instances_of_reordered_shapes_differ() {
    let factory = TypeFactory::new();
    let ab = factory.get_or_create(&desc(&[("A", Type::Double), ("B", Type::Double)])).unwrap();
    let ba = factory.get_or_create(&desc(&[("B", Type::Double), ("A", Type::Double)])).unwrap();
    let x = RecordInstance::with_values(ab, vec![Value::Double(1.0), Value::Double(1.0)]).unwrap();
    let y = RecordInstance::with_values(ba, vec![Value::Double(1.0), Value::Double(1.0)]).unwrap();
    assert_ne!(x, y);
}

#[test]
fn test_hash_is_xor_of_fields() {
    let factory = TypeFactory::new();
    let ty = factory.get_or_create(&desc(&[("A", Type::Int32), ("B", Type::Int32)])).unwrap();
    // Equal fields cancel out under XOR.
    let same = RecordInstance::with_values(ty, vec![Value::Int32(7), Value::Int32(7)]).unwrap();
    assert_eq!(same.structural_hash(), 0);
}

#[test]
fn test_defaults_and_set() {
    let factory = TypeFactory::new();
    let ty = factory.get_or_create(&name_count()).unwrap();
    let mut record = RecordInstance::new(ty);
    assert_eq!(record.get("Name"), Some(&Value::Null));
    assert_eq!(record.get("Count"), Some(&Value::Double(0.0)));

    record.set("count", Value::Double(3.0)).unwrap();
    assert_eq!(record.get("Count"), Some(&Value::Double(3.0)));

    let err = record.set("Count", Value::string("three")).unwrap_err();
    assert!(matches!(err, FactoryError::TypeMismatch { .. }));
    let err = record.set("Missing", Value::Null).unwrap_err();
    assert!(matches!(err, FactoryError::UnknownProperty { .. }));
}

#[test]
fn test_record_display() {
    let factory = TypeFactory::new();
    let ty = factory.get_or_create(&name_count()).unwrap();
    let record = RecordInstance::with_values(ty, vec![Value::string("x"), Value::Double(42.0)]).unwrap();
    assert_eq!(record.to_string(), "{Name=x, Count=42}");
}

#[test]
fn test_with_values_checks_arity() {
    let factory = TypeFactory::new();
    let ty = factory.get_or_create(&name_count()).unwrap();
    let err = RecordInstance::with_values(ty, vec![Value::string("x")]).unwrap_err();
    assert_eq!(err, FactoryError::ArityMismatch { expected: 2, found: 1 });
}
