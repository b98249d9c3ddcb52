//! Operator and aggregate signature tables.
//!
//! Operators are type-checked by resolving a call against a fixed table
//! of signatures, exactly as if the operator were an overloaded method.
//! Tables inherit from one another; [`operator_layers`] lists an
//! operator's own table first, then the tables it inherits.

use dynexpr_types::{Builtin, MethodInfo, Type};
use lazy_static::lazy_static;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorTable {
    Arithmetic,
    Add,
    Subtract,
    Equality,
    Relational,
    Logical,
    Negation,
    Not,
}

fn with_nullable(types: &[Type]) -> Vec<Type> {
    types
        .iter()
        .flat_map(|t| [t.clone(), Type::nullable(t.clone())])
        .collect()
}

fn unary(types: &[Type]) -> Vec<Arc<MethodInfo>> {
    types
        .iter()
        .map(|t| Arc::new(MethodInfo::signature("F", &[t.clone()])))
        .collect()
}

fn binary(types: &[Type]) -> Vec<Arc<MethodInfo>> {
    types
        .iter()
        .map(|t| Arc::new(MethodInfo::signature("F", &[t.clone(), t.clone()])))
        .collect()
}

fn aggregate(name: &str, params: &[Type]) -> Arc<MethodInfo> {
    Arc::new(MethodInfo::signature(name, params))
}

lazy_static! {
    static ref ARITHMETIC: Vec<Arc<MethodInfo>> = {
        use Type::*;
        binary(&with_nullable(&[Int32, UInt32, Int64, UInt64, Single, Double, Decimal]))
    };

    static ref ADD: Vec<Arc<MethodInfo>> = {
        let date = Type::DateTime;
        let span = Type::TimeSpan;
        vec![
            aggregate("F", &[date.clone(), span.clone()]),
            aggregate("F", &[Type::nullable(date), Type::nullable(span.clone())]),
            aggregate("F", &[span.clone(), span.clone()]),
            aggregate("F", &[Type::nullable(span.clone()), Type::nullable(span)]),
        ]
    };

    static ref SUBTRACT: Vec<Arc<MethodInfo>> = binary(&with_nullable(&[Type::DateTime]));

    static ref RELATIONAL: Vec<Arc<MethodInfo>> = {
        use Type::*;
        let mut types = vec![String];
        types.extend(with_nullable(&[Char, DateTime, TimeSpan]));
        binary(&types)
    };

    static ref EQUALITY: Vec<Arc<MethodInfo>> = binary(&with_nullable(&[Type::Boolean, Type::Guid]));

    static ref LOGICAL: Vec<Arc<MethodInfo>> = binary(&with_nullable(&[Type::Boolean]));

    static ref NEGATION: Vec<Arc<MethodInfo>> = {
        use Type::*;
        unary(&with_nullable(&[Int32, Int64, Single, Double, Decimal]))
    };

    static ref NOT: Vec<Arc<MethodInfo>> = unary(&with_nullable(&[Type::Boolean]));

    static ref AGGREGATES: Vec<Arc<MethodInfo>> = {
        use Type::*;
        let mut methods = vec![
            aggregate("Where", &[Boolean]),
            aggregate("Any", &[]),
            aggregate("Any", &[Boolean]),
            aggregate("All", &[Boolean]),
            aggregate("Count", &[]),
            aggregate("Count", &[Boolean]),
            aggregate("Min", &[Object]),
            aggregate("Max", &[Object]),
        ];
        let numeric = with_nullable(&[Int32, Int64, Single, Double, Decimal]);
        methods.extend(numeric.iter().map(|t| aggregate("Sum", &[t.clone()])));
        methods.extend(numeric.iter().map(|t| aggregate("Average", &[t.clone()])));
        methods
    };

    /// `String.Concat(Object, Object)`, the target of `&` and of `+` on text.
    pub static ref STRING_CONCAT: Arc<MethodInfo> = Arc::new(MethodInfo::builtin(
        "Concat",
        &[Type::Object, Type::Object],
        Type::String,
        true,
        Builtin::StringConcat,
    ));

    /// `String.Compare(String, String)`, the target of relational operators
    /// on text.
    pub static ref STRING_COMPARE: Arc<MethodInfo> = Arc::new(MethodInfo::builtin(
        "Compare",
        &[Type::String, Type::String],
        Type::Int32,
        true,
        Builtin::StringCompare,
    ));
}

/// The signature layers consulted for an operator, most specific first.
pub fn operator_layers(table: OperatorTable) -> Vec<&'static [Arc<MethodInfo>]> {
    match table {
        OperatorTable::Arithmetic => vec![ARITHMETIC.as_slice()],
        OperatorTable::Add => vec![ADD.as_slice(), ARITHMETIC.as_slice()],
        OperatorTable::Subtract => vec![SUBTRACT.as_slice(), ADD.as_slice(), ARITHMETIC.as_slice()],
        OperatorTable::Equality => vec![EQUALITY.as_slice(), RELATIONAL.as_slice(), ARITHMETIC.as_slice()],
        OperatorTable::Relational => vec![RELATIONAL.as_slice(), ARITHMETIC.as_slice()],
        OperatorTable::Logical => vec![LOGICAL.as_slice()],
        OperatorTable::Negation => vec![NEGATION.as_slice()],
        OperatorTable::Not => vec![NOT.as_slice()],
    }
}

/// Aggregate signatures named `name`, ignoring case.
pub fn aggregate_methods(name: &str) -> Vec<Arc<MethodInfo>> {
    AGGREGATES
        .iter()
        .filter(|m| m.name.eq_ignore_ascii_case(name))
        .cloned()
        .collect()
}

/// Result type of `Average` over a selector of type `selector`.
pub fn average_result(selector: &Type) -> Type {
    let lifted = |t: Type| if selector.is_nullable() { Type::nullable(t) } else { t };
    match selector.non_nullable() {
        Type::Int32 | Type::Int64 => lifted(Type::Double),
        other => lifted(other.clone()),
    }
}
