//! Tree-walking interpreter for typed expression trees.

use crate::builtins;
use crate::convert::{convert, invalid_cast};
use crate::error::{EvalError, EvalResult};
use crate::operators;
use dynexpr_ast::{AggregateOp, BinaryOp, DynamicOrdering, Expr, ExprKind, ExprRef, LambdaExpr, ParameterExpr};
use dynexpr_types::{Access, Decimal, MethodBody, MethodInfo, PropertyInfo, RecordInstance, Type, Value};
use std::cmp::Ordering;
use std::sync::Arc;

/// Evaluates expressions against a stack of parameter bindings.
///
/// Parameters are matched by identity, so an aggregate selector's unnamed
/// element parameter shadows nothing it does not own.
#[derive(Default)]
pub struct Interpreter {
    scope: Vec<(Arc<ParameterExpr>, Value)>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&self, parameter: &Arc<ParameterExpr>) -> EvalResult<Value> {
        self.scope
            .iter()
            .rev()
            .find(|(p, _)| Arc::ptr_eq(p, parameter))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| EvalError::Unsupported(format!("unbound parameter '{}'", parameter.name)))
    }

    /// Evaluate `lambda` with its parameters bound to `args`.
    pub fn apply(&mut self, lambda: &LambdaExpr, args: Vec<Value>) -> EvalResult<Value> {
        if lambda.parameters.len() != args.len() {
            return Err(EvalError::ArityMismatch {
                expected: lambda.parameters.len(),
                found: args.len(),
            });
        }
        let depth = self.scope.len();
        self.scope.extend(lambda.parameters.iter().cloned().zip(args));
        let result = self.eval(&lambda.body);
        self.scope.truncate(depth);
        result
    }

    pub fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::Constant(v) => Ok(v.clone()),
            ExprKind::Parameter(p) => self.lookup(p),
            ExprKind::Member { target, member, .. } => {
                let receiver = self.eval_target(target.as_ref())?;
                read_member(member, &receiver)
            }
            ExprKind::Call { target, method, args, .. } => {
                let receiver = self.eval_target(target.as_ref())?;
                if target.is_some() && receiver.is_null() {
                    return Err(EvalError::NullReference);
                }
                let args = self.eval_all(args)?;
                invoke(method, &receiver, &args)
            }
            ExprKind::ArrayIndex { target, index } => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                let items = match &target {
                    Value::Null => return Err(EvalError::NullReference),
                    other => other.as_items().ok_or_else(|| invalid_cast(other, &Type::array(Type::Object)))?,
                };
                let position = index.as_i128().ok_or(EvalError::NoValue)?;
                usize::try_from(position)
                    .ok()
                    .and_then(|i| items.get(i))
                    .cloned()
                    .ok_or(EvalError::IndexOutOfRange)
            }
            ExprKind::New { ctor, args } => {
                let args = self.eval_all(args)?;
                invoke(ctor, &Value::Null, &args)
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.eval(operand)?;
                operators::unary(*op, &operand)
            }
            ExprKind::Binary { op, left, right } => match op {
                BinaryOp::AndAlso | BinaryOp::OrElse => self.eval_logical(*op, left, right),
                op if op.is_comparison() => {
                    let (l, r) = (self.eval(left)?, self.eval(right)?);
                    operators::compare(*op, &l, &r)
                }
                op => {
                    let (l, r) = (self.eval(left)?, self.eval(right)?);
                    operators::arithmetic(*op, &l, &r)
                }
            },
            ExprKind::Conditional { test, if_true, if_false } => match self.eval(test)? {
                Value::Boolean(true) => self.eval(if_true),
                Value::Boolean(false) => self.eval(if_false),
                Value::Null => Err(EvalError::NoValue),
                other => Err(invalid_cast(&other, &Type::Boolean)),
            },
            ExprKind::Convert { operand, checked } => {
                let value = self.eval(operand)?;
                convert(value, &expr.ty, *checked)
            }
            ExprKind::Lambda(_) => Err(EvalError::Unsupported("a lambda as a value".into())),
            ExprKind::Invoke { lambda, args } => {
                let lambda = lambda
                    .as_lambda()
                    .cloned()
                    .ok_or_else(|| EvalError::Unsupported("invocation of a non-lambda".into()))?;
                let args = self.eval_all(args)?;
                self.apply(&lambda, args)
            }
            ExprKind::MemberInit { record, bindings } => {
                let values = self.eval_all(bindings)?;
                Ok(RecordInstance::with_values(record.clone(), values)?.into_value())
            }
            ExprKind::Aggregate { source, op, selector } => {
                let source = self.eval(source)?;
                let items = match &source {
                    Value::Null => return Err(EvalError::NullReference),
                    other => other
                        .as_items()
                        .ok_or_else(|| invalid_cast(other, &Type::sequence(Type::Object)))?,
                };
                self.aggregate(*op, items, selector.as_deref(), &expr.ty)
            }
        }
    }

    fn eval_target(&mut self, target: Option<&ExprRef>) -> EvalResult<Value> {
        match target {
            Some(t) => self.eval(t),
            None => Ok(Value::Null),
        }
    }

    fn eval_all(&mut self, exprs: &[ExprRef]) -> EvalResult<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    /// `&&` / `||`, short-circuiting, with null as "unknown".
    fn eval_logical(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> EvalResult<Value> {
        let decisive = op == BinaryOp::OrElse;
        let l = truth(self.eval(left)?)?;
        if l == Some(decisive) {
            return Ok(Value::Boolean(decisive));
        }
        let r = truth(self.eval(right)?)?;
        Ok(match (l, r) {
            (_, Some(b)) if b == decisive => Value::Boolean(decisive),
            (Some(_), Some(b)) => Value::Boolean(b),
            _ => Value::Null,
        })
    }

    // ========================================================================
    // Aggregates
    // ========================================================================

    fn select(&mut self, selector: &LambdaExpr, item: &Value) -> EvalResult<Value> {
        self.apply(selector, vec![item.clone()])
    }

    fn predicate(&mut self, selector: &LambdaExpr, item: &Value) -> EvalResult<bool> {
        Ok(truth(self.select(selector, item)?)? == Some(true))
    }

    fn aggregate(
        &mut self,
        op: AggregateOp,
        items: &[Value],
        selector: Option<&LambdaExpr>,
        result_ty: &Type,
    ) -> EvalResult<Value> {
        match (op, selector) {
            (AggregateOp::Any, None) => Ok(Value::Boolean(!items.is_empty())),
            (AggregateOp::Count, None) => Ok(Value::Int32(count(items.len())?)),
            (_, None) => Err(EvalError::Unsupported(format!("{} without a selector", op.name()))),
            (AggregateOp::Where, Some(s)) => {
                let mut kept = Vec::new();
                for item in items {
                    if self.predicate(s, item)? {
                        kept.push(item.clone());
                    }
                }
                Ok(Value::sequence(kept))
            }
            (AggregateOp::Any, Some(s)) => {
                for item in items {
                    if self.predicate(s, item)? {
                        return Ok(Value::Boolean(true));
                    }
                }
                Ok(Value::Boolean(false))
            }
            (AggregateOp::All, Some(s)) => {
                for item in items {
                    if !self.predicate(s, item)? {
                        return Ok(Value::Boolean(false));
                    }
                }
                Ok(Value::Boolean(true))
            }
            (AggregateOp::Count, Some(s)) => {
                let mut n = 0;
                for item in items {
                    if self.predicate(s, item)? {
                        n += 1;
                    }
                }
                Ok(Value::Int32(count(n)?))
            }
            (AggregateOp::Min | AggregateOp::Max, Some(s)) => {
                let keep = if op == AggregateOp::Min { Ordering::Less } else { Ordering::Greater };
                let mut best: Option<Value> = None;
                for item in items {
                    let v = self.select(s, item)?;
                    if v.is_null() {
                        continue;
                    }
                    best = match best {
                        Some(b) if v.compare(&b) != Some(keep) => Some(b),
                        _ => Some(v),
                    };
                }
                match best {
                    Some(v) => Ok(v),
                    None if !s.result_type().is_value_type() || s.result_type().is_nullable() => Ok(Value::Null),
                    None => Err(EvalError::EmptySequence),
                }
            }
            (AggregateOp::Sum, Some(s)) => {
                let kind = s.result_type().non_nullable().clone();
                let mut total = Value::default_for(&kind);
                for item in items {
                    let v = self.select(s, item)?;
                    if !v.is_null() {
                        total = checked_sum(&total, &v)?;
                    }
                }
                Ok(total)
            }
            (AggregateOp::Average, Some(s)) => {
                let kind = s.result_type().non_nullable().clone();
                let mut total = Value::default_for(&kind);
                let mut n: u64 = 0;
                for item in items {
                    let v = self.select(s, item)?;
                    if !v.is_null() {
                        total = match kind {
                            Type::Int32 | Type::Int64 => widened_sum(&total, &v)?,
                            _ => checked_sum(&total, &v)?,
                        };
                        n += 1;
                    }
                }
                if n == 0 {
                    return if result_ty.is_nullable() {
                        Ok(Value::Null)
                    } else {
                        Err(EvalError::EmptySequence)
                    };
                }
                Ok(match total {
                    Value::Single(t) => Value::Single(t / n as f32),
                    Value::Decimal(t) => Value::Decimal(t.checked_div(Decimal::from(n)).ok_or(EvalError::Overflow)?),
                    other => Value::Double(other.as_f64().ok_or(EvalError::Overflow)? / n as f64),
                })
            }
        }
    }
}

fn truth(value: Value) -> EvalResult<Option<bool>> {
    match value {
        Value::Boolean(b) => Ok(Some(b)),
        Value::Null => Ok(None),
        other => Err(invalid_cast(&other, &Type::Boolean)),
    }
}

fn count(n: usize) -> EvalResult<i32> {
    i32::try_from(n).map_err(|_| EvalError::Overflow)
}

/// Integer and decimal sums are checked, floating sums are not.
fn checked_sum(total: &Value, v: &Value) -> EvalResult<Value> {
    Ok(match (total, v) {
        (Value::Int32(a), Value::Int32(b)) => Value::Int32(a.checked_add(*b).ok_or(EvalError::Overflow)?),
        (Value::Int64(a), Value::Int64(b)) => Value::Int64(a.checked_add(*b).ok_or(EvalError::Overflow)?),
        (Value::Single(a), Value::Single(b)) => Value::Single(a + b),
        (Value::Double(a), Value::Double(b)) => Value::Double(a + b),
        (Value::Decimal(a), Value::Decimal(b)) => Value::Decimal(a.checked_add(*b).ok_or(EvalError::Overflow)?),
        (a, b) => {
            return Err(EvalError::Unsupported(format!(
                "sum of {} and {}",
                a.type_of(),
                b.type_of()
            )))
        }
    })
}

/// Average accumulates integers as `Int64`.
fn widened_sum(total: &Value, v: &Value) -> EvalResult<Value> {
    let a = total.as_i128().ok_or(EvalError::Overflow)?;
    let b = v.as_i128().ok_or_else(|| invalid_cast(v, &Type::Int64))?;
    let sum = i64::try_from(a + b).map_err(|_| EvalError::Overflow)?;
    Ok(Value::Int64(sum))
}

fn read_member(member: &PropertyInfo, receiver: &Value) -> EvalResult<Value> {
    match &member.access {
        Access::Constant(v) => Ok(v.clone()),
        Access::Builtin(b) => builtins::property(*b, receiver),
        Access::Field(i) => match receiver {
            Value::Null => Err(EvalError::NullReference),
            Value::Record(r) => r
                .field(*i)
                .cloned()
                .ok_or_else(|| EvalError::MissingMember(member.name.clone())),
            other => Err(EvalError::MissingMember(format!("{} on {}", member.name, other.type_of()))),
        },
        Access::Host => match receiver {
            Value::Null => Err(EvalError::NullReference),
            Value::Instance(i) => i
                .member(&member.name)
                .cloned()
                .ok_or_else(|| EvalError::MissingMember(member.name.clone())),
            other => Err(EvalError::MissingMember(format!("{} on {}", member.name, other.type_of()))),
        },
    }
}

fn invoke(method: &MethodInfo, receiver: &Value, args: &[Value]) -> EvalResult<Value> {
    match &method.body {
        MethodBody::Builtin(b) => builtins::call(*b, method, receiver, args),
        MethodBody::Host(f) => f(receiver, args).map_err(|message| EvalError::Host {
            name: method.name.clone(),
            message,
        }),
        MethodBody::Signature => Err(EvalError::Unsupported(method.name.clone())),
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Evaluate a parsed lambda against argument values.
pub fn evaluate(lambda: &LambdaExpr, args: &[Value]) -> EvalResult<Value> {
    tracing::trace!(parameters = lambda.parameters.len(), "evaluating lambda");
    for (p, v) in lambda.parameters.iter().zip(args) {
        if !v.conforms_to(&p.ty) {
            return Err(invalid_cast(v, &p.ty));
        }
    }
    Interpreter::new().apply(lambda, args.to_vec())
}

/// Evaluate an expression that references no parameters.
pub fn evaluate_expr(expr: &Expr) -> EvalResult<Value> {
    Interpreter::new().eval(expr)
}

/// Stable sort of `items` by the keys of an ordering clause whose
/// selectors are written over `parameter`. Nulls sort first.
pub fn order_by(
    items: &[Value],
    parameter: &Arc<ParameterExpr>,
    orderings: &[DynamicOrdering],
) -> EvalResult<Vec<Value>> {
    tracing::trace!(items = items.len(), keys = orderings.len(), "ordering");
    let mut interpreter = Interpreter::new();
    let mut keyed = Vec::with_capacity(items.len());
    for item in items {
        interpreter.scope.push((parameter.clone(), item.clone()));
        let keys = orderings
            .iter()
            .map(|o| interpreter.eval(&o.selector))
            .collect::<EvalResult<Vec<Value>>>();
        interpreter.scope.pop();
        keyed.push((keys?, item.clone()));
    }
    keyed.sort_by(|(a, _), (b, _)| {
        orderings
            .iter()
            .zip(a.iter().zip(b))
            .map(|(o, (x, y))| {
                let ordering = compare_keys(x, y);
                if o.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            })
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    Ok(keyed.into_iter().map(|(_, item)| item).collect())
}

fn compare_keys(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.compare(b).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynexpr_types::ClassType;

    fn int(v: i32) -> ExprRef {
        Expr::constant(Value::Int32(v), Type::Int32)
    }

    #[test]
    fn test_parameters_bind_by_identity() {
        let x = ParameterExpr::new("x", Type::Int32);
        let shadow = ParameterExpr::new("x", Type::Int32);
        let lambda = LambdaExpr::new(vec![x.clone()], Expr::parameter(&shadow));
        let r = evaluate(&lambda, &[Value::Int32(1)]);
        assert!(matches!(r, Err(EvalError::Unsupported(_))));
    }

    #[test]
    fn test_logical_three_valued() {
        let null = Expr::constant(Value::Null, Type::nullable(Type::Boolean));
        let t = Expr::constant(Value::Boolean(true), Type::Boolean);
        let f = Expr::constant(Value::Boolean(false), Type::Boolean);
        let ty = Type::nullable(Type::Boolean);
        let and_false = Expr::binary(BinaryOp::AndAlso, null.clone(), f, ty.clone());
        let or_true = Expr::binary(BinaryOp::OrElse, null.clone(), t.clone(), ty.clone());
        let and_true = Expr::binary(BinaryOp::AndAlso, null, t, ty);
        assert_eq!(evaluate_expr(&and_false), Ok(Value::Boolean(false)));
        assert_eq!(evaluate_expr(&or_true), Ok(Value::Boolean(true)));
        assert_eq!(evaluate_expr(&and_true), Ok(Value::Null));
    }

    #[test]
    fn test_host_member_missing() {
        let class = ClassType::builder("Bag").property("Name", Type::String).build();
        let instance = dynexpr_types::HostInstance::new(class.clone()).into_value();
        let member = class.property("Name").cloned().unwrap();
        let p = ParameterExpr::new("b", Type::Class(class.clone()));
        let body = Expr::member(Some(Expr::parameter(&p)), Type::Class(class), member);
        let lambda = LambdaExpr::new(vec![p], body);
        assert_eq!(
            evaluate(&lambda, &[instance]),
            Err(EvalError::MissingMember("Name".into()))
        );
    }

    #[test]
    fn test_arity_is_checked() {
        let lambda = LambdaExpr::new(vec![], int(1));
        assert_eq!(
            evaluate(&lambda, &[Value::Int32(1)]),
            Err(EvalError::ArityMismatch { expected: 0, found: 1 })
        );
    }

    #[test]
    fn test_order_by_puts_nulls_first() {
        let p = ParameterExpr::unnamed(Type::nullable(Type::Int32));
        let orderings = vec![DynamicOrdering {
            selector: Expr::parameter(&p),
            ascending: true,
        }];
        let items = vec![Value::Int32(3), Value::Null, Value::Int32(1)];
        let sorted = order_by(&items, &p, &orderings).unwrap();
        assert_eq!(sorted, vec![Value::Null, Value::Int32(1), Value::Int32(3)]);
    }
}
