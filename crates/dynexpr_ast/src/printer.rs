//! Text rendering of expression trees.
//!
//! The output is meant for diagnostics and the CLI; it is not re-parseable.
//! Binary operators are fully parenthesized and the unnamed parameter
//! prints as `it`.

use crate::node::*;
use dynexpr_types::Value;
use std::fmt;

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Constant(v) => write_constant(f, v),
            ExprKind::Parameter(p) => write_parameter(f, p),
            ExprKind::Member { target, owner, member } => {
                match target {
                    Some(t) => write!(f, "{}", t)?,
                    None => write!(f, "{}", owner)?,
                }
                write!(f, ".{}", member.name)
            }
            ExprKind::Call {
                target,
                owner,
                method,
                args,
            } => {
                match target {
                    Some(t) => write!(f, "{}", t)?,
                    None => write!(f, "{}", owner)?,
                }
                write!(f, ".{}(", method.name)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            ExprKind::ArrayIndex { target, index } => write!(f, "{}[{}]", target, index),
            ExprKind::New { ctor, args } => {
                write!(f, "new {}(", ctor.name)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Negate => write!(f, "-{}", operand),
                UnaryOp::Not => write!(f, "Not({})", operand),
            },
            ExprKind::Binary { op, left, right } => write!(f, "({} {} {})", left, op.symbol(), right),
            ExprKind::Conditional {
                test,
                if_true,
                if_false,
            } => write!(f, "IIF({}, {}, {})", test, if_true, if_false),
            ExprKind::Convert { operand, checked } => {
                let name = if *checked { "ConvertChecked" } else { "Convert" };
                write!(f, "{}({}, {})", name, operand, self.ty)
            }
            ExprKind::Lambda(l) => write_lambda(f, l),
            ExprKind::Invoke { lambda, args } => {
                write!(f, "Invoke({}", lambda)?;
                for a in args {
                    write!(f, ", {}", a)?;
                }
                write!(f, ")")
            }
            ExprKind::MemberInit { record, bindings } => {
                write!(f, "new {}(", record.name())?;
                for (i, (p, b)) in record.properties().iter().zip(bindings).enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", p.name, b)?;
                }
                write!(f, ")")
            }
            ExprKind::Aggregate { source, op, selector } => {
                write!(f, "{}.{}(", source, op.name())?;
                if let Some(l) = selector {
                    write_lambda(f, l)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn write_constant(f: &mut fmt::Formatter<'_>, v: &Value) -> fmt::Result {
    match v {
        Value::Null => write!(f, "null"),
        Value::String(s) => write!(f, "\"{}\"", s),
        Value::Char(c) => write!(f, "'{}'", c),
        other => write!(f, "{}", other),
    }
}

fn write_parameter(f: &mut fmt::Formatter<'_>, p: &ParameterExpr) -> fmt::Result {
    if p.name.is_empty() {
        write!(f, "it")
    } else {
        write!(f, "{}", p.name)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[ExprRef]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_lambda(f: &mut fmt::Formatter<'_>, l: &LambdaExpr) -> fmt::Result {
    match l.parameters.as_slice() {
        [p] => write_parameter(f, p)?,
        params => {
            write!(f, "(")?;
            for (i, p) in params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_parameter(f, p)?;
            }
            write!(f, ")")?;
        }
    }
    write!(f, " => {}", l.body)
}

impl fmt::Display for LambdaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_lambda(f, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynexpr_types::Type;

    #[test]
    fn test_binary_is_parenthesized() {
        let one = Expr::constant(Value::Int32(1), Type::Int32);
        let two = Expr::constant(Value::Int32(2), Type::Int32);
        let sum = Expr::binary(BinaryOp::Add, one, two, Type::Int32);
        assert_eq!(sum.to_string(), "(1 + 2)");
    }

    #[test]
    fn test_lambda_over_unnamed_parameter() {
        let it = ParameterExpr::unnamed(Type::String);
        let body = Expr::constant(Value::string("x"), Type::String);
        let body = Expr::binary(BinaryOp::Equal, Expr::parameter(&it), body, Type::Boolean);
        let lambda = LambdaExpr::new(vec![it], body);
        assert_eq!(lambda.to_string(), "it => (it == \"x\")");
        assert_eq!(lambda.result_type(), &Type::Boolean);
    }

    #[test]
    fn test_convert_names_target_type() {
        let x = ParameterExpr::new("x", Type::Int32);
        let conv = Expr::convert_checked(Expr::parameter(&x), Type::Int64);
        assert_eq!(conv.to_string(), "ConvertChecked(x, Int64)");
    }

    #[test]
    fn test_aggregate_names() {
        assert_eq!(AggregateOp::from_name("count"), Some(AggregateOp::Count));
        assert_eq!(AggregateOp::from_name("Select"), None);
    }
}
