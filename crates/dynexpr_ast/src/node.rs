//! Expression tree node definitions.

use dynexpr_types::{LambdaType, MethodInfo, PropertyInfo, RecordType, Type, Value};
use std::sync::Arc;

/// A shared reference to an expression node.
pub type ExprRef = Arc<Expr>;

// ============================================================================
// Core Node
// ============================================================================

#[derive(Debug, Clone)]
pub struct Expr {
    /// The static type of the expression.
    pub ty: Type,
    pub kind: ExprKind,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Constant(Value),
    Parameter(Arc<ParameterExpr>),
    /// Property or field read. `target` is `None` for static members.
    Member {
        target: Option<ExprRef>,
        owner: Type,
        member: PropertyInfo,
    },
    /// Method or indexer call. `target` is `None` for static methods.
    Call {
        target: Option<ExprRef>,
        owner: Type,
        method: Arc<MethodInfo>,
        args: Vec<ExprRef>,
    },
    ArrayIndex {
        target: ExprRef,
        index: ExprRef,
    },
    New {
        ctor: Arc<MethodInfo>,
        args: Vec<ExprRef>,
    },
    Unary {
        op: UnaryOp,
        operand: ExprRef,
    },
    Binary {
        op: BinaryOp,
        left: ExprRef,
        right: ExprRef,
    },
    Conditional {
        test: ExprRef,
        if_true: ExprRef,
        if_false: ExprRef,
    },
    /// Conversion to this node's type. Checked conversions fail on overflow.
    Convert {
        operand: ExprRef,
        checked: bool,
    },
    Lambda(Arc<LambdaExpr>),
    Invoke {
        lambda: ExprRef,
        args: Vec<ExprRef>,
    },
    /// Construction of a synthesized record; one binding per field, in
    /// field order.
    MemberInit {
        record: Arc<RecordType>,
        bindings: Vec<ExprRef>,
    },
    /// A sequence operation over `source`.
    Aggregate {
        source: ExprRef,
        op: AggregateOp,
        selector: Option<Arc<LambdaExpr>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    AndAlso,
    OrElse,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::AndAlso => "&&",
            BinaryOp::OrElse => "||",
        }
    }

    #[inline]
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::LessThan
                | BinaryOp::LessThanOrEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterThanOrEqual
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    Where,
    Any,
    All,
    Count,
    Min,
    Max,
    Sum,
    Average,
}

impl AggregateOp {
    /// Resolve an aggregate method name, ignoring case.
    pub fn from_name(name: &str) -> Option<AggregateOp> {
        const NAMES: &[(&str, AggregateOp)] = &[
            ("Where", AggregateOp::Where),
            ("Any", AggregateOp::Any),
            ("All", AggregateOp::All),
            ("Count", AggregateOp::Count),
            ("Min", AggregateOp::Min),
            ("Max", AggregateOp::Max),
            ("Sum", AggregateOp::Sum),
            ("Average", AggregateOp::Average),
        ];
        NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, op)| *op)
    }

    pub fn name(self) -> &'static str {
        match self {
            AggregateOp::Where => "Where",
            AggregateOp::Any => "Any",
            AggregateOp::All => "All",
            AggregateOp::Count => "Count",
            AggregateOp::Min => "Min",
            AggregateOp::Max => "Max",
            AggregateOp::Sum => "Sum",
            AggregateOp::Average => "Average",
        }
    }
}

// ============================================================================
// Parameters and Lambdas
// ============================================================================

/// A lambda parameter. Parameters are identified by their `Arc`, not by
/// name; an unnamed parameter has an empty name.
#[derive(Debug)]
pub struct ParameterExpr {
    pub name: String,
    pub ty: Type,
}

impl ParameterExpr {
    pub fn new(name: impl Into<String>, ty: Type) -> Arc<ParameterExpr> {
        Arc::new(ParameterExpr { name: name.into(), ty })
    }

    pub fn unnamed(ty: Type) -> Arc<ParameterExpr> {
        Self::new("", ty)
    }
}

#[derive(Debug)]
pub struct LambdaExpr {
    pub parameters: Vec<Arc<ParameterExpr>>,
    pub body: ExprRef,
}

impl LambdaExpr {
    pub fn new(parameters: Vec<Arc<ParameterExpr>>, body: ExprRef) -> Arc<LambdaExpr> {
        Arc::new(LambdaExpr { parameters, body })
    }

    pub fn result_type(&self) -> &Type {
        &self.body.ty
    }

    pub fn lambda_type(&self) -> LambdaType {
        LambdaType {
            parameters: self.parameters.iter().map(|p| p.ty.clone()).collect(),
            result: self.body.ty.clone(),
        }
    }
}

/// One key of an ordering clause.
#[derive(Debug, Clone)]
pub struct DynamicOrdering {
    pub selector: ExprRef,
    pub ascending: bool,
}

// ============================================================================
// Constructors
// ============================================================================

impl Expr {
    #[inline]
    pub fn new(ty: Type, kind: ExprKind) -> ExprRef {
        Arc::new(Expr { ty, kind })
    }

    pub fn constant(value: Value, ty: Type) -> ExprRef {
        Expr::new(ty, ExprKind::Constant(value))
    }

    pub fn parameter(p: &Arc<ParameterExpr>) -> ExprRef {
        Expr::new(p.ty.clone(), ExprKind::Parameter(p.clone()))
    }

    pub fn convert(operand: ExprRef, ty: Type) -> ExprRef {
        Expr::new(ty, ExprKind::Convert { operand, checked: false })
    }

    pub fn convert_checked(operand: ExprRef, ty: Type) -> ExprRef {
        Expr::new(ty, ExprKind::Convert { operand, checked: true })
    }

    pub fn unary(op: UnaryOp, operand: ExprRef) -> ExprRef {
        Expr::new(operand.ty.clone(), ExprKind::Unary { op, operand })
    }

    pub fn binary(op: BinaryOp, left: ExprRef, right: ExprRef, ty: Type) -> ExprRef {
        Expr::new(ty, ExprKind::Binary { op, left, right })
    }

    pub fn conditional(test: ExprRef, if_true: ExprRef, if_false: ExprRef) -> ExprRef {
        Expr::new(
            if_true.ty.clone(),
            ExprKind::Conditional {
                test,
                if_true,
                if_false,
            },
        )
    }

    pub fn member(target: Option<ExprRef>, owner: Type, member: PropertyInfo) -> ExprRef {
        Expr::new(member.ty.clone(), ExprKind::Member { target, owner, member })
    }

    /// A call to a method that returns a value. The node's type is the
    /// method's result type, or `Object` for a method with none.
    pub fn call(target: Option<ExprRef>, owner: Type, method: Arc<MethodInfo>, args: Vec<ExprRef>) -> ExprRef {
        let ty = method.result.clone().unwrap_or(Type::Object);
        Expr::new(
            ty,
            ExprKind::Call {
                target,
                owner,
                method,
                args,
            },
        )
    }

    pub fn lambda(lambda: Arc<LambdaExpr>) -> ExprRef {
        Expr::new(Type::Lambda(Arc::new(lambda.lambda_type())), ExprKind::Lambda(lambda))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn as_constant(&self) -> Option<&Value> {
        match &self.kind {
            ExprKind::Constant(v) => Some(v),
            _ => None,
        }
    }

    /// The member name an unaliased projection item takes.
    pub fn member_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Member { member, .. } => Some(&member.name),
            _ => None,
        }
    }

    pub fn as_lambda(&self) -> Option<&Arc<LambdaExpr>> {
        match &self.kind {
            ExprKind::Lambda(l) => Some(l),
            _ => None,
        }
    }
}
