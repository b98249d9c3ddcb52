//! The expression parser implementation.
//!
//! A recursive descent parser with one token of lookahead. Every node is
//! type-checked as it is built: operators, calls, constructors and indexers
//! resolve through the overload resolver, and the first failure aborts the
//! parse with no partial tree.

use dynexpr_ast::*;
use dynexpr_core::text::TextPos;
use dynexpr_core::CaseInsensitiveMap;
use dynexpr_diagnostics::{messages, DiagnosticMessage, ParseError};
use dynexpr_scanner::{Scanner, Token, TokenKind};
use dynexpr_types::conversion::is_numeric;
use dynexpr_types::{catalog, MethodInfo, PropertyDescriptor, Type, TypeFactory, Value};
use indexmap::IndexMap;
use std::sync::Arc;

use crate::precedence::{binary_precedence, OperatorPrecedence};
use crate::promote::LiteralRegistry;
use crate::resolver::{find_best_method, find_layered, Resolution};
use crate::signatures::{
    aggregate_methods, average_result, operator_layers, OperatorTable, STRING_COMPARE, STRING_CONCAT,
};

/// Default bound on expression nesting.
pub const DEFAULT_MAX_DEPTH: u32 = 100;

/// A value the caller makes visible to the expression.
#[derive(Debug, Clone)]
pub enum External {
    /// Bound as a constant of the value's own type.
    Value(Value),
    /// Used as-is; a lambda followed by an argument list is invoked.
    Expr(ExprRef),
    /// Named externals. As the last positional value this becomes the
    /// external symbol table, looked up case-sensitively.
    Symbols(IndexMap<String, External>),
}

impl External {
    pub fn lambda(lambda: Arc<LambdaExpr>) -> External {
        External::Expr(Expr::lambda(lambda))
    }
}

impl From<Value> for External {
    fn from(value: Value) -> Self {
        External::Value(value)
    }
}

pub struct Parser<'a> {
    factory: &'a TypeFactory,
    scanner: Scanner,
    token: Token,
    symbols: CaseInsensitiveMap<External>,
    externals: Option<&'a IndexMap<String, External>>,
    /// The implicit receiver.
    it: Option<Arc<ParameterExpr>>,
    literals: LiteralRegistry,
    depth: u32,
    max_depth: u32,
}

fn error_at(pos: TextPos, template: &DiagnosticMessage, args: &[&str]) -> ParseError {
    ParseError::new(template, pos, args)
}

fn incompatible_operands(op: &Token, left: &Type, right: &Type) -> ParseError {
    error_at(
        op.pos,
        &messages::INCOMPATIBLE_OPERANDS,
        &[&op.text, &left.to_string(), &right.to_string()],
    )
}

fn binary_op(token: &Token) -> Option<BinaryOp> {
    Some(match token.kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Subtract,
        TokenKind::Asterisk => BinaryOp::Multiply,
        TokenKind::Slash => BinaryOp::Divide,
        TokenKind::Percent => BinaryOp::Modulo,
        TokenKind::Equal | TokenKind::DoubleEqual => BinaryOp::Equal,
        TokenKind::ExclamationEqual | TokenKind::LessGreater => BinaryOp::NotEqual,
        TokenKind::LessThan => BinaryOp::LessThan,
        TokenKind::LessThanEqual => BinaryOp::LessThanOrEqual,
        TokenKind::GreaterThan => BinaryOp::GreaterThan,
        TokenKind::GreaterThanEqual => BinaryOp::GreaterThanOrEqual,
        TokenKind::DoubleAmpersand => BinaryOp::AndAlso,
        TokenKind::DoubleBar => BinaryOp::OrElse,
        TokenKind::Identifier if token.is_identifier("and") => BinaryOp::AndAlso,
        TokenKind::Identifier if token.is_identifier("or") => BinaryOp::OrElse,
        TokenKind::Identifier if token.is_identifier("mod") => BinaryOp::Modulo,
        _ => return None,
    })
}

fn is_interface(ty: &Type) -> bool {
    matches!(ty, Type::Class(c) if c.is_interface)
}

/// `String.Concat(Object, Object)`; value-typed operands are boxed.
fn generate_concat(left: ExprRef, right: ExprRef) -> ExprRef {
    let boxed = |e: ExprRef| {
        if e.ty.is_value_type() {
            Expr::convert(e, Type::Object)
        } else {
            e
        }
    };
    Expr::call(None, Type::String, (*STRING_CONCAT).clone(), vec![boxed(left), boxed(right)])
}

impl<'a> Parser<'a> {
    /// Bind the parameters and external values, and read the first token.
    ///
    /// Named parameters become symbols; a single unnamed parameter becomes
    /// `it`. Positional values are bound as `@0`, `@1`, ... unless the last
    /// one is an [`External::Symbols`] table.
    pub fn new(
        factory: &'a TypeFactory,
        text: &str,
        parameters: &[Arc<ParameterExpr>],
        values: &'a [External],
    ) -> Result<Self, ParseError> {
        tracing::trace!(text, parameters = parameters.len(), values = values.len(), "parsing expression");
        let mut parser = Self {
            factory,
            scanner: Scanner::new(text),
            token: Token::new(TokenKind::Unknown, "", 0),
            symbols: CaseInsensitiveMap::new(),
            externals: None,
            it: None,
            literals: LiteralRegistry::new(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        };
        for p in parameters.iter().filter(|p| !p.name.is_empty()) {
            parser.add_symbol(&p.name, External::Expr(Expr::parameter(p)))?;
        }
        if let [p] = parameters {
            if p.name.is_empty() {
                parser.it = Some(p.clone());
            }
        }
        for (i, value) in values.iter().enumerate() {
            match value {
                External::Symbols(map) if i + 1 == values.len() => parser.externals = Some(map),
                other => parser.add_symbol(&format!("@{}", i), other.clone())?,
            }
        }
        parser.next_token()?;
        Ok(parser)
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse the whole text as one expression, promoted to `result_type`
    /// when one is given.
    pub fn parse(&mut self, result_type: Option<&Type>) -> Result<ExprRef, ParseError> {
        let pos = self.token.pos;
        let expr = self.parse_expression()?;
        let expr = match result_type {
            Some(ty) => self
                .literals
                .promote(&expr, ty, true)
                .ok_or_else(|| error_at(pos, &messages::EXPRESSION_TYPE_MISMATCH, &[&ty.to_string()]))?,
            None => expr,
        };
        self.validate(TokenKind::End, &messages::SYNTAX_ERROR)?;
        Ok(expr)
    }

    /// Parse a comma-separated ordering clause.
    pub fn parse_ordering(&mut self) -> Result<Vec<DynamicOrdering>, ParseError> {
        let mut orderings = Vec::new();
        loop {
            let selector = self.parse_expression()?;
            let mut ascending = true;
            if self.token.is_identifier("asc") || self.token.is_identifier("ascending") {
                self.next_token()?;
            } else if self.token.is_identifier("desc") || self.token.is_identifier("descending") {
                self.next_token()?;
                ascending = false;
            }
            orderings.push(DynamicOrdering { selector, ascending });
            if self.token.kind != TokenKind::Comma {
                break;
            }
            self.next_token()?;
        }
        self.validate(TokenKind::End, &messages::SYNTAX_ERROR)?;
        Ok(orderings)
    }

    // ========================================================================
    // Token management
    // ========================================================================

    #[inline]
    fn next_token(&mut self) -> Result<(), ParseError> {
        self.token = self.scanner.scan()?;
        Ok(())
    }

    fn error(&self, template: &DiagnosticMessage, args: &[&str]) -> ParseError {
        error_at(self.token.pos, template, args)
    }

    fn validate(&self, kind: TokenKind, template: &DiagnosticMessage) -> Result<(), ParseError> {
        if self.token.kind == kind {
            Ok(())
        } else {
            Err(self.error(template, &[]))
        }
    }

    /// The current identifier with a leading `@` removed.
    fn get_identifier(&self) -> Result<String, ParseError> {
        self.validate(TokenKind::Identifier, &messages::IDENTIFIER_EXPECTED)?;
        let id = &self.token.text;
        Ok(match id.strip_prefix('@') {
            Some(rest) if !rest.is_empty() => rest.to_string(),
            _ => id.clone(),
        })
    }

    fn add_symbol(&mut self, name: &str, value: External) -> Result<(), ParseError> {
        if self.symbols.try_insert(name, value) {
            Ok(())
        } else {
            Err(self.error(&messages::DUPLICATE_IDENTIFIER, &[name]))
        }
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, ParseError>) -> Result<T, ParseError> {
        if self.depth >= self.max_depth {
            return Err(self.error(&messages::NESTING_TOO_DEEP, &[&self.max_depth.to_string()]));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn parse_expression(&mut self) -> Result<ExprRef, ParseError> {
        self.nested(|p| {
            let pos = p.token.pos;
            let expr = p.parse_binary(OperatorPrecedence::Lowest)?;
            if p.token.kind != TokenKind::Question {
                return Ok(expr);
            }
            p.next_token()?;
            let if_true = p.parse_expression()?;
            p.validate(TokenKind::Colon, &messages::COLON_EXPECTED)?;
            p.next_token()?;
            let if_false = p.parse_expression()?;
            p.generate_conditional(expr, if_true, if_false, pos)
        })
    }

    fn parse_binary(&mut self, min: OperatorPrecedence) -> Result<ExprRef, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let precedence = binary_precedence(&self.token);
            if precedence == OperatorPrecedence::Invalid || precedence < min {
                break;
            }
            let op = self.token.clone();
            self.next_token()?;
            let right = self.parse_binary(precedence.tighter())?;
            left = self.make_binary(&op, left, right)?;
        }
        Ok(left)
    }

    fn make_binary(&mut self, op: &Token, left: ExprRef, right: ExprRef) -> Result<ExprRef, ParseError> {
        if op.kind == TokenKind::Ampersand
            || (op.kind == TokenKind::Plus && (left.ty == Type::String || right.ty == Type::String))
        {
            return Ok(generate_concat(left, right));
        }
        let kind = binary_op(op).ok_or_else(|| error_at(op.pos, &messages::SYNTAX_ERROR, &[]))?;
        if kind.is_comparison() {
            return self.make_comparison(op, kind, left, right);
        }
        let table = match kind {
            BinaryOp::AndAlso | BinaryOp::OrElse => OperatorTable::Logical,
            BinaryOp::Add => OperatorTable::Add,
            BinaryOp::Subtract => OperatorTable::Subtract,
            _ => OperatorTable::Arithmetic,
        };
        let (left, right) = self.check_and_promote_operands(table, op, left, right)?;
        let date_difference = kind == BinaryOp::Subtract
            && left.ty.non_nullable() == &Type::DateTime
            && right.ty.non_nullable() == &Type::DateTime;
        let ty = if !date_difference {
            left.ty.clone()
        } else if left.ty.is_nullable() {
            Type::nullable(Type::TimeSpan)
        } else {
            Type::TimeSpan
        };
        Ok(Expr::binary(kind, left, right, ty))
    }

    fn make_comparison(
        &mut self,
        op: &Token,
        kind: BinaryOp,
        left: ExprRef,
        right: ExprRef,
    ) -> Result<ExprRef, ParseError> {
        let is_equality = matches!(kind, BinaryOp::Equal | BinaryOp::NotEqual);
        let (left, right) = if is_equality && !left.ty.is_value_type() && !right.ty.is_value_type() {
            if left.ty == right.ty {
                (left, right)
            } else if left.ty.is_assignable_from(&right.ty) {
                let ty = left.ty.clone();
                (left, Expr::convert(right, ty))
            } else if right.ty.is_assignable_from(&left.ty) {
                let ty = right.ty.clone();
                (Expr::convert(left, ty), right)
            } else {
                return Err(incompatible_operands(op, &left.ty, &right.ty));
            }
        } else if left.ty.is_enum() || right.ty.is_enum() {
            if left.ty == right.ty {
                (left, right)
            } else if let Some(r) = self.literals.promote(&right, &left.ty, true) {
                (left, r)
            } else if let Some(l) = self.literals.promote(&left, &right.ty, true) {
                (l, right)
            } else {
                return Err(incompatible_operands(op, &left.ty, &right.ty));
            }
        } else {
            let table = if is_equality {
                OperatorTable::Equality
            } else {
                OperatorTable::Relational
            };
            self.check_and_promote_operands(table, op, left, right)?
        };
        if !is_equality && left.ty == Type::String {
            let compare = Expr::call(None, Type::String, (*STRING_COMPARE).clone(), vec![left, right]);
            let zero = Expr::constant(Value::Int32(0), Type::Int32);
            return Ok(Expr::binary(kind, compare, zero, Type::Boolean));
        }
        Ok(Expr::binary(kind, left, right, Type::Boolean))
    }

    fn check_and_promote_operands(
        &self,
        table: OperatorTable,
        op: &Token,
        left: ExprRef,
        right: ExprRef,
    ) -> Result<(ExprRef, ExprRef), ParseError> {
        let original = (left.ty.clone(), right.ty.clone());
        let mut args = vec![left, right];
        let (_, result) = find_layered(&self.literals, operator_layers(table), &mut args);
        let right = args.pop();
        let left = args.pop();
        match (result, left, right) {
            (Resolution::Found(_), Some(l), Some(r)) => Ok((l, r)),
            _ => Err(incompatible_operands(op, &original.0, &original.1)),
        }
    }

    fn check_and_promote_operand(&self, table: OperatorTable, op: &Token, operand: ExprRef) -> Result<ExprRef, ParseError> {
        let original = operand.ty.clone();
        let mut args = vec![operand];
        let (_, result) = find_layered(&self.literals, operator_layers(table), &mut args);
        match (result, args.pop()) {
            (Resolution::Found(_), Some(e)) => Ok(e),
            _ => Err(error_at(
                op.pos,
                &messages::INCOMPATIBLE_OPERAND,
                &[&op.text, &original.to_string()],
            )),
        }
    }

    fn parse_unary(&mut self) -> Result<ExprRef, ParseError> {
        let is_unary = matches!(self.token.kind, TokenKind::Minus | TokenKind::Exclamation)
            || self.token.is_identifier("not");
        if !is_unary {
            return self.parse_primary();
        }
        let op = self.token.clone();
        self.next_token()?;
        if op.kind == TokenKind::Minus
            && matches!(self.token.kind, TokenKind::IntegerLiteral | TokenKind::RealLiteral)
        {
            // Fold the sign into the literal so the floor of each type parses.
            self.token.text = format!("-{}", self.token.text);
            self.token.pos = op.pos;
            return self.parse_primary();
        }
        let operand = self.nested(|p| p.parse_unary())?;
        if op.kind == TokenKind::Minus {
            let operand = self.check_and_promote_operand(OperatorTable::Negation, &op, operand)?;
            Ok(Expr::unary(UnaryOp::Negate, operand))
        } else {
            let operand = self.check_and_promote_operand(OperatorTable::Not, &op, operand)?;
            Ok(Expr::unary(UnaryOp::Not, operand))
        }
    }

    fn parse_primary(&mut self) -> Result<ExprRef, ParseError> {
        let mut expr = self.parse_primary_start()?;
        loop {
            match self.token.kind {
                TokenKind::Dot => {
                    self.next_token()?;
                    let ty = expr.ty.clone();
                    expr = self.parse_member_access(ty, Some(expr))?;
                }
                TokenKind::OpenBracket => expr = self.parse_element_access(expr)?,
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary_start(&mut self) -> Result<ExprRef, ParseError> {
        match self.token.kind {
            TokenKind::Identifier => self.parse_identifier(),
            TokenKind::StringLiteral => self.parse_string_literal(),
            TokenKind::IntegerLiteral => self.parse_integer_literal(),
            TokenKind::RealLiteral => self.parse_real_literal(),
            TokenKind::OpenParen => self.parse_paren_expression(),
            _ => Err(self.error(&messages::EXPRESSION_EXPECTED, &[])),
        }
    }

    // ========================================================================
    // Literals
    // ========================================================================

    fn parse_string_literal(&mut self) -> Result<ExprRef, ParseError> {
        let raw = self.token.text.clone();
        let quote = raw.chars().next().unwrap_or('"');
        let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or("");
        let text = inner.replace(&format!("{0}{0}", quote), &quote.to_string());
        if quote == '\'' {
            let mut chars = text.chars();
            let c = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => return Err(self.error(&messages::INVALID_CHARACTER_LITERAL, &[])),
            };
            self.next_token()?;
            return Ok(self.literals.create(Value::Char(c), text));
        }
        self.next_token()?;
        Ok(self.literals.create(Value::string(&text), text))
    }

    /// Non-negative literals take the first of `Int32`, `UInt32`, `Int64`,
    /// `UInt64` that holds them; negative ones `Int32` or `Int64`.
    fn parse_integer_literal(&mut self) -> Result<ExprRef, ParseError> {
        let text = self.token.text.clone();
        let invalid = || error_at(self.token.pos, &messages::INVALID_INTEGER_LITERAL, &[&text]);
        let value = if text.starts_with('-') {
            let v: i64 = text.parse().map_err(|_| invalid())?;
            i32::try_from(v).map_or(Value::Int64(v), Value::Int32)
        } else {
            let v: u64 = text.parse().map_err(|_| invalid())?;
            if let Ok(v) = i32::try_from(v) {
                Value::Int32(v)
            } else if let Ok(v) = u32::try_from(v) {
                Value::UInt32(v)
            } else if let Ok(v) = i64::try_from(v) {
                Value::Int64(v)
            } else {
                Value::UInt64(v)
            }
        };
        self.next_token()?;
        Ok(self.literals.create(value, text))
    }

    fn parse_real_literal(&mut self) -> Result<ExprRef, ParseError> {
        let text = self.token.text.clone();
        let value = match text.strip_suffix(|c: char| c == 'f' || c == 'F') {
            Some(digits) => digits.parse::<f32>().ok().map(Value::Single),
            None => text.parse::<f64>().ok().map(Value::Double),
        };
        let value = value.ok_or_else(|| self.error(&messages::INVALID_REAL_LITERAL, &[&text]))?;
        self.next_token()?;
        Ok(self.literals.create(value, text))
    }

    fn parse_paren_expression(&mut self) -> Result<ExprRef, ParseError> {
        self.validate(TokenKind::OpenParen, &messages::OPEN_PAREN_EXPECTED)?;
        self.next_token()?;
        let expr = self.parse_expression()?;
        self.validate(TokenKind::CloseParen, &messages::CLOSE_PAREN_OR_OPERATOR_EXPECTED)?;
        self.next_token()?;
        Ok(expr)
    }

    // ========================================================================
    // Identifiers
    // ========================================================================

    fn parse_identifier(&mut self) -> Result<ExprRef, ParseError> {
        self.validate(TokenKind::Identifier, &messages::IDENTIFIER_EXPECTED)?;
        let text = self.token.text.clone();
        let keyword = |word: &str| text.eq_ignore_ascii_case(word);
        if keyword("true") || keyword("false") {
            let value = keyword("true");
            self.next_token()?;
            return Ok(Expr::constant(Value::Boolean(value), Type::Boolean));
        }
        if keyword("null") {
            self.next_token()?;
            return Ok(self.literals.null_literal());
        }
        if keyword("it") {
            return self.parse_it();
        }
        if keyword("iif") {
            return self.parse_iif();
        }
        if keyword("new") {
            return self.parse_new();
        }
        if let Some(ty) = Type::predefined(&text) {
            return self.parse_type_access(ty);
        }
        let symbol = self
            .symbols
            .get(&text)
            .or_else(|| self.externals.and_then(|m| m.get(&text)))
            .cloned();
        if let Some(symbol) = symbol {
            return self.parse_symbol(symbol);
        }
        if let Some(it) = self.it.clone() {
            return self.parse_member_access(it.ty.clone(), Some(Expr::parameter(&it)));
        }
        Err(self.error(&messages::UNKNOWN_IDENTIFIER, &[&text]))
    }

    fn parse_symbol(&mut self, symbol: External) -> Result<ExprRef, ParseError> {
        let pos = self.token.pos;
        let expr = match symbol {
            External::Value(v) => {
                let ty = v.type_of();
                Expr::constant(v, ty)
            }
            External::Expr(e) => e,
            External::Symbols(_) => return Err(self.error(&messages::NOT_A_VALUE, &[&self.token.text])),
        };
        self.next_token()?;
        if self.token.kind == TokenKind::OpenParen {
            if let Some(lambda) = expr.as_lambda().cloned() {
                return self.parse_lambda_invocation(expr, &lambda, pos);
            }
        }
        Ok(expr)
    }

    fn parse_lambda_invocation(
        &mut self,
        expr: ExprRef,
        lambda: &LambdaExpr,
        pos: TextPos,
    ) -> Result<ExprRef, ParseError> {
        let mut args = self.parse_argument_list()?;
        let params: Vec<Type> = lambda.parameters.iter().map(|p| p.ty.clone()).collect();
        let invoke = [Arc::new(MethodInfo::signature("Invoke", &params))];
        if !find_best_method(&self.literals, &invoke, &mut args).is_found() {
            return Err(error_at(pos, &messages::ARGS_INCOMPATIBLE_WITH_LAMBDA, &[]));
        }
        Ok(Expr::new(
            lambda.result_type().clone(),
            ExprKind::Invoke { lambda: expr, args },
        ))
    }

    fn parse_it(&mut self) -> Result<ExprRef, ParseError> {
        let it = self.it.clone().ok_or_else(|| self.error(&messages::NO_IT_IN_SCOPE, &[]))?;
        self.next_token()?;
        Ok(Expr::parameter(&it))
    }

    fn parse_iif(&mut self) -> Result<ExprRef, ParseError> {
        let pos = self.token.pos;
        self.next_token()?;
        let args = self.parse_argument_list()?;
        let [test, if_true, if_false]: [ExprRef; 3] = args
            .try_into()
            .map_err(|_| error_at(pos, &messages::IIF_REQUIRES_THREE_ARGS, &[]))?;
        self.generate_conditional(test, if_true, if_false, pos)
    }

    fn generate_conditional(
        &self,
        test: ExprRef,
        if_true: ExprRef,
        if_false: ExprRef,
        pos: TextPos,
    ) -> Result<ExprRef, ParseError> {
        if test.ty != Type::Boolean {
            return Err(error_at(pos, &messages::FIRST_EXPR_MUST_BE_BOOL, &[]));
        }
        if if_true.ty == if_false.ty {
            return Ok(Expr::conditional(test, if_true, if_false));
        }
        let true_as_false = if self.literals.is_null_literal(&if_false) {
            None
        } else {
            self.literals.promote(&if_true, &if_false.ty, true)
        };
        let false_as_true = if self.literals.is_null_literal(&if_true) {
            None
        } else {
            self.literals.promote(&if_false, &if_true.ty, true)
        };
        match (true_as_false, false_as_true) {
            (Some(t), None) => Ok(Expr::conditional(test, t, if_false)),
            (None, Some(f)) => Ok(Expr::conditional(test, if_true, f)),
            (both, _) => {
                let name = |e: &ExprRef| {
                    if self.literals.is_null_literal(e) {
                        "null".to_string()
                    } else {
                        e.ty.to_string()
                    }
                };
                let template = if both.is_some() {
                    &messages::BOTH_TYPES_CONVERT_TO_OTHER
                } else {
                    &messages::NEITHER_TYPE_CONVERTS_TO_OTHER
                };
                Err(error_at(pos, template, &[&name(&if_true), &name(&if_false)]))
            }
        }
    }

    /// `new(expr [as Name], ...)`: a projection into a synthesized record.
    fn parse_new(&mut self) -> Result<ExprRef, ParseError> {
        let pos = self.token.pos;
        self.next_token()?;
        self.validate(TokenKind::OpenParen, &messages::OPEN_PAREN_EXPECTED)?;
        self.next_token()?;
        let mut descriptors = Vec::new();
        let mut bindings = Vec::new();
        loop {
            let item_pos = self.token.pos;
            let expr = self.parse_expression()?;
            let name = if self.token.is_identifier("as") {
                self.next_token()?;
                let name = self.get_identifier()?;
                self.next_token()?;
                name
            } else {
                expr.member_name()
                    .map(str::to_string)
                    .ok_or_else(|| error_at(item_pos, &messages::MISSING_AS_CLAUSE, &[]))?
            };
            descriptors.push(PropertyDescriptor::new(name, expr.ty.clone()));
            bindings.push(expr);
            if self.token.kind != TokenKind::Comma {
                break;
            }
            self.next_token()?;
        }
        self.validate(TokenKind::CloseParen, &messages::CLOSE_PAREN_OR_COMMA_EXPECTED)?;
        self.next_token()?;
        let record = self
            .factory
            .get_or_create(&descriptors)
            .map_err(|e| error_at(pos, &messages::INVALID_PROJECTION, &[&e.to_string()]))?;
        Ok(Expr::new(
            Type::Record(record.clone()),
            ExprKind::MemberInit { record, bindings },
        ))
    }

    // ========================================================================
    // Types and members
    // ========================================================================

    fn parse_type_access(&mut self, ty: Type) -> Result<ExprRef, ParseError> {
        let pos = self.token.pos;
        self.next_token()?;
        let mut ty = ty;
        if self.token.kind == TokenKind::Question {
            if !ty.is_value_type() || ty.is_nullable() {
                return Err(error_at(pos, &messages::TYPE_HAS_NO_NULLABLE_FORM, &[&ty.to_string()]));
            }
            ty = Type::nullable(ty);
            self.next_token()?;
        }
        if self.token.kind == TokenKind::OpenParen {
            let mut args = self.parse_argument_list()?;
            let ctors = catalog::constructors(&ty);
            return match find_best_method(&self.literals, &ctors, &mut args) {
                Resolution::Found(ctor) => Ok(Expr::new(ty, ExprKind::New { ctor, args })),
                Resolution::Ambiguous => Err(error_at(
                    pos,
                    &messages::AMBIGUOUS_CONSTRUCTOR_INVOCATION,
                    &[&ty.to_string()],
                )),
                Resolution::NotFound => match args.pop() {
                    Some(arg) if args.is_empty() => self.generate_conversion(arg, &ty, pos),
                    _ => Err(error_at(pos, &messages::NO_MATCHING_CONSTRUCTOR, &[&ty.to_string()])),
                },
            };
        }
        self.validate(TokenKind::Dot, &messages::DOT_OR_OPEN_PAREN_EXPECTED)?;
        self.next_token()?;
        self.parse_member_access(ty, None)
    }

    /// Explicit conversion `T(expr)`.
    fn generate_conversion(&self, expr: ExprRef, ty: &Type, pos: TextPos) -> Result<ExprRef, ParseError> {
        let source = expr.ty.clone();
        if &source == ty {
            return Ok(expr);
        }
        if source.is_value_type() && ty.is_value_type() {
            if (source.is_nullable() || ty.is_nullable()) && source.non_nullable() == ty.non_nullable() {
                return Ok(Expr::convert(expr, ty.clone()));
            }
            let numeric_or_enum = |t: &Type| is_numeric(t) || t.is_enum();
            if numeric_or_enum(&source) && numeric_or_enum(ty) {
                return Ok(Expr::convert_checked(expr, ty.clone()));
            }
        }
        if source.is_assignable_from(ty) || ty.is_assignable_from(&source) || is_interface(&source) || is_interface(ty) {
            return Ok(Expr::convert(expr, ty.clone()));
        }
        Err(error_at(
            pos,
            &messages::CANNOT_CONVERT_VALUE,
            &[&source.to_string(), &ty.to_string()],
        ))
    }

    /// `.name` or `.name(args)` on `instance`, or on the static members of
    /// `ty` when there is no instance.
    fn parse_member_access(&mut self, ty: Type, instance: Option<ExprRef>) -> Result<ExprRef, ParseError> {
        let pos = self.token.pos;
        let id = self.get_identifier()?;
        self.next_token()?;
        let static_access = instance.is_none();
        if self.token.kind != TokenKind::OpenParen {
            let member = catalog::find_property(&ty, &id, static_access).ok_or_else(|| {
                error_at(pos, &messages::UNKNOWN_PROPERTY_OR_FIELD, &[&id, &ty.to_string()])
            })?;
            return Ok(Expr::member(instance, ty, member));
        }
        if let Some(source) = &instance {
            if ty != Type::String {
                if let Some(element) = ty.element_type() {
                    return self.parse_aggregate(source.clone(), element, &id, pos);
                }
            }
        }
        let mut args = self.parse_argument_list()?;
        let layers = catalog::find_methods(&ty, &id, static_access);
        let (index, result) = find_layered(&self.literals, layers.iter().map(|l| l.methods.as_slice()), &mut args);
        match result {
            Resolution::NotFound => Err(error_at(pos, &messages::NO_APPLICABLE_METHOD, &[&id, &ty.to_string()])),
            Resolution::Ambiguous => Err(error_at(
                pos,
                &messages::AMBIGUOUS_METHOD_INVOCATION,
                &[&id, &ty.to_string()],
            )),
            Resolution::Found(method) => {
                let owner = layers.get(index).map_or_else(|| ty.clone(), |l| l.owner.clone());
                if !catalog::is_predefined(&owner) {
                    return Err(error_at(pos, &messages::METHODS_ARE_INACCESSIBLE, &[&owner.to_string()]));
                }
                if method.result.is_none() {
                    return Err(error_at(pos, &messages::METHOD_IS_VOID, &[&id, &owner.to_string()]));
                }
                Ok(Expr::call(instance, owner, method, args))
            }
        }
    }

    /// An aggregate call over a sequence. The argument, if any, is parsed
    /// with `it` bound to the element.
    fn parse_aggregate(
        &mut self,
        source: ExprRef,
        element: Type,
        name: &str,
        pos: TextPos,
    ) -> Result<ExprRef, ParseError> {
        let inner = ParameterExpr::unnamed(element);
        let outer = self.it.replace(inner.clone());
        let args = self.parse_argument_list();
        self.it = outer;
        let mut args = args?;
        let no_aggregate = || error_at(pos, &messages::NO_APPLICABLE_AGGREGATE, &[name]);
        let methods = aggregate_methods(name);
        let method = match find_best_method(&self.literals, &methods, &mut args) {
            Resolution::Found(m) => m,
            _ => return Err(no_aggregate()),
        };
        let op = AggregateOp::from_name(&method.name).ok_or_else(no_aggregate)?;
        let selector_ty = args.first().map(|a| a.ty.clone());
        let ty = match op {
            AggregateOp::Where => Type::sequence(inner.ty.clone()),
            AggregateOp::Any | AggregateOp::All => Type::Boolean,
            AggregateOp::Count => Type::Int32,
            AggregateOp::Min | AggregateOp::Max | AggregateOp::Sum => selector_ty.unwrap_or(Type::Object),
            AggregateOp::Average => selector_ty.map_or(Type::Double, |t| average_result(&t)),
        };
        let selector = args.into_iter().next().map(|body| LambdaExpr::new(vec![inner], body));
        Ok(Expr::new(ty, ExprKind::Aggregate { source, op, selector }))
    }

    fn parse_element_access(&mut self, expr: ExprRef) -> Result<ExprRef, ParseError> {
        let pos = self.token.pos;
        self.validate(TokenKind::OpenBracket, &messages::OPEN_PAREN_EXPECTED)?;
        self.next_token()?;
        let mut args = self.parse_arguments()?;
        self.validate(TokenKind::CloseBracket, &messages::CLOSE_BRACKET_OR_COMMA_EXPECTED)?;
        self.next_token()?;
        if let Type::Array(element) = &expr.ty {
            let element = (**element).clone();
            let index = match args.as_slice() {
                [index] => self
                    .literals
                    .promote(index, &Type::Int32, true)
                    .ok_or_else(|| error_at(pos, &messages::INVALID_INDEX, &[]))?,
                _ => return Err(error_at(pos, &messages::CANNOT_INDEX_MULTI_DIM_ARRAY, &[])),
            };
            return Ok(Expr::new(element, ExprKind::ArrayIndex { target: expr, index }));
        }
        let layers = catalog::find_indexers(&expr.ty);
        let (index, result) = find_layered(&self.literals, layers.iter().map(|l| l.methods.as_slice()), &mut args);
        match result {
            Resolution::NotFound => Err(error_at(pos, &messages::NO_APPLICABLE_INDEXER, &[&expr.ty.to_string()])),
            Resolution::Ambiguous => Err(error_at(
                pos,
                &messages::AMBIGUOUS_INDEXER_INVOCATION,
                &[&expr.ty.to_string()],
            )),
            Resolution::Found(method) => {
                let owner = layers.get(index).map_or_else(|| expr.ty.clone(), |l| l.owner.clone());
                Ok(Expr::call(Some(expr), owner, method, args))
            }
        }
    }

    fn parse_argument_list(&mut self) -> Result<Vec<ExprRef>, ParseError> {
        self.validate(TokenKind::OpenParen, &messages::OPEN_PAREN_EXPECTED)?;
        self.next_token()?;
        let args = if self.token.kind != TokenKind::CloseParen {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        self.validate(TokenKind::CloseParen, &messages::CLOSE_PAREN_OR_COMMA_EXPECTED)?;
        self.next_token()?;
        Ok(args)
    }

    fn parse_arguments(&mut self) -> Result<Vec<ExprRef>, ParseError> {
        let mut args = Vec::new();
        loop {
            args.push(self.parse_expression()?);
            if self.token.kind != TokenKind::Comma {
                break;
            }
            self.next_token()?;
        }
        Ok(args)
    }
}
