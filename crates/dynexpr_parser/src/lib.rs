//! dynexpr_parser: Type-checking parser for expression text.
//!
//! Parses expression text into a typed tree. Operators, calls, indexers and
//! constructors are resolved against signature tables with the numeric
//! promotion rules of [`dynexpr_types::conversion`].

mod parser;
mod precedence;
mod promote;
mod resolver;
mod signatures;

pub use parser::{External, Parser, DEFAULT_MAX_DEPTH};
pub use promote::LiteralRegistry;
pub use resolver::{find_best_method, Resolution};

use dynexpr_ast::{DynamicOrdering, ExprRef, LambdaExpr, ParameterExpr};
use dynexpr_diagnostics::ParseError;
use dynexpr_types::{Type, TypeFactory};
use std::sync::Arc;

/// Parse `text` as an expression over `parameters`, promoted to
/// `result_type` when one is given.
pub fn parse(
    factory: &TypeFactory,
    result_type: Option<&Type>,
    text: &str,
    parameters: &[Arc<ParameterExpr>],
    values: &[External],
) -> Result<ExprRef, ParseError> {
    Parser::new(factory, text, parameters, values)?.parse(result_type)
}

pub fn parse_lambda(
    factory: &TypeFactory,
    parameters: Vec<Arc<ParameterExpr>>,
    result_type: Option<&Type>,
    text: &str,
    values: &[External],
) -> Result<Arc<LambdaExpr>, ParseError> {
    let body = parse(factory, result_type, text, &parameters, values)?;
    Ok(LambdaExpr::new(parameters, body))
}

/// A lambda over one unnamed parameter of `it_type`, available to the
/// expression as `it` and as the receiver of bare member names.
pub fn parse_lambda_it(
    factory: &TypeFactory,
    it_type: Type,
    result_type: Option<&Type>,
    text: &str,
    values: &[External],
) -> Result<Arc<LambdaExpr>, ParseError> {
    parse_lambda(factory, vec![ParameterExpr::unnamed(it_type)], result_type, text, values)
}

pub fn parse_ordering(
    factory: &TypeFactory,
    parameters: &[Arc<ParameterExpr>],
    text: &str,
    values: &[External],
) -> Result<Vec<DynamicOrdering>, ParseError> {
    Parser::new(factory, text, parameters, values)?.parse_ordering()
}
