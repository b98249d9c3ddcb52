//! dynexpr_engine: The embedding facade.
//!
//! [`Engine`] owns the record type cache and the configured options, and
//! routes parsing, materialization, evaluation and request dispatch
//! through them. One engine is meant to live for the whole process and be
//! shared by reference; every method takes `&self` except handler
//! registration.

pub mod registry;

pub use registry::{DispatchError, Handler, HandlerRegistry, CALL_METHOD};

use dynexpr_ast::{DynamicOrdering, ExprRef, LambdaExpr, ParameterExpr};
use dynexpr_diagnostics::ParseError;
use dynexpr_evaluator::EvalError;
use dynexpr_materializer::{MaterializeError, Materializer};
use dynexpr_options::EngineOptions;
use dynexpr_parser::{External, Parser};
use dynexpr_types::{Type, TypeFactory, Value};
use rayon::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Materialize(#[from] MaterializeError),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("Invalid JSON: {0}")]
    Json(String),
}

#[derive(Debug)]
pub struct Engine {
    factory: TypeFactory,
    options: EngineOptions,
    handlers: HandlerRegistry,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        tracing::debug!(?options, "creating engine");
        Self {
            factory: TypeFactory::with_limit(options.max_record_types),
            options,
            handlers: HandlerRegistry::new(),
        }
    }

    pub fn factory(&self) -> &TypeFactory {
        &self.factory
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    // ========================================================================
    // Parsing
    // ========================================================================

    fn parser<'a>(
        &'a self,
        text: &str,
        parameters: &[Arc<ParameterExpr>],
        values: &'a [External],
    ) -> Result<Parser<'a>, ParseError> {
        Ok(Parser::new(&self.factory, text, parameters, values)?.with_max_depth(self.options.max_nesting_depth))
    }

    pub fn parse(
        &self,
        result_type: Option<&Type>,
        text: &str,
        parameters: &[Arc<ParameterExpr>],
        values: &[External],
    ) -> Result<ExprRef, ParseError> {
        self.parser(text, parameters, values)?.parse(result_type)
    }

    pub fn parse_lambda(
        &self,
        parameters: Vec<Arc<ParameterExpr>>,
        result_type: Option<&Type>,
        text: &str,
        values: &[External],
    ) -> Result<Arc<LambdaExpr>, ParseError> {
        let body = self.parse(result_type, text, &parameters, values)?;
        Ok(LambdaExpr::new(parameters, body))
    }

    pub fn parse_lambda_it(
        &self,
        it_type: Type,
        result_type: Option<&Type>,
        text: &str,
        values: &[External],
    ) -> Result<Arc<LambdaExpr>, ParseError> {
        self.parse_lambda(vec![ParameterExpr::unnamed(it_type)], result_type, text, values)
    }

    pub fn parse_ordering(
        &self,
        parameters: &[Arc<ParameterExpr>],
        text: &str,
        values: &[External],
    ) -> Result<Vec<DynamicOrdering>, ParseError> {
        self.parser(text, parameters, values)?.parse_ordering()
    }

    // ========================================================================
    // Materialization
    // ========================================================================

    pub fn materializer(&self) -> Materializer<'_> {
        Materializer::new(&self.factory).coerce_array_elements(self.options.coerce_array_elements)
    }

    pub fn materialize(&self, node: &serde_json::Value) -> Result<Value, MaterializeError> {
        self.materializer().materialize(node)
    }

    pub fn materialize_str(&self, json: &str) -> Result<Value, EngineError> {
        let node: serde_json::Value = serde_json::from_str(json).map_err(|e| EngineError::Json(e.to_string()))?;
        Ok(self.materialize(&node)?)
    }

    /// Materialize many payloads in parallel against the shared cache.
    pub fn materialize_batch(&self, nodes: &[serde_json::Value]) -> Vec<Result<Value, MaterializeError>> {
        let materializer = self.materializer();
        nodes.par_iter().map(|node| materializer.materialize(node)).collect()
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    pub fn evaluate(&self, lambda: &LambdaExpr, args: &[Value]) -> Result<Value, EvalError> {
        dynexpr_evaluator::evaluate(lambda, args)
    }

    /// Parse `text` with `it` typed as `value`'s type and evaluate it
    /// against `value`.
    pub fn evaluate_over(&self, text: &str, value: &Value, values: &[External]) -> Result<Value, EngineError> {
        let lambda = self.parse_lambda_it(value.type_of(), None, text, values)?;
        Ok(self.evaluate(&lambda, std::slice::from_ref(value))?)
    }

    /// Sort `items` by an ordering clause written over `item_type`.
    pub fn order_by(&self, item_type: Type, text: &str, items: &[Value]) -> Result<Vec<Value>, EngineError> {
        let it = ParameterExpr::unnamed(item_type);
        let orderings = self.parse_ordering(std::slice::from_ref(&it), text, &[])?;
        Ok(dynexpr_evaluator::order_by(items, &it, &orderings)?)
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn register<F>(&mut self, name: impl Into<String>, handler: F) -> Result<(), DispatchError>
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.handlers.register(name, handler)
    }

    pub fn dispatch(&self, request: &serde_json::Value) -> Result<serde_json::Value, DispatchError> {
        self.handlers.dispatch(&self.materializer(), request)
    }

    pub fn dispatch_str(&self, request: &str) -> Result<serde_json::Value, EngineError> {
        let node: serde_json::Value =
            serde_json::from_str(request).map_err(|e| EngineError::Json(e.to_string()))?;
        Ok(self.dispatch(&node)?)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}
