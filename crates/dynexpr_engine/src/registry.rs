//! Name-to-handler dispatch for decoded call requests.
//!
//! A request is a JSON object `{"Function": "CallMethod", "Method": name,
//! "Args": [...]}`. The arguments are materialized, the handler registered
//! under `name` is called with them, and its result is rendered back to
//! JSON. Every failure is returned to the caller.

use dynexpr_materializer::{to_json, MaterializeError, Materializer};
use dynexpr_types::Value;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// The only request function the registry serves.
pub const CALL_METHOD: &str = "CallMethod";

pub type Handler = Arc<dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("Malformed request: {0}")]
    Malformed(String),
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),
    #[error("No handler is registered for method '{0}'")]
    UnknownMethod(String),
    #[error("A handler is already registered for method '{0}'")]
    DuplicateHandler(String),
    #[error("Argument {index} of '{method}': {source}")]
    Argument {
        method: String,
        index: usize,
        #[source]
        source: MaterializeError,
    },
    #[error("Method '{method}' failed: {message}")]
    Handler { method: String, message: String },
}

#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: IndexMap<String, Handler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`. Names are matched exactly.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F) -> Result<(), DispatchError>
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.handlers.contains_key(&name) {
            return Err(DispatchError::DuplicateHandler(name));
        }
        self.handlers.insert(name, Arc::new(handler));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }

    /// Registered method names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Serve one decoded request.
    pub fn dispatch(
        &self,
        materializer: &Materializer<'_>,
        request: &serde_json::Value,
    ) -> Result<serde_json::Value, DispatchError> {
        let request = request
            .as_object()
            .ok_or_else(|| DispatchError::Malformed("the request is not an object".into()))?;
        let field = |name: &str| {
            request
                .get(name)
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| DispatchError::Malformed(format!("missing string field '{}'", name)))
        };
        let function = field("Function")?;
        if function != CALL_METHOD {
            return Err(DispatchError::UnknownFunction(function.to_string()));
        }
        let method = field("Method")?;
        let args = match request.get("Args") {
            Some(serde_json::Value::Array(args)) => args.as_slice(),
            Some(serde_json::Value::Null) | None => &[],
            Some(_) => return Err(DispatchError::Malformed("'Args' is not an array".into())),
        };
        let handler = self
            .handlers
            .get(method)
            .ok_or_else(|| DispatchError::UnknownMethod(method.to_string()))?;

        let values = args
            .iter()
            .enumerate()
            .map(|(index, arg)| {
                materializer.materialize(arg).map_err(|source| DispatchError::Argument {
                    method: method.to_string(),
                    index,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(method, args = values.len(), "dispatching");
        match handler(&values) {
            Ok(result) => Ok(to_json(&result)),
            Err(message) => {
                tracing::warn!(method, %message, "handler failed");
                Err(DispatchError::Handler {
                    method: method.to_string(),
                    message,
                })
            }
        }
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("methods", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
