use crate::coerce::coerce_leaf;
use crate::MaterializeError;
use dynexpr_types::{PropertyDescriptor, RecordInstance, Type, TypeFactory, Value};
use serde_json::Map;
use std::sync::Arc;

/// Materializes decoded JSON against a shared record type cache.
///
/// An object nested inside an object is typed `Object` in the outer
/// signature, so the outer shape does not depend on the inner one; its
/// value is still a record of its own shape. Arrays become sequences
/// typed `IEnumerable<Object>`.
#[derive(Debug, Clone, Copy)]
pub struct Materializer<'a> {
    factory: &'a TypeFactory,
    coerce_array_elements: bool,
}

impl<'a> Materializer<'a> {
    pub fn new(factory: &'a TypeFactory) -> Self {
        Self {
            factory,
            coerce_array_elements: true,
        }
    }

    /// When false, scalar array elements keep their decoded JSON type
    /// instead of going through leaf inference.
    pub fn coerce_array_elements(mut self, coerce: bool) -> Self {
        self.coerce_array_elements = coerce;
        self
    }

    pub fn factory(&self) -> &'a TypeFactory {
        self.factory
    }

    /// Materialize any node. A top-level scalar is inferred like a leaf.
    pub fn materialize(&self, node: &serde_json::Value) -> Result<Value, MaterializeError> {
        Ok(self.node(node)?.1)
    }

    /// Materialize a JSON object into a record instance.
    pub fn materialize_record(&self, node: &serde_json::Value) -> Result<Arc<RecordInstance>, MaterializeError> {
        match node {
            serde_json::Value::Object(map) => self.record(map),
            other => Err(MaterializeError::NotAnObject(kind_name(other))),
        }
    }

    fn node(&self, node: &serde_json::Value) -> Result<(Type, Value), MaterializeError> {
        match node {
            serde_json::Value::Object(map) => {
                let record = self.record(map)?;
                Ok((Type::Object, Value::Record(record)))
            }
            serde_json::Value::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| self.element(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((Type::sequence(Type::Object), Value::sequence(items)))
            }
            leaf => Ok(coerce_leaf(leaf)),
        }
    }

    fn element(&self, item: &serde_json::Value) -> Result<Value, MaterializeError> {
        match item {
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => self.materialize(item),
            leaf if self.coerce_array_elements => Ok(coerce_leaf(leaf).1),
            leaf => Ok(decoded(leaf)),
        }
    }

    fn record(&self, map: &Map<String, serde_json::Value>) -> Result<Arc<RecordInstance>, MaterializeError> {
        let mut descriptors = Vec::with_capacity(map.len());
        let mut values = Vec::with_capacity(map.len());
        for (name, node) in map {
            let (ty, value) = self.node(node)?;
            tracing::trace!(property = name.as_str(), ty = %ty, "inferred property");
            descriptors.push(PropertyDescriptor::new(name.as_str(), ty));
            values.push(value);
        }
        let record_type = self.factory.get_or_create(&descriptors)?;
        Ok(Arc::new(RecordInstance::with_values(record_type, values)?))
    }
}

/// A scalar in its decoded JSON type.
fn decoded(leaf: &serde_json::Value) -> Value {
    match leaf {
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int64(i),
            None => n.as_f64().map_or(Value::Null, Value::Double),
        },
        serde_json::Value::String(s) => Value::string(s),
        _ => Value::Null,
    }
}

fn kind_name(node: &serde_json::Value) -> &'static str {
    match node {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
