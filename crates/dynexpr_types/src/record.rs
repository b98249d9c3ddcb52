//! Synthesized structural record types and their instances.

use crate::factory::FactoryError;
use crate::signature::Signature;
use crate::ty::Type;
use crate::value::Value;
use dynexpr_core::CaseInsensitiveMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// One (name, type) pair of a record shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyDescriptor {
    pub name: String,
    pub ty: Type,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self { name: name.into(), ty }
    }
}

/// A record type synthesized for one signature. Immutable once created.
pub struct RecordType {
    id: u32,
    name: String,
    properties: Vec<PropertyDescriptor>,
    index: CaseInsensitiveMap<usize>,
    signature: Signature,
}

impl RecordType {
    pub(crate) fn new(
        id: u32,
        properties: Vec<PropertyDescriptor>,
        signature: Signature,
    ) -> Result<Self, FactoryError> {
        let index = property_index(&properties)?;
        Ok(Self {
            id,
            name: format!("DynamicClass{}", id),
            properties,
            index,
            signature,
        })
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Field position of a property, ignoring case.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.field_index(name).map(|i| &self.properties[i])
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Reject shapes with two properties whose names differ only in case.
pub(crate) fn property_index(properties: &[PropertyDescriptor]) -> Result<CaseInsensitiveMap<usize>, FactoryError> {
    let mut index = CaseInsensitiveMap::with_capacity(properties.len());
    for (i, p) in properties.iter().enumerate() {
        if !index.try_insert(p.name.as_str(), i) {
            return Err(FactoryError::DuplicateProperty(p.name.clone()));
        }
    }
    Ok(index)
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field("properties", &self.properties)
            .finish()
    }
}

// ============================================================================
// Instances
// ============================================================================

/// An instance of a synthesized record: one value per property, in
/// declaration order.
///
/// Two instances are equal when they share the same record type and every
/// field is equal; comparison stops at the first differing field. The hash
/// is the XOR of the field hashes.
#[derive(Clone)]
pub struct RecordInstance {
    ty: Arc<RecordType>,
    fields: Vec<Value>,
}

impl RecordInstance {
    /// A new instance with every field at its type's default value.
    pub fn new(ty: Arc<RecordType>) -> Self {
        let fields = ty.properties.iter().map(|p| Value::default_for(&p.ty)).collect();
        Self { ty, fields }
    }

    /// An instance populated from values given in field order.
    pub fn with_values(ty: Arc<RecordType>, values: Vec<Value>) -> Result<Self, FactoryError> {
        if values.len() != ty.len() {
            return Err(FactoryError::ArityMismatch {
                expected: ty.len(),
                found: values.len(),
            });
        }
        for (p, v) in ty.properties.iter().zip(&values) {
            check_field(p, v)?;
        }
        Ok(Self { ty, fields: values })
    }

    pub fn set(&mut self, name: &str, value: Value) -> Result<(), FactoryError> {
        let idx = self.ty.field_index(name).ok_or_else(|| FactoryError::UnknownProperty {
            name: name.to_string(),
            type_name: self.ty.name.clone(),
        })?;
        check_field(&self.ty.properties[idx], &value)?;
        self.fields[idx] = value;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.ty.field_index(name).map(|i| &self.fields[i])
    }

    #[inline]
    pub fn field(&self, index: usize) -> Option<&Value> {
        self.fields.get(index)
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.ty
    }

    pub fn into_value(self) -> Value {
        Value::Record(Arc::new(self))
    }

    pub fn structural_hash(&self) -> u64 {
        self.fields.iter().fold(0u64, |acc, v| {
            let mut hasher = rustc_hash::FxHasher::default();
            v.hash(&mut hasher);
            acc ^ hasher.finish()
        })
    }
}

fn check_field(p: &PropertyDescriptor, v: &Value) -> Result<(), FactoryError> {
    if v.conforms_to(&p.ty) {
        Ok(())
    } else {
        Err(FactoryError::TypeMismatch {
            property: p.name.clone(),
            expected: p.ty.to_string(),
            found: v.type_of().to_string(),
        })
    }
}

impl PartialEq for RecordInstance {
    fn eq(&self, other: &RecordInstance) -> bool {
        Arc::ptr_eq(&self.ty, &other.ty)
            && self.fields.iter().zip(&other.fields).all(|(a, b)| a == b)
    }
}

impl Eq for RecordInstance {}

impl Hash for RecordInstance {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.structural_hash());
    }
}

impl fmt::Display for RecordInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (p, v)) in self.ty.properties.iter().zip(&self.fields).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", p.name, v)?;
        }
        write!(f, "}}")
    }
}

impl fmt::Debug for RecordInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.ty.name, self)
    }
}
