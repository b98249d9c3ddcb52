//! The record type cache.
//!
//! [`TypeFactory::get_or_create`] maps a descriptor list to exactly one
//! [`RecordType`] per distinct [`Signature`], for the lifetime of the
//! factory. Concurrent callers racing on the same signature go through the
//! map's entry lock, so only one of them synthesizes the type. Entries are
//! never evicted; an optional limit makes creation fail once reached.

use crate::record::{property_index, PropertyDescriptor, RecordType};
use crate::signature::Signature;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use dynexpr_core::NameTable;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FactoryError {
    #[error("The property '{0}' is defined more than once")]
    DuplicateProperty(String),
    #[error("The record type limit of {limit} has been reached")]
    CapacityExceeded { limit: usize },
    #[error("No property '{name}' exists in type '{type_name}'")]
    UnknownProperty { name: String, type_name: String },
    #[error("Property '{property}' expects a value of type '{expected}', found '{found}'")]
    TypeMismatch {
        property: String,
        expected: String,
        found: String,
    },
    #[error("Expected {expected} field values, found {found}")]
    ArityMismatch { expected: usize, found: usize },
}

pub struct TypeFactory {
    interner: NameTable,
    types: DashMap<Signature, Arc<RecordType>>,
    next_id: AtomicU32,
    count: AtomicUsize,
    limit: Option<usize>,
}

impl TypeFactory {
    pub fn new() -> Self {
        Self::with_limit(None)
    }

    /// A factory that refuses to synthesize more than `limit` types.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            interner: NameTable::new(),
            types: DashMap::new(),
            next_id: AtomicU32::new(0),
            count: AtomicUsize::new(0),
            limit,
        }
    }

    pub fn signature(&self, descriptors: &[PropertyDescriptor]) -> Signature {
        Signature::new(&self.interner, descriptors)
    }

    /// Return the record type for this descriptor list, synthesizing it on
    /// first use.
    pub fn get_or_create(&self, descriptors: &[PropertyDescriptor]) -> Result<Arc<RecordType>, FactoryError> {
        property_index(descriptors)?;
        let signature = self.signature(descriptors);
        match self.types.entry(signature) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                self.reserve()?;
                let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                let record = Arc::new(RecordType::new(id, descriptors.to_vec(), entry.key().clone())?);
                tracing::debug!(
                    name = record.name(),
                    properties = record.len(),
                    hash = entry.key().hash_code(),
                    "synthesized record type"
                );
                entry.insert(record.clone());
                Ok(record)
            }
        }
    }

    /// Look up an existing record type without creating one.
    pub fn get(&self, descriptors: &[PropertyDescriptor]) -> Option<Arc<RecordType>> {
        self.types.get(&self.signature(descriptors)).map(|r| r.value().clone())
    }

    fn reserve(&self) -> Result<(), FactoryError> {
        match self.limit {
            None => {
                self.count.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Some(limit) => self
                .count
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < limit).then_some(n + 1))
                .map(|_| ())
                .map_err(|_| {
                    tracing::warn!(limit, "record type limit reached");
                    FactoryError::CapacityExceeded { limit }
                }),
        }
    }

    /// Number of distinct record types synthesized so far.
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

impl Default for TypeFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeFactory")
            .field("types", &self.len())
            .field("limit", &self.limit)
            .finish()
    }
}
