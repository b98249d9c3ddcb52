//! Property-name interning for structural signatures.
//!
//! The record type cache compares signatures on every lookup, and payloads
//! of the same shape repeat the same property names. Names are interned
//! once per cache so that comparing two signatures compares `u32`s.

use lasso::{Spur, ThreadedRodeo};
use std::fmt;
use std::sync::Arc;

/// Handle to an interned property name. Case is significant.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Name(Spur);

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.0)
    }
}

/// The names seen by one type cache. Clones share one table, and any
/// thread may intern concurrently.
#[derive(Clone, Default)]
pub struct NameTable {
    names: Arc<ThreadedRodeo>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn intern(&self, name: &str) -> Name {
        Name(self.names.get_or_intern(name))
    }

    #[inline]
    pub fn resolve(&self, name: Name) -> &str {
        self.names.resolve(&name.0)
    }

    /// Distinct names interned so far.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Debug for NameTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameTable({} names)", self.len())
    }
}
