//! Structural signatures: the cache key for synthesized record types.

use crate::record::PropertyDescriptor;
use crate::ty::Type;
use dynexpr_core::{Name, NameTable};
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// An order-sensitive fingerprint over a list of (name, type) descriptors.
///
/// The hash is the XOR of `hash(name) ^ hash(type)` over all descriptors,
/// so it does not depend on order. Equality does: the same pairs in a
/// different order form a different signature, and the cache stores them
/// as distinct record types.
#[derive(Debug, Clone)]
pub struct Signature {
    entries: Box<[(Name, Type)]>,
    hash: u64,
}

fn fx_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

impl Signature {
    pub fn new(interner: &NameTable, descriptors: &[PropertyDescriptor]) -> Self {
        let mut hash = 0u64;
        let entries = descriptors
            .iter()
            .map(|d| {
                hash ^= fx_hash(d.name.as_str()) ^ fx_hash(&d.ty);
                (interner.intern(&d.name), d.ty.clone())
            })
            .collect();
        Self { entries, hash }
    }

    #[inline]
    pub fn hash_code(&self) -> u64 {
        self.hash
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Signature) -> bool {
        self.hash == other.hash && self.entries == other.entries
    }
}

impl Eq for Signature {}

impl Hash for Signature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(pairs: &[(&str, Type)]) -> Vec<PropertyDescriptor> {
        pairs.iter().map(|(n, t)| PropertyDescriptor::new(*n, t.clone())).collect()
    }

    #[test]
    fn test_same_pairs_same_order_are_equal() {
        let interner = NameTable::new();
        let a = Signature::new(&interner, &desc(&[("Name", Type::String), ("Count", Type::Double)]));
        let b = Signature::new(&interner, &desc(&[("Name", Type::String), ("Count", Type::Double)]));
        assert_eq!(a, b);
        assert_eq!(a.hash_code(), b.hash_code());
    }

    #[test]
    fn test_reordered_pairs_share_hash_but_differ() {
        let interner = NameTable::new();
        let a = Signature::new(&interner, &desc(&[("Name", Type::String), ("Count", Type::Double)]));
        let b = Signature::new(&interner, &desc(&[("Count", Type::Double), ("Name", Type::String)]));
        assert_eq!(a.hash_code(), b.hash_code());
        assert_ne!(a, b);
    }

    #[test]
    fn test_types_and_names_both_matter() {
        let interner = NameTable::new();
        let a = Signature::new(&interner, &desc(&[("Count", Type::Double)]));
        let b = Signature::new(&interner, &desc(&[("Count", Type::String)]));
        let c = Signature::new(&interner, &desc(&[("count", Type::Double)]));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_empty_signature() {
        let interner = NameTable::new();
        let empty = Signature::new(&interner, &[]);
        assert!(empty.is_empty());
        assert_eq!(empty.hash_code(), 0);
    }
}
