//! Collection types shared across the engine.

use rustc_hash::FxHashMap;

/// An insertion-ordered map whose keys compare case-insensitively.
///
/// The original spelling of each key is preserved for display. Member
/// lookup on types, the parser's symbol table, and record property lookup
/// all use this map, since identifiers in expressions ignore case.
#[derive(Debug, Clone)]
pub struct CaseInsensitiveMap<V> {
    entries: Vec<(String, V)>,
    index: FxHashMap<String, usize>,
}

impl<V> Default for CaseInsensitiveMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CaseInsensitiveMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    #[inline]
    fn fold(key: &str) -> String {
        key.to_lowercase()
    }

    /// Insert a value. Returns `false` and leaves the map unchanged when a
    /// key differing only in case is already present.
    pub fn try_insert(&mut self, key: impl Into<String>, value: V) -> bool {
        let key = key.into();
        let folded = Self::fold(&key);
        if self.index.contains_key(&folded) {
            return false;
        }
        self.index.insert(folded, self.entries.len());
        self.entries.push((key, value));
        true
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.index
            .get(&Self::fold(key))
            .map(|&idx| &self.entries[idx].1)
    }

    /// Look up a key, returning the stored spelling together with the value.
    pub fn get_entry(&self, key: &str) -> Option<(&str, &V)> {
        self.index.get(&Self::fold(key)).map(|&idx| {
            let (k, v) = &self.entries[idx];
            (k.as_str(), v)
        })
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.index.get(&Self::fold(key)).copied()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(&Self::fold(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        let mut map = CaseInsensitiveMap::new();
        assert!(map.try_insert("Name", 1));
        assert_eq!(map.get("name"), Some(&1));
        assert_eq!(map.get("NAME"), Some(&1));
        assert_eq!(map.get_entry("nAmE").map(|(k, _)| k), Some("Name"));
    }

    #[test]
    fn test_duplicate_differing_in_case_is_rejected() {
        let mut map = CaseInsensitiveMap::new();
        assert!(map.try_insert("x", 1));
        assert!(!map.try_insert("X", 2));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("x"), Some(&1));
    }

    #[test]
    fn test_iteration_keeps_insertion_order() {
        let mut map = CaseInsensitiveMap::new();
        map.try_insert("b", 2);
        map.try_insert("a", 1);
        let keys: Vec<_> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(map.position("A"), Some(1));
    }
}
