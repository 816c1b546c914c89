//! Canonical containers
//!
//! [`Mapping`] and [`Sequence`] only ever hold canonical content: keys are
//! folded through [`Canonicalize`] on every insert and lookup, and nested
//! containers are always [`Mapping`]/[`Sequence`] values. Foreign maps and
//! vectors are deep-copied on conversion, so nothing stored here aliases
//! caller-owned memory.

use crate::key::Canonicalize;
use crate::value::Value;
use indexmap::IndexMap;

/// Key/value container with canonical keys
///
/// Iteration follows insertion order; equality ignores order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: IndexMap<String, Value>,
}

impl Mapping {
    /// Create empty mapping
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty mapping with room for `capacity` entries
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a key
    #[inline]
    #[must_use]
    pub fn get(&self, key: impl Canonicalize) -> Option<&Value> {
        self.entries.get(&key.canonicalize())
    }

    /// Look up a key for mutation
    #[inline]
    pub fn get_mut(&mut self, key: impl Canonicalize) -> Option<&mut Value> {
        self.entries.get_mut(&key.canonicalize())
    }

    /// Check whether a key is present (an explicit null counts)
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: impl Canonicalize) -> bool {
        self.entries.contains_key(&key.canonicalize())
    }

    /// Insert a value, returning the previous one
    ///
    /// Keys differing only in representation (symbol vs string) address the
    /// same entry.
    #[inline]
    pub fn insert(&mut self, key: impl Canonicalize, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.canonicalize(), value.into())
    }

    /// Remove a key, preserving the order of the remaining entries
    #[inline]
    pub fn remove(&mut self, key: impl Canonicalize) -> Option<Value> {
        self.entries.shift_remove(&key.canonicalize())
    }

    /// Existing value for `key`, or a freshly inserted empty mapping
    pub fn entry_or_mapping(&mut self, key: impl Canonicalize) -> &mut Value {
        self.entry_or_insert_with(key, || Value::Mapping(Mapping::new()))
    }

    /// Existing value for `key`, or the result of `make` inserted under it
    pub fn entry_or_insert_with(
        &mut self,
        key: impl Canonicalize,
        make: impl FnOnce() -> Value,
    ) -> &mut Value {
        self.entries.entry(key.canonicalize()).or_insert_with(make)
    }

    /// Remove every entry
    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Canonical keys in insertion order
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Values in insertion order
    #[inline]
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    /// Entries in insertion order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Non-destructive recursive merge
    ///
    /// Keys present in both sides whose values are both mappings are merged
    /// recursively; otherwise `other`'s value wins. Neither input changes.
    #[must_use]
    pub fn merge(&self, other: &Mapping) -> Mapping {
        let mut result = self.clone();
        for (key, theirs) in &other.entries {
            let merged = match (result.entries.get(key), theirs) {
                (Some(Value::Mapping(ours)), Value::Mapping(theirs)) => {
                    Value::Mapping(ours.merge(theirs))
                }
                _ => theirs.clone(),
            };
            result.entries.insert(key.clone(), merged);
        }
        result
    }

    /// Force every deferred value in this mapping
    #[must_use]
    pub fn into_concrete(self) -> Mapping {
        Self {
            entries: self
                .entries
                .into_iter()
                .map(|(k, v)| (k, v.into_concrete()))
                .collect(),
        }
    }
}

impl<K: Canonicalize, V: Into<Value>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        mapping.extend(iter);
        mapping
    }
}

impl<K: Canonicalize, V: Into<Value>> Extend<(K, V)> for Mapping {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Mapping {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Ordered container of values; duplicates allowed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sequence {
    items: Vec<Value>,
}

impl Sequence {
    /// Create empty sequence
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the sequence is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at `index`
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// Item at `index` for mutation
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.items.get_mut(index)
    }

    /// Append an item
    #[inline]
    pub fn push(&mut self, value: impl Into<Value>) {
        self.items.push(value.into());
    }

    /// Remove and return the item at `index`, if any
    #[inline]
    pub fn remove(&mut self, index: usize) -> Option<Value> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Remove every item
    #[inline]
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Whether an equal item is present
    #[inline]
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.items.contains(value)
    }

    /// Items in order
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    /// Order-preserving union without duplicates
    ///
    /// Items of `self` come first, then items of `other` not already seen.
    #[must_use]
    pub fn union(&self, other: &Sequence) -> Sequence {
        let mut result = Sequence::new();
        for item in self.items.iter().chain(&other.items) {
            if !result.contains(item) {
                result.items.push(item.clone());
            }
        }
        result
    }

    /// Force every deferred value in this sequence
    #[must_use]
    pub fn into_concrete(self) -> Sequence {
        Self {
            items: self.items.into_iter().map(Value::into_concrete).collect(),
        }
    }
}

impl<V: Into<Value>> FromIterator<V> for Sequence {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl IntoIterator for Sequence {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Symbol;
    use pretty_assertions::assert_eq;

    #[test]
    fn symbol_and_string_keys_unify() {
        let mut m = Mapping::new();
        m.insert(Symbol::new("a"), 1);
        m.insert("a", 2);

        assert_eq!(m.len(), 1);
        assert_eq!(m.get(Symbol::new("a")), Some(&Value::from(2)));
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn null_is_present() {
        let mut m = Mapping::new();
        m.insert("gone", Value::null());
        assert!(m.contains_key("gone"));
        assert!(m.get("gone").unwrap().is_null());
    }

    #[test]
    fn remove_preserves_order() {
        let mut m: Mapping = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        assert_eq!(m.remove("b"), Some(Value::from(2)));
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn equality_ignores_order() {
        let a: Mapping = [("x", 1), ("y", 2)].into_iter().collect();
        let b: Mapping = [("y", 2), ("x", 1)].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn merge_recurses_into_mappings() {
        let mut lower = Mapping::new();
        lower.insert("a", [("x", 1), ("y", 2)].into_iter().collect::<Mapping>());
        let mut higher = Mapping::new();
        higher.insert("a", [("y", 3), ("z", 4)].into_iter().collect::<Mapping>());

        let merged = lower.merge(&higher);
        let expected: Mapping = [("x", 1), ("y", 3), ("z", 4)].into_iter().collect();
        assert_eq!(merged.get("a"), Some(&Value::from(expected)));

        // inputs untouched
        assert_eq!(lower.get("a").unwrap().get("y"), Some(&Value::from(2)));
        assert!(higher.get("a").unwrap().get("x").is_none());
    }

    #[test]
    fn merge_replaces_sequences_and_mismatches() {
        let lower: Mapping = [("list", Value::from(vec![1, 2, 3])), ("s", Value::from(1))]
            .into_iter()
            .collect();
        let higher: Mapping = [
            ("list", Value::from(vec![9])),
            ("s", Value::from(Mapping::new())),
        ]
        .into_iter()
        .collect();

        let merged = lower.merge(&higher);
        assert_eq!(merged.get("list"), Some(&Value::from(vec![9])));
        assert_eq!(merged.get("s"), Some(&Value::from(Mapping::new())));
    }

    #[test]
    fn entry_or_mapping_vivifies_once() {
        let mut m = Mapping::new();
        m.entry_or_mapping("a")
            .as_mapping_mut()
            .unwrap()
            .insert("b", 1);
        m.entry_or_mapping("a");
        assert_eq!(m.get("a").unwrap().get("b"), Some(&Value::from(1)));
    }

    #[test]
    fn sequence_union_dedupes_in_order() {
        let a: Sequence = vec![1, 1, 2].into_iter().collect();
        let b: Sequence = vec![2, 3].into_iter().collect();
        let expected: Sequence = vec![1, 2, 3].into_iter().collect();
        assert_eq!(a.union(&b), expected);
    }

    #[test]
    fn sequence_remove_out_of_bounds() {
        let mut s: Sequence = vec!["a"].into_iter().collect();
        assert!(s.remove(3).is_none());
        assert_eq!(s.remove(0), Some(Value::from("a")));
        assert!(s.is_empty());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn entries() -> impl Strategy<Value = Vec<(String, i64)>> {
            proptest::collection::btree_map("[a-e]", any::<i64>(), 0..6)
                .prop_map(|m| m.into_iter().collect())
        }

        proptest! {
            #[test]
            fn equality_ignores_insertion_order(pairs in entries()) {
                let forward: Mapping = pairs.iter().cloned().collect();
                let backward: Mapping = pairs.iter().rev().cloned().collect();
                prop_assert_eq!(forward, backward);
            }

            #[test]
            fn merge_keeps_inputs_and_unions_keys(lower in entries(), higher in entries()) {
                let lower: Mapping = lower.into_iter().collect();
                let higher: Mapping = higher.into_iter().collect();
                let (lower_before, higher_before) = (lower.clone(), higher.clone());

                let merged = lower.merge(&higher);

                prop_assert_eq!(&lower, &lower_before);
                prop_assert_eq!(&higher, &higher_before);
                for key in lower.keys().chain(higher.keys()) {
                    prop_assert!(merged.contains_key(key));
                }
                for (key, value) in higher.iter() {
                    prop_assert_eq!(merged.get(key), Some(value));
                }
            }
        }
    }
}
