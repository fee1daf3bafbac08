//! Insertion-ordered property mapping, with the index access the diff tool
//! and the writer both need for deterministic, positional iteration.

use std::collections::HashMap;

/// A property's value, or an explicit tombstone (legal only in change records).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropValue {
    Set(String),
    Delete,
}

impl PropValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Set(v) => Some(v.as_str()),
            PropValue::Delete => None,
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, PropValue::Delete)
    }
}

/// Ordered mapping from property name to [`PropValue`].
///
/// Re-inserting the same key with an identical value is a no-op (position is
/// preserved). Re-inserting with a different value moves the key to the
/// tail. Deletion removes the key from the order entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet {
    entries: Vec<(String, PropValue)>,
    index: HashMap<String, usize>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropValue::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Set a string value, inserting at the tail or updating in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.insert(name.into(), PropValue::Set(value.into()));
    }

    /// Insert a tombstone; only meaningful on change records.
    pub fn delete_entry(&mut self, name: impl Into<String>) {
        self.insert(name.into(), PropValue::Delete);
    }

    fn insert(&mut self, name: String, value: PropValue) {
        if let Some(&i) = self.index.get(&name) {
            if self.entries[i].1 == value {
                return;
            }
            // Move to tail: drop the old slot, append fresh, reindex shifted slots.
            self.entries.remove(i);
            for v in self.index.values_mut() {
                if *v > i {
                    *v -= 1;
                }
            }
            self.index.remove(&name);
            let new_i = self.entries.len();
            self.entries.push((name.clone(), value));
            self.index.insert(name, new_i);
        } else {
            let i = self.entries.len();
            self.index.insert(name.clone(), i);
            self.entries.push((name, value));
        }
    }

    /// Remove a key from the set entirely (not a tombstone — gone from iteration).
    pub fn remove(&mut self, name: &str) -> Option<PropValue> {
        let i = self.index.remove(name)?;
        let (_, value) = self.entries.remove(i);
        for v in self.index.values_mut() {
            if *v > i {
                *v -= 1;
            }
        }
        Some(value)
    }

    /// Indexed access in insertion order, for positional comparison.
    pub fn get_index(&self, i: usize) -> Option<(&str, &PropValue)> {
        self.entries.get(i).map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reinsert_same_value_keeps_order() {
        let mut p = PropertySet::new();
        p.set("a", "1");
        p.set("b", "2");
        p.set("a", "1");
        let keys: Vec<_> = p.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn reinsert_new_value_moves_to_tail() {
        let mut p = PropertySet::new();
        p.set("a", "1");
        p.set("b", "2");
        p.set("a", "3");
        let keys: Vec<_> = p.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(p.get_str("a"), Some("3"));
    }

    #[test]
    fn delete_removes_from_order() {
        let mut p = PropertySet::new();
        p.set("a", "1");
        p.set("b", "2");
        p.remove("a");
        let keys: Vec<_> = p.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b"]);
    }

    #[test]
    fn tombstone_is_distinct_from_removal() {
        let mut p = PropertySet::new();
        p.delete_entry("a");
        assert!(p.contains("a"));
        assert_eq!(p.get("a"), Some(&PropValue::Delete));
    }
}
