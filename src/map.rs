//! The flat label map.
//!
//! [`Labels`] is the interchange type on both sides of the library: marshal
//! produces one, unmarshal consumes one. It wraps an [`IndexMap`] so that
//! iteration follows insertion order, which keeps marshal output and test
//! assertions stable. Callers must not rely on any particular ordering of
//! the keys a record produces.
//!
//! ## Examples
//!
//! ```rust
//! use labeler::Labels;
//!
//! let mut labels = Labels::new();
//! labels.insert("app", "billing");
//! labels.insert("Tier", "backend");
//!
//! assert_eq!(labels.get("app"), Some("billing"));
//! assert_eq!(labels.find("tier", true), Some(("Tier", "backend")));
//! assert_eq!(labels.find("tier", false), None);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// An ordered map of label keys to label values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels(IndexMap<String, String>);

impl Labels {
    /// Creates an empty `Labels`.
    #[must_use]
    pub fn new() -> Self {
        Labels(IndexMap::new())
    }

    /// Creates an empty `Labels` with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Labels(IndexMap::with_capacity(capacity))
    }

    /// Inserts a label, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Returns the value stored under exactly `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Finds a label by key, optionally ignoring case.
    ///
    /// Case-insensitive lookup is a linear scan comparing lowercased keys, and
    /// returns the key as it is stored so the caller can remove it later.
    #[must_use]
    pub fn find(&self, key: &str, ignore_case: bool) -> Option<(&str, &str)> {
        if let Some((k, v)) = self.0.get_key_value(key) {
            return Some((k.as_str(), v.as_str()));
        }
        if !ignore_case {
            return None;
        }
        let wanted = key.to_lowercase();
        self.0
            .iter()
            .find(|(k, _)| k.to_lowercase() == wanted)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Removes a label, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, String> {
        self.0.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, String, String> {
        self.0.values()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, String> {
        self.0.iter()
    }

    /// Keeps only the labels for which `keep` returns true.
    pub fn retain<F: FnMut(&String, &mut String) -> bool>(&mut self, keep: F) {
        self.0.retain(keep)
    }

    /// Unwraps the underlying [`IndexMap`].
    #[must_use]
    pub fn into_inner(self) -> IndexMap<String, String> {
        self.0
    }
}

impl From<IndexMap<String, String>> for Labels {
    fn from(map: IndexMap<String, String>) -> Self {
        Labels(map)
    }
}

impl From<HashMap<String, String>> for Labels {
    fn from(map: HashMap<String, String>) -> Self {
        Labels(map.into_iter().collect())
    }
}

impl From<BTreeMap<String, String>> for Labels {
    fn from(map: BTreeMap<String, String>) -> Self {
        Labels(map.into_iter().collect())
    }
}

impl From<Labels> for HashMap<String, String> {
    fn from(labels: Labels) -> Self {
        labels.0.into_iter().collect()
    }
}

impl From<Labels> for BTreeMap<String, String> {
    fn from(labels: Labels) -> Self {
        labels.0.into_iter().collect()
    }
}

impl From<Labels> for IndexMap<String, String> {
    fn from(labels: Labels) -> Self {
        labels.0
    }
}

impl IntoIterator for Labels {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Labels {
    type Item = (&'a String, &'a String);
    type IntoIter = indexmap::map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Labels {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Labels(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Labels {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        self.0
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}
