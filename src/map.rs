//! Ordered map type for Sled maps.
//!
//! This module provides [`SledMap`], a wrapper around [`IndexMap`] that keeps
//! pairs in insertion order. A parsed map preserves the order of its source
//! pairs and the serializer emits pairs in the order they were inserted.
//!
//! Sled maps are keyed entirely by strings or entirely by integers, so the
//! two concrete forms are exposed as [`StringMap`] and [`IntMap`].
//!
//! ## Examples
//!
//! ```rust
//! use serde_sled::{StringMap, Value};
//!
//! let mut map = StringMap::new();
//! map.insert("name".to_string(), Value::from("Alice"));
//! map.insert("age".to_string(), Value::from(30));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! ```

use crate::Value;
use indexmap::IndexMap;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// An ordered map from keys of one kind to Sled values.
///
/// # Examples
///
/// ```rust
/// use serde_sled::{IntMap, Value};
///
/// let mut map = IntMap::new();
/// map.insert(2, Value::from("two"));
/// map.insert(1, Value::from("one"));
///
/// // Iteration maintains insertion order
/// let keys: Vec<_> = map.keys().copied().collect();
/// assert_eq!(keys, vec![2, 1]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SledMap<K: Hash + Eq>(IndexMap<K, Value>);

/// A map keyed by strings. The root of every document is one of these.
pub type StringMap = SledMap<String>;

/// A map keyed by signed 64-bit integers.
pub type IntMap = SledMap<i64>;

impl<K: Hash + Eq> SledMap<K> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        SledMap(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        SledMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contained this key, the old value is returned and
    /// the key keeps its original position.
    pub fn insert(&mut self, key: K, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&Value>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.0.get(key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut Value>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.0.get_mut(key)
    }

    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.0.contains_key(key)
    }

    /// Removes a key, preserving the order of the remaining pairs.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<Value>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, K, Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, K, Value> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, K, Value> {
        self.0.iter()
    }
}

impl<K: Hash + Eq> Default for SledMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq> From<HashMap<K, Value>> for SledMap<K> {
    fn from(map: HashMap<K, Value>) -> Self {
        SledMap(map.into_iter().collect())
    }
}

impl<K: Hash + Eq> From<IndexMap<K, Value>> for SledMap<K> {
    fn from(map: IndexMap<K, Value>) -> Self {
        SledMap(map)
    }
}

impl<K: Hash + Eq> From<SledMap<K>> for HashMap<K, Value> {
    fn from(map: SledMap<K>) -> Self {
        map.0.into_iter().collect()
    }
}

impl<K: Hash + Eq> IntoIterator for SledMap<K> {
    type Item = (K, Value);
    type IntoIter = indexmap::map::IntoIter<K, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, K: Hash + Eq> IntoIterator for &'a SledMap<K> {
    type Item = (&'a K, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, K, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Hash + Eq> FromIterator<(K, Value)> for SledMap<K> {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        SledMap(IndexMap::from_iter(iter))
    }
}
