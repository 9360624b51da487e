//! Insertion-ordered string-keyed map.
//!
//! Head element collections are small (tens of entries) and their iteration order is
//! their render order, so a vector of pairs with linear lookup is all that is needed.
//!
//! Re-inserting an existing key replaces the value in place; a new key is appended.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Clone, PartialEq, Eq)]
pub struct OrderedMap<V> {
  entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
  fn default() -> Self {
    Self { entries: Vec::new() }
  }
}

impl<V> OrderedMap<V> {
  pub fn new() -> Self {
    Self::default()
  }

  fn position(&self, key: &str) -> Option<usize> {
    self.entries.iter().position(|(k, _)| k == key)
  }

  /// Insert a value, returning the previous value stored under `key`.
  pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
    let key = key.into();
    match self.position(&key) {
      Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
      None => {
        self.entries.push((key, value));
        None
      }
    }
  }

  pub fn get(&self, key: &str) -> Option<&V> {
    self.position(key).map(|idx| &self.entries[idx].1)
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.position(key).is_some()
  }

  /// Remove `key`, keeping the order of the remaining entries.
  pub fn remove(&mut self, key: &str) -> Option<V> {
    self.position(key).map(|idx| self.entries.remove(idx).1)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.entries.iter().map(|(k, _)| k.as_str())
  }

  pub fn values(&self) -> impl Iterator<Item = &V> {
    self.entries.iter().map(|(_, v)| v)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v))
  }
}

impl<V> IntoIterator for OrderedMap<V> {
  type Item = (String, V);
  type IntoIter = std::vec::IntoIter<(String, V)>;

  fn into_iter(self) -> Self::IntoIter {
    self.entries.into_iter()
  }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut map = Self::new();
    for (k, v) in iter {
      map.insert(k, v);
    }
    map
  }
}

impl<K: Into<String>, V> Extend<(K, V)> for OrderedMap<V> {
  fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
    for (k, v) in iter {
      self.insert(k, v);
    }
  }
}

impl<V: fmt::Debug> fmt::Debug for OrderedMap<V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_map().entries(self.iter()).finish()
  }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.entries.len()))?;
    for (k, v) in &self.entries {
      map.serialize_entry(k, v)?;
    }
    map.end()
  }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
  type Value = OrderedMap<V>;

  fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("a map with string keys")
  }

  fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
    let mut map = OrderedMap::new();
    while let Some((key, value)) = access.next_entry::<String, V>()? {
      map.insert(key, value);
    }
    Ok(map)
  }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
  }
}
