use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::consts::{DEFAULT_CACHE_LIFETIME_SECS, FRAGMENT_CACHE_TAG, FRAGMENT_ENTRY_VERSION, FRAGMENT_KEY_PREFIX};
use crate::element::ElementMap;
use crate::fragment::{Fragment, FragmentError, display_name};
use crate::serializer::{ElementSerializer, SerializedMap};
use crate::store::CacheStore;
use crate::util::hash::hash_bytes;

/// Stored form of one fragment's head elements.
///
/// `elements` holds everything the fragment's render added, nested fragments
/// included, in first-insertion order. An entry replays on its own even when
/// the entries of its nested fragments were invalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentEntry {
  pub version: u32,
  pub elements: SerializedMap,
}

/// Head elements persisted per fragment, next to the fragment's content cache.
///
/// The entry key is derived from the fragment's own cache key and the entry
/// carries the fragment's own tags, so invalidating the fragment's content
/// also invalidates its head elements. Entries use a lifetime of their own
/// rather than the fragment's.
#[derive(Debug, Clone)]
pub struct FragmentHeadCache {
  store: Arc<dyn CacheStore>,
  serializer: ElementSerializer,
  prefix: String,
  lifetime_secs: Option<u64>,
  tags: Vec<String>,
}

impl FragmentHeadCache {
  pub fn new(store: Arc<dyn CacheStore>, serializer: ElementSerializer) -> Self {
    Self {
      store,
      serializer,
      prefix: FRAGMENT_KEY_PREFIX.to_string(),
      lifetime_secs: Some(DEFAULT_CACHE_LIFETIME_SECS),
      tags: vec![FRAGMENT_CACHE_TAG.to_string()],
    }
  }

  pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.prefix = prefix.into();
    self
  }

  /// `None` keeps entries until their tags are cleaned.
  pub fn with_lifetime(mut self, lifetime_secs: Option<u64>) -> Self {
    self.lifetime_secs = lifetime_secs;
    self
  }

  /// Tags applied to every entry in addition to the fragment's own.
  pub fn with_tags(mut self, tags: Vec<String>) -> Self {
    self.tags = tags;
    self
  }

  pub fn store(&self) -> &Arc<dyn CacheStore> {
    &self.store
  }

  /// Entry key for `fragment`: the prefix followed by the hash of its cache key.
  pub fn cache_key(&self, fragment: &dyn Fragment) -> Result<String, FragmentError> {
    let key = fragment.cache_key()?;
    if key.is_empty() {
      return Err(FragmentError::MissingCacheKey);
    }
    Ok(format!("{}{}", self.prefix, hash_bytes(key.as_bytes())))
  }

  /// Configured tags followed by the fragment's own, without duplicates.
  pub fn cache_tags(&self, fragment: &dyn Fragment) -> Result<Vec<String>, FragmentError> {
    let mut tags = self.tags.clone();
    for tag in fragment.cache_tags()? {
      if !tags.contains(&tag) {
        tags.push(tag);
      }
    }
    Ok(tags)
  }

  /// Persist the head elements of `fragment`.
  ///
  /// Nothing is written for an empty map. Returns whether the entry is stored
  /// (or needed no storing).
  pub fn save(&self, fragment: &dyn Fragment, elements: &SerializedMap) -> bool {
    if elements.is_empty() {
      return true;
    }

    let name = display_name(fragment);
    let (key, tags) = match self.cache_key(fragment).and_then(|k| Ok((k, self.cache_tags(fragment)?))) {
      Ok(pair) => pair,
      Err(e) => {
        warn!(fragment = %name, error = %e, "failed to save fragment head elements");
        return false;
      }
    };

    let entry = FragmentEntry {
      version: FRAGMENT_ENTRY_VERSION,
      elements: elements.clone(),
    };
    let bytes = match serde_json::to_vec(&entry) {
      Ok(bytes) => bytes,
      Err(e) => {
        warn!(fragment = %name, cache_key = %key, error = %e, "failed to encode fragment head elements");
        return false;
      }
    };

    match self.store.save(&key, &bytes, &tags, self.lifetime_secs) {
      Ok(()) => {
        debug!(fragment = %name, cache_key = %key, count = elements.len(), "fragment head elements saved");
        true
      }
      Err(e) => {
        warn!(fragment = %name, cache_key = %key, error = %e, "failed to save fragment head elements");
        false
      }
    }
  }

  /// Read the raw entry stored under `entry_key`.
  pub fn load_entry(&self, entry_key: &str) -> Option<FragmentEntry> {
    let bytes = match self.store.load(entry_key) {
      Ok(Some(bytes)) => bytes,
      Ok(None) => return None,
      Err(e) => {
        warn!(cache_key = %entry_key, error = %e, "failed to load fragment head elements");
        return None;
      }
    };

    match serde_json::from_slice::<FragmentEntry>(&bytes) {
      Ok(entry) if entry.version == FRAGMENT_ENTRY_VERSION => Some(entry),
      Ok(entry) => {
        warn!(cache_key = %entry_key, version = entry.version, "unsupported fragment head element entry");
        None
      }
      Err(e) => {
        warn!(cache_key = %entry_key, error = %e, "failed to decode fragment head elements");
        None
      }
    }
  }

  /// Elements cached for `fragment`, in stored order. Empty when nothing is
  /// cached or on failure.
  pub fn load(&self, fragment: &dyn Fragment) -> ElementMap {
    let key = match self.cache_key(fragment) {
      Ok(key) => key,
      Err(e) => {
        warn!(fragment = %display_name(fragment), error = %e, "failed to load fragment head elements");
        return ElementMap::new();
      }
    };

    match self.load_entry(&key) {
      Some(entry) => self.serializer.unserialize(&entry.elements),
      None => {
        debug!(fragment = %display_name(fragment), cache_key = %key, "no fragment head elements cached");
        ElementMap::new()
      }
    }
  }

  pub fn clear(&self, fragment: &dyn Fragment) -> bool {
    let result = self
      .cache_key(fragment)
      .map_err(|e| e.to_string())
      .and_then(|key| self.store.remove(&key).map_err(|e| e.to_string()));

    match result {
      Ok(_) => true,
      Err(e) => {
        warn!(fragment = %display_name(fragment), error = %e, "failed to clear fragment head elements");
        false
      }
    }
  }
}
