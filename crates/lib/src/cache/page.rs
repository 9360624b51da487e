use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::consts::PAGE_CACHE_TAG;
use crate::element::ElementMap;
use crate::serializer::ElementSerializer;
use crate::store::CacheStore;

/// Whole-page persistence used by [`HeadTagManager`](crate::manager::HeadTagManager).
pub trait PageCacheStrategy: fmt::Debug + Send {
  fn is_enabled(&self) -> bool;

  /// Store key of the page entry, when the strategy has one.
  fn cache_key(&self) -> Option<&str>;

  fn cache_tags(&self) -> Vec<String>;

  /// Load the previously cached collection. Empty when absent or on failure.
  fn load(&mut self) -> ElementMap;

  fn save(&mut self, elements: &ElementMap) -> bool;

  fn clear(&mut self) -> bool;
}

/// Strategy that never caches.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCacheStrategy;

impl PageCacheStrategy for NullCacheStrategy {
  fn is_enabled(&self) -> bool {
    false
  }

  fn cache_key(&self) -> Option<&str> {
    None
  }

  fn cache_tags(&self) -> Vec<String> {
    Vec::new()
  }

  fn load(&mut self) -> ElementMap {
    ElementMap::new()
  }

  fn save(&mut self, _elements: &ElementMap) -> bool {
    true
  }

  fn clear(&mut self) -> bool {
    true
  }
}

/// Strategy persisting the page collection in a [`CacheStore`].
#[derive(Debug)]
pub struct StoreCacheStrategy {
  store: Arc<dyn CacheStore>,
  serializer: ElementSerializer,
  key: String,
  lifetime_secs: Option<u64>,
  loaded: bool,
}

impl StoreCacheStrategy {
  /// Key is `prefix` followed by `page_id`.
  pub fn new(
    store: Arc<dyn CacheStore>,
    serializer: ElementSerializer,
    prefix: &str,
    page_id: &str,
    lifetime_secs: Option<u64>,
  ) -> Self {
    Self {
      store,
      serializer,
      key: format!("{prefix}{page_id}"),
      lifetime_secs,
      loaded: false,
    }
  }
}

impl PageCacheStrategy for StoreCacheStrategy {
  fn is_enabled(&self) -> bool {
    true
  }

  fn cache_key(&self) -> Option<&str> {
    Some(&self.key)
  }

  fn cache_tags(&self) -> Vec<String> {
    vec![PAGE_CACHE_TAG.to_string()]
  }

  /// Loads at most once; later calls return an empty map.
  fn load(&mut self) -> ElementMap {
    if self.loaded {
      return ElementMap::new();
    }
    self.loaded = true;

    let bytes = match self.store.load(&self.key) {
      Ok(Some(bytes)) => bytes,
      Ok(None) => return ElementMap::new(),
      Err(e) => {
        warn!(cache_key = %self.key, error = %e, "failed to load page head elements");
        return ElementMap::new();
      }
    };

    match self.serializer.decode(&bytes) {
      Ok(data) => {
        let elements = self.serializer.unserialize(&data);
        debug!(cache_key = %self.key, count = elements.len(), "page head elements loaded");
        elements
      }
      Err(e) => {
        warn!(cache_key = %self.key, error = %e, "failed to decode page head elements");
        ElementMap::new()
      }
    }
  }

  fn save(&mut self, elements: &ElementMap) -> bool {
    let data = self.serializer.serialize(elements);
    let bytes = match self.serializer.encode(&data) {
      Ok(bytes) => bytes,
      Err(e) => {
        warn!(cache_key = %self.key, error = %e, "failed to encode page head elements");
        return false;
      }
    };

    match self.store.save(&self.key, &bytes, &self.cache_tags(), self.lifetime_secs) {
      Ok(()) => {
        debug!(cache_key = %self.key, count = data.len(), "page head elements saved");
        true
      }
      Err(e) => {
        warn!(cache_key = %self.key, error = %e, "failed to save page head elements");
        false
      }
    }
  }

  fn clear(&mut self) -> bool {
    match self.store.remove(&self.key) {
      Ok(_) => true,
      Err(e) => {
        warn!(cache_key = %self.key, error = %e, "failed to clear page head elements");
        false
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::consts::PAGE_KEY_PREFIX;
  use crate::store::MemoryStore;
  use crate::util::testutil::{FailingStore, element_of};
  use tracing_test::traced_test;

  fn strategy(store: Arc<dyn CacheStore>) -> StoreCacheStrategy {
    StoreCacheStrategy::new(store, ElementSerializer::with_builtins(), PAGE_KEY_PREFIX, "home", None)
  }

  #[test]
  fn save_then_load_in_next_request() {
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
    let mut elements = ElementMap::new();
    elements.insert("robots", element_of("meta", &[("name", "robots"), ("content", "index")]));

    let mut first = strategy(store.clone());
    assert!(first.save(&elements));
    assert_eq!(first.cache_key(), Some("headtag_page_home"));

    let mut second = strategy(store.clone());
    let loaded = second.load();
    assert_eq!(loaded.keys().collect::<Vec<_>>(), vec!["robots"]);
    assert!(second.load().is_empty());

    let listed = store.entries().unwrap();
    assert_eq!(listed[0].tags, vec![PAGE_CACHE_TAG.to_string()]);
  }

  #[test]
  fn clear_removes_entry() {
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
    let mut s = strategy(store.clone());
    s.save(&ElementMap::new());
    assert!(s.clear());
    assert!(store.entries().unwrap().is_empty());
  }

  #[test]
  #[traced_test]
  fn store_failure_is_logged_and_empty() {
    let mut s = strategy(Arc::new(FailingStore));
    assert!(s.load().is_empty());
    assert!(!s.save(&ElementMap::new()));
    assert!(!s.clear());
    assert!(logs_contain("failed to load page head elements"));
  }

  #[test]
  fn null_strategy_is_inert() {
    let mut s = NullCacheStrategy;
    assert!(!s.is_enabled());
    assert!(s.load().is_empty());
    assert!(s.save(&ElementMap::new()));
  }
}
