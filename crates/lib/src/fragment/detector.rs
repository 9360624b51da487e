use std::sync::Arc;

use tracing::warn;

use super::{Fragment, display_name};
use crate::store::CacheStore;

/// Decides whether a fragment is cacheable and whether its content is cached.
///
/// Both checks fail closed: any accessor or store failure is logged and
/// answered with `false`.
#[derive(Debug, Clone)]
pub struct CacheDetector {
  content_store: Arc<dyn CacheStore>,
}

impl CacheDetector {
  /// `content_store` is the store the host keeps fragment content in.
  pub fn new(content_store: Arc<dyn CacheStore>) -> Self {
    Self { content_store }
  }

  pub fn is_cacheable(&self, fragment: &dyn Fragment) -> bool {
    match fragment.cache_lifetime() {
      Ok(lifetime) => lifetime.is_cacheable(),
      Err(e) => {
        warn!(fragment = %display_name(fragment), error = %e, "failed to determine if fragment is cacheable");
        false
      }
    }
  }

  pub fn is_cached(&self, fragment: &dyn Fragment) -> bool {
    if !self.is_cacheable(fragment) {
      return false;
    }

    let key = match fragment.cache_key() {
      Ok(key) => key,
      Err(e) => {
        warn!(fragment = %display_name(fragment), error = %e, "failed to check if fragment is cached");
        return false;
      }
    };

    match self.content_store.load(&key) {
      Ok(Some(content)) => !content.is_empty(),
      Ok(None) => false,
      Err(e) => {
        warn!(fragment = %display_name(fragment), cache_key = %key, error = %e, "failed to check if fragment is cached");
        false
      }
    }
  }
}
