//! Before/after fragment hooks driving the tracker, detector, and fragment cache.
//!
//! [`HeadRuntime`] is built once per process and shared read-only between
//! requests. Each page render gets its own [`HeadSession`], which owns the
//! page's manager and tracking stack.
//!
//! # Hook Flow
//!
//! ```text
//! on_before(F)   start tracking F (named, output enabled, module enabled)
//!   ...          F renders, or the host serves its content from cache
//! on_after(F)    delta    = elements added since start, minus nested claims
//!                captured = elements added since start, nested ones included
//!                cacheable, captured non-empty -> save captured in insertion order
//!                cacheable, nothing new, cached -> replay the stored entry
//!                otherwise                      -> hand delta to parents
//!                always clear F's frame
//! ```

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::cache::{FragmentHeadCache, PageCacheStrategy, StoreCacheStrategy};
use crate::config::{Config, ConfigError, StoreBackend};
use crate::fragment::{CacheDetector, ElementTracker, Fragment};
use crate::manager::HeadTagManager;
use crate::placeholder::{HeadInjector, InjectOutcome, Response};
use crate::serializer::ElementSerializer;
use crate::store::{CacheStore, FileStore, MemoryStore};

/// Open the store selected by `config`.
pub fn open_store(config: &Config) -> Result<Arc<dyn CacheStore>, ConfigError> {
  match config.store.backend {
    StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    StoreBackend::File => {
      let path = config.store.path.as_ref().ok_or(ConfigError::MissingStorePath)?;
      Ok(Arc::new(FileStore::new(path)))
    }
  }
}

/// Process-wide state: registries, store, and configuration.
#[derive(Debug)]
pub struct HeadRuntime {
  config: Config,
  serializer: ElementSerializer,
  store: Arc<dyn CacheStore>,
  fragment_cache: FragmentHeadCache,
  detector: CacheDetector,
  injector: HeadInjector,
}

impl HeadRuntime {
  /// Runtime over the built-in element types. `store` holds both head element
  /// entries and fragment content.
  pub fn new(config: Config, store: Arc<dyn CacheStore>) -> Self {
    Self::with_serializer(config, store, ElementSerializer::with_builtins())
  }

  pub fn with_serializer(config: Config, store: Arc<dyn CacheStore>, serializer: ElementSerializer) -> Self {
    let fragment_cache = FragmentHeadCache::new(store.clone(), serializer.clone())
      .with_prefix(config.fragment_cache.key_prefix.clone())
      .with_lifetime(config.fragment_cache.lifetime_secs)
      .with_tags(config.fragment_cache.tags.clone());
    let detector = CacheDetector::new(store.clone());
    let injector = HeadInjector::new(config.placeholder.clone(), config.skip_response_types.clone());

    Self {
      config,
      serializer,
      store,
      fragment_cache,
      detector,
      injector,
    }
  }

  pub fn from_config(config: Config) -> Result<Self, ConfigError> {
    let store = open_store(&config)?;
    Ok(Self::new(config, store))
  }

  /// Check fragment content against a different store than the head element one.
  pub fn with_content_store(mut self, content_store: Arc<dyn CacheStore>) -> Self {
    self.detector = CacheDetector::new(content_store);
    self
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn serializer(&self) -> &ElementSerializer {
    &self.serializer
  }

  pub fn store(&self) -> &Arc<dyn CacheStore> {
    &self.store
  }

  pub fn fragment_cache(&self) -> &FragmentHeadCache {
    &self.fragment_cache
  }

  pub fn detector(&self) -> &CacheDetector {
    &self.detector
  }

  /// Start a page render. `page_id` keys the whole-page cache when enabled.
  pub fn session(&self, page_id: Option<&str>) -> HeadSession<'_> {
    let factories = self.serializer.factories().clone();
    let manager = match page_id {
      Some(page_id) if self.config.page_cache.enabled => {
        let strategy: Box<dyn PageCacheStrategy> = Box::new(StoreCacheStrategy::new(
          self.store.clone(),
          self.serializer.clone(),
          &self.config.page_cache.key_prefix,
          page_id,
          self.config.page_cache.lifetime_secs,
        ));
        HeadTagManager::with_page_cache(factories, strategy)
      }
      _ => HeadTagManager::new(factories),
    };

    HeadSession {
      runtime: self,
      manager,
      tracker: ElementTracker::new(self.serializer.clone()),
    }
  }
}

/// State of one page render.
#[derive(Debug)]
pub struct HeadSession<'rt> {
  runtime: &'rt HeadRuntime,
  manager: HeadTagManager,
  tracker: ElementTracker,
}

impl<'rt> HeadSession<'rt> {
  pub fn runtime(&self) -> &'rt HeadRuntime {
    self.runtime
  }

  pub fn manager(&mut self) -> &mut HeadTagManager {
    &mut self.manager
  }

  pub fn tracker(&self) -> &ElementTracker {
    &self.tracker
  }

  fn tracked_name<'f>(&self, fragment: &'f dyn Fragment) -> Option<&'f str> {
    fragment.name_in_layout().filter(|name| !name.is_empty())
  }

  pub fn on_before_fragment_render(&mut self, fragment: &dyn Fragment) {
    let Some(name) = self.tracked_name(fragment) else {
      return;
    };

    let config = &self.runtime.config;
    if !config.enabled {
      return;
    }
    if !config.is_module_enabled(fragment.module_name()) {
      trace!(fragment = %name, module = ?fragment.module_name(), "module output disabled, not tracking");
      return;
    }

    self.tracker.start_tracking(name, &mut self.manager);
  }

  pub fn on_after_fragment_render(&mut self, fragment: &dyn Fragment) {
    let Some(name) = self.tracked_name(fragment) else {
      return;
    };
    if !self.tracker.is_tracking(name) {
      return;
    }

    let delta = self.tracker.stop_tracking_and_get_new_elements(name, &mut self.manager);
    let captured = self.tracker.captured_elements(name, &mut self.manager);
    let runtime = self.runtime;
    let detector = &runtime.detector;
    let cache = &runtime.fragment_cache;

    if detector.is_cacheable(fragment) && !captured.is_empty() {
      if cache.save(fragment, &captured) {
        trace!(fragment = %name, own = delta.len(), total = captured.len(), "fragment head elements persisted");
      } else {
        self.tracker.release_claims(name);
      }
    } else if detector.is_cached(fragment) {
      self.restore(name, fragment);
    } else {
      self.tracker.release_claims(name);
    }

    self.tracker.clear_tracking(name);
  }

  /// Replay the stored entry of a fragment served from cache.
  fn restore(&mut self, name: &str, fragment: &dyn Fragment) {
    let elements = self.runtime.fragment_cache.load(fragment);
    if elements.is_empty() {
      debug!(fragment = %name, "no head elements cached for fragment");
      return;
    }

    let keys: Vec<String> = elements.keys().map(str::to_string).collect();
    for (element_key, element) in elements {
      self.manager.add_element(element, element_key);
    }
    self.tracker.claim_for_enclosing(name, &keys);
    debug!(fragment = %name, count = keys.len(), "head elements restored from fragment cache");
  }

  /// Run `render` between the before and after hooks.
  ///
  /// When `render` fails the fragment's frame is dropped without persisting
  /// anything; elements it added stay with the enclosing fragment.
  pub fn render_fragment<T, E>(
    &mut self,
    fragment: &dyn Fragment,
    render: impl FnOnce(&mut Self) -> Result<T, E>,
  ) -> Result<T, E> {
    self.on_before_fragment_render(fragment);
    let result = render(self);
    match &result {
      Ok(_) => self.on_after_fragment_render(fragment),
      Err(_) => {
        if let Some(name) = self.tracked_name(fragment) {
          warn!(fragment = %name, "fragment render failed, discarding tracking frame");
          self.tracker.clear_tracking(name);
        }
      }
    }
    result
  }

  /// Substitute the placeholder in `response` with the rendered head elements.
  pub fn inject(&mut self, response: &mut dyn Response) -> InjectOutcome {
    self.runtime.injector.inject(response, &mut self.manager)
  }

  /// End the render: drop frames left open by unmatched hooks.
  pub fn finish(&mut self) {
    self.tracker.reset();
  }
}
