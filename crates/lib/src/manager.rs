//! The page's ordered, keyed collection of head elements.
//!
//! Keys are unique: re-adding a key replaces the element in place, a new key
//! is appended. Insertion order is render order.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use headtag_lib::element::FactoryRegistry;
//! use headtag_lib::manager::HeadTagManager;
//!
//! let mut manager = HeadTagManager::new(Arc::new(FactoryRegistry::with_builtins()));
//! manager.add_meta_name("description", "x").unwrap();
//! assert_eq!(manager.render(), "<meta name=\"description\" content=\"x\">\n");
//! ```

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace};

use crate::cache::{NullCacheStrategy, PageCacheStrategy};
use crate::consts::CHARSET_KEY;
use crate::element::{Attributes, ElementData, ElementError, ElementMap, FactoryRegistry, HeadElement};
use crate::util::hash::Hashable;

/// Material hashed into a derived element key.
#[derive(Serialize)]
struct ElementKeySource<'a> {
  element_type: &'a str,
  attributes: &'a Attributes,
  content: Option<&'a str>,
}

impl Hashable for ElementKeySource<'_> {}

/// Derive the key of an element built from `data`: `<type>_<hash>`.
///
/// Identical declarations always derive the same key.
pub fn generate_element_key(element_type: &str, data: &ElementData) -> Result<String, ElementError> {
  let source = ElementKeySource {
    element_type,
    attributes: &data.attributes,
    content: data.content.as_deref(),
  };
  let hash = source.compute_hash().map_err(ElementError::KeyDerivation)?;
  Ok(format!("{element_type}_{hash}"))
}

/// Collects the head elements of one page render.
///
/// With a whole-page cache strategy, the first access loads the cached
/// collection and [`render`](Self::render) writes it back when it changed.
pub struct HeadTagManager {
  factories: Arc<FactoryRegistry>,
  page_cache: Box<dyn PageCacheStrategy>,
  elements: ElementMap,
  loaded: bool,
  modified: bool,
  flushed: bool,
}

impl fmt::Debug for HeadTagManager {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("HeadTagManager")
      .field("elements", &self.elements.keys().collect::<Vec<_>>())
      .field("page_cache", &self.page_cache)
      .field("modified", &self.modified)
      .finish()
  }
}

impl HeadTagManager {
  pub fn new(factories: Arc<FactoryRegistry>) -> Self {
    Self::with_page_cache(factories, Box::new(NullCacheStrategy))
  }

  pub fn with_page_cache(factories: Arc<FactoryRegistry>, page_cache: Box<dyn PageCacheStrategy>) -> Self {
    Self {
      factories,
      page_cache,
      elements: ElementMap::new(),
      loaded: false,
      modified: false,
      flushed: false,
    }
  }

  pub fn factories(&self) -> &Arc<FactoryRegistry> {
    &self.factories
  }

  fn ensure_loaded(&mut self) {
    if self.loaded {
      return;
    }
    self.loaded = true;

    if !self.page_cache.is_enabled() {
      return;
    }
    let cached = self.page_cache.load();
    if !cached.is_empty() {
      debug!(count = cached.len(), "restored page head elements");
    }
    for (key, element) in cached {
      self.elements.insert(key, element);
    }
  }

  /// Add `element` under `key`, replacing any element already stored there.
  pub fn add_element(&mut self, element: Arc<dyn HeadElement>, key: impl Into<String>) {
    self.ensure_loaded();
    let key = key.into();
    trace!(key = %key, element_type = %element.type_name(), "head element added");
    self.elements.insert(key, element);
    self.modified = true;
  }

  /// Build an element of the short type `element_type` and add it.
  ///
  /// Without an explicit key the key is derived from the type and data, so
  /// adding the same declaration twice keeps a single element.
  pub fn create_element(
    &mut self,
    element_type: &str,
    data: ElementData,
    key: Option<&str>,
  ) -> Result<Arc<dyn HeadElement>, ElementError> {
    let factory = self
      .factories
      .factory_by_type(element_type)
      .ok_or_else(|| ElementError::UnknownType(element_type.to_string()))?
      .clone();

    let key = match key {
      Some(key) => key.to_string(),
      None => generate_element_key(element_type, &data)?,
    };
    let element = factory.create(data)?;
    self.add_element(element.clone(), key);
    Ok(element)
  }

  pub fn add_meta(&mut self, data: ElementData, key: Option<&str>) -> Result<Arc<dyn HeadElement>, ElementError> {
    self.create_element("meta", data, key)
  }

  /// `<meta name=".." content="..">`, keyed by name.
  pub fn add_meta_name(&mut self, name: &str, content: &str) -> Result<Arc<dyn HeadElement>, ElementError> {
    let data = ElementData::new().with_attribute("name", name).with_attribute("content", content);
    self.create_element("meta", data, Some(&format!("meta_name_{name}")))
  }

  /// `<meta property=".." content="..">`, keyed by property.
  pub fn add_meta_property(&mut self, property: &str, content: &str) -> Result<Arc<dyn HeadElement>, ElementError> {
    let data = ElementData::new()
      .with_attribute("property", property)
      .with_attribute("content", content);
    self.create_element("meta", data, Some(&format!("meta_property_{property}")))
  }

  pub fn add_charset(&mut self, charset: &str) -> Result<Arc<dyn HeadElement>, ElementError> {
    let data = ElementData::new().with_attribute("charset", charset);
    self.create_element("meta", data, Some(CHARSET_KEY))
  }

  pub fn add_link(&mut self, data: ElementData, key: Option<&str>) -> Result<Arc<dyn HeadElement>, ElementError> {
    self.create_element("link", data, key)
  }

  pub fn add_stylesheet(
    &mut self,
    href: &str,
    extra: &[(&str, &str)],
    key: Option<&str>,
  ) -> Result<Arc<dyn HeadElement>, ElementError> {
    let data = ElementData::new()
      .with_attribute("rel", "stylesheet")
      .with_attribute("href", href)
      .with_attributes(extra.iter().copied());
    self.create_element("link", data, key)
  }

  pub fn add_script(&mut self, data: ElementData, key: Option<&str>) -> Result<Arc<dyn HeadElement>, ElementError> {
    self.create_element("script", data, key)
  }

  pub fn add_external_script(
    &mut self,
    src: &str,
    extra: &[(&str, &str)],
    key: Option<&str>,
  ) -> Result<Arc<dyn HeadElement>, ElementError> {
    let data = ElementData::new()
      .with_attribute("src", src)
      .with_attributes(extra.iter().copied());
    self.create_element("script", data, key)
  }

  pub fn add_inline_script(&mut self, content: &str, key: Option<&str>) -> Result<Arc<dyn HeadElement>, ElementError> {
    self.create_element("script", ElementData::new().with_content(content), key)
  }

  pub fn add_inline_style(&mut self, content: &str, key: Option<&str>) -> Result<Arc<dyn HeadElement>, ElementError> {
    self.create_element("style", ElementData::new().with_content(content), key)
  }

  /// Remove `key`. Missing keys are ignored.
  pub fn remove(&mut self, key: &str) {
    self.ensure_loaded();
    if self.elements.remove(key).is_some() {
      self.modified = true;
    }
  }

  pub fn has(&mut self, key: &str) -> bool {
    self.ensure_loaded();
    self.elements.contains_key(key)
  }

  pub fn get(&mut self, key: &str) -> Option<Arc<dyn HeadElement>> {
    self.ensure_loaded();
    self.elements.get(key).cloned()
  }

  /// Snapshot of the collection in render order.
  pub fn all_elements(&mut self) -> ElementMap {
    self.ensure_loaded();
    self.elements.clone()
  }

  pub fn element_keys(&mut self) -> Vec<String> {
    self.ensure_loaded();
    self.elements.keys().map(str::to_string).collect()
  }

  pub fn len(&mut self) -> usize {
    self.ensure_loaded();
    self.elements.len()
  }

  pub fn is_empty(&mut self) -> bool {
    self.len() == 0
  }

  /// `(key, markup)` pairs in render order.
  pub fn rendered_elements(&mut self) -> Vec<(String, String)> {
    self.ensure_loaded();
    self
      .elements
      .iter()
      .map(|(key, element)| (key.to_string(), element.render()))
      .collect()
  }

  /// Markup of every element, each followed by a newline.
  ///
  /// The first render after a change writes the collection to the page cache;
  /// the cache is written at most once per request.
  pub fn render(&mut self) -> String {
    self.ensure_loaded();
    let mut out = String::new();
    for element in self.elements.values() {
      out.push_str(&element.render());
      out.push('\n');
    }

    if self.modified && !self.flushed {
      self.flush();
    }
    out
  }

  /// Write the collection to the page cache now.
  pub fn save_to_cache(&mut self) -> bool {
    self.ensure_loaded();
    self.flush()
  }

  fn flush(&mut self) -> bool {
    if !self.page_cache.is_enabled() {
      return true;
    }
    let saved = self.page_cache.save(&self.elements);
    if saved {
      self.modified = false;
      self.flushed = true;
    }
    saved
  }

  /// Drop every element and the page cache entry.
  pub fn clear(&mut self) {
    self.elements.clear();
    self.loaded = true;
    self.modified = false;
    if self.page_cache.is_enabled() {
      self.page_cache.clear();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::StoreCacheStrategy;
  use crate::consts::PAGE_KEY_PREFIX;
  use crate::element::{MetaElement, ScriptElement};
  use crate::serializer::ElementSerializer;
  use crate::store::{CacheStore, MemoryStore};
  use crate::util::testutil::element_of;

  fn manager() -> HeadTagManager {
    HeadTagManager::new(Arc::new(FactoryRegistry::with_builtins()))
  }

  #[test]
  fn meta_description_scenario() {
    let mut m = manager();
    m.add_meta(
      ElementData::new()
        .with_attribute("name", "description")
        .with_attribute("content", "x"),
      None,
    )
    .unwrap();
    assert_eq!(m.render(), "<meta name=\"description\" content=\"x\">\n");
  }

  #[test]
  fn explicit_key_collision_keeps_last_value() {
    let mut m = manager();
    m.add_inline_style("a{}", Some("theme")).unwrap();
    m.add_inline_style("b{}", Some("theme")).unwrap();

    assert_eq!(m.len(), 1);
    assert_eq!(m.get("theme").unwrap().content(), Some("b{}"));
  }

  #[test]
  fn derived_key_deduplicates() {
    let mut m = manager();
    m.add_stylesheet("/a.css", &[], None).unwrap();
    m.add_stylesheet("/a.css", &[], None).unwrap();
    m.add_stylesheet("/b.css", &[], None).unwrap();
    assert_eq!(m.len(), 2);
  }

  #[test]
  fn render_follows_insertion_order() {
    let mut m = manager();
    m.add_element(element_of("meta", &[("name", "a")]), "A");
    m.add_element(element_of("meta", &[("name", "b")]), "B");
    m.add_element(element_of("meta", &[("name", "c")]), "C");
    m.add_element(element_of("meta", &[("name", "a2")]), "A");

    assert_eq!(
      m.render(),
      "<meta name=\"a2\">\n<meta name=\"b\">\n<meta name=\"c\">\n"
    );
  }

  #[test]
  fn unknown_type_fails_loud() {
    let mut m = manager();
    let err = m.create_element("marquee", ElementData::new(), None).unwrap_err();
    assert!(matches!(err, ElementError::UnknownType(t) if t == "marquee"));
  }

  #[test]
  fn missing_keys_are_silent() {
    let mut m = manager();
    m.remove("nothing");
    assert!(!m.has("nothing"));
    assert!(m.get("nothing").is_none());
  }

  #[test]
  fn convenience_adders() {
    let mut m = manager();
    m.add_charset("UTF-8").unwrap();
    m.add_meta_property("og:title", "Shoes").unwrap();
    m.add_external_script("/app.js", &[("defer", "defer")], Some("app")).unwrap();
    m.add_inline_script("window.x = 1;", Some("inline")).unwrap();

    assert!(m.get(CHARSET_KEY).unwrap().as_any().is::<MetaElement>());
    assert!(m.has("meta_property_og:title"));
    assert!(m.get("app").unwrap().as_any().is::<ScriptElement>());
    let rendered = m.rendered_elements();
    assert_eq!(rendered[0], (CHARSET_KEY.to_string(), "<meta charset=\"UTF-8\">".to_string()));
    assert_eq!(rendered[2].1, "<script src=\"/app.js\" defer=\"defer\"></script>");
    assert_eq!(rendered[3].1, "<script>window.x = 1;</script>");
  }

  #[test]
  fn generated_keys_are_stable_and_typed() {
    let data = ElementData::new().with_attribute("rel", "icon");
    let a = generate_element_key("link", &data).unwrap();
    let b = generate_element_key("link", &data.clone()).unwrap();
    assert_eq!(a, b);
    assert!(a.starts_with("link_"));
    assert_ne!(a, generate_element_key("meta", &data).unwrap());
  }

  #[test]
  fn page_cache_round_trip() {
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
    let serializer = ElementSerializer::with_builtins();
    let strategy = || {
      Box::new(StoreCacheStrategy::new(store.clone(), serializer.clone(), PAGE_KEY_PREFIX, "home", None))
    };

    let mut first = HeadTagManager::with_page_cache(serializer.factories().clone(), strategy());
    first.add_meta_name("robots", "index").unwrap();
    first.render();
    assert_eq!(store.entries().unwrap().len(), 1);

    let mut second = HeadTagManager::with_page_cache(serializer.factories().clone(), strategy());
    assert!(second.has("meta_name_robots"));
    second.add_charset("UTF-8").unwrap();
    assert_eq!(second.element_keys(), vec!["meta_name_robots", "charset"]);
  }

  #[test]
  fn clear_empties_collection_and_page_entry() {
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
    let serializer = ElementSerializer::with_builtins();
    let strategy = StoreCacheStrategy::new(store.clone(), serializer.clone(), PAGE_KEY_PREFIX, "p", None);
    let mut m = HeadTagManager::with_page_cache(serializer.factories().clone(), Box::new(strategy));

    m.add_meta_name("a", "b").unwrap();
    assert!(m.save_to_cache());
    m.clear();
    assert!(m.is_empty());
    assert!(store.entries().unwrap().is_empty());
  }
}
