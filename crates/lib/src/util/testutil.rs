//! Test doubles shared by the unit tests of headtag-lib.

use std::any::Any;
use std::cell::Cell;
use std::io;
use std::str::FromStr;
use std::sync::Arc;

use crate::element::{Attributes, ElementData, ElementKind, FactoryRegistry, HeadElement, escape_html};
use crate::fragment::{CacheLifetime, Fragment, FragmentError};
use crate::store::{CacheStore, EntryInfo, StoreError};

/// A `<base>` element: a custom type no built-in strategy or factory knows.
#[derive(Debug, Clone)]
pub struct BaseElement {
  attributes: Attributes,
}

impl BaseElement {
  pub const TYPE_NAME: &'static str = "test::BaseElement";

  pub fn new(href: &str) -> Self {
    let mut attributes = Attributes::new();
    attributes.insert("href", href.to_string());
    Self { attributes }
  }
}

impl HeadElement for BaseElement {
  fn type_name(&self) -> &str {
    Self::TYPE_NAME
  }

  fn attributes(&self) -> &Attributes {
    &self.attributes
  }

  fn render(&self) -> String {
    let href = self.attribute("href").unwrap_or_default();
    format!(r#"<base href="{}">"#, escape_html(href))
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}

/// Build a built-in element through its factory.
pub fn element(kind: ElementKind, attributes: &[(&str, &str)], content: Option<&str>) -> Arc<dyn HeadElement> {
  let mut data = ElementData::new().with_attributes(attributes.iter().copied());
  if let Some(content) = content {
    data = data.with_content(content);
  }
  FactoryRegistry::with_builtins()
    .factory_by_type(kind.as_str())
    .unwrap()
    .create(data)
    .unwrap()
}

/// Shorthand for `element` taking the short type as a string.
pub fn element_of(short_type: &str, attributes: &[(&str, &str)]) -> Arc<dyn HeadElement> {
  element(ElementKind::from_str(short_type).unwrap(), attributes, None)
}

/// Configurable fragment. The lifetime can change after construction to mimic
/// hosts that settle it while rendering.
#[derive(Debug)]
pub struct TestFragment {
  name: Option<String>,
  module: Option<String>,
  key: String,
  tags: Vec<String>,
  lifetime: Cell<CacheLifetime>,
  fail_lifetime: bool,
  fail_key: bool,
}

impl TestFragment {
  pub fn new(name: &str) -> Self {
    Self {
      name: Some(name.to_string()),
      module: None,
      key: format!("fragment_{name}"),
      tags: Vec::new(),
      lifetime: Cell::new(CacheLifetime::Unset),
      fail_lifetime: false,
      fail_key: false,
    }
  }

  pub fn nameless() -> Self {
    Self {
      name: None,
      ..Self::new("")
    }
  }

  pub fn key(mut self, key: &str) -> Self {
    self.key = key.to_string();
    self
  }

  pub fn lifetime(self, lifetime: CacheLifetime) -> Self {
    self.lifetime.set(lifetime);
    self
  }

  pub fn cached(self) -> Self {
    self.lifetime(CacheLifetime::Seconds(3600))
  }

  pub fn tags(mut self, tags: &[&str]) -> Self {
    self.tags = tags.iter().map(|t| t.to_string()).collect();
    self
  }

  pub fn module(mut self, module: &str) -> Self {
    self.module = Some(module.to_string());
    self
  }

  pub fn failing_lifetime(mut self) -> Self {
    self.fail_lifetime = true;
    self
  }

  pub fn failing_key(mut self) -> Self {
    self.fail_key = true;
    self
  }

  pub fn set_lifetime(&self, lifetime: CacheLifetime) {
    self.lifetime.set(lifetime);
  }
}

impl Fragment for TestFragment {
  fn name_in_layout(&self) -> Option<&str> {
    self.name.as_deref()
  }

  fn module_name(&self) -> Option<&str> {
    self.module.as_deref()
  }

  fn cache_key(&self) -> Result<String, FragmentError> {
    if self.fail_key {
      return Err(FragmentError::Accessor {
        accessor: "cache_key",
        message: "store configuration missing".to_string(),
      });
    }
    Ok(self.key.clone())
  }

  fn cache_lifetime(&self) -> Result<CacheLifetime, FragmentError> {
    if self.fail_lifetime {
      return Err(FragmentError::Accessor {
        accessor: "cache_lifetime",
        message: "lifetime depends on unavailable state".to_string(),
      });
    }
    Ok(self.lifetime.get())
  }

  fn cache_tags(&self) -> Result<Vec<String>, FragmentError> {
    Ok(self.tags.clone())
  }
}

/// Store whose every operation fails.
#[derive(Debug, Default)]
pub struct FailingStore;

fn unavailable() -> StoreError {
  StoreError::Read(io::Error::other("backend unavailable"))
}

impl CacheStore for FailingStore {
  fn load(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
    Err(unavailable())
  }

  fn save(&self, _key: &str, _data: &[u8], _tags: &[String], _lifetime_secs: Option<u64>) -> Result<(), StoreError> {
    Err(StoreError::Write(io::Error::other("backend unavailable")))
  }

  fn remove(&self, _key: &str) -> Result<bool, StoreError> {
    Err(unavailable())
  }

  fn clean_tags(&self, _tags: &[String]) -> Result<usize, StoreError> {
    Err(unavailable())
  }

  fn flush(&self) -> Result<usize, StoreError> {
    Err(unavailable())
  }

  fn entries(&self) -> Result<Vec<EntryInfo>, StoreError> {
    Err(unavailable())
  }
}
