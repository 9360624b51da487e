//! Head elements: the pre-rendered declarations collected for a document's `<head>`.
//!
//! An element is an attribute bag plus optional body content with a pure
//! `render()`. Elements are built through an [`ElementFactory`] and shared
//! immutably (`Arc<dyn HeadElement>`) once they enter a collection.
//!
//! # Element Types
//!
//! | short type | type identity                         | rendered as                  |
//! |------------|---------------------------------------|------------------------------|
//! | `meta`     | `headtag::element::MetaElement`       | `<meta a="v">`               |
//! | `link`     | `headtag::element::LinkElement`       | `<link a="v">`               |
//! | `script`   | `headtag::element::ScriptElement`     | `<script a="v">body</script>`|
//! | `style`    | `headtag::element::StyleElement`      | `<style a="v">body</style>`  |
//!
//! Custom element types implement [`HeadElement`] and register a factory and a
//! serialization strategy of their own.

mod builtin;
mod factory;
mod registry;

use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::ordered::OrderedMap;

pub use builtin::{LinkElement, MetaElement, ScriptElement, StyleElement};
pub use factory::{BuiltinFactory, ElementFactory};
pub use registry::FactoryRegistry;

/// Ordered attribute name to value map. Render order follows insertion order.
pub type Attributes = OrderedMap<String>;

/// Keyed, ordered collection of live elements.
pub type ElementMap = OrderedMap<Arc<dyn HeadElement>>;

/// Errors raised while constructing elements.
///
/// These indicate a programming mistake in page-construction code and are
/// surfaced to the caller rather than swallowed.
#[derive(Debug, Error)]
pub enum ElementError {
  #[error("no factory found for element type: {0}")]
  UnknownType(String),

  #[error("invalid {element_type} element: {message}")]
  Invalid { element_type: String, message: String },

  #[error("failed to derive element key: {0}")]
  KeyDerivation(#[source] serde_json::Error),
}

/// A single declaration destined for the document head.
pub trait HeadElement: fmt::Debug + Send + Sync + 'static {
  /// Full type identity, recorded when serializing so the element can be
  /// rebuilt by the matching factory.
  fn type_name(&self) -> &str;

  fn attributes(&self) -> &Attributes;

  /// Body content. Void elements have none.
  fn content(&self) -> Option<&str> {
    None
  }

  fn render(&self) -> String;

  fn as_any(&self) -> &dyn Any;

  fn attribute(&self, name: &str) -> Option<&str> {
    self.attributes().get(name).map(String::as_str)
  }

  fn has_attribute(&self, name: &str) -> bool {
    self.attributes().contains_key(name)
  }
}

/// The built-in element kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
  Meta,
  Link,
  Script,
  Style,
}

impl ElementKind {
  pub const ALL: [ElementKind; 4] = [ElementKind::Meta, ElementKind::Link, ElementKind::Script, ElementKind::Style];

  /// Short type name (`meta`, `link`, ...).
  pub fn as_str(self) -> &'static str {
    match self {
      ElementKind::Meta => "meta",
      ElementKind::Link => "link",
      ElementKind::Script => "script",
      ElementKind::Style => "style",
    }
  }

  /// Full type identity of the concrete element this kind constructs.
  pub fn type_name(self) -> &'static str {
    match self {
      ElementKind::Meta => MetaElement::TYPE_NAME,
      ElementKind::Link => LinkElement::TYPE_NAME,
      ElementKind::Script => ScriptElement::TYPE_NAME,
      ElementKind::Style => StyleElement::TYPE_NAME,
    }
  }

  /// Whether elements of this kind carry body content.
  pub fn has_content(self) -> bool {
    matches!(self, ElementKind::Script | ElementKind::Style)
  }
}

impl fmt::Display for ElementKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ElementKind {
  type Err = ElementError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    ElementKind::ALL
      .into_iter()
      .find(|kind| kind.as_str() == s)
      .ok_or_else(|| ElementError::UnknownType(s.to_string()))
  }
}

/// Construction input for a factory: attributes plus optional content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementData {
  #[serde(default)]
  pub attributes: Attributes,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content: Option<String>,
}

impl ElementData {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.attributes.insert(name, value.into());
    self
  }

  pub fn with_attributes<K, V>(mut self, attributes: impl IntoIterator<Item = (K, V)>) -> Self
  where
    K: Into<String>,
    V: Into<String>,
  {
    for (name, value) in attributes {
      self.attributes.insert(name, value.into());
    }
    self
  }

  pub fn with_content(mut self, content: impl Into<String>) -> Self {
    self.content = Some(content.into());
    self
  }
}

/// Reject attribute names a browser would not parse as a single attribute.
pub(crate) fn validate_attributes(element_type: &str, attributes: &Attributes) -> Result<(), ElementError> {
  for name in attributes.keys() {
    let bad = name.is_empty()
      || name
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '>' | '/' | '=' | '<'));
    if bad {
      return Err(ElementError::Invalid {
        element_type: element_type.to_string(),
        message: format!("invalid attribute name '{name}'"),
      });
    }
  }
  Ok(())
}

/// Escape text for use inside a double-quoted attribute value.
pub fn escape_html(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  for c in input.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#039;"),
      _ => out.push(c),
    }
  }
  out
}

pub(crate) fn attributes_to_string(attributes: &Attributes) -> String {
  let mut out = String::new();
  for (name, value) in attributes.iter() {
    out.push(' ');
    out.push_str(&escape_html(name));
    out.push_str("=\"");
    out.push_str(&escape_html(value));
    out.push('"');
  }
  out
}
