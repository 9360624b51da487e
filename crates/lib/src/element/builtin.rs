use std::any::Any;

use super::{Attributes, HeadElement, attributes_to_string};

fn render_void(tag: &str, attributes: &Attributes) -> String {
  format!("<{tag}{}>", attributes_to_string(attributes))
}

fn render_container(tag: &str, attributes: &Attributes, content: Option<&str>) -> String {
  format!(
    "<{tag}{}>{}</{tag}>",
    attributes_to_string(attributes),
    content.unwrap_or_default()
  )
}

/// `<meta>` declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaElement {
  attributes: Attributes,
}

impl MetaElement {
  pub const TYPE_NAME: &'static str = "headtag::element::MetaElement";

  pub fn new(attributes: Attributes) -> Self {
    Self { attributes }
  }

  pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
    self.attributes.insert(name, value.into());
    self
  }

  pub fn remove_attribute(&mut self, name: &str) -> &mut Self {
    self.attributes.remove(name);
    self
  }
}

impl HeadElement for MetaElement {
  fn type_name(&self) -> &str {
    Self::TYPE_NAME
  }

  fn attributes(&self) -> &Attributes {
    &self.attributes
  }

  fn render(&self) -> String {
    render_void("meta", &self.attributes)
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}

/// `<link>` declaration (stylesheets, canonical URLs, preloads, icons).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkElement {
  attributes: Attributes,
}

impl LinkElement {
  pub const TYPE_NAME: &'static str = "headtag::element::LinkElement";

  pub fn new(attributes: Attributes) -> Self {
    Self { attributes }
  }

  pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
    self.attributes.insert(name, value.into());
    self
  }

  pub fn remove_attribute(&mut self, name: &str) -> &mut Self {
    self.attributes.remove(name);
    self
  }
}

impl HeadElement for LinkElement {
  fn type_name(&self) -> &str {
    Self::TYPE_NAME
  }

  fn attributes(&self) -> &Attributes {
    &self.attributes
  }

  fn render(&self) -> String {
    render_void("link", &self.attributes)
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}

/// `<script>` element, external (`src`) or inline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptElement {
  attributes: Attributes,
  content: Option<String>,
}

impl ScriptElement {
  pub const TYPE_NAME: &'static str = "headtag::element::ScriptElement";

  pub fn new(attributes: Attributes, content: Option<String>) -> Self {
    Self { attributes, content }
  }

  pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
    self.attributes.insert(name, value.into());
    self
  }

  pub fn remove_attribute(&mut self, name: &str) -> &mut Self {
    self.attributes.remove(name);
    self
  }

  pub fn set_content(&mut self, content: impl Into<String>) -> &mut Self {
    self.content = Some(content.into());
    self
  }
}

impl HeadElement for ScriptElement {
  fn type_name(&self) -> &str {
    Self::TYPE_NAME
  }

  fn attributes(&self) -> &Attributes {
    &self.attributes
  }

  fn content(&self) -> Option<&str> {
    self.content.as_deref()
  }

  fn render(&self) -> String {
    render_container("script", &self.attributes, self.content.as_deref())
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}

/// Inline `<style>` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleElement {
  attributes: Attributes,
  content: Option<String>,
}

impl StyleElement {
  pub const TYPE_NAME: &'static str = "headtag::element::StyleElement";

  pub fn new(attributes: Attributes, content: Option<String>) -> Self {
    Self { attributes, content }
  }

  pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
    self.attributes.insert(name, value.into());
    self
  }

  pub fn set_content(&mut self, content: impl Into<String>) -> &mut Self {
    self.content = Some(content.into());
    self
  }
}

impl HeadElement for StyleElement {
  fn type_name(&self) -> &str {
    Self::TYPE_NAME
  }

  fn attributes(&self) -> &Attributes {
    &self.attributes
  }

  fn content(&self) -> Option<&str> {
    self.content.as_deref()
  }

  fn render(&self) -> String {
    render_container("style", &self.attributes, self.content.as_deref())
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}
