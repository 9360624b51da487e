use std::sync::Arc;

use super::{
  ElementData, ElementError, ElementKind, HeadElement, LinkElement, MetaElement, ScriptElement, StyleElement,
  validate_attributes,
};

/// Builds elements of one type from plain [`ElementData`].
pub trait ElementFactory: Send + Sync {
  /// Short type name (`meta`, `script`, ...).
  fn element_type(&self) -> &str;

  /// Full type identity of the elements this factory builds.
  fn type_name(&self) -> &str;

  fn create(&self, data: ElementData) -> Result<Arc<dyn HeadElement>, ElementError>;
}

/// Factory for the four built-in element kinds.
///
/// Content passed to a void kind (`meta`, `link`) is dropped.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinFactory {
  kind: ElementKind,
}

impl BuiltinFactory {
  pub fn new(kind: ElementKind) -> Self {
    Self { kind }
  }

  pub fn kind(&self) -> ElementKind {
    self.kind
  }
}

impl ElementFactory for BuiltinFactory {
  fn element_type(&self) -> &str {
    self.kind.as_str()
  }

  fn type_name(&self) -> &str {
    self.kind.type_name()
  }

  fn create(&self, data: ElementData) -> Result<Arc<dyn HeadElement>, ElementError> {
    validate_attributes(self.kind.as_str(), &data.attributes)?;

    let ElementData { attributes, content } = data;
    let element: Arc<dyn HeadElement> = match self.kind {
      ElementKind::Meta => Arc::new(MetaElement::new(attributes)),
      ElementKind::Link => Arc::new(LinkElement::new(attributes)),
      ElementKind::Script => Arc::new(ScriptElement::new(attributes, content)),
      ElementKind::Style => Arc::new(StyleElement::new(attributes, content)),
    };
    Ok(element)
  }
}
