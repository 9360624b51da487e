use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{BuiltinFactory, ElementFactory, ElementKind};

/// Maps short element types and full type identities to factories.
///
/// Built once per process during startup and shared read-only afterwards.
#[derive(Default)]
pub struct FactoryRegistry {
  by_type: HashMap<String, Arc<dyn ElementFactory>>,
  by_type_name: HashMap<String, Arc<dyn ElementFactory>>,
  type_name_to_type: HashMap<String, String>,
  /// Registration order of short types, for stable listings.
  order: Vec<String>,
}

impl FactoryRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registry preloaded with factories for `meta`, `link`, `script`, and `style`.
  pub fn with_builtins() -> Self {
    let mut registry = Self::new();
    for kind in ElementKind::ALL {
      registry.register(Arc::new(BuiltinFactory::new(kind)));
    }
    registry
  }

  /// Register a factory. A later registration for the same type replaces the earlier one.
  pub fn register(&mut self, factory: Arc<dyn ElementFactory>) {
    let element_type = factory.element_type().to_string();
    let type_name = factory.type_name().to_string();

    if !self.by_type.contains_key(&element_type) {
      self.order.push(element_type.clone());
    }
    self.type_name_to_type.insert(type_name.clone(), element_type.clone());
    self.by_type_name.insert(type_name, factory.clone());
    self.by_type.insert(element_type, factory);
  }

  pub fn factory_by_type(&self, element_type: &str) -> Option<&Arc<dyn ElementFactory>> {
    self.by_type.get(element_type)
  }

  pub fn factory_by_type_name(&self, type_name: &str) -> Option<&Arc<dyn ElementFactory>> {
    self.by_type_name.get(type_name)
  }

  /// Short type registered for a full type identity.
  pub fn element_type_for(&self, type_name: &str) -> Option<&str> {
    self.type_name_to_type.get(type_name).map(String::as_str)
  }

  pub fn has_type(&self, element_type: &str) -> bool {
    self.by_type.contains_key(element_type)
  }

  pub fn has_type_name(&self, type_name: &str) -> bool {
    self.by_type_name.contains_key(type_name)
  }

  /// Registered short types in registration order.
  pub fn element_types(&self) -> Vec<&str> {
    self.order.iter().map(String::as_str).collect()
  }
}

impl fmt::Debug for FactoryRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FactoryRegistry")
      .field("element_types", &self.order)
      .finish()
  }
}
