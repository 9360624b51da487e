//! Per-type serialization strategies and their registry.
//!
//! Lookup order for an element:
//! 1. the strategy registered for the element's exact type identity,
//! 2. the memoized result of an earlier capability probe for the same concrete type,
//! 3. a probe across all strategies in priority order (highest first), memoized.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use super::{SerializeError, SerializedElement};
use crate::element::{ElementKind, HeadElement, LinkElement, MetaElement, ScriptElement, StyleElement};

pub const DEFAULT_PRIORITY: i32 = 100;

/// Converts one element type into its [`SerializedElement`] form.
pub trait SerializationStrategy: Send + Sync {
  /// Short type name written as `short_type`.
  fn element_type(&self) -> &str;

  /// Full type identity this strategy is registered under.
  fn type_name(&self) -> &str;

  fn can_handle(&self, element: &dyn HeadElement) -> bool;

  fn serialize(&self, element: &dyn HeadElement, key: &str) -> Result<SerializedElement, SerializeError>;

  fn priority(&self) -> i32 {
    DEFAULT_PRIORITY
  }
}

/// Strategy for the built-in element kinds. Body content is captured for
/// `script` and `style` only.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinStrategy {
  kind: ElementKind,
}

impl BuiltinStrategy {
  pub fn new(kind: ElementKind) -> Self {
    Self { kind }
  }
}

impl SerializationStrategy for BuiltinStrategy {
  fn element_type(&self) -> &str {
    self.kind.as_str()
  }

  fn type_name(&self) -> &str {
    self.kind.type_name()
  }

  fn can_handle(&self, element: &dyn HeadElement) -> bool {
    let any = element.as_any();
    match self.kind {
      ElementKind::Meta => any.is::<MetaElement>(),
      ElementKind::Link => any.is::<LinkElement>(),
      ElementKind::Script => any.is::<ScriptElement>(),
      ElementKind::Style => any.is::<StyleElement>(),
    }
  }

  fn serialize(&self, element: &dyn HeadElement, key: &str) -> Result<SerializedElement, SerializeError> {
    if !self.can_handle(element) {
      return Err(SerializeError::Unsupported {
        key: key.to_string(),
        type_name: element.type_name().to_string(),
      });
    }

    Ok(SerializedElement {
      type_name: element.type_name().to_string(),
      short_type: self.kind.as_str().to_string(),
      attributes: element.attributes().clone(),
      content: if self.kind.has_content() {
        element.content().map(str::to_string)
      } else {
        None
      },
    })
  }
}

/// Registry of serialization strategies.
///
/// Registration happens at startup; lookups afterwards only touch the probe memo.
#[derive(Default)]
pub struct StrategyRegistry {
  /// Sorted by priority, highest first. Equal priorities keep registration order.
  strategies: Vec<Arc<dyn SerializationStrategy>>,
  by_type: HashMap<String, usize>,
  by_type_name: HashMap<String, usize>,
  probe_memo: RwLock<HashMap<TypeId, usize>>,
}

impl StrategyRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registry preloaded with strategies for the built-in element kinds.
  pub fn with_builtins() -> Self {
    Self::from_strategies(
      ElementKind::ALL
        .into_iter()
        .map(|kind| Arc::new(BuiltinStrategy::new(kind)) as Arc<dyn SerializationStrategy>),
    )
  }

  pub fn from_strategies(strategies: impl IntoIterator<Item = Arc<dyn SerializationStrategy>>) -> Self {
    let mut registry = Self::new();
    for strategy in strategies {
      registry.register(strategy);
    }
    registry
  }

  pub fn register(&mut self, strategy: Arc<dyn SerializationStrategy>) {
    let at = self
      .strategies
      .iter()
      .position(|s| s.priority() < strategy.priority())
      .unwrap_or(self.strategies.len());
    self.strategies.insert(at, strategy);
    self.reindex();
  }

  fn reindex(&mut self) {
    self.by_type.clear();
    self.by_type_name.clear();
    // Iterate lowest priority first so the highest priority wins each slot.
    for (idx, strategy) in self.strategies.iter().enumerate().rev() {
      self.by_type.insert(strategy.element_type().to_string(), idx);
      self.by_type_name.insert(strategy.type_name().to_string(), idx);
    }
    if let Ok(mut memo) = self.probe_memo.write() {
      memo.clear();
    }
  }

  /// Find the strategy that should serialize `element`.
  pub fn strategy_for(&self, element: &dyn HeadElement) -> Option<&Arc<dyn SerializationStrategy>> {
    if let Some(&idx) = self.by_type_name.get(element.type_name()) {
      return self.strategies.get(idx);
    }

    let type_id = element.as_any().type_id();
    if let Ok(memo) = self.probe_memo.read()
      && let Some(&idx) = memo.get(&type_id)
    {
      return self.strategies.get(idx);
    }

    let idx = self.strategies.iter().position(|s| s.can_handle(element))?;
    if let Ok(mut memo) = self.probe_memo.write() {
      memo.insert(type_id, idx);
    }
    self.strategies.get(idx)
  }

  pub fn strategy_by_type(&self, element_type: &str) -> Option<&Arc<dyn SerializationStrategy>> {
    self.by_type.get(element_type).and_then(|&idx| self.strategies.get(idx))
  }

  pub fn strategy_by_type_name(&self, type_name: &str) -> Option<&Arc<dyn SerializationStrategy>> {
    self.by_type_name.get(type_name).and_then(|&idx| self.strategies.get(idx))
  }

  pub fn has_type(&self, element_type: &str) -> bool {
    self.by_type.contains_key(element_type)
  }

  pub fn strategies(&self) -> &[Arc<dyn SerializationStrategy>] {
    &self.strategies
  }
}

impl fmt::Debug for StrategyRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let names: Vec<&str> = self.strategies.iter().map(|s| s.type_name()).collect();
    f.debug_struct("StrategyRegistry").field("strategies", &names).finish()
  }
}
