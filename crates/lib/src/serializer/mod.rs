//! Conversion between live elements and their plain keyed-map form.
//!
//! The serialized form records the element's full type identity and short type
//! next to its attributes and content, so it can be rebuilt later, possibly in
//! another process. Failures are isolated per entry: a bad entry is logged and
//! dropped, the rest of the batch goes through.
//!
//! # Example Entry
//!
//! ```json
//! {
//!   "type": "headtag::element::ScriptElement",
//!   "short_type": "script",
//!   "attributes": { "src": "/js/app.js", "defer": "defer" },
//!   "content": null
//! }
//! ```

mod strategy;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::element::{Attributes, ElementData, ElementMap, FactoryRegistry, HeadElement};
use crate::util::ordered::OrderedMap;

pub use strategy::{BuiltinStrategy, DEFAULT_PRIORITY, SerializationStrategy, StrategyRegistry};

/// Short type written when the element's type is unknown to the factory registry.
pub const UNKNOWN_SHORT_TYPE: &str = "unknown";

/// Plain representation of one element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedElement {
  /// Full type identity. Empty in data written before identities were recorded.
  #[serde(rename = "type", default)]
  pub type_name: String,
  #[serde(default)]
  pub short_type: String,
  #[serde(default)]
  pub attributes: Attributes,
  #[serde(default)]
  pub content: Option<String>,
}

/// Keyed, ordered collection of serialized elements.
pub type SerializedMap = OrderedMap<SerializedElement>;

#[derive(Debug, Error)]
pub enum SerializeError {
  #[error("strategy cannot serialize element '{key}' of type {type_name}")]
  Unsupported { key: String, type_name: String },

  #[error("failed to encode head elements: {0}")]
  Encode(#[source] serde_json::Error),

  #[error("failed to decode head elements: {0}")]
  Decode(#[source] serde_json::Error),
}

/// Serializes element collections through the strategy registry and rebuilds
/// them through the factory registry.
#[derive(Debug, Clone)]
pub struct ElementSerializer {
  factories: Arc<FactoryRegistry>,
  strategies: Arc<StrategyRegistry>,
}

impl ElementSerializer {
  pub fn new(factories: Arc<FactoryRegistry>, strategies: Arc<StrategyRegistry>) -> Self {
    Self { factories, strategies }
  }

  /// Serializer over the built-in factories and strategies.
  pub fn with_builtins() -> Self {
    Self::new(
      Arc::new(FactoryRegistry::with_builtins()),
      Arc::new(StrategyRegistry::with_builtins()),
    )
  }

  pub fn factories(&self) -> &Arc<FactoryRegistry> {
    &self.factories
  }

  /// Serialize each element, keeping keys and order. Entries that fail are omitted.
  pub fn serialize(&self, elements: &ElementMap) -> SerializedMap {
    let mut out = SerializedMap::new();

    for (key, element) in elements.iter() {
      let result = match self.strategies.strategy_for(element.as_ref()) {
        Some(strategy) => strategy.serialize(element.as_ref(), key),
        None => Ok(self.fallback_serialize(element.as_ref())),
      };

      match result {
        Ok(data) => {
          out.insert(key, data);
        }
        Err(e) => {
          warn!(key = %key, element_type = %element.type_name(), error = %e, "failed to serialize head element");
        }
      }
    }

    out
  }

  /// Rebuild elements. Entries whose type cannot be resolved, or whose factory
  /// rejects the data, are omitted.
  pub fn unserialize(&self, data: &SerializedMap) -> ElementMap {
    let mut out = ElementMap::new();

    for (key, entry) in data.iter() {
      match self.recreate(entry) {
        Some(Ok(element)) => {
          out.insert(key, element);
        }
        Some(Err(e)) => {
          warn!(key = %key, element_type = %entry.type_name, error = %e, "failed to unserialize head element");
        }
        None => {
          warn!(
            key = %key,
            element_type = %entry.type_name,
            short_type = %entry.short_type,
            "no factory for serialized head element, skipping"
          );
        }
      }
    }

    out
  }

  /// Encode a serialized collection for the backing store.
  pub fn encode(&self, data: &SerializedMap) -> Result<Vec<u8>, SerializeError> {
    serde_json::to_vec(data).map_err(SerializeError::Encode)
  }

  pub fn decode(&self, bytes: &[u8]) -> Result<SerializedMap, SerializeError> {
    serde_json::from_slice(bytes).map_err(SerializeError::Decode)
  }

  fn recreate(&self, entry: &SerializedElement) -> Option<Result<Arc<dyn HeadElement>, crate::element::ElementError>> {
    let factory = Some(entry.type_name.as_str())
      .filter(|t| !t.is_empty())
      .and_then(|t| self.factories.factory_by_type_name(t))
      .or_else(|| self.factories.factory_by_type(&entry.short_type))
      .or_else(|| self.factories.factory_by_type(&entry.type_name))?;

    let data = ElementData {
      attributes: entry.attributes.clone(),
      content: entry.content.clone(),
    };
    Some(factory.create(data))
  }

  fn fallback_serialize(&self, element: &dyn HeadElement) -> SerializedElement {
    let type_name = element.type_name();
    SerializedElement {
      type_name: type_name.to_string(),
      short_type: self
        .factories
        .element_type_for(type_name)
        .unwrap_or(UNKNOWN_SHORT_TYPE)
        .to_string(),
      attributes: element.attributes().clone(),
      content: None,
    }
  }
}
