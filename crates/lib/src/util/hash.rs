//! Hashing utilities for cache keys and element identity.
//!
//! This module provides:
//! - `ObjectHash`: A truncated hash identifying a logical head element
//! - `ContentHash`: A full 64-character hash used for cache key derivation
//! - `hash_bytes()`: Arbitrary byte hashing

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::consts::ELEMENT_KEY_HASH_LEN;

pub type HashError = serde_json::Error;

/// A hash identifying a logical object by its serialized form.
///
/// The hash is a truncated SHA-256 of the JSON-serialized value, so two values
/// that serialize identically always collapse to the same hash.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHash(pub String);

impl std::fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<ObjectHash, HashError> {
    let serialized = serde_json::to_string(self)?;
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    let full = format!("{:x}", hasher.finalize());
    Ok(ObjectHash(full[..ELEMENT_KEY_HASH_LEN].to_string()))
  }
}

/// A full 64-character SHA256 hash.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Hash arbitrary bytes.
///
/// Returns the full 64-character SHA256 hash.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  let mut hasher = Sha256::new();
  hasher.update(data);
  ContentHash(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::BTreeMap;

  #[derive(Serialize)]
  struct Sample {
    kind: &'static str,
    attributes: BTreeMap<&'static str, &'static str>,
  }

  impl Hashable for Sample {}

  #[test]
  fn hash_bytes_known_value() {
    let hash = hash_bytes(b"hello world");
    assert_eq!(
      hash.0,
      "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
    );
  }

  #[test]
  fn object_hash_is_truncated() {
    let sample = Sample {
      kind: "meta",
      attributes: BTreeMap::from([("name", "description")]),
    };
    let hash = sample.compute_hash().unwrap();
    assert_eq!(hash.0.len(), ELEMENT_KEY_HASH_LEN);
  }

  #[test]
  fn object_hash_is_deterministic() {
    let a = Sample {
      kind: "link",
      attributes: BTreeMap::from([("rel", "stylesheet"), ("href", "/a.css")]),
    };
    let b = Sample {
      kind: "link",
      attributes: BTreeMap::from([("rel", "stylesheet"), ("href", "/a.css")]),
    };
    assert_eq!(a.compute_hash().unwrap(), b.compute_hash().unwrap());
  }

  #[test]
  fn object_hash_changes_with_content() {
    let a = Sample {
      kind: "link",
      attributes: BTreeMap::from([("href", "/a.css")]),
    };
    let b = Sample {
      kind: "link",
      attributes: BTreeMap::from([("href", "/b.css")]),
    };
    assert_ne!(a.compute_hash().unwrap(), b.compute_hash().unwrap());
  }
}
