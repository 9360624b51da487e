//! Generic key-value cache store backing fragment and page head element entries.
//!
//! Entries are opaque byte blobs under string keys, labelled with tags for
//! group invalidation and an optional lifetime. Two backends are provided:
//! - [`MemoryStore`]: process-local, used for tests and single-process hosts
//! - [`FileStore`]: one JSON envelope per key on disk, shared across processes

mod file;
mod memory;

use std::fmt;
use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors from a cache store backend.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("failed to read cache entry: {0}")]
  Read(#[source] io::Error),

  #[error("failed to write cache entry: {0}")]
  Write(#[source] io::Error),

  #[error("failed to create cache directory: {0}")]
  CreateDir(#[source] io::Error),

  #[error("failed to remove cache entry: {0}")]
  Remove(#[source] io::Error),

  #[error("failed to parse cache entry: {0}")]
  Parse(#[source] serde_json::Error),

  #[error("failed to serialize cache entry: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("failed to decode cache payload: {0}")]
  Decode(#[source] base64::DecodeError),

  #[error("failed to scan cache directory: {0}")]
  Scan(String),

  #[error("unsupported cache entry version: {0}")]
  UnsupportedVersion(u32),

  #[error("cache store lock poisoned")]
  Poisoned,
}

/// Summary of one stored entry, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
  pub key: String,
  pub tags: Vec<String>,
  /// Unix timestamp after which the entry is treated as absent.
  pub expires_at: Option<u64>,
  pub size: usize,
}

/// Key-value store with tag-based invalidation.
///
/// Implementations must be safe to share between concurrent requests. Writes to
/// the same key race to last-write-wins.
pub trait CacheStore: fmt::Debug + Send + Sync {
  /// Load the payload stored under `key`. Expired entries are reported as absent.
  fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

  /// Store `data` under `key`, replacing any previous entry.
  ///
  /// `lifetime_secs` of `None` keeps the entry until it is removed or its tags are cleaned.
  fn save(&self, key: &str, data: &[u8], tags: &[String], lifetime_secs: Option<u64>) -> Result<(), StoreError>;

  /// Remove `key`. Returns whether an entry existed.
  fn remove(&self, key: &str) -> Result<bool, StoreError>;

  /// Remove every entry carrying at least one of `tags`. Returns the number removed.
  fn clean_tags(&self, tags: &[String]) -> Result<usize, StoreError>;

  /// Remove every entry. Returns the number removed.
  fn flush(&self) -> Result<usize, StoreError>;

  /// List live entries sorted by key.
  fn entries(&self) -> Result<Vec<EntryInfo>, StoreError>;
}

pub(crate) fn now_unix() -> u64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_secs()
}

pub(crate) fn expiry_from(lifetime_secs: Option<u64>) -> Option<u64> {
  lifetime_secs.map(|secs| now_unix().saturating_add(secs))
}

pub(crate) fn is_expired(expires_at: Option<u64>) -> bool {
  expires_at.is_some_and(|at| at <= now_unix())
}

pub(crate) fn shares_tag(entry_tags: &[String], tags: &[String]) -> bool {
  entry_tags.iter().any(|t| tags.contains(t))
}
