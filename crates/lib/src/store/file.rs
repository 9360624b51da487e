//! Filesystem-backed cache store.
//!
//! # Storage Layout
//!
//! ```text
//! {base_path}/
//! ├── 3f/
//! │   └── 3fa1...e9.json   # envelope for the key hashing to 3fa1...e9
//! └── b9/
//!     └── b94d...c2.json
//! ```
//!
//! File names are the SHA-256 of the key, so arbitrary keys are safe on every
//! filesystem. The envelope records the original key, tags, expiry, and the
//! base64 payload.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{CacheStore, EntryInfo, StoreError, expiry_from, is_expired, shares_tag};
use crate::consts::STORE_ENTRY_VERSION;
use crate::util::hash::hash_bytes;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
  version: u32,
  key: String,
  #[serde(default)]
  tags: Vec<String>,
  expires_at: Option<u64>,
  data: String,
}

/// Store writing one JSON envelope per key.
///
/// Writes go to a temporary file in the target directory and are renamed into
/// place, so readers never observe a partial entry.
#[derive(Debug, Clone)]
pub struct FileStore {
  base_path: PathBuf,
}

impl FileStore {
  pub fn new(base_path: impl Into<PathBuf>) -> Self {
    Self {
      base_path: base_path.into(),
    }
  }

  pub fn base_path(&self) -> &Path {
    &self.base_path
  }

  fn entry_path(&self, key: &str) -> PathBuf {
    let hash = hash_bytes(key.as_bytes()).0;
    self.base_path.join(&hash[..2]).join(format!("{hash}.json"))
  }

  fn read_envelope(path: &Path) -> Result<Option<Envelope>, StoreError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(StoreError::Read(e)),
    };

    let envelope: Envelope = serde_json::from_str(&content).map_err(StoreError::Parse)?;
    if envelope.version != STORE_ENTRY_VERSION {
      return Err(StoreError::UnsupportedVersion(envelope.version));
    }
    Ok(Some(envelope))
  }

  fn remove_path(path: &Path) -> Result<bool, StoreError> {
    match fs::remove_file(path) {
      Ok(()) => Ok(true),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
      Err(e) => Err(StoreError::Remove(e)),
    }
  }

  /// All entry files currently on disk.
  fn entry_files(&self) -> Result<Vec<PathBuf>, StoreError> {
    if !self.base_path.exists() {
      return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&self.base_path).min_depth(2).max_depth(2).sort_by_file_name() {
      let entry = entry.map_err(|e| StoreError::Scan(e.to_string()))?;
      let path = entry.path();
      if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
        files.push(path.to_path_buf());
      }
    }
    Ok(files)
  }

  /// Visit every readable envelope; unreadable files are logged and skipped.
  fn scan(&self) -> Result<Vec<(PathBuf, Envelope)>, StoreError> {
    let mut out = Vec::new();
    for path in self.entry_files()? {
      match Self::read_envelope(&path) {
        Ok(Some(envelope)) => out.push((path, envelope)),
        Ok(None) => {}
        Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable cache entry"),
      }
    }
    Ok(out)
  }
}

impl CacheStore for FileStore {
  fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
    let path = self.entry_path(key);
    let Some(envelope) = Self::read_envelope(&path)? else {
      return Ok(None);
    };

    if envelope.key != key {
      warn!(key = %key, stored = %envelope.key, "cache entry key mismatch, treating as absent");
      return Ok(None);
    }

    if is_expired(envelope.expires_at) {
      debug!(key = %key, "cache entry expired");
      Self::remove_path(&path)?;
      return Ok(None);
    }

    STANDARD.decode(envelope.data).map(Some).map_err(StoreError::Decode)
  }

  fn save(&self, key: &str, data: &[u8], tags: &[String], lifetime_secs: Option<u64>) -> Result<(), StoreError> {
    let path = self.entry_path(key);
    let dir = path.parent().unwrap_or(self.base_path.as_path());
    fs::create_dir_all(dir).map_err(StoreError::CreateDir)?;

    let envelope = Envelope {
      version: STORE_ENTRY_VERSION,
      key: key.to_string(),
      tags: tags.to_vec(),
      expires_at: expiry_from(lifetime_secs),
      data: STANDARD.encode(data),
    };
    let content = serde_json::to_vec(&envelope).map_err(StoreError::Serialize)?;

    let mut temp = NamedTempFile::new_in(dir).map_err(StoreError::Write)?;
    temp.write_all(&content).map_err(StoreError::Write)?;
    temp.persist(&path).map_err(|e| StoreError::Write(e.error))?;

    debug!(key = %key, path = %path.display(), size = data.len(), "cache entry written");
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<bool, StoreError> {
    Self::remove_path(&self.entry_path(key))
  }

  fn clean_tags(&self, tags: &[String]) -> Result<usize, StoreError> {
    let mut removed = 0;
    for (path, envelope) in self.scan()? {
      if shares_tag(&envelope.tags, tags) && Self::remove_path(&path)? {
        removed += 1;
      }
    }
    Ok(removed)
  }

  fn flush(&self) -> Result<usize, StoreError> {
    let mut removed = 0;
    for path in self.entry_files()? {
      if Self::remove_path(&path)? {
        removed += 1;
      }
    }
    Ok(removed)
  }

  fn entries(&self) -> Result<Vec<EntryInfo>, StoreError> {
    let mut list: Vec<EntryInfo> = self
      .scan()?
      .into_iter()
      .filter(|(_, envelope)| !is_expired(envelope.expires_at))
      .map(|(_, envelope)| EntryInfo {
        size: STANDARD.decode(&envelope.data).map(|d| d.len()).unwrap_or(0),
        key: envelope.key,
        tags: envelope.tags,
        expires_at: envelope.expires_at,
      })
      .collect();
    list.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(list)
  }
}
