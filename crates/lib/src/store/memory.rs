use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{CacheStore, EntryInfo, StoreError, expiry_from, is_expired, shares_tag};

#[derive(Debug, Clone)]
struct MemoryEntry {
  data: Vec<u8>,
  tags: Vec<String>,
  expires_at: Option<u64>,
}

/// Process-local store guarded by a mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, MemoryEntry>>, StoreError> {
    self.entries.lock().map_err(|_| StoreError::Poisoned)
  }
}

impl CacheStore for MemoryStore {
  fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
    let mut entries = self.lock()?;
    match entries.get(key) {
      Some(entry) if is_expired(entry.expires_at) => {
        entries.remove(key);
        Ok(None)
      }
      Some(entry) => Ok(Some(entry.data.clone())),
      None => Ok(None),
    }
  }

  fn save(&self, key: &str, data: &[u8], tags: &[String], lifetime_secs: Option<u64>) -> Result<(), StoreError> {
    let entry = MemoryEntry {
      data: data.to_vec(),
      tags: tags.to_vec(),
      expires_at: expiry_from(lifetime_secs),
    };
    self.lock()?.insert(key.to_string(), entry);
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<bool, StoreError> {
    Ok(self.lock()?.remove(key).is_some())
  }

  fn clean_tags(&self, tags: &[String]) -> Result<usize, StoreError> {
    let mut entries = self.lock()?;
    let before = entries.len();
    entries.retain(|_, entry| !shares_tag(&entry.tags, tags));
    Ok(before - entries.len())
  }

  fn flush(&self) -> Result<usize, StoreError> {
    let mut entries = self.lock()?;
    let count = entries.len();
    entries.clear();
    Ok(count)
  }

  fn entries(&self) -> Result<Vec<EntryInfo>, StoreError> {
    let entries = self.lock()?;
    let mut list: Vec<EntryInfo> = entries
      .iter()
      .filter(|(_, entry)| !is_expired(entry.expires_at))
      .map(|(key, entry)| EntryInfo {
        key: key.clone(),
        tags: entry.tags.clone(),
        expires_at: entry.expires_at,
        size: entry.data.len(),
      })
      .collect();
    list.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(list)
  }
}
