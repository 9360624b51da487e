use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::Serialize;

use headtag_lib::config::Config;
use headtag_lib::session::open_store;

use crate::output::{OutputFormat, format_bytes, format_expiry, print_info, print_json, print_stat, print_success};

#[derive(Serialize)]
struct Removed {
  removed: usize,
}

pub fn cmd_cache_list(config: &Config, output: OutputFormat) -> Result<()> {
  let store = open_store(config).context("Failed to open cache store")?;
  let entries = store.entries().context("Failed to list cache entries")?;

  if output.is_json() {
    print_json(&entries)?;
    return Ok(());
  }

  if entries.is_empty() {
    print_info("Cache is empty");
    return Ok(());
  }

  let now = SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_secs())
    .unwrap_or_default();
  for entry in &entries {
    println!("{}", entry.key);
    print_stat("Size", &format_bytes(entry.size as u64));
    if !entry.tags.is_empty() {
      print_stat("Tags", &entry.tags.join(", "));
    }
    print_stat("Expires", &format_expiry(entry.expires_at, now));
  }
  println!();
  print_stat("Entries", &entries.len().to_string());

  Ok(())
}

pub fn cmd_cache_clean(config: &Config, tags: &[String], output: OutputFormat) -> Result<()> {
  let store = open_store(config).context("Failed to open cache store")?;
  let removed = store.clean_tags(tags).context("Failed to clean cache tags")?;

  if output.is_json() {
    print_json(&Removed { removed })?;
  } else {
    print_success(&format!("Removed {} entries tagged {}", removed, tags.join(", ")));
  }
  Ok(())
}

pub fn cmd_cache_flush(config: &Config, output: OutputFormat) -> Result<()> {
  let store = open_store(config).context("Failed to open cache store")?;
  let removed = store.flush().context("Failed to flush cache")?;

  if output.is_json() {
    print_json(&Removed { removed })?;
  } else {
    print_success(&format!("Flushed {} entries", removed));
  }
  Ok(())
}
