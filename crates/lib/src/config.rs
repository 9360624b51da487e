//! Runtime configuration.
//!
//! Loaded from a TOML file; every field has a default so an empty file (or no
//! file) is valid. Environment overrides are applied on top:
//!
//! | variable            | overrides            |
//! |---------------------|----------------------|
//! | `HEADTAG_ENABLED`   | `enabled`            |
//! | `HEADTAG_STORE_DIR` | `store.path`, and selects the file backend |
//!
//! # Example
//!
//! ```toml
//! enabled = true
//! disabled_modules = ["Vendor_Checkout"]
//!
//! [fragment_cache]
//! lifetime_secs = 86400
//!
//! [store]
//! backend = "file"
//! path = "/var/cache/headtag"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{
  DEFAULT_CACHE_LIFETIME_SECS, DEFAULT_PLACEHOLDER, FRAGMENT_CACHE_TAG, FRAGMENT_KEY_PREFIX, PAGE_KEY_PREFIX,
};

pub const ENV_ENABLED: &str = "HEADTAG_ENABLED";
pub const ENV_STORE_DIR: &str = "HEADTAG_STORE_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("invalid value for {var}: {value}")]
  InvalidEnv { var: &'static str, value: String },

  #[error("file store selected without a path")]
  MissingStorePath,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Administrative output switch. When off no fragment is tracked.
  pub enabled: bool,
  /// Host modules whose fragments are never tracked.
  pub disabled_modules: Vec<String>,
  /// Token replaced with the rendered head elements.
  pub placeholder: String,
  /// Response types never injected into.
  pub skip_response_types: Vec<String>,
  pub fragment_cache: FragmentCacheConfig,
  pub page_cache: PageCacheConfig,
  pub store: StoreConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      enabled: true,
      disabled_modules: Vec::new(),
      placeholder: DEFAULT_PLACEHOLDER.to_string(),
      skip_response_types: Vec::new(),
      fragment_cache: FragmentCacheConfig::default(),
      page_cache: PageCacheConfig::default(),
      store: StoreConfig::default(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FragmentCacheConfig {
  pub key_prefix: String,
  /// Lifetime of fragment entries; `None` keeps them until tag invalidation.
  pub lifetime_secs: Option<u64>,
  /// Tags applied to every fragment entry.
  pub tags: Vec<String>,
}

impl Default for FragmentCacheConfig {
  fn default() -> Self {
    Self {
      key_prefix: FRAGMENT_KEY_PREFIX.to_string(),
      lifetime_secs: Some(DEFAULT_CACHE_LIFETIME_SECS),
      tags: vec![FRAGMENT_CACHE_TAG.to_string()],
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageCacheConfig {
  pub enabled: bool,
  pub key_prefix: String,
  pub lifetime_secs: Option<u64>,
}

impl Default for PageCacheConfig {
  fn default() -> Self {
    Self {
      enabled: false,
      key_prefix: PAGE_KEY_PREFIX.to_string(),
      lifetime_secs: Some(DEFAULT_CACHE_LIFETIME_SECS),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
  #[default]
  Memory,
  File,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
  pub backend: StoreBackend,
  pub path: Option<PathBuf>,
}

impl Config {
  /// Parse a config file without applying environment overrides.
  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Load `path` (or the defaults when `None`) and apply environment overrides.
  pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
    let mut config = match path {
      Some(path) => {
        debug!(path = %path.display(), "loading config");
        Self::from_file(path)?
      }
      None => Self::default(),
    };
    config.apply_env()?;
    config.validate()?;
    Ok(config)
  }

  pub fn apply_env(&mut self) -> Result<(), ConfigError> {
    if let Ok(value) = std::env::var(ENV_ENABLED) {
      self.enabled = parse_bool(&value).ok_or(ConfigError::InvalidEnv {
        var: ENV_ENABLED,
        value,
      })?;
    }

    if let Ok(dir) = std::env::var(ENV_STORE_DIR)
      && !dir.is_empty()
    {
      self.store.backend = StoreBackend::File;
      self.store.path = Some(PathBuf::from(dir));
    }
    Ok(())
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.store.backend == StoreBackend::File && self.store.path.is_none() {
      return Err(ConfigError::MissingStorePath);
    }
    Ok(())
  }

  /// Whether fragments of `module` may be tracked.
  pub fn is_module_enabled(&self, module: Option<&str>) -> bool {
    match module {
      Some(module) => !self.disabled_modules.iter().any(|m| m == module),
      None => true,
    }
  }
}

fn parse_bool(value: &str) -> Option<bool> {
  match value.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Some(true),
    "0" | "false" | "no" | "off" => Some(false),
    _ => None,
  }
}
