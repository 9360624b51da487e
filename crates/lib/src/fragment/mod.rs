//! Host fragments and the per-fragment instrumentation built on them.
//!
//! A fragment is a cacheable unit of page output supplied by the host
//! rendering pipeline. This crate only needs its stable layout name and its
//! cache metadata, exposed through the [`Fragment`] trait.

mod detector;
mod tracker;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use detector::CacheDetector;
pub use tracker::{ElementTracker, TrackingFrame};

/// Failure of a host fragment accessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FragmentError {
  #[error("fragment has no cache key")]
  MissingCacheKey,

  #[error("fragment accessor '{accessor}' failed: {message}")]
  Accessor { accessor: &'static str, message: String },
}

/// Cache lifetime declared by a fragment.
///
/// `Unset` and `Disabled` are both not cacheable, as is `Seconds(0)`.
/// `Inherit` is cacheable with the store's default lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheLifetime {
  #[default]
  Unset,
  Disabled,
  Inherit,
  Seconds(u64),
}

impl CacheLifetime {
  pub fn is_cacheable(self) -> bool {
    match self {
      CacheLifetime::Unset | CacheLifetime::Disabled => false,
      CacheLifetime::Inherit => true,
      CacheLifetime::Seconds(secs) => secs > 0,
    }
  }

  /// Explicit lifetime in seconds, if one was declared.
  pub fn seconds(self) -> Option<u64> {
    match self {
      CacheLifetime::Seconds(secs) if secs > 0 => Some(secs),
      _ => None,
    }
  }
}

impl fmt::Display for CacheLifetime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CacheLifetime::Unset => f.write_str("unset"),
      CacheLifetime::Disabled => f.write_str("disabled"),
      CacheLifetime::Inherit => f.write_str("inherit"),
      CacheLifetime::Seconds(secs) => write!(f, "{secs}s"),
    }
  }
}

/// A renderable unit supplied by the host.
///
/// Cache accessors are fallible and evaluated lazily: some hosts only settle a
/// fragment's cache lifetime while it renders, so callers ask at the moment
/// they need the answer.
pub trait Fragment {
  /// Stable layout name. Fragments without one are never tracked.
  fn name_in_layout(&self) -> Option<&str>;

  /// Name of the host module that owns the fragment, for output switches.
  fn module_name(&self) -> Option<&str> {
    None
  }

  /// Key of the fragment's own content-cache entry.
  fn cache_key(&self) -> Result<String, FragmentError>;

  fn cache_lifetime(&self) -> Result<CacheLifetime, FragmentError>;

  /// Invalidation tags of the fragment's content-cache entry.
  fn cache_tags(&self) -> Result<Vec<String>, FragmentError>;
}

/// Layout name for logging, `-` when absent.
pub(crate) fn display_name(fragment: &dyn Fragment) -> &str {
  fragment.name_in_layout().unwrap_or("-")
}
