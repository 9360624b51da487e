//! Shared helpers for library integration tests.

use std::path::Path;
use std::sync::Arc;

use headtag_lib::config::Config;
use headtag_lib::fragment::{CacheLifetime, Fragment};
use headtag_lib::page::FragmentSpec;
use headtag_lib::session::{HeadRuntime, HeadSession};
use headtag_lib::store::{CacheStore, FileStore};

/// Runtime over a file store rooted at `dir`, as a fresh process would build it.
pub fn file_runtime(dir: &Path, config: Config) -> HeadRuntime {
  HeadRuntime::new(config, Arc::new(FileStore::new(dir)))
}

/// A named fragment with the given lifetime and tags.
pub fn fragment(name: &str, lifetime: CacheLifetime, tags: &[&str]) -> FragmentSpec {
  FragmentSpec {
    name: Some(name.to_string()),
    cache_lifetime: lifetime,
    tags: tags.iter().map(|t| t.to_string()).collect(),
    ..FragmentSpec::default()
  }
}

/// Record `fragment`'s content in the host cache, as the host does after a miss.
pub fn store_content(runtime: &HeadRuntime, fragment: &dyn Fragment, tags: &[String]) {
  let key = fragment.cache_key().unwrap();
  runtime.store().save(&key, b"<div></div>", tags, None).unwrap();
}

pub fn add_stylesheet(session: &mut HeadSession<'_>, href: &str) {
  session.manager().add_stylesheet(href, &[], Some(href)).unwrap();
}
