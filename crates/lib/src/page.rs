//! Reference host: assembles a page from a tree of declared fragments.
//!
//! Each fragment declares its head elements, a body, cache metadata, and
//! nested children. The renderer walks the tree through the session hooks,
//! serving a fragment's content from the store on a content-cache hit (its
//! children and element declarations are skipped, as a real host would skip
//! executing it) and storing the content on a miss.
//!
//! # Page File
//!
//! ```toml
//! id = "home"
//! title = "Home"
//! charset = "UTF-8"
//!
//! [[fragments]]
//! name = "header"
//! cache_lifetime = 3600
//! tags = ["cms_block_header"]
//! body = "<header>Shop</header>"
//!
//! [[fragments.elements]]
//! type = "link"
//! attributes = { rel = "stylesheet", href = "/css/header.css" }
//!
//! [[fragments.children]]
//! name = "nav"
//! cache_lifetime = true
//! body = "<nav></nav>"
//! ```
//!
//! `cache_lifetime` is a number of seconds, `true` for the store default, or
//! `false` to disable caching. Leaving it out also disables caching.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::element::{Attributes, ElementData, ElementError, escape_html};
use crate::fragment::{CacheLifetime, Fragment, FragmentError};
use crate::placeholder::{InjectOutcome, Response};
use crate::session::{HeadRuntime, HeadSession};

#[derive(Debug, Error)]
pub enum PageError {
  #[error("failed to read page {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse page {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("fragment '{fragment}': {source}")]
  Element {
    fragment: String,
    #[source]
    source: ElementError,
  },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageSpec {
  /// Page identifier, keys the whole-page cache.
  pub id: Option<String>,
  #[serde(default)]
  pub title: String,
  pub charset: Option<String>,
  #[serde(default)]
  pub fragments: Vec<FragmentSpec>,
}

impl PageSpec {
  pub fn from_file(path: &Path) -> Result<Self, PageError> {
    let content = fs::read_to_string(path).map_err(|source| PageError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::parse(&content).map_err(|source| PageError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(content)
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FragmentSpec {
  pub name: Option<String>,
  pub module: Option<String>,
  /// Content cache key; derived from the name when absent.
  pub cache_key: Option<String>,
  #[serde(default, deserialize_with = "deserialize_lifetime")]
  pub cache_lifetime: CacheLifetime,
  #[serde(default)]
  pub tags: Vec<String>,
  #[serde(default)]
  pub elements: Vec<ElementSpec>,
  #[serde(default)]
  pub body: String,
  #[serde(default)]
  pub children: Vec<FragmentSpec>,
}

/// A head element declared by a fragment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ElementSpec {
  /// Short element type (`meta`, `link`, `script`, `style`).
  #[serde(rename = "type")]
  pub element_type: String,
  pub key: Option<String>,
  #[serde(default)]
  pub attributes: Attributes,
  pub content: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LifetimeValue {
  Flag(bool),
  Seconds(u64),
}

fn deserialize_lifetime<'de, D: Deserializer<'de>>(deserializer: D) -> Result<CacheLifetime, D::Error> {
  Ok(match LifetimeValue::deserialize(deserializer)? {
    LifetimeValue::Flag(true) => CacheLifetime::Inherit,
    LifetimeValue::Flag(false) => CacheLifetime::Disabled,
    LifetimeValue::Seconds(0) => CacheLifetime::Disabled,
    LifetimeValue::Seconds(secs) => CacheLifetime::Seconds(secs),
  })
}

impl Fragment for FragmentSpec {
  fn name_in_layout(&self) -> Option<&str> {
    self.name.as_deref()
  }

  fn module_name(&self) -> Option<&str> {
    self.module.as_deref()
  }

  fn cache_key(&self) -> Result<String, FragmentError> {
    match (&self.cache_key, &self.name) {
      (Some(key), _) if !key.is_empty() => Ok(key.clone()),
      (_, Some(name)) if !name.is_empty() => Ok(format!("fragment_{name}")),
      _ => Err(FragmentError::MissingCacheKey),
    }
  }

  fn cache_lifetime(&self) -> Result<CacheLifetime, FragmentError> {
    Ok(self.cache_lifetime)
  }

  fn cache_tags(&self) -> Result<Vec<String>, FragmentError> {
    Ok(self.tags.clone())
  }
}

/// The emitted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPage {
  pub html: String,
  pub injection: InjectOutcome,
  /// Number of head elements collected for the page.
  pub head_elements: usize,
}

struct HtmlDocument(String);

impl Response for HtmlDocument {
  fn type_name(&self) -> &str {
    "html"
  }

  fn content(&self) -> &str {
    &self.0
  }

  fn set_content(&mut self, content: String) {
    self.0 = content;
  }
}

/// Renders [`PageSpec`] trees through a [`HeadRuntime`].
#[derive(Debug, Clone, Copy)]
pub struct PageRenderer<'rt> {
  runtime: &'rt HeadRuntime,
}

impl<'rt> PageRenderer<'rt> {
  pub fn new(runtime: &'rt HeadRuntime) -> Self {
    Self { runtime }
  }

  /// Render `page`. `page_id` overrides the page's own identifier.
  pub fn render(&self, page: &PageSpec, page_id: Option<&str>) -> Result<RenderedPage, PageError> {
    let page_id = page_id.or(page.id.as_deref());
    let mut session = self.runtime.session(page_id);

    if let Some(charset) = &page.charset {
      session
        .manager()
        .add_charset(charset)
        .map_err(|source| PageError::Element {
          fragment: "-".to_string(),
          source,
        })?;
    }

    let mut body = String::new();
    for fragment in &page.fragments {
      body.push_str(&self.render_fragment(&mut session, fragment)?);
    }

    let mut document = HtmlDocument(format!(
      "<!DOCTYPE html>\n<html>\n<head>\n<title>{}</title>\n{}\n</head>\n<body>\n{}</body>\n</html>\n",
      escape_html(&page.title),
      self.runtime.config().placeholder,
      body
    ));
    let injection = session.inject(&mut document);
    let head_elements = session.manager().len();
    session.finish();

    info!(page = ?page_id, head_elements, injection = ?injection, "page rendered");
    Ok(RenderedPage {
      html: document.0,
      injection,
      head_elements,
    })
  }

  fn render_fragment(&self, session: &mut HeadSession<'rt>, fragment: &FragmentSpec) -> Result<String, PageError> {
    session.render_fragment(fragment, |session: &mut HeadSession<'rt>| -> Result<String, PageError> {
      if let Some(content) = self.cached_content(fragment) {
        return Ok(content);
      }

      for element in &fragment.elements {
        let data = ElementData {
          attributes: element.attributes.clone(),
          content: element.content.clone(),
        };
        session
          .manager()
          .create_element(&element.element_type, data, element.key.as_deref())
          .map_err(|source| PageError::Element {
            fragment: fragment.name.clone().unwrap_or_else(|| "-".to_string()),
            source,
          })?;
      }

      let mut content = fragment.body.clone();
      for child in &fragment.children {
        content.push_str(&self.render_fragment(session, child)?);
      }
      content.push('\n');

      self.store_content(fragment, &content);
      Ok(content)
    })
  }

  fn cached_content(&self, fragment: &FragmentSpec) -> Option<String> {
    if !self.runtime.detector().is_cached(fragment) {
      return None;
    }
    let key = fragment.cache_key().ok()?;
    match self.runtime.store().load(&key) {
      Ok(Some(bytes)) => {
        debug!(fragment = ?fragment.name, cache_key = %key, "fragment content served from cache");
        Some(String::from_utf8_lossy(&bytes).into_owned())
      }
      Ok(None) => None,
      Err(e) => {
        warn!(fragment = ?fragment.name, cache_key = %key, error = %e, "failed to load fragment content");
        None
      }
    }
  }

  fn store_content(&self, fragment: &FragmentSpec, content: &str) {
    if !self.runtime.detector().is_cacheable(fragment) {
      return;
    }
    let Ok(key) = fragment.cache_key() else {
      return;
    };

    let result = self.runtime.store().save(
      &key,
      content.as_bytes(),
      &fragment.tags,
      fragment.cache_lifetime.seconds(),
    );
    if let Err(e) = result {
      warn!(fragment = ?fragment.name, cache_key = %key, error = %e, "failed to store fragment content");
    }
  }
}
