//! Placeholder substitution into the outgoing response.
//!
//! The host template embeds a single token where the collected head elements
//! belong. Right before the response leaves the process the token is replaced
//! with the manager's rendered output.
//!
//! Injection is skipped, never failed, when:
//! - the response type is on the exclusion list
//! - the body is empty or not an HTML document
//! - the token is absent
//! - there is nothing to inject
//!
//! # Example
//!
//! ```
//! use headtag_lib::placeholder::{HeadInjector, InjectOutcome, Response};
//!
//! struct Page(String);
//!
//! impl Response for Page {
//!   fn type_name(&self) -> &str { "page" }
//!   fn content(&self) -> &str { &self.0 }
//!   fn set_content(&mut self, content: String) { self.0 = content; }
//! }
//!
//! let injector = HeadInjector::new("<!-- HEAD -->", Vec::new());
//! let mut page = Page("<!DOCTYPE html><head><!-- HEAD --></head>".to_string());
//! let outcome = injector.inject_rendered(&mut page, || "<meta charset=\"UTF-8\">\n".to_string());
//! assert_eq!(outcome, InjectOutcome::Injected);
//! assert_eq!(page.0, "<!DOCTYPE html><head><meta charset=\"UTF-8\">\n</head>");
//! ```

use serde::Serialize;
use tracing::{debug, trace};

use crate::consts::DEFAULT_PLACEHOLDER;
use crate::manager::HeadTagManager;

/// Outgoing response body, as exposed by the host.
pub trait Response {
  /// Host-specific response type, matched against the exclusion list.
  fn type_name(&self) -> &str;

  fn content(&self) -> &str;

  fn set_content(&mut self, content: String);
}

/// What an injection attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectOutcome {
  Injected,
  ExcludedType,
  EmptyBody,
  NotHtml,
  NoPlaceholder,
  NothingToInject,
}

#[derive(Debug, Clone)]
pub struct HeadInjector {
  placeholder: String,
  skip_response_types: Vec<String>,
}

impl Default for HeadInjector {
  fn default() -> Self {
    Self::new(DEFAULT_PLACEHOLDER, Vec::new())
  }
}

impl HeadInjector {
  pub fn new(placeholder: impl Into<String>, skip_response_types: Vec<String>) -> Self {
    Self {
      placeholder: placeholder.into(),
      skip_response_types,
    }
  }

  pub fn placeholder(&self) -> &str {
    &self.placeholder
  }

  /// Replace the token in `response` with the manager's rendered elements.
  pub fn inject(&self, response: &mut dyn Response, manager: &mut HeadTagManager) -> InjectOutcome {
    self.inject_rendered(response, || manager.render())
  }

  /// Replace the token with the output of `render`, which is only called once
  /// every precondition holds.
  pub fn inject_rendered(&self, response: &mut dyn Response, render: impl FnOnce() -> String) -> InjectOutcome {
    let outcome = self.check(response);
    if outcome != InjectOutcome::Injected {
      trace!(response_type = %response.type_name(), outcome = ?outcome, "head injection skipped");
      return outcome;
    }

    let head = render();
    if head.is_empty() {
      trace!("no head elements to inject");
      return InjectOutcome::NothingToInject;
    }

    let content = response.content().replacen(&self.placeholder, &head, 1);
    response.set_content(content);
    debug!(bytes = head.len(), "head elements injected");
    InjectOutcome::Injected
  }

  fn check(&self, response: &dyn Response) -> InjectOutcome {
    if self.skip_response_types.iter().any(|t| t == response.type_name()) {
      return InjectOutcome::ExcludedType;
    }

    let content = response.content();
    if content.is_empty() {
      return InjectOutcome::EmptyBody;
    }
    if !is_html_document(content) {
      return InjectOutcome::NotHtml;
    }
    if !content.contains(&self.placeholder) {
      return InjectOutcome::NoPlaceholder;
    }
    InjectOutcome::Injected
  }
}

/// Whether `content` declares an HTML document, by doctype or `<html` tag.
pub fn is_html_document(content: &str) -> bool {
  let lower = content.to_ascii_lowercase();
  lower.contains("<!doctype html") || lower.contains("<html")
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::Cell;

  struct TestResponse {
    kind: &'static str,
    body: String,
  }

  impl TestResponse {
    fn html(body: &str) -> Self {
      Self {
        kind: "page",
        body: body.to_string(),
      }
    }
  }

  impl Response for TestResponse {
    fn type_name(&self) -> &str {
      self.kind
    }

    fn content(&self) -> &str {
      &self.body
    }

    fn set_content(&mut self, content: String) {
      self.body = content;
    }
  }

  const TOKEN: &str = "<!-- {{HEADTAG:PLACEHOLDER:HEAD_ADDITIONAL}} -->";

  fn head() -> String {
    "<meta charset=\"UTF-8\">\n".to_string()
  }

  #[test]
  fn replaces_first_token_only() {
    let injector = HeadInjector::default();
    let mut response = TestResponse::html(&format!("<!DOCTYPE html><head>{TOKEN}</head><body>{TOKEN}</body>"));

    assert_eq!(injector.inject_rendered(&mut response, head), InjectOutcome::Injected);
    assert_eq!(
      response.body,
      format!("<!DOCTYPE html><head><meta charset=\"UTF-8\">\n</head><body>{TOKEN}</body>")
    );
  }

  #[test]
  fn skips_non_html() {
    let injector = HeadInjector::default();
    let mut response = TestResponse::html(&format!("{{\"head\":\"{TOKEN}\"}}"));
    assert_eq!(injector.inject_rendered(&mut response, head), InjectOutcome::NotHtml);
  }

  #[test]
  fn html_tag_without_doctype_counts() {
    let injector = HeadInjector::default();
    let mut response = TestResponse::html(&format!("<HTML><head>{TOKEN}</head></HTML>"));
    assert_eq!(injector.inject_rendered(&mut response, head), InjectOutcome::Injected);
  }

  #[test]
  fn skips_missing_token_without_rendering() {
    let injector = HeadInjector::default();
    let rendered = Cell::new(false);
    let mut response = TestResponse::html("<!DOCTYPE html><head></head>");

    let outcome = injector.inject_rendered(&mut response, || {
      rendered.set(true);
      head()
    });
    assert_eq!(outcome, InjectOutcome::NoPlaceholder);
    assert!(!rendered.get());
  }

  #[test]
  fn skips_excluded_type_and_empty_body() {
    let injector = HeadInjector::new(TOKEN, vec!["json".to_string()]);
    let mut json = TestResponse {
      kind: "json",
      body: format!("<html>{TOKEN}</html>"),
    };
    assert_eq!(injector.inject_rendered(&mut json, head), InjectOutcome::ExcludedType);

    let mut empty = TestResponse::html("");
    assert_eq!(injector.inject_rendered(&mut empty, head), InjectOutcome::EmptyBody);
  }

  #[test]
  fn empty_render_leaves_token() {
    let injector = HeadInjector::default();
    let body = format!("<!DOCTYPE html><head>{TOKEN}</head>");
    let mut response = TestResponse::html(&body);
    assert_eq!(
      injector.inject_rendered(&mut response, String::new),
      InjectOutcome::NothingToInject
    );
    assert_eq!(response.body, body);
  }
}
