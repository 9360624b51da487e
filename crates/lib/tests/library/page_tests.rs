use headtag_lib::config::Config;
use headtag_lib::page::{PageRenderer, PageSpec};
use headtag_lib::placeholder::InjectOutcome;
use headtag_lib::store::CacheStore;
use tempfile::TempDir;

use super::common::file_runtime;

const SHOP: &str = r#"
id = "category-shoes"
title = "Shoes"
charset = "UTF-8"

[[fragments]]
name = "head.additional"
body = "<div class=\"top\"></div>"

[[fragments.elements]]
type = "meta"
attributes = { name = "description", content = "All the shoes" }

[[fragments]]
name = "catalog.list"
cache_lifetime = 3600
tags = ["cat_5"]
body = "<ul></ul>"

[[fragments.elements]]
type = "script"
key = "list_js"
attributes = { src = "/js/list.js" }

[[fragments.children]]
name = "catalog.toolbar"
cache_lifetime = true
tags = ["cat_5"]
body = "<nav></nav>"

[[fragments.children.elements]]
type = "style"
key = "toolbar_css"
content = ".toolbar{display:flex}"
"#;

#[test]
fn cold_and_warm_renders_match() {
  let temp = TempDir::new().unwrap();
  let page = PageSpec::parse(SHOP).unwrap();

  let cold = {
    let runtime = file_runtime(temp.path(), Config::default());
    PageRenderer::new(&runtime).render(&page, None).unwrap()
  };
  let warm = {
    let runtime = file_runtime(temp.path(), Config::default());
    PageRenderer::new(&runtime).render(&page, None).unwrap()
  };

  assert_eq!(cold.injection, InjectOutcome::Injected);
  assert_eq!(cold.head_elements, 4);
  assert_eq!(cold.html, warm.html);
  assert!(warm.html.contains("<style>.toolbar{display:flex}</style>"));
}

#[test]
fn invalidated_category_is_rebuilt() {
  let temp = TempDir::new().unwrap();
  let page = PageSpec::parse(SHOP).unwrap();
  let runtime = file_runtime(temp.path(), Config::default());
  let renderer = PageRenderer::new(&runtime);

  let first = renderer.render(&page, None).unwrap();
  assert!(runtime.store().clean_tags(&["cat_5".to_string()]).unwrap() > 0);
  let second = renderer.render(&page, None).unwrap();
  assert_eq!(first.html, second.html);
}

#[test]
fn disabled_output_renders_without_tracking() {
  let temp = TempDir::new().unwrap();
  let page = PageSpec::parse(SHOP).unwrap();
  let config = Config {
    enabled: false,
    ..Config::default()
  };
  let runtime = file_runtime(temp.path(), config);

  let rendered = PageRenderer::new(&runtime).render(&page, None).unwrap();
  assert_eq!(rendered.injection, InjectOutcome::Injected);
  let keys: Vec<String> = runtime.store().entries().unwrap().into_iter().map(|e| e.key).collect();
  assert!(keys.iter().all(|k| !k.starts_with("headtag_fragment_")));
}

#[test]
fn page_cache_keeps_whole_collection() {
  let temp = TempDir::new().unwrap();
  let page = PageSpec::parse(SHOP).unwrap();
  let mut config = Config::default();
  config.page_cache.enabled = true;
  let runtime = file_runtime(temp.path(), config);

  PageRenderer::new(&runtime).render(&page, None).unwrap();
  let keys: Vec<String> = runtime.store().entries().unwrap().into_iter().map(|e| e.key).collect();
  assert!(keys.contains(&"headtag_page_category-shoes".to_string()));
}

const LAYOUT: &str = r#"
id = "home"
title = "Home"

[[fragments]]
name = "layout"
cache_lifetime = 3600
tags = ["layout_tag"]
body = "<main>"

[[fragments.elements]]
type = "link"
attributes = { rel = "stylesheet", href = "/a.css" }

[[fragments.children]]
name = "menu"
cache_lifetime = 3600
tags = ["menu_tag"]
body = "<nav></nav>"

[[fragments.children.elements]]
type = "link"
attributes = { rel = "stylesheet", href = "/b.css" }

[[fragments.children]]
name = "cart"
cache_lifetime = false
body = "<aside></aside>"

[[fragments.children.elements]]
type = "link"
attributes = { rel = "stylesheet", href = "/c.css" }
"#;

fn stylesheet_positions(html: &str) -> Vec<usize> {
  ["/a.css", "/b.css", "/c.css"]
    .iter()
    .map(|href| html.find(href).unwrap_or(usize::MAX))
    .collect()
}

#[test]
fn nested_stylesheets_keep_cascade_order_on_outer_hit() {
  let temp = TempDir::new().unwrap();
  let page = PageSpec::parse(LAYOUT).unwrap();
  let runtime = file_runtime(temp.path(), Config::default());
  let renderer = PageRenderer::new(&runtime);

  let cold = renderer.render(&page, None).unwrap();
  let warm = renderer.render(&page, None).unwrap();

  let positions = stylesheet_positions(&cold.html);
  assert!(positions[0] < positions[1] && positions[1] < positions[2], "{}", cold.html);
  assert_eq!(cold.html, warm.html);
}

#[test]
fn outer_hit_keeps_stylesheet_of_invalidated_nested_fragment() {
  let temp = TempDir::new().unwrap();
  let page = PageSpec::parse(LAYOUT).unwrap();
  let runtime = file_runtime(temp.path(), Config::default());
  let renderer = PageRenderer::new(&runtime);

  let cold = renderer.render(&page, None).unwrap();
  let removed = runtime.store().clean_tags(&["menu_tag".to_string()]).unwrap();
  assert_eq!(removed, 2);

  let warm = renderer.render(&page, None).unwrap();
  assert!(warm.html.contains("<nav></nav>"));
  assert!(warm.html.contains("/b.css"));
  assert_eq!(cold.html, warm.html);
}

#[test]
fn page_file_attributes_keep_declared_order() {
  let temp = TempDir::new().unwrap();
  let page = PageSpec::parse(LAYOUT).unwrap();
  let runtime = file_runtime(temp.path(), Config::default());

  let rendered = PageRenderer::new(&runtime).render(&page, None).unwrap();
  assert!(
    rendered.html.contains("<link rel=\"stylesheet\" href=\"/a.css\">\n"),
    "{}",
    rendered.html
  );
}
