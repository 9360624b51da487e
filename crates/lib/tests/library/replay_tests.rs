use headtag_lib::config::Config;
use headtag_lib::fragment::CacheLifetime;
use headtag_lib::session::HeadRuntime;
use headtag_lib::store::CacheStore;
use tempfile::TempDir;

use super::common::{add_stylesheet, file_runtime, fragment, store_content};

#[test]
fn elements_replay_in_a_new_process() {
  let temp = TempDir::new().unwrap();
  let header = fragment("header", CacheLifetime::Seconds(3600), &["cms_block_header"]);

  {
    let runtime = file_runtime(temp.path(), Config::default());
    let mut session = runtime.session(None);
    session.on_before_fragment_render(&header);
    add_stylesheet(&mut session, "/css/header.css");
    session.manager().add_meta_name("theme-color", "#000").unwrap();
    session.on_after_fragment_render(&header);
    store_content(&runtime, &header, &header.tags);
  }

  let runtime = file_runtime(temp.path(), Config::default());
  let mut session = runtime.session(None);
  session.on_before_fragment_render(&header);
  session.on_after_fragment_render(&header);

  assert_eq!(
    session.manager().element_keys(),
    vec!["/css/header.css", "meta_name_theme-color"]
  );
  assert_eq!(
    session.manager().render(),
    "<link rel=\"stylesheet\" href=\"/css/header.css\">\n<meta name=\"theme-color\" content=\"#000\">\n"
  );
}

#[test]
fn fragment_tag_invalidates_head_elements() {
  let temp = TempDir::new().unwrap();
  let runtime = file_runtime(temp.path(), Config::default());
  let block = fragment("cms", CacheLifetime::Inherit, &["cms_block_7"]);

  let mut session = runtime.session(None);
  session.on_before_fragment_render(&block);
  add_stylesheet(&mut session, "/css/cms.css");
  session.on_after_fragment_render(&block);
  store_content(&runtime, &block, &block.tags);

  let removed = runtime.store().clean_tags(&["cms_block_7".to_string()]).unwrap();
  assert_eq!(removed, 2);
  assert!(runtime.fragment_cache().load(&block).is_empty());
}

/// Render layout(layout.css) > menu(menu.css, cached) + cart(cart.css, uncached).
fn render_layout(runtime: &HeadRuntime) -> Vec<String> {
  let outer = fragment("layout", CacheLifetime::Seconds(600), &["layout_tag"]);
  let inner = fragment("menu", CacheLifetime::Seconds(600), &["menu_tag"]);
  let volatile = fragment("cart", CacheLifetime::Disabled, &[]);

  let mut session = runtime.session(None);
  session.on_before_fragment_render(&outer);
  add_stylesheet(&mut session, "/css/layout.css");
  session.on_before_fragment_render(&inner);
  add_stylesheet(&mut session, "/css/menu.css");
  session.on_after_fragment_render(&inner);
  session.on_before_fragment_render(&volatile);
  add_stylesheet(&mut session, "/css/cart.css");
  session.on_after_fragment_render(&volatile);
  session.on_after_fragment_render(&outer);
  store_content(runtime, &outer, &outer.tags);
  session.manager().element_keys()
}

/// Serve layout from cache: the hooks run without its body executing.
fn replay_layout(runtime: &HeadRuntime) -> Vec<String> {
  let outer = fragment("layout", CacheLifetime::Seconds(600), &["layout_tag"]);
  let mut session = runtime.session(None);
  session.on_before_fragment_render(&outer);
  session.on_after_fragment_render(&outer);
  session.manager().element_keys()
}

#[test]
fn outer_hit_replays_nested_fragments_across_processes() {
  let temp = TempDir::new().unwrap();
  let cold = render_layout(&file_runtime(temp.path(), Config::default()));
  assert_eq!(cold, vec!["/css/layout.css", "/css/menu.css", "/css/cart.css"]);

  let warm = replay_layout(&file_runtime(temp.path(), Config::default()));
  assert_eq!(warm, cold);
}

#[test]
fn outer_hit_survives_nested_invalidation() {
  let temp = TempDir::new().unwrap();
  let runtime = file_runtime(temp.path(), Config::default());
  let cold = render_layout(&runtime);

  let removed = runtime.store().clean_tags(&["menu_tag".to_string()]).unwrap();
  assert_eq!(removed, 1);

  assert_eq!(replay_layout(&runtime), cold);
}

#[test]
fn restored_elements_precede_later_fragments() {
  let temp = TempDir::new().unwrap();
  let cached = fragment("banner", CacheLifetime::Inherit, &[]);
  let later = fragment("footer", CacheLifetime::Disabled, &[]);

  let runtime = file_runtime(temp.path(), Config::default());
  {
    let mut session = runtime.session(None);
    session.on_before_fragment_render(&cached);
    add_stylesheet(&mut session, "/css/banner.css");
    session.on_after_fragment_render(&cached);
    store_content(&runtime, &cached, &[]);
  }

  let mut session = runtime.session(None);
  session.manager().add_charset("UTF-8").unwrap();
  session.on_before_fragment_render(&cached);
  session.on_after_fragment_render(&cached);
  session.on_before_fragment_render(&later);
  add_stylesheet(&mut session, "/css/footer.css");
  session.on_after_fragment_render(&later);

  assert_eq!(
    session.manager().element_keys(),
    vec!["charset", "/css/banner.css", "/css/footer.css"]
  );
}

#[test]
fn concurrent_sessions_share_one_runtime() {
  let temp = TempDir::new().unwrap();
  let runtime = file_runtime(temp.path(), Config::default());

  std::thread::scope(|scope| {
    for n in 0..4 {
      let runtime = &runtime;
      scope.spawn(move || {
        let block = fragment("shared", CacheLifetime::Inherit, &[]);
        let mut session = runtime.session(None);
        session.on_before_fragment_render(&block);
        add_stylesheet(&mut session, "/css/shared.css");
        session.on_after_fragment_render(&block);
        assert_eq!(session.tracker().tracking_level(), 0, "worker {n}");
      });
    }
  });

  let block = fragment("shared", CacheLifetime::Inherit, &[]);
  let loaded = runtime.fragment_cache().load(&block);
  assert_eq!(loaded.keys().collect::<Vec<_>>(), vec!["/css/shared.css"]);
}
