use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use headtag_lib::config::{Config, StoreBackend};

use crate::output::{OutputFormat, format_lifetime, print_json, print_stat};

#[derive(Serialize)]
struct Info<'a> {
  version: &'static str,
  config_file: Option<&'a Path>,
  config: &'a Config,
}

pub fn cmd_info(config: &Config, config_file: Option<&Path>, output: OutputFormat) -> Result<()> {
  if output.is_json() {
    return print_json(&Info {
      version: env!("CARGO_PKG_VERSION"),
      config_file,
      config,
    });
  }

  println!("headtag v{}", env!("CARGO_PKG_VERSION"));
  println!();
  print_stat(
    "Config",
    &config_file.map_or_else(|| "(defaults)".to_string(), |p| p.display().to_string()),
  );
  print_stat("Enabled", &config.enabled.to_string());
  print_stat("Placeholder", &config.placeholder);
  if !config.disabled_modules.is_empty() {
    print_stat("Disabled modules", &config.disabled_modules.join(", "));
  }
  if !config.skip_response_types.is_empty() {
    print_stat("Skipped responses", &config.skip_response_types.join(", "));
  }

  let store = match (&config.store.backend, &config.store.path) {
    (StoreBackend::File, Some(path)) => format!("file ({})", path.display()),
    (StoreBackend::File, None) => "file".to_string(),
    (StoreBackend::Memory, _) => "memory".to_string(),
  };
  print_stat("Store", &store);

  println!();
  println!("Fragment cache:");
  print_stat("Key prefix", &config.fragment_cache.key_prefix);
  print_stat("Lifetime", &format_lifetime(config.fragment_cache.lifetime_secs));
  print_stat("Tags", &config.fragment_cache.tags.join(", "));

  println!();
  println!("Page cache:");
  print_stat("Enabled", &config.page_cache.enabled.to_string());
  print_stat("Key prefix", &config.page_cache.key_prefix);
  print_stat("Lifetime", &format_lifetime(config.page_cache.lifetime_secs));

  Ok(())
}
