use std::path::Path;

use anyhow::{Context, Result};

use headtag_lib::config::Config;
use headtag_lib::page::{PageRenderer, PageSpec};
use headtag_lib::session::HeadRuntime;

use crate::output::{OutputFormat, print_json};

pub fn cmd_render(config: Config, page_path: &Path, page_id: Option<&str>, output: OutputFormat) -> Result<()> {
  let page = PageSpec::from_file(page_path)?;
  let runtime = HeadRuntime::from_config(config).context("Failed to open cache store")?;

  let rendered = PageRenderer::new(&runtime)
    .render(&page, page_id)
    .with_context(|| format!("Failed to render {}", page_path.display()))?;

  if output.is_json() {
    print_json(&rendered)?;
  } else {
    print!("{}", rendered.html);
  }

  Ok(())
}
