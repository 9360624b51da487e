mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use headtag_lib::config::{Config, StoreBackend};

use crate::output::OutputFormat;

/// headtag - Fragment-scoped head element tracking and caching
#[derive(Parser)]
#[command(name = "headtag")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Path to the configuration file
  #[arg(short, long, global = true, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Use a file store in this directory
  #[arg(long, global = true, value_name = "DIR")]
  store: Option<PathBuf>,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Render a page file and print the resulting document
  Render {
    /// Path to the page file
    page: PathBuf,

    /// Page identifier for the whole-page cache (default: the page's `id`)
    #[arg(long)]
    page_id: Option<String>,
  },

  /// Inspect or invalidate the cache store
  Cache {
    #[command(subcommand)]
    action: CacheCommand,
  },

  /// Show the effective configuration
  Info,
}

#[derive(Subcommand)]
enum CacheCommand {
  /// List live cache entries
  List,

  /// Remove every entry carrying one of the given tags
  Clean {
    /// Tag to invalidate (repeatable)
    #[arg(long = "tag", required = true)]
    tags: Vec<String>,
  },

  /// Remove every entry
  Flush,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let config = load_config(&cli)?;

  match cli.command {
    Commands::Render { page, page_id } => cmd::cmd_render(config, &page, page_id.as_deref(), cli.output),
    Commands::Cache { action } => match action {
      CacheCommand::List => cmd::cmd_cache_list(&config, cli.output),
      CacheCommand::Clean { tags } => cmd::cmd_cache_clean(&config, &tags, cli.output),
      CacheCommand::Flush => cmd::cmd_cache_flush(&config, cli.output),
    },
    Commands::Info => cmd::cmd_info(&config, cli.config.as_deref(), cli.output),
  }
}

fn load_config(cli: &Cli) -> Result<Config> {
  let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
  if let Some(dir) = &cli.store {
    config.store.backend = StoreBackend::File;
    config.store.path = Some(dir.clone());
  }
  debug!(backend = ?config.store.backend, path = ?config.store.path, "configuration loaded");
  Ok(config)
}
