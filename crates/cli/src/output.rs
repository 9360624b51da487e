//! CLI output formatting utilities.
//!
//! Provides consistent formatting for terminal output including colored status
//! messages, human-readable sizes and lifetimes, and Unicode symbols.

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const INFO: &str = "•";
}

pub fn format_bytes(bytes: u64) -> String {
  const KB: u64 = 1024;
  const MB: u64 = KB * 1024;
  const GB: u64 = MB * 1024;

  if bytes >= GB {
    format!("{:.1} GB", bytes as f64 / GB as f64)
  } else if bytes >= MB {
    format!("{:.1} MB", bytes as f64 / MB as f64)
  } else if bytes >= KB {
    format!("{:.1} KB", bytes as f64 / KB as f64)
  } else {
    format!("{} B", bytes)
  }
}

/// Format a lifetime in seconds using the largest whole unit.
pub fn format_lifetime(secs: Option<u64>) -> String {
  const MINUTE: u64 = 60;
  const HOUR: u64 = MINUTE * 60;
  const DAY: u64 = HOUR * 24;

  match secs {
    None => "until invalidated".to_string(),
    Some(s) if s >= DAY && s % DAY == 0 => format!("{}d", s / DAY),
    Some(s) if s >= HOUR && s % HOUR == 0 => format!("{}h", s / HOUR),
    Some(s) if s >= MINUTE && s % MINUTE == 0 => format!("{}m", s / MINUTE),
    Some(s) => format!("{}s", s),
  }
}

/// Format an absolute expiry relative to `now` (both Unix seconds).
pub fn format_expiry(expires_at: Option<u64>, now: u64) -> String {
  match expires_at {
    None => "never".to_string(),
    Some(at) if at <= now => "expired".to_string(),
    Some(at) => format!("in {}", format_lifetime(Some(at - now))),
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
