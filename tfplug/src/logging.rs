//! Logging setup for provider processes
//!
//! Terraform captures a plugin's stderr, so all log output goes there. The
//! level follows Terraform's own variables: `TF_LOG_PROVIDER` wins over
//! `TF_LOG`, and anything unparseable falls back to `INFO`.

use crate::error::{Result, TfplugError};
use std::str::FromStr;
use tracing::Level;

pub const DEFAULT_LEVEL: Level = Level::INFO;

/// Resolves the log level through `lookup`, usually `std::env::var(..).ok()`.
pub fn level_from_env(lookup: impl Fn(&str) -> Option<String>) -> Level {
    ["TF_LOG_PROVIDER", "TF_LOG"]
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
        .and_then(|value| Level::from_str(value.trim()).ok())
        .unwrap_or(DEFAULT_LEVEL)
}

/// Installs the global fmt subscriber. Fails if one is already installed.
pub fn init_logging() -> Result<()> {
    let level = level_from_env(|name| std::env::var(name).ok());

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
        .map_err(|e| TfplugError::Logging(e.to_string()))
}
