//! Config file location
//!
//! # Environment Variables
//!
//! - `MOUNTCTL_CONFIG` - Override the device config file (e.g., `~/dotfiles/fs.toml`)
//!
//! Without an override the config lives at `~/.fs.json.gpg`.

use anyhow::{Context, Result};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Environment variable for config file override
pub const ENV_CONFIG_FILE: &str = "MOUNTCTL_CONFIG";

/// Default config file name, relative to the home directory
pub const DEFAULT_CONFIG_FILE: &str = ".fs.json.gpg";

/// Resolve the device config file
///
/// Priority:
/// 1. Explicit path (`--file`, which clap also fills from `MOUNTCTL_CONFIG`)
/// 2. `MOUNTCTL_CONFIG` env var
/// 3. `~/.fs.json.gpg`
pub fn config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(expand(&path.to_string_lossy()));
    }

    if let Ok(file) = std::env::var(ENV_CONFIG_FILE) {
        let path = expand(&file);
        log::debug!("Using config file from {}: {}", ENV_CONFIG_FILE, path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(DEFAULT_CONFIG_FILE))
}

/// Expand `~` and environment variables in a path
///
/// Falls back to the unexpanded string when a variable is undefined.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}
