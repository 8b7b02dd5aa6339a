//! Device config loading
//!
//! The config maps device names to devices. It is JSON unless the file ends
//! in `.toml`; a trailing `.gpg` means the content is decrypted with
//! `gpg --batch -d` first.

use anyhow::{Context, Result, bail};
use devgraph::{COMMAND_LOG_LEVEL, DeviceGraph};
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from the file name, ignoring a `.gpg` suffix
    pub fn detect(path: &Path) -> Self {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        let name = name.strip_suffix(".gpg").unwrap_or(&name);
        if name.ends_with(".toml") {
            Self::Toml
        } else {
            Self::Json
        }
    }

    pub fn parse(self, content: &str) -> Result<DeviceGraph> {
        match self {
            Self::Json => serde_json::from_str(content).context("Invalid JSON device config"),
            Self::Toml => toml::from_str(content).context("Invalid TOML device config"),
        }
    }
}

fn is_encrypted(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gpg")
}

/// Load the device graph from a config file
pub fn load_graph(path: &Path) -> Result<DeviceGraph> {
    let content = if is_encrypted(path) {
        decrypt(path)?
    } else {
        fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?
    };

    let graph = ConfigFormat::detect(path)
        .parse(&content)
        .with_context(|| format!("Could not load {}", path.display()))?;
    log::debug!("Loaded {} devices from {}", graph.len(), path.display());
    Ok(graph)
}

/// Decrypt a gpg file; stdin stays attached so gpg can prompt for a passphrase
fn decrypt(path: &Path) -> Result<String> {
    log::log!(COMMAND_LOG_LEVEL, "gpg --batch -d {}", path.display());
    let output = Command::new("gpg")
        .args(["--batch", "-d"])
        .arg(path)
        .stdin(Stdio::inherit())
        .stderr(Stdio::inherit())
        .output()
        .context("Could not run gpg")?;

    if !output.status.success() {
        bail!("gpg could not decrypt {}", path.display());
    }
    String::from_utf8(output.stdout).context("Decrypted config is not UTF-8")
}
