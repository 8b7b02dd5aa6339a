//! Shell command runner
//!
//! Runs a device's command template through `bash -c`, with `source` and
//! `target` exported, plus `authfile` pointing at a transient file holding
//! the device's secret when mounting.

use crate::context::CommandRunner;
use crate::types::{CommandStatus, Device, Step};
use std::io::{self, Write};
use std::process::Command;
use tempfile::TempPath;

/// Level at which every command is logged just before it runs
pub const COMMAND_LOG_LEVEL: log::Level = log::Level::Info;

/// Runs command templates through a shell, inheriting stdio
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self::with_shell("bash")
    }

    /// Use a different shell binary (must accept `-c <command>`)
    pub fn with_shell(shell: &str) -> Self {
        Self {
            shell: shell.to_string(),
        }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, name: &str, device: &Device, step: Step) -> io::Result<CommandStatus> {
        let command = step.command(&device.commands);
        let credential = match &device.authfile {
            Some(secret) if step.uses_authfile() => Some(write_credential(secret)?),
            _ => None,
        };

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .env("source", &device.source)
            .env("target", &device.target);
        if let Some(path) = &credential {
            cmd.env("authfile", path.as_os_str());
        }

        log::log!(COMMAND_LOG_LEVEL, "{} {}: {}", step, name, command);
        let status = cmd.status()?;

        if let Some(path) = credential {
            path.close()?;
        }
        Ok(CommandStatus::from(status))
    }
}

/// Write the secret to a fresh temporary file, removed when the path drops
fn write_credential(secret: &str) -> io::Result<TempPath> {
    let mut file = tempfile::Builder::new().prefix("fs-").tempfile()?;
    file.write_all(secret.as_bytes())?;
    file.flush()?;
    Ok(file.into_temp_path())
}
