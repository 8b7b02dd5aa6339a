//! Core types for device orchestration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::ExitStatus;

/// Shell command templates for one device
///
/// Each template runs with `source`, `target` and (for mount, when the
/// device has credentials) `authfile` in its environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Commands {
    /// Exits zero when the device is currently mounted
    #[serde(alias = "Check")]
    pub check: String,
    #[serde(alias = "Mount")]
    pub mount: String,
    #[serde(alias = "Umount")]
    pub umount: String,
}

/// A named resource that can be mounted and unmounted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Path this device reads from
    #[serde(alias = "Source")]
    pub source: String,
    /// Path this device is mounted at
    #[serde(alias = "Target")]
    pub target: String,
    /// Missing commands decode as empty templates
    #[serde(default, alias = "Commands")]
    pub commands: Commands,
    /// Secret written to a transient file while mounting
    #[serde(default, alias = "Authfile", skip_serializing_if = "Option::is_none")]
    pub authfile: Option<String>,
    /// Explicit locality: `true` local, `false` remote, absent inferred
    #[serde(default, alias = "Local", skip_serializing_if = "Option::is_none")]
    pub local: Option<bool>,
}

impl Device {
    /// Create a device with empty commands
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            ..Default::default()
        }
    }

    pub fn with_commands(mut self, check: &str, mount: &str, umount: &str) -> Self {
        self.commands = Commands {
            check: check.to_string(),
            mount: mount.to_string(),
            umount: umount.to_string(),
        };
        self
    }

    pub fn with_authfile(mut self, secret: &str) -> Self {
        self.authfile = Some(secret.to_string());
        self
    }

    pub fn with_local(mut self, local: bool) -> Self {
        self.local = Some(local);
        self
    }
}

/// Operation driven over a set of devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Check,
    Mount,
    Umount,
}

impl Operation {
    /// Which dependency edges a device waits on before acting
    pub fn direction(self) -> Direction {
        match self {
            Operation::Check => Direction::Unordered,
            Operation::Mount => Direction::Forward,
            Operation::Umount => Direction::Reverse,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Check => "check",
            Operation::Mount => "mount",
            Operation::Umount => "umount",
        };
        f.write_str(name)
    }
}

/// Ordering applied by the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// No waiting at all
    Unordered,
    /// Wait on direct dependencies (mount what a device sits on first)
    Forward,
    /// Wait on reverse dependencies (unmount what sits on a device first)
    Reverse,
}

/// A single command step of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    Check,
    Mount,
    Umount,
}

impl Step {
    /// The command template for this step
    pub fn command(self, commands: &Commands) -> &str {
        match self {
            Step::Check => &commands.check,
            Step::Mount => &commands.mount,
            Step::Umount => &commands.umount,
        }
    }

    /// Only mounting gets the credential file
    pub fn uses_authfile(self) -> bool {
        matches!(self, Step::Mount)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Check => "check",
            Step::Mount => "mount",
            Step::Umount => "umount",
        };
        f.write_str(name)
    }
}

/// How a command finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    pub success: bool,
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
}

impl CommandStatus {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            code: Some(0),
        }
    }

    pub fn failure(code: Option<i32>) -> Self {
        Self {
            success: false,
            code,
        }
    }
}

impl From<ExitStatus> for CommandStatus {
    fn from(status: ExitStatus) -> Self {
        Self {
            success: status.success(),
            code: status.code(),
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {}", code),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// Where a device lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locality {
    Local,
    Remote,
    Unknown,
}

impl Locality {
    /// Flag form: `Some(true)` local, `Some(false)` remote, `None` unknown
    pub fn as_flag(self) -> Option<bool> {
        match self {
            Locality::Local => Some(true),
            Locality::Remote => Some(false),
            Locality::Unknown => None,
        }
    }

    /// Local or remote, as opposed to unknown
    pub fn is_resolved(self) -> bool {
        self != Locality::Unknown
    }
}

impl From<bool> for Locality {
    fn from(local: bool) -> Self {
        if local {
            Locality::Local
        } else {
            Locality::Remote
        }
    }
}

impl fmt::Display for Locality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Locality::Local => "local",
            Locality::Remote => "remote",
            Locality::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
