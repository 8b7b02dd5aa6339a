//! Error types for the devgraph crate

use std::io;
use std::sync::Arc;
use thiserror::Error;

use crate::types::{CommandStatus, Operation};

/// Errors that can occur while building or running device tasks
///
/// Errors are `Clone` because a single task outcome is shared by every
/// caller that waited on it.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// No device with this name in the graph
    #[error("unknown device: {0}")]
    UnknownDevice(String),

    /// The command could not be launched, or its I/O failed
    #[error("{op} {device}: {source}")]
    Launch {
        op: Operation,
        device: String,
        #[source]
        source: Arc<io::Error>,
    },

    /// The command ran but reported failure
    #[error("{op} {device}: {status}")]
    CommandFailed {
        op: Operation,
        device: String,
        status: CommandStatus,
    },

    /// A dependency failed, so this device was never attempted
    #[error("{op} {device}: {source}")]
    Dependency {
        op: Operation,
        device: String,
        dependency: String,
        #[source]
        source: Arc<Error>,
    },

    /// The device sits on, or waits on, a dependency cycle and can never start
    #[error("{op} {device}: dependency cycle: {}", .cycle.join(" -> "))]
    Cycle {
        op: Operation,
        device: String,
        cycle: Vec<String>,
    },

    /// The action panicked; the panic is kept as this device's outcome
    #[error("{op} {device}: panicked: {message}")]
    Panicked {
        op: Operation,
        device: String,
        message: String,
    },
}

impl Error {
    /// Device this error is about, if any
    pub fn device(&self) -> Option<&str> {
        match self {
            Error::UnknownDevice(name) => Some(name),
            Error::Launch { device, .. }
            | Error::CommandFailed { device, .. }
            | Error::Dependency { device, .. }
            | Error::Cycle { device, .. }
            | Error::Panicked { device, .. } => Some(device),
        }
    }

    /// Returns true if this device was skipped because a dependency failed
    pub fn is_dependency_failure(&self) -> bool {
        matches!(self, Error::Dependency { .. })
    }

    /// Follows the dependency chain down to the device that actually failed
    pub fn root_cause_device(&self) -> Option<&str> {
        let mut current = self;
        while let Error::Dependency { source, .. } = current {
            current = source.as_ref();
        }
        current.device()
    }
}

/// Result type for devgraph operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(device: &str) -> Error {
        Error::CommandFailed {
            op: Operation::Mount,
            device: device.to_string(),
            status: CommandStatus::failure(Some(1)),
        }
    }

    #[test]
    fn test_dependency_chain_message() {
        let err = Error::Dependency {
            op: Operation::Mount,
            device: "a".to_string(),
            dependency: "b".to_string(),
            source: Arc::new(failed("b")),
        };

        assert_eq!(err.to_string(), "mount a: mount b: exit status 1");
        assert!(err.is_dependency_failure());
        assert_eq!(err.device(), Some("a"));
        assert_eq!(err.root_cause_device(), Some("b"));
    }

    #[test]
    fn test_launch_error_keeps_source() {
        let err = Error::Launch {
            op: Operation::Umount,
            device: "nas".to_string(),
            source: Arc::new(io::Error::new(io::ErrorKind::NotFound, "bash not found")),
        };

        assert_eq!(err.to_string(), "umount nas: bash not found");
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_dependency_failure());
    }

    #[test]
    fn test_cycle_message() {
        let err = Error::Cycle {
            op: Operation::Mount,
            device: "c".to_string(),
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "mount c: dependency cycle: a -> b -> a");
        assert_eq!(err.device(), Some("c"));
        assert_eq!(err.root_cause_device(), Some("c"));
    }

    #[test]
    fn test_panicked_message() {
        let err = Error::Panicked {
            op: Operation::Check,
            device: "usb".to_string(),
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "check usb: panicked: boom");
        assert!(!err.is_dependency_failure());
    }
}
