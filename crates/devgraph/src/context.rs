//! Provider traits for running commands and reporting progress
//!
//! These traits keep the executor independent of how commands are actually
//! launched and how results are shown to the user.

use crate::error::Error;
use crate::types::{CommandStatus, Device, Step};
use std::io;

/// Runs one command step for a device
///
/// Returns the command's status when it ran (successfully or not), and an
/// I/O error only when it could not be launched at all.
pub trait CommandRunner: Send + Sync {
    fn run(&self, name: &str, device: &Device, step: Step) -> io::Result<CommandStatus>;
}

/// Observer for notable device transitions
///
/// Purely observational: nothing the reporter does affects the outcome.
pub trait Reporter: Send + Sync {
    /// The check found the device mounted (nothing to do for mount)
    fn on_is_mounted(&self, name: &str);

    /// The check found the device unmounted (nothing to do for umount)
    fn on_is_umounted(&self, name: &str);

    /// The device was just mounted
    fn on_mounted(&self, name: &str);

    /// The device was just unmounted
    fn on_umounted(&self, name: &str);

    /// The device's task failed, reported once per device
    fn on_error(&self, name: &str, error: &Error);
}

/// No-op reporter
pub struct NoReport;

impl Reporter for NoReport {
    fn on_is_mounted(&self, _name: &str) {}
    fn on_is_umounted(&self, _name: &str) {}
    fn on_mounted(&self, _name: &str) {}
    fn on_umounted(&self, _name: &str) {}
    fn on_error(&self, _name: &str, _error: &Error) {}
}
