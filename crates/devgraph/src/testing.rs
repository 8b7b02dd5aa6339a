//! Test doubles shared by the unit tests

use crate::context::{CommandRunner, Reporter};
use crate::error::Error;
use crate::types::{CommandStatus, Device, Step};
use std::collections::BTreeSet;
use std::io;
use std::sync::Mutex;

/// Reporter that records every notification as a string
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl Reporter for RecordingReporter {
    fn on_is_mounted(&self, name: &str) {
        self.push(format!("is_mounted {name}"));
    }

    fn on_is_umounted(&self, name: &str) {
        self.push(format!("is_umounted {name}"));
    }

    fn on_mounted(&self, name: &str) {
        self.push(format!("mounted {name}"));
    }

    fn on_umounted(&self, name: &str) {
        self.push(format!("umounted {name}"));
    }

    fn on_error(&self, name: &str, error: &Error) {
        self.push(format!("error {name}: {error}"));
    }
}

/// In-memory stand-in for a shell: tracks which devices are mounted
///
/// Check succeeds for mounted devices, mount/umount flip the state. Steps
/// can be made to exit 1, and devices can be made impossible to launch.
#[derive(Default)]
pub struct MockRunner {
    mounted: Mutex<BTreeSet<String>>,
    failing: BTreeSet<(String, Step)>,
    unlaunchable: BTreeSet<String>,
    calls: Mutex<Vec<(String, Step)>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mounted(self, names: &[&str]) -> Self {
        self.mounted
            .lock()
            .unwrap()
            .extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn with_failing(mut self, name: &str, step: Step) -> Self {
        self.failing.insert((name.to_string(), step));
        self
    }

    pub fn with_unlaunchable(mut self, name: &str) -> Self {
        self.unlaunchable.insert(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, Step)> {
        self.calls.lock().unwrap().clone()
    }

    /// Steps run for one device, in order
    pub fn steps(&self, name: &str) -> Vec<Step> {
        self.calls()
            .into_iter()
            .filter(|(n, _)| n == name)
            .map(|(_, step)| step)
            .collect()
    }

    /// Index of a call in the global call order
    pub fn position(&self, name: &str, step: Step) -> Option<usize> {
        self.calls()
            .iter()
            .position(|(n, s)| n == name && *s == step)
    }

    pub fn is_mounted(&self, name: &str) -> bool {
        self.mounted.lock().unwrap().contains(name)
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, name: &str, _device: &Device, step: Step) -> io::Result<CommandStatus> {
        self.calls.lock().unwrap().push((name.to_string(), step));

        if self.unlaunchable.contains(name) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "bash: not found"));
        }
        if self.failing.contains(&(name.to_string(), step)) {
            return Ok(CommandStatus::failure(Some(1)));
        }

        let mut mounted = self.mounted.lock().unwrap();
        let status = match step {
            Step::Check if mounted.contains(name) => CommandStatus::succeeded(),
            Step::Check => CommandStatus::failure(Some(1)),
            Step::Mount => {
                mounted.insert(name.to_string());
                CommandStatus::succeeded()
            }
            Step::Umount => {
                mounted.remove(name);
                CommandStatus::succeeded()
            }
        };
        Ok(status)
    }
}
