//! Dependency-ordered, single-flight task executor
//!
//! Each device owns a single-assignment cell holding its outcome. The first
//! caller of [`Executor::run`] for a device claims the cell and computes the
//! outcome: it triggers every dependency concurrently (scoped threads), waits
//! for all of them, and only then runs the action, or fails straight away if a
//! dependency failed. Every other caller, whichever entry point it came
//! through, blocks on that one cell and gets a clone of the same outcome.
//!
//! Devices marked stuck on a dependency cycle fail with [`Error::Cycle`]
//! without waiting on anything. A panicking action is caught and stored as
//! [`Error::Panicked`], so it still counts as the device's single run.

use crate::context::Reporter;
use crate::error::{Error, Result};
use crate::graph::{Adjacency, DeviceGraph};
use crate::types::{Device, Operation};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use std::thread;

/// Result of one device's task, shared by every caller
pub type Outcome = Result<()>;

/// Per-device work run once all of its dependencies succeeded
pub trait Action: Send + Sync {
    fn run(&self, name: &str, device: &Device) -> Outcome;
}

impl<F> Action for F
where
    F: Fn(&str, &Device) -> Outcome + Send + Sync,
{
    fn run(&self, name: &str, device: &Device) -> Outcome {
        self(name, device)
    }
}

/// A family of memoized tasks, one per device
///
/// Tasks are safe to invoke from any number of threads at once; the action
/// for a device runs at most once per executor.
pub struct Executor<'a> {
    op: Operation,
    graph: &'a DeviceGraph,
    order: Adjacency,
    slots: BTreeMap<String, OnceLock<Outcome>>,
    /// Devices that can never start, with the cycle they are stuck behind
    stuck: BTreeMap<String, Vec<String>>,
    action: Box<dyn Action + 'a>,
    reporter: &'a dyn Reporter,
}

impl<'a> Executor<'a> {
    /// Build tasks where each device first waits on `order[device]`
    pub fn new(
        op: Operation,
        graph: &'a DeviceGraph,
        order: Adjacency,
        action: impl Action + 'a,
        reporter: &'a dyn Reporter,
    ) -> Self {
        let slots = graph
            .names()
            .map(|name| (name.to_string(), OnceLock::new()))
            .collect();

        Self {
            op,
            graph,
            order,
            slots,
            stuck: BTreeMap::new(),
            action: Box::new(action),
            reporter,
        }
    }

    /// Fail these devices with [`Error::Cycle`] instead of waiting on their
    /// dependencies, which would never finish
    ///
    /// Must cover every device on or behind a cycle in the order; see
    /// [`crate::graph::stuck_on_cycles`].
    pub fn with_stuck(mut self, stuck: BTreeMap<String, Vec<String>>) -> Self {
        self.stuck = stuck;
        self
    }

    pub fn operation(&self) -> Operation {
        self.op
    }

    /// Names that have a task
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Outcome of a device if its task already completed
    pub fn outcome(&self, name: &str) -> Option<&Outcome> {
        self.slots.get(name).and_then(OnceLock::get)
    }

    /// Run the task for `name`, triggering its dependencies as needed
    ///
    /// Blocks until the device's outcome is known.
    pub fn run(&self, name: &str) -> Outcome {
        let slot = self
            .slots
            .get(name)
            .ok_or_else(|| Error::UnknownDevice(name.to_string()))?;

        slot.get_or_init(|| self.execute(name)).clone()
    }

    /// Compute the outcome of `name`; called once per device
    fn execute(&self, name: &str) -> Outcome {
        if let Some(cycle) = self.stuck.get(name) {
            let err = Error::Cycle {
                op: self.op,
                device: name.to_string(),
                cycle: cycle.clone(),
            };
            self.reporter.on_error(name, &err);
            return Err(err);
        }

        let deps = self.order.get(name).map(Vec::as_slice).unwrap_or_default();
        if !deps.is_empty() {
            log::debug!("{} {}: waiting on {}", self.op, name, deps.join(", "));
        }

        let outcome = match first_failure(self.await_all(deps)) {
            Some((dependency, cause)) => Err(Error::Dependency {
                op: self.op,
                device: name.to_string(),
                dependency: dependency.to_string(),
                source: Arc::new(cause),
            }),
            None => match self.graph.get(name) {
                Some(device) => {
                    log::trace!("{} {}: starting", self.op, name);
                    self.act(name, device)
                }
                None => Err(Error::UnknownDevice(name.to_string())),
            },
        };

        if let Err(e) = &outcome {
            self.reporter.on_error(name, e);
        }
        outcome
    }

    /// Run the action, turning a panic into this device's outcome
    fn act(&self, name: &str, device: &Device) -> Outcome {
        let run = AssertUnwindSafe(|| self.action.run(name, device));
        panic::catch_unwind(run).unwrap_or_else(|payload| {
            Err(Error::Panicked {
                op: self.op,
                device: name.to_string(),
                message: panic_message(&*payload),
            })
        })
    }

    /// Trigger every dependency concurrently and wait for all of them
    fn await_all<'n>(&self, deps: &'n [String]) -> Vec<(&'n str, Outcome)> {
        match deps {
            [] => Vec::new(),
            [only] => vec![(only.as_str(), self.run(only))],
            _ => thread::scope(|scope| {
                let handles: Vec<_> = deps
                    .iter()
                    .map(|dep| (dep.as_str(), scope.spawn(move || self.run(dep))))
                    .collect();

                handles
                    .into_iter()
                    .map(|(dep, handle)| {
                        let outcome = handle
                            .join()
                            .unwrap_or_else(|payload| panic::resume_unwind(payload));
                        (dep, outcome)
                    })
                    .collect()
            }),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn first_failure(outcomes: Vec<(&str, Outcome)>) -> Option<(&str, Error)> {
    outcomes
        .into_iter()
        .find_map(|(dep, outcome)| outcome.err().map(|e| (dep, e)))
}
