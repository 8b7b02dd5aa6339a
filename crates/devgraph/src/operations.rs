//! Check, mount and umount task builders
//!
//! Mount waits on direct dependencies, umount on reverse dependencies, check
//! on nothing. Mount and umount check first and leave devices that are
//! already in the wanted state alone. Devices on or behind a dependency cycle
//! fail with [`Error::Cycle`]; everything else runs normally.

use crate::context::{CommandRunner, Reporter};
use crate::error::{Error, Result};
use crate::executor::{Executor, Outcome};
use crate::graph::{Dependencies, DeviceGraph, stuck_on_cycles};
use crate::types::{CommandStatus, Device, Operation, Step};
use std::sync::Arc;

/// Tasks that report whether each device is mounted, without changing anything
pub fn check_tasks<'a>(
    graph: &'a DeviceGraph,
    runner: &'a dyn CommandRunner,
    reporter: &'a dyn Reporter,
) -> Executor<'a> {
    let op = Operation::Check;
    let action = move |name: &str, device: &Device| -> Outcome {
        if run_step(runner, op, name, device, Step::Check)?.success {
            reporter.on_is_mounted(name);
        } else {
            reporter.on_is_umounted(name);
        }
        Ok(())
    };

    Executor::new(op, graph, Default::default(), action, reporter)
}

/// Tasks that mount each device after everything it sits on
pub fn mount_tasks<'a>(
    graph: &'a DeviceGraph,
    runner: &'a dyn CommandRunner,
    reporter: &'a dyn Reporter,
) -> Executor<'a> {
    let op = Operation::Mount;
    let action = move |name: &str, device: &Device| -> Outcome {
        if run_step(runner, op, name, device, Step::Check)?.success {
            reporter.on_is_mounted(name);
            return Ok(());
        }

        let status = run_step(runner, op, name, device, Step::Mount)?;
        if status.success {
            reporter.on_mounted(name);
            Ok(())
        } else {
            Err(command_failed(op, name, status))
        }
    };

    ordered(op, graph, action, reporter)
}

/// Tasks that unmount each device after everything sitting on it
pub fn umount_tasks<'a>(
    graph: &'a DeviceGraph,
    runner: &'a dyn CommandRunner,
    reporter: &'a dyn Reporter,
) -> Executor<'a> {
    let op = Operation::Umount;
    let action = move |name: &str, device: &Device| -> Outcome {
        if !run_step(runner, op, name, device, Step::Check)?.success {
            reporter.on_is_umounted(name);
            return Ok(());
        }

        let status = run_step(runner, op, name, device, Step::Umount)?;
        if status.success {
            reporter.on_umounted(name);
            Ok(())
        } else {
            Err(command_failed(op, name, status))
        }
    };

    ordered(op, graph, action, reporter)
}

/// Build an executor over the operation's dependency direction, failing
/// devices that would wait on a cycle forever
fn ordered<'a, F>(
    op: Operation,
    graph: &'a DeviceGraph,
    action: F,
    reporter: &'a dyn Reporter,
) -> Executor<'a>
where
    F: Fn(&str, &Device) -> Outcome + Send + Sync + 'a,
{
    let order = Dependencies::resolve(graph).into_order(op.direction());
    let stuck = stuck_on_cycles(&order);
    if !stuck.is_empty() {
        let names: Vec<&str> = stuck.keys().map(String::as_str).collect();
        log::warn!("Dependency cycle, cannot {op}: {}", names.join(", "));
    }
    Executor::new(op, graph, order, action, reporter).with_stuck(stuck)
}

fn run_step(
    runner: &dyn CommandRunner,
    op: Operation,
    name: &str,
    device: &Device,
    step: Step,
) -> Result<CommandStatus> {
    runner
        .run(name, device, step)
        .map_err(|e| Error::Launch {
            op,
            device: name.to_string(),
            source: Arc::new(e),
        })
}

fn command_failed(op: Operation, name: &str, status: CommandStatus) -> Error {
    Error::CommandFailed {
        op,
        device: name.to_string(),
        status,
    }
}
