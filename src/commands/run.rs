//! Run check, mount or umount over the selected devices
//!
//! Selected devices are started on a rayon pool. Each task pulls in its own
//! dependencies, so a device outside the selection may still be mounted (or
//! unmounted) when something selected needs it.

use anyhow::{Context as _, Result, bail};
use devgraph::{
    Dependencies, DeviceGraph, Error, Executor, Locality, Operation, ShellRunner, check_tasks,
    infer_localities, mount_tasks, umount_tasks,
};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

use crate::Context;
use crate::cli::SelectArgs;
use crate::config;
use crate::ui::{self, TerminalReporter};

pub fn run(ctx: &Context, op: Operation, args: &SelectArgs) -> Result<()> {
    let graph = config::load_graph(&ctx.config)?;
    if graph.is_empty() {
        ui::warn(&format!("No devices configured in {}", ctx.config.display()));
        return Ok(());
    }
    let localities = infer_localities(&graph, &Dependencies::resolve(&graph));

    let selected = select(&graph, &localities, args);
    if selected.is_empty() {
        ui::warn("No devices selected");
        return Ok(());
    }
    log::info!("{} {} devices: {}", op, selected.len(), selected.join(", "));

    let runner = ShellRunner::new();
    let reporter = TerminalReporter::new(ctx.quiet);
    let tasks = match op {
        Operation::Check => check_tasks(&graph, &runner, &reporter),
        Operation::Mount => mount_tasks(&graph, &runner, &reporter),
        Operation::Umount => umount_tasks(&graph, &runner, &reporter),
    };

    let failures = run_selected(&tasks, &selected, args.jobs)?;
    let ok = selected.len() - failures.len();

    if failures.is_empty() {
        if !ctx.quiet {
            ui::success(&format!("{ok} ok, 0 failed"));
        }
        return Ok(());
    }

    ui::error(&format!("{} ok, {} failed", ok, failures.len()));
    for (name, err) in &failures {
        log::debug!("{name}: {err:?}");
    }
    bail!(
        "{} of {} devices failed to {}",
        failures.len(),
        selected.len(),
        tasks.operation()
    )
}

/// Names to run: explicit names plus every device whose locality was asked
/// for, or all devices when nothing narrows the selection
pub fn select(
    graph: &DeviceGraph,
    localities: &BTreeMap<String, Locality>,
    args: &SelectArgs,
) -> Vec<String> {
    if args.selects_all() {
        return graph.names().map(str::to_string).collect();
    }

    let mut selected = BTreeSet::new();
    for name in &args.names {
        if graph.contains(name) {
            selected.insert(name.clone());
        } else {
            ui::warn(&format!("Unknown device: {name}"));
        }
    }

    let wanted = |locality: Locality| match locality {
        Locality::Local => args.local,
        Locality::Remote => args.remote,
        Locality::Unknown => args.unknown,
    };
    selected.extend(
        localities
            .iter()
            .filter(|(_, locality)| wanted(**locality))
            .map(|(name, _)| name.clone()),
    );

    selected.into_iter().collect()
}

/// Start every name on a pool of `jobs` threads (0 = one per CPU) and collect
/// the failures
fn run_selected(
    tasks: &Executor<'_>,
    names: &[String],
    jobs: usize,
) -> Result<Vec<(String, Error)>> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if jobs > 0 {
        builder = builder.num_threads(jobs);
    }
    let pool = builder.build().context("Could not start worker pool")?;

    let failures: Vec<(String, Error)> = pool.install(|| {
        names
            .par_iter()
            .filter_map(|name| tasks.run(name).err().map(|err| (name.clone(), err)))
            .collect()
    });
    Ok(failures)
}
