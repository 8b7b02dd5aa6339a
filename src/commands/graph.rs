//! `deps` and `localities`: show what the config implies without running anything

use anyhow::Result;
use devgraph::{Dependencies, DeviceGraph, Locality, find_cycle, infer_localities};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::Context;
use crate::cli::ReportArgs;
use crate::config;
use crate::ui;

/// Dependency edges of one device
#[derive(Debug, Serialize, PartialEq, Eq)]
struct DeviceDeps<'a> {
    /// Devices it sits on
    depends_on: &'a [String],
    /// Devices sitting on it
    required_by: &'a [String],
}

fn deps_report<'a>(
    graph: &'a DeviceGraph,
    deps: &'a Dependencies,
) -> BTreeMap<&'a str, DeviceDeps<'a>> {
    graph
        .names()
        .map(|name| {
            let entry = DeviceDeps {
                depends_on: deps.direct(name),
                required_by: deps.reverse(name),
            };
            (name, entry)
        })
        .collect()
}

pub fn deps(ctx: &Context, args: &ReportArgs) -> Result<()> {
    let graph = config::load_graph(&ctx.config)?;
    let deps = Dependencies::resolve(&graph);
    let report = deps_report(&graph, &deps);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    ui::header("Dependencies");
    for (name, entry) in &report {
        println!("  {name}");
        if entry.depends_on.is_empty() && entry.required_by.is_empty() {
            ui::dim("standalone");
            continue;
        }
        if !entry.depends_on.is_empty() {
            ui::kv("depends on", &entry.depends_on.join(", "));
        }
        if !entry.required_by.is_empty() {
            ui::kv("required by", &entry.required_by.join(", "));
        }
    }

    if let Some(cycle) = find_cycle(&deps.direct) {
        ui::warn(&format!(
            "Dependency cycle, devices on or behind it cannot be mounted: {}",
            cycle.join(" -> ")
        ));
    }
    Ok(())
}

pub fn localities(ctx: &Context, args: &ReportArgs) -> Result<()> {
    let graph = config::load_graph(&ctx.config)?;
    let localities = infer_localities(&graph, &Dependencies::resolve(&graph));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&localities)?);
        return Ok(());
    }

    ui::header("Localities");
    for (name, locality) in &localities {
        ui::kv(name, &locality_label(&graph, name, *locality));
    }
    Ok(())
}

/// Locality plus whether it was set in the config or inferred
fn locality_label(graph: &DeviceGraph, name: &str, locality: Locality) -> String {
    let explicit = graph.get(name).is_some_and(|d| d.local.is_some());
    match (locality, explicit) {
        (Locality::Unknown, _) | (_, true) => locality.to_string(),
        (_, false) => format!("{locality} (inferred)"),
    }
}
