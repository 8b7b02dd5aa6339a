//! Locality inference
//!
//! Devices with an explicit `local` flag are authoritative. Everything else is
//! inferred from direct dependencies by repeated passes until a pass makes no
//! progress:
//!
//! - any remote dependency makes a device remote, without waiting for the rest
//! - all dependencies resolved with at least one local makes it local
//! - all dependencies resolved with none local or remote (including no
//!   dependencies at all) leaves it unknown
//!
//! A dependency only counts as resolved once it is local or remote. Devices
//! still undecided when a pass changes nothing (cycles, or chains hanging off
//! an unknown device) end up unknown.

use crate::graph::{Dependencies, DeviceGraph};
use crate::types::{Device, Locality};
use std::collections::{BTreeMap, BTreeSet};

/// Infer the locality of every device in the graph
pub fn infer_localities(graph: &DeviceGraph, deps: &Dependencies) -> BTreeMap<String, Locality> {
    let mut settled: BTreeMap<&str, Locality> = BTreeMap::new();
    let mut pending: BTreeSet<&str> = graph.names().collect();

    loop {
        let before = pending.len();
        pending.retain(|name| {
            let Some(device) = graph.get(name) else {
                return false;
            };
            match decide(device, deps.direct(name), &settled) {
                Some(locality) => {
                    settled.insert(*name, locality);
                    false
                }
                None => true,
            }
        });
        if pending.len() == before {
            break;
        }
    }

    if !pending.is_empty() {
        log::debug!(
            "Locality unresolved after fixed point, marking unknown: {:?}",
            pending
        );
    }

    graph
        .names()
        .map(|name| {
            let locality = settled.get(name).copied().unwrap_or(Locality::Unknown);
            (name.to_string(), locality)
        })
        .collect()
}

/// Locality flags per device: `Some(true)` local, `Some(false)` remote,
/// `None` unknown
pub fn localities(graph: &DeviceGraph) -> BTreeMap<String, Option<bool>> {
    let deps = Dependencies::resolve(graph);
    infer_localities(graph, &deps)
        .into_iter()
        .map(|(name, locality)| (name, locality.as_flag()))
        .collect()
}

/// Classify one device from what is settled so far, `None` to keep waiting
fn decide(
    device: &Device,
    direct: &[String],
    settled: &BTreeMap<&str, Locality>,
) -> Option<Locality> {
    if let Some(local) = device.local {
        return Some(Locality::from(local));
    }

    let resolved: Vec<Locality> = direct
        .iter()
        .filter_map(|dep| settled.get(dep.as_str()).copied())
        .filter(|locality| locality.is_resolved())
        .collect();

    if resolved.contains(&Locality::Remote) {
        return Some(Locality::Remote);
    }
    if resolved.len() < direct.len() {
        return None;
    }
    // Everything resolved and nothing remote: local unless there was nothing
    Some(if direct.is_empty() {
        Locality::Unknown
    } else {
        Locality::Local
    })
}
