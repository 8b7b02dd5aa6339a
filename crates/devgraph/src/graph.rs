//! Device graph and path-nesting dependency resolution
//!
//! A device `A` depends on device `B` when `B`'s target is a prefix of `A`'s
//! source: `B` has to be mounted before `A` can read from beneath it.

use crate::types::{Device, Direction};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Adjacency lists keyed by device name
pub type Adjacency = BTreeMap<String, Vec<String>>;

/// All configured devices, keyed by unique name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceGraph {
    devices: BTreeMap<String, Device>,
}

impl DeviceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device, replacing any previous one with the same name
    pub fn with_device(mut self, name: &str, device: Device) -> Self {
        self.devices.insert(name.to_string(), device);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Device> {
        self.devices.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.devices.contains_key(name)
    }

    /// Device names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Device)> {
        self.devices.iter().map(|(name, device)| (name.as_str(), device))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}


/// Direct and reverse dependency edges of a graph
///
/// Only devices with at least one edge have an entry; lookups through
/// [`Dependencies::direct`] and [`Dependencies::reverse`] return an empty
/// slice otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    pub direct: Adjacency,
    pub reverse: Adjacency,
}

impl Dependencies {
    /// Resolve every `A -> B` edge where `B.target` is a non-empty prefix of
    /// `A.source` and `A != B`
    pub fn resolve(graph: &DeviceGraph) -> Self {
        let mut deps = Self::default();

        for (n1, d1) in graph.iter() {
            for (n2, d2) in graph.iter() {
                if n1 != n2 && !d2.target.is_empty() && d1.source.starts_with(&d2.target) {
                    deps.direct
                        .entry(n1.to_string())
                        .or_default()
                        .push(n2.to_string());
                    deps.reverse
                        .entry(n2.to_string())
                        .or_default()
                        .push(n1.to_string());
                }
            }
        }

        log::debug!(
            "Resolved {} dependency edges across {} devices",
            deps.direct.values().map(Vec::len).sum::<usize>(),
            graph.len()
        );
        deps
    }

    /// Devices `name` depends on
    pub fn direct(&self, name: &str) -> &[String] {
        self.direct.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Devices that depend on `name`
    pub fn reverse(&self, name: &str) -> &[String] {
        self.reverse.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// The edges an executor waits on for the given direction
    pub fn into_order(self, direction: Direction) -> Adjacency {
        match direction {
            Direction::Unordered => Adjacency::new(),
            Direction::Forward => self.direct,
            Direction::Reverse => self.reverse,
        }
    }
}

/// Find a cycle in an adjacency map, returned as a closed path (`a -> b -> a`)
pub fn find_cycle(order: &Adjacency) -> Option<Vec<String>> {
    let mut done: BTreeSet<&str> = BTreeSet::new();

    for start in order.keys() {
        if done.contains(start.as_str()) {
            continue;
        }
        let mut path: Vec<&str> = Vec::new();
        if let Some(cycle) = visit(order, start, &mut path, &mut done) {
            return Some(cycle);
        }
    }
    None
}

/// Devices that can never start in this order: those on a cycle and those
/// waiting (directly or not) on one, each mapped to a cycle it is stuck behind
///
/// Everything else has a finite chain of waits and runs normally.
pub fn stuck_on_cycles(order: &Adjacency) -> BTreeMap<String, Vec<String>> {
    let nodes: BTreeSet<&str> = order
        .iter()
        .flat_map(|(name, next)| std::iter::once(name).chain(next))
        .map(String::as_str)
        .collect();

    // Peel off devices whose waits all finish until nothing changes
    let mut finishes: BTreeSet<&str> = BTreeSet::new();
    loop {
        let before = finishes.len();
        for name in &nodes {
            let waits_finish = order
                .get(*name)
                .into_iter()
                .flatten()
                .all(|next| finishes.contains(next.as_str()));
            if waits_finish {
                finishes.insert(*name);
            }
        }
        if finishes.len() == before {
            break;
        }
    }

    nodes
        .difference(&finishes)
        .filter_map(|name| {
            // Every stuck device waits on another stuck one, so a search that
            // skips finishing devices always closes a loop
            let mut done = finishes.clone();
            let mut path = Vec::new();
            visit(order, *name, &mut path, &mut done).map(|cycle| (name.to_string(), cycle))
        })
        .collect()
}

fn visit<'a>(
    order: &'a Adjacency,
    name: &'a str,
    path: &mut Vec<&'a str>,
    done: &mut BTreeSet<&'a str>,
) -> Option<Vec<String>> {
    if let Some(pos) = path.iter().position(|n| *n == name) {
        let mut cycle: Vec<String> = path[pos..].iter().map(|n| n.to_string()).collect();
        cycle.push(name.to_string());
        return Some(cycle);
    }
    if done.contains(name) {
        return None;
    }

    path.push(name);
    for next in order.get(name).into_iter().flatten() {
        if let Some(cycle) = visit(order, next, path, done) {
            return Some(cycle);
        }
    }
    path.pop();
    done.insert(name);
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested_pair() -> DeviceGraph {
        DeviceGraph::new()
            .with_device("a", Device::new("/mnt/b/x", "/mnt/a"))
            .with_device("b", Device::new("/dev/sdb", "/mnt/b").with_local(true))
    }

    #[test]
    fn test_resolve_nested_pair() {
        let deps = Dependencies::resolve(&nested_pair());

        assert_eq!(deps.direct("a"), ["b".to_string()]);
        assert_eq!(deps.reverse("b"), ["a".to_string()]);
        assert!(deps.direct("b").is_empty());
        assert!(deps.reverse("a").is_empty());
    }

    #[test]
    fn test_resolve_empty_graph() {
        let deps = Dependencies::resolve(&DeviceGraph::new());
        assert!(deps.direct.is_empty());
        assert!(deps.reverse.is_empty());
    }

    #[test]
    fn test_resolve_excludes_self_prefix() {
        let graph = DeviceGraph::new().with_device("loop", Device::new("/mnt/loop", "/mnt/loop"));
        let deps = Dependencies::resolve(&graph);
        assert!(deps.direct.is_empty());
    }

    #[test]
    fn test_resolve_ignores_empty_target() {
        let graph = DeviceGraph::new()
            .with_device("a", Device::new("/mnt/b/x", "/mnt/a"))
            .with_device("blank", Device::new("/dev/sdc", ""));
        let deps = Dependencies::resolve(&graph);
        assert!(deps.direct("a").is_empty());
    }

    #[test]
    fn test_resolve_is_plain_string_prefix() {
        // "/mnt/backup" starts with "/mnt/b" even though it is a sibling path
        let graph = DeviceGraph::new()
            .with_device("backup", Device::new("/mnt/backup/disk", "/srv/backup"))
            .with_device("b", Device::new("/dev/sdb", "/mnt/b"));
        let deps = Dependencies::resolve(&graph);
        assert_eq!(deps.direct("backup"), ["b".to_string()]);
    }

    #[test]
    fn test_resolve_multiple_dependencies_sorted() {
        let graph = DeviceGraph::new()
            .with_device("top", Device::new("/mnt/base/inner/data", "/mnt/top"))
            .with_device("base", Device::new("/dev/sda", "/mnt/base"))
            .with_device("inner", Device::new("/mnt/base/img", "/mnt/base/inner"));
        let deps = Dependencies::resolve(&graph);

        assert_eq!(deps.direct("top"), ["base".to_string(), "inner".to_string()]);
        assert_eq!(deps.direct("inner"), ["base".to_string()]);
        assert_eq!(deps.reverse("base"), ["inner".to_string(), "top".to_string()]);
    }

    #[test]
    fn test_into_order() {
        let deps = Dependencies::resolve(&nested_pair());
        assert!(deps.clone().into_order(Direction::Unordered).is_empty());
        assert_eq!(deps.clone().into_order(Direction::Forward), deps.direct);
        assert_eq!(deps.clone().into_order(Direction::Reverse), deps.reverse);
    }

    #[test]
    fn test_find_cycle_none_for_dag() {
        let deps = Dependencies::resolve(&nested_pair());
        assert_eq!(find_cycle(&deps.direct), None);
        assert_eq!(find_cycle(&deps.reverse), None);
    }

    #[test]
    fn test_find_cycle_shared_target() {
        // Both mount at /x from beneath /x, so each depends on the other
        let graph = DeviceGraph::new()
            .with_device("a", Device::new("/x/y", "/x"))
            .with_device("b", Device::new("/x/z", "/x"));
        let deps = Dependencies::resolve(&graph);

        let cycle = find_cycle(&deps.direct).unwrap();
        assert_eq!(cycle, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_stuck_on_cycles_empty_for_dag() {
        let deps = Dependencies::resolve(&nested_pair());
        assert!(stuck_on_cycles(&deps.direct).is_empty());
        assert!(stuck_on_cycles(&deps.reverse).is_empty());
    }

    #[test]
    fn test_stuck_on_cycles_spares_unrelated_devices() {
        // a and b share /x; top waits on both; usb and under are independent
        let graph = DeviceGraph::new()
            .with_device("a", Device::new("/x/y", "/x"))
            .with_device("b", Device::new("/x/z", "/x"))
            .with_device("top", Device::new("/x/data.img", "/mnt/top"))
            .with_device("usb", Device::new("/dev/sdc1", "/mnt/usb"))
            .with_device("under", Device::new("/mnt/usb/disk.img", "/mnt/under"));
        let deps = Dependencies::resolve(&graph);

        let forward = stuck_on_cycles(&deps.direct);
        assert_eq!(forward.keys().collect::<Vec<_>>(), vec!["a", "b", "top"]);
        assert_eq!(forward["a"], vec!["a", "b", "a"]);
        assert_eq!(forward["top"], vec!["a", "b", "a"]);

        // Unmounting waits the other way: top only has to wait on nothing
        let reverse = stuck_on_cycles(&deps.reverse);
        assert_eq!(reverse.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_graph_accessors() {
        let graph = nested_pair();
        assert!(!graph.is_empty());
        assert!(DeviceGraph::new().is_empty());
        assert_eq!(graph.len(), 2);
        assert!(graph.contains("a"));
        assert!(!graph.contains("c"));
        assert_eq!(graph.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(graph.get("b").unwrap().target, "/mnt/b");
    }

    #[test]
    fn test_graph_deserializes_from_map() {
        let json = r#"{
            "b": {"source": "/dev/sdb", "target": "/mnt/b",
                  "commands": {"check": "c", "mount": "m", "umount": "u"}}
        }"#;
        let graph: DeviceGraph = serde_json::from_str(json).unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.get("b").unwrap().source, "/dev/sdb");
    }
}
