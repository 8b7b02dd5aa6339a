//! # Devgraph
//!
//! Dependency-ordered mount orchestration.
//!
//! Devices are named resources with a source path, a target path and shell
//! commands to check, mount and unmount them. Dependencies are never declared:
//! a device depends on every other device whose target is a prefix of its
//! source.
//!
//! ## Core Concepts
//!
//! - **DeviceGraph**: all configured devices, keyed by name
//! - **Dependencies**: direct (what a device sits on) and reverse (what sits on it) edges
//! - **Locality**: local, remote or unknown, inferred through the graph
//! - **Executor**: memoized per-device tasks; each runs its action at most once,
//!   after all of its dependencies completed
//!
//! ## Example
//!
//! ```ignore
//! use devgraph::{Device, DeviceGraph, NoReport, ShellRunner, mount_tasks};
//!
//! let graph = DeviceGraph::new()
//!     .with_device("disk", Device::new("/dev/sdb1", "/srv")
//!         .with_commands("mountpoint -q \"$target\"", "mount \"$source\" \"$target\"", "umount \"$target\""))
//!     .with_device("media", Device::new("/srv/media.img", "/srv/media")
//!         .with_commands("mountpoint -q \"$target\"", "mount -o loop \"$source\" \"$target\"", "umount \"$target\""));
//!
//! let runner = ShellRunner::new();
//! let tasks = mount_tasks(&graph, &runner, &NoReport);
//!
//! // Mounts "disk" first, then "media"
//! tasks.run("media")?;
//! ```
//!
//! ## Provider Traits
//!
//! - [`CommandRunner`]: runs one command step for a device
//! - [`Reporter`]: observes mounted/unmounted/error transitions
//!
//! This keeps the crate free of terminal and process concerns; tests drive
//! the executor with in-memory runners.

pub mod context;
pub mod error;
pub mod executor;
pub mod graph;
pub mod locality;
pub mod operations;
pub mod shell;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use context::{CommandRunner, NoReport, Reporter};
pub use error::{Error, Result};
pub use executor::{Action, Executor, Outcome};
pub use graph::{Adjacency, Dependencies, DeviceGraph, find_cycle, stuck_on_cycles};
pub use locality::{infer_localities, localities};
pub use operations::{check_tasks, mount_tasks, umount_tasks};
pub use shell::{COMMAND_LOG_LEVEL, ShellRunner};
pub use types::{CommandStatus, Commands, Device, Direction, Locality, Operation, Step};
