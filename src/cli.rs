use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::paths::ENV_CONFIG_FILE;

#[derive(Parser)]
#[command(name = "mountctl")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Mount and unmount devices in dependency order", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v shows commands as they run)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Device config file (JSON or TOML, optionally .gpg encrypted)
    #[arg(short, long, global = true, env = ENV_CONFIG_FILE)]
    pub file: Option<PathBuf>,

    /// Defaults to `check` over every device
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Report whether devices are mounted
    Check(SelectArgs),

    /// Mount devices, dependencies first
    Mount(SelectArgs),

    /// Unmount devices, dependents first
    Umount(SelectArgs),

    /// Show which devices sit on which
    Deps(ReportArgs),

    /// Show the inferred locality of every device
    Localities(ReportArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Selection
// ============================================================================

#[derive(Args, Debug, Default)]
pub struct SelectArgs {
    /// Device names (all devices when no names or filters are given)
    pub names: Vec<String>,

    /// Add every local device
    #[arg(short, long)]
    pub local: bool,

    /// Add every remote device
    #[arg(short, long)]
    pub remote: bool,

    /// Add every device of unknown locality
    #[arg(short, long)]
    pub unknown: bool,

    /// Number of devices started in parallel (0 = one per CPU)
    #[arg(short, long, default_value = "0")]
    pub jobs: usize,
}

impl SelectArgs {
    /// True when no name or filter narrows the selection
    pub fn selects_all(&self) -> bool {
        self.names.is_empty() && !self.local && !self.remote && !self.unknown
    }
}

#[derive(Args, Debug, Default)]
pub struct ReportArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
