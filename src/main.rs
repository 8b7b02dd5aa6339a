mod cli;
mod commands;
mod config;
mod paths;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, SelectArgs};
use devgraph::Operation;
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    /// Device config file
    pub config: PathBuf,
}

/// Log level for the `-v` count; `--quiet` wins
fn log_level(verbose: u8, quiet: bool) -> log::LevelFilter {
    if quiet {
        return log::LevelFilter::Error;
    }
    match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(log_level(cli.verbose, cli.quiet))
        .format_timestamp(None)
        .init();

    let command = cli
        .command
        .unwrap_or_else(|| Command::Check(SelectArgs::default()));

    if let Command::Completions { shell } = command {
        generate(shell, &mut Cli::command(), "mountctl", &mut io::stdout());
        return Ok(());
    }

    let ctx = Context {
        quiet: cli.quiet,
        config: paths::config_file(cli.file.as_deref())?,
    };

    match command {
        Command::Check(args) => commands::run::run(&ctx, Operation::Check, &args),
        Command::Mount(args) => commands::run::run(&ctx, Operation::Mount, &args),
        Command::Umount(args) => commands::run::run(&ctx, Operation::Umount, &args),
        Command::Deps(args) => commands::graph::deps(&ctx, &args),
        Command::Localities(args) => commands::graph::localities(&ctx, &args),
        Command::Completions { .. } => Ok(()),
    }
}
