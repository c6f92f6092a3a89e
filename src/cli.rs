//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the provisioning compiler.
#[derive(Parser, Debug)]
#[command(
    name = "thornsec",
    about = "Network infrastructure compiler: declarative specification in, idempotent provisioning plans out",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared across subcommands.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Path to the network specification
    #[arg(short, long, global = true, default_value = "network.json")]
    pub spec: PathBuf,

    /// Disable parallel per-machine compilation (parallel is the default)
    #[arg(long = "no-parallel", global = true, action = clap::ArgAction::SetFalse)]
    pub parallel: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile execution plans for the managed servers
    Compile(CompileOpts),
    /// Load and validate the specification without compiling
    Check,
    /// Print version information
    Version,
}

/// Options for the `compile` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CompileOpts {
    /// Compile only the named machine
    #[arg(short, long)]
    pub machine: Option<String>,

    /// Emit plans as JSON instead of the readable rendering
    #[arg(long)]
    pub json: bool,
}
