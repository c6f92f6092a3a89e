//! Binary entry point.

use anyhow::Result;
use clap::Parser;

use thornsec::{cli, commands, logging};

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    logging::init(args.verbose);

    match args.command {
        cli::Command::Compile(opts) => commands::compile::run(&args.global, &opts),
        cli::Command::Check => commands::check::run(&args.global),
        cli::Command::Version => {
            let version = option_env!("THORNSEC_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
            print_version(version);
            Ok(())
        }
    }
}

#[allow(clippy::print_stdout)]
fn print_version(version: &str) {
    println!("thornsec {version}");
}
