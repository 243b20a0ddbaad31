mod cli;
mod config;
mod convert;
mod dump_cmd;
mod info_cmd;
mod logging;
mod swap_cmd;

use std::process;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};
use crate::config::EspConfig;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = EspConfig::load(cli.config.as_deref())?;
    match cli.command {
        Command::Info(args) => info_cmd::run(args, &config),
        Command::Dump(args) => dump_cmd::run(args, &config),
        Command::Swap(args) => swap_cmd::run(args, &config),
    }
}
