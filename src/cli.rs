use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Inspect, dump and re-encode ESP conditional trace files.
#[derive(Parser)]
#[command(
    name = "esptrace",
    version,
    about = "Inspect, dump and re-encode ESP conditional trace files"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to an optional TOML configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Print the header and a per-trace summary.
    Info(InfoArgs),
    /// Print the header and every month block as text.
    Dump(DumpArgs),
    /// Re-encode a file in another byte order.
    Swap(SwapArgs),
}

/// Arguments for the `info` subcommand.
#[derive(clap::Args)]
pub struct InfoArgs {
    /// Trace file to inspect.
    pub file: PathBuf,

    /// Only decode the header; skip the month blocks.
    #[arg(long)]
    pub header_only: bool,
}

/// Arguments for the `dump` subcommand.
#[derive(clap::Args)]
pub struct DumpArgs {
    /// Trace file to dump.
    pub file: PathBuf,

    /// Multiply every non-missing value by this factor.
    #[arg(long)]
    pub multiply: Option<f64>,

    /// Add this offset to every non-missing value after scaling.
    #[arg(long)]
    pub add: Option<f64>,

    /// Write the dump here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `swap` subcommand.
#[derive(clap::Args)]
pub struct SwapArgs {
    /// Trace file to read.
    pub input: PathBuf,

    /// New file to write; never the input itself.
    pub output: PathBuf,

    /// Byte order to write (`big` or `little`); defaults to the opposite of the input.
    #[arg(short, long)]
    pub byte_order: Option<String>,
}
