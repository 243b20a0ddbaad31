//! Info command: print the header and a summary of each trace.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use esptrace_io::{EnsembleFile, is_missing};

use crate::cli::InfoArgs;
use crate::config::EspConfig;
use crate::convert;

/// Print the header and per-trace value counts.
pub fn run(args: InfoArgs, config: &EspConfig) -> Result<()> {
    let _cmd = info_span!("info").entered();
    let reader_cfg =
        convert::build_reader_config(&config.reader)?.with_read_data(!args.header_only);

    let ensemble = EnsembleFile::open(&args.file, &reader_cfg)
        .with_context(|| format!("failed to open trace file: {}", args.file.display()))?;
    info!(byte_order = %ensemble.byte_order(), "opened");

    println!("{}", ensemble.header());
    println!("byte order          {}", ensemble.byte_order());
    if args.header_only {
        return Ok(());
    }

    println!();
    println!(
        "{:<28} {:>8} {:>8} {:>12} {:>12}",
        "trace", "values", "present", "min", "max"
    );
    for trace in ensemble.traces() {
        let present = trace.values().iter().copied().filter(|v| !is_missing(*v));
        let (min, max) = present.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        let (min, max) = if min.is_finite() {
            (format!("{min:.4}"), format!("{max:.4}"))
        } else {
            ("-".to_string(), "-".to_string())
        };
        println!(
            "{:<28} {:>8} {:>8} {:>12} {:>12}",
            trace.identifier(),
            trace.len(),
            trace.count_present(),
            min,
            max
        );
    }
    Ok(())
}
