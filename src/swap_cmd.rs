//! Swap command: re-encode a trace file in another byte order.

use anyhow::{Context, Result, bail};
use tracing::{info, info_span};

use esptrace_io::EnsembleFile;

use crate::cli::SwapArgs;
use crate::config::EspConfig;
use crate::convert;

/// Read `input` and write it to the new file `output`.
pub fn run(args: SwapArgs, config: &EspConfig) -> Result<()> {
    let _cmd = info_span!("swap").entered();
    if args.input == args.output {
        bail!("output must be a new file, not the input itself");
    }

    let reader_cfg = convert::build_reader_config(&config.reader)?;
    let ensemble = EnsembleFile::open(&args.input, &reader_cfg)
        .with_context(|| format!("failed to open trace file: {}", args.input.display()))?;

    let writer_cfg = convert::build_writer_config(
        &config.writer,
        args.byte_order.as_deref(),
        ensemble.byte_order().swapped(),
    )?;
    info!(
        from = %ensemble.byte_order(),
        to = %writer_cfg.byte_order(),
        "re-encoding"
    );

    ensemble
        .write(&args.output, &writer_cfg)
        .with_context(|| format!("failed to write trace file: {}", args.output.display()))?;
    info!(path = %args.output.display(), "trace file written");
    Ok(())
}
