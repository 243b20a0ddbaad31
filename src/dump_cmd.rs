//! Dump command: print every month block of a trace file as text.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use esptrace_io::EnsembleFile;

use crate::cli::DumpArgs;
use crate::config::EspConfig;
use crate::convert;

/// Dump the header and all blocks, to a file or stdout.
pub fn run(args: DumpArgs, config: &EspConfig) -> Result<()> {
    let _cmd = info_span!("dump").entered();
    let reader_cfg = convert::build_reader_config(&config.reader)?
        .with_read_data(false)
        .with_keep_open(true);
    let conversion = convert::build_unit_conversion(&config.dump, args.multiply, args.add);

    let mut ensemble = EnsembleFile::open(&args.file, &reader_cfg)
        .with_context(|| format!("failed to open trace file: {}", args.file.display()))?;

    let summary = match args.output {
        Some(ref path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create dump file: {}", path.display()))?;
            let mut out = BufWriter::new(file);
            let summary = ensemble.dump(&mut out, conversion)?;
            out.flush()
                .with_context(|| format!("failed to write dump file: {}", path.display()))?;
            info!(path = %path.display(), "dump written");
            summary
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            ensemble.dump(&mut out, conversion)?
        }
    };

    if !summary.matches_header() {
        warn!(
            blocks = summary.blocks,
            expected = summary.expected_blocks,
            "file holds a different number of blocks than its header describes"
        );
    }
    Ok(())
}
