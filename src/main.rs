use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dircompare::{build_options, compare_directories, Args, ConsoleReport};

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose, args.quiet);
    debug!("Parsed CLI arguments: {args:?}");

    let opts = build_options(&args)?;

    if let (Ok(a), Ok(b)) = (args.dir_a.canonicalize(), args.dir_b.canonicalize()) {
        if a == b {
            warn!("Both arguments point to the same directory: {}", a.display());
        }
    }

    let stdout = io::stdout();
    let mut report = ConsoleReport::new(BufWriter::new(stdout.lock()));
    compare_directories(&args.dir_a, &args.dir_b, &opts, &mut report)
        .context("Failed to write comparison report")?;
    report
        .into_inner()
        .flush()
        .context("Failed to flush report")?;

    Ok(())
}
