mod bytecode;
mod classfile;
#[cfg(test)]
mod fixtures;
mod logging;
mod opcodes;
mod report;
mod scan;
mod stats;

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use crate::report::Reporter;
use crate::scan::analyze_archive;

/// CLI arguments for jarstat execution.
#[derive(Parser, Debug)]
#[command(
    name = "jarstat",
    about = "Fast, deterministic instruction statistics for JVM class and JAR files.",
    version
)]
struct Cli {
    /// Zip-format archive of class files to analyze.
    #[arg(value_name = "ARCHIVE")]
    input: PathBuf,
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    #[arg(long)]
    quiet: bool,
    #[arg(long)]
    timing: bool,
}

fn main() -> Result<()> {
    logging::init_logging();
    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    if !cli.input.exists() {
        anyhow::bail!("input not found: {}", cli.input.display());
    }

    let started_at = Instant::now();
    let mut writer = output_writer(cli.output.as_deref())?;
    let mut reporter = Reporter::new(&mut writer);

    let scan_started_at = Instant::now();
    let output = analyze_archive(&cli.input, &mut reporter)?;
    let scan_duration_ms = scan_started_at.elapsed().as_millis();

    reporter
        .summary(&output.stats)
        .context("failed to write report")?;
    reporter.flush().context("failed to write report")?;

    if cli.timing && !cli.quiet {
        eprintln!(
            "timing: total_ms={} scan_ms={} entries={} classes={}",
            started_at.elapsed().as_millis(),
            scan_duration_ms,
            output.entry_count,
            output.stats.classes
        );
    }

    Ok(())
}

fn output_writer(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) if path == Path::new("-") => Ok(Box::new(io::stdout())),
        Some(path) => Ok(Box::new(
            File::create(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Ok(Box::new(io::stdout())),
    }
}
