//! Archive walking: enumerates class-file entries of a zip archive in entry
//! order and drives the parse → decode → tally pipeline for each one.
//!
//! Any I/O, class-file, or bytecode failure aborts the whole scan with a
//! context chain naming the archive, entry, method, and offset. No partial
//! statistics survive a failed run.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;
use zip::ZipArchive;

use crate::bytecode;
use crate::classfile::ClassFile;
use crate::report::Reporter;
use crate::stats::Statistics;

/// Result of a complete archive scan.
#[derive(Debug)]
pub(crate) struct ScanOutput {
    pub(crate) stats: Statistics,
    /// Number of `.class` entries processed.
    pub(crate) entry_count: usize,
}

/// Scans one archive, writing trace lines as entries are visited.
///
/// Entries are processed strictly in archive order; only the final summary is
/// withheld until the scan finished cleanly.
pub(crate) fn analyze_archive<W: Write>(
    path: &Path,
    reporter: &mut Reporter<W>,
) -> Result<ScanOutput> {
    let base_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());
    reporter
        .archive_header(&base_name)
        .context("failed to write report")?;

    let file =
        fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut archive =
        ZipArchive::new(file).with_context(|| format!("failed to read {}", path.display()))?;
    debug!(entries = archive.len(), archive = %path.display(), "scanning archive");

    let mut stats = Statistics::default();
    let mut entry_count = 0;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if !name.ends_with(".class") {
            continue;
        }
        entry_count += 1;
        reporter.entry(&name).context("failed to write report")?;

        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .with_context(|| format!("failed to read {}:{}", path.display(), name))?;
        analyze_class(&data, reporter, &mut stats)
            .with_context(|| format!("failed to analyze {}:{}", path.display(), name))?;
    }

    debug!(
        classes = stats.classes,
        methods = stats.methods,
        instructions = stats.instructions,
        "scan complete"
    );
    Ok(ScanOutput { stats, entry_count })
}

fn analyze_class<W: Write>(
    data: &[u8],
    reporter: &mut Reporter<W>,
    stats: &mut Statistics,
) -> Result<()> {
    let class_file = ClassFile::parse(data).context("malformed class file")?;
    let class_name = class_file
        .name()
        .context("failed to resolve class name")?
        .to_string();
    reporter.class(&class_name).context("failed to write report")?;
    stats.record_class();

    for method in &class_file.methods {
        let method_name = class_file
            .method_name(method)
            .with_context(|| format!("failed to resolve a method name in {class_name}"))?;
        let descriptor = class_file
            .method_descriptor(method)
            .with_context(|| format!("failed to resolve a method descriptor in {class_name}"))?;
        reporter
            .method(method_name, descriptor)
            .context("failed to write report")?;

        if let Some(code) = &method.code {
            let instructions = bytecode::decode(&code.code).with_context(|| {
                format!("malformed bytecode in {class_name}.{method_name}{descriptor}")
            })?;
            stats.record_method(&instructions);
        }
    }

    Ok(())
}
