use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::Options;
use crate::report::{ReportEvent, ReportSink, Side};
use crate::scanner::{scan_dir, FileError, ScanResult, TreeStats};

#[derive(Debug, Default)]
pub struct Comparison {
    pub stats_a: TreeStats,
    pub stats_b: TreeStats,
    pub different: Vec<(PathBuf, PathBuf)>,
    pub only_in_a: Vec<PathBuf>,
    pub only_in_b: Vec<PathBuf>,
    pub identical: u64,
    pub errors: Vec<FileError>,
}

impl Comparison {
    /// Paths present in exactly one tree, those only in B first.
    pub fn missing_files(&self) -> impl Iterator<Item = &PathBuf> {
        self.only_in_b.iter().chain(self.only_in_a.iter())
    }
}

/// Byte-for-byte comparison. Sizes are checked first, then both files are
/// streamed and compared chunk by chunk.
pub fn files_equal(p1: &Path, p2: &Path) -> io::Result<bool> {
    let f1 = File::open(p1)?;
    let f2 = File::open(p2)?;
    if f1.metadata()?.len() != f2.metadata()?.len() {
        return Ok(false);
    }

    let mut r1 = BufReader::new(f1);
    let mut r2 = BufReader::new(f2);
    loop {
        let n = {
            let b1 = r1.fill_buf()?;
            let b2 = r2.fill_buf()?;
            if b1.is_empty() && b2.is_empty() {
                return Ok(true);
            }
            let n = b1.len().min(b2.len());
            if n == 0 || b1[..n] != b2[..n] {
                return Ok(false);
            }
            n
        };
        r1.consume(n);
        r2.consume(n);
    }
}

fn report_error(
    sink: &mut dyn ReportSink,
    comparison: &mut Comparison,
    error: FileError,
) -> Result<()> {
    sink.emit(ReportEvent::FileError {
        path: error.path.clone(),
        message: error.message.clone(),
    })?;
    comparison.errors.push(error);
    Ok(())
}

/// Whether `rel` lies under a path `scan` failed to read.
fn unreadable_in(scan: &ScanResult, rel: &Path) -> bool {
    scan.errors.iter().any(|e| rel.starts_with(&e.path))
}

/// Compares the trees under `a_root` and `b_root`, streaming findings to `sink`.
///
/// Each relative path is classified once, so nothing is reported twice.
/// Unreadable files are reported as errors and skipped; only a failing sink
/// aborts the run.
pub fn compare_directories(
    a_root: &Path,
    b_root: &Path,
    opts: &Options,
    sink: &mut dyn ReportSink,
) -> Result<Comparison> {
    sink.emit(ReportEvent::Header {
        root_a: a_root.to_path_buf(),
        root_b: b_root.to_path_buf(),
    })?;

    let scan_a = scan_dir(a_root, &opts.ignore_patterns);
    let scan_b = scan_dir(b_root, &opts.ignore_patterns);
    let comparison = compare_scans(&scan_a, &scan_b, sink)?;

    info!(
        "Compared {} and {}: {} identical, {} different, {} only in A, {} only in B, {} errors",
        a_root.display(),
        b_root.display(),
        comparison.identical,
        comparison.different.len(),
        comparison.only_in_a.len(),
        comparison.only_in_b.len(),
        comparison.errors.len()
    );

    Ok(comparison)
}

/// Classifies two finished scans. A path missing from one side is only
/// reported when that side read its location without error.
pub fn compare_scans(
    scan_a: &ScanResult,
    scan_b: &ScanResult,
    sink: &mut dyn ReportSink,
) -> Result<Comparison> {
    let mut comparison = Comparison {
        stats_a: scan_a.stats(),
        stats_b: scan_b.stats(),
        ..Default::default()
    };

    sink.emit(ReportEvent::TreeStats {
        root: scan_a.root.clone(),
        stats: comparison.stats_a,
    })?;
    sink.emit(ReportEvent::TreeStats {
        root: scan_b.root.clone(),
        stats: comparison.stats_b,
    })?;

    for error in scan_a.errors.iter().chain(&scan_b.errors) {
        report_error(sink, &mut comparison, error.clone())?;
    }

    // 1. Only in B
    for rel_b in scan_b.files.keys() {
        if !scan_a.files.contains_key(rel_b) {
            if unreadable_in(scan_a, rel_b) {
                debug!("Skipping {}: unreadable in A", rel_b.display());
                continue;
            }
            sink.emit(ReportEvent::OnlyIn {
                side: Side::B,
                rel: rel_b.clone(),
            })?;
            comparison.only_in_b.push(rel_b.clone());
        }
    }

    // 2. Only in A, or in both
    for (rel, a_file) in &scan_a.files {
        let Some(b_file) = scan_b.files.get(rel) else {
            if unreadable_in(scan_b, rel) {
                debug!("Skipping {}: unreadable in B", rel.display());
                continue;
            }
            sink.emit(ReportEvent::OnlyIn {
                side: Side::A,
                rel: rel.clone(),
            })?;
            comparison.only_in_a.push(rel.clone());
            continue;
        };

        match files_equal(&a_file.abs, &b_file.abs) {
            Ok(true) => comparison.identical += 1,
            Ok(false) => {
                debug!("Content differs: {}", rel.display());
                sink.emit(ReportEvent::Differs {
                    rel_a: rel.clone(),
                    rel_b: rel.clone(),
                })?;
                comparison.different.push((rel.clone(), rel.clone()));
            }
            Err(err) => {
                warn!("Cannot compare {}: {err}", rel.display());
                let error = FileError {
                    path: rel.clone(),
                    message: err.to_string(),
                };
                report_error(sink, &mut comparison, error)?;
            }
        }
    }

    sink.emit(ReportEvent::Summary {
        different: comparison.different.clone(),
        missing: comparison.missing_files().cloned().collect(),
    })?;

    Ok(comparison)
}
