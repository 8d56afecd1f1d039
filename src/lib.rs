//
// lib.rs
// dircompare
//
// Library entry that re-exports modules so the binary and tests can reach CLI parsing, scanning, comparison, and reporting.
//
// Thales Matheus Mendonça Santos - November 2025
//
pub mod cli;
pub mod compare;
pub mod report;
pub mod scanner;
pub mod utils;

pub use cli::{build_options, Args, Options};
pub use compare::{compare_directories, compare_scans, files_equal, Comparison};
pub use report::{ConsoleReport, ReportEvent, ReportSink, Side};
pub use scanner::{count_files_and_size, scan_dir, FileEntry, FileError, ScanResult, TreeStats};
pub use utils::bytes_to_mb;
