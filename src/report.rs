use std::io::{self, Write};
use std::path::PathBuf;

use crate::scanner::TreeStats;
use crate::utils::{bytes_to_mb, display_rel};

/// Which of the two compared trees an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    Header {
        root_a: PathBuf,
        root_b: PathBuf,
    },
    TreeStats {
        root: PathBuf,
        stats: TreeStats,
    },
    /// `rel` exists under the root of `side` only.
    OnlyIn {
        side: Side,
        rel: PathBuf,
    },
    Differs {
        rel_a: PathBuf,
        rel_b: PathBuf,
    },
    FileError {
        path: PathBuf,
        message: String,
    },
    Summary {
        different: Vec<(PathBuf, PathBuf)>,
        missing: Vec<PathBuf>,
    },
}

/// Destination for comparison output.
pub trait ReportSink {
    fn emit(&mut self, event: ReportEvent) -> io::Result<()>;
}

/// Collects events in order.
impl ReportSink for Vec<ReportEvent> {
    fn emit(&mut self, event: ReportEvent) -> io::Result<()> {
        self.push(event);
        Ok(())
    }
}

/// Renders events as human-readable text.
pub struct ConsoleReport<W: Write> {
    out: W,
    root_a: PathBuf,
    root_b: PathBuf,
    stats_seen: usize,
}

impl<W: Write> ConsoleReport<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            root_a: PathBuf::new(),
            root_b: PathBuf::new(),
            stats_seen: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for ConsoleReport<W> {
    fn emit(&mut self, event: ReportEvent) -> io::Result<()> {
        match event {
            ReportEvent::Header { root_a, root_b } => {
                writeln!(self.out, "Comparing files between the directories:")?;
                writeln!(self.out, "Directory 1: {}", root_a.display())?;
                writeln!(self.out, "Directory 2: {}", root_b.display())?;
                writeln!(self.out)?;
                self.root_a = root_a;
                self.root_b = root_b;
            }
            ReportEvent::TreeStats { root, stats } => {
                writeln!(self.out, "Number of files in {}: {}", root.display(), stats.files)?;
                writeln!(
                    self.out,
                    "Directory size of {}: {:.2} MB",
                    root.display(),
                    bytes_to_mb(stats.bytes)
                )?;
                self.stats_seen += 1;
                if self.stats_seen == 2 {
                    writeln!(self.out)?;
                }
            }
            ReportEvent::OnlyIn { side, rel } => {
                let (here, there) = match side {
                    Side::A => (&self.root_a, &self.root_b),
                    Side::B => (&self.root_b, &self.root_a),
                };
                writeln!(
                    self.out,
                    "File {} exists in {}, but not in {}",
                    display_rel(&rel),
                    here.display(),
                    there.display()
                )?;
            }
            ReportEvent::Differs { rel_a, rel_b } => {
                writeln!(
                    self.out,
                    "Differences found between {} and {}",
                    display_rel(&rel_a),
                    display_rel(&rel_b)
                )?;
            }
            ReportEvent::FileError { path, message } => {
                writeln!(self.out, "Warning: could not read {}: {message}", display_rel(&path))?;
            }
            ReportEvent::Summary { different, missing } => {
                writeln!(self.out)?;
                if different.is_empty() {
                    writeln!(self.out, "Summary: No differences found between the directories.")?;
                } else {
                    writeln!(
                        self.out,
                        "Summary: The following files are different between the directories:"
                    )?;
                    for (rel_a, rel_b) in &different {
                        writeln!(
                            self.out,
                            "- {} (in {}) and {} (in {})",
                            display_rel(rel_a),
                            self.root_a.display(),
                            display_rel(rel_b),
                            self.root_b.display()
                        )?;
                    }
                }

                writeln!(self.out)?;
                if missing.is_empty() {
                    writeln!(
                        self.out,
                        "Summary: No missing files found between the directories."
                    )?;
                } else {
                    writeln!(
                        self.out,
                        "Summary: The following files exist in only one of the directories:"
                    )?;
                    for rel in &missing {
                        writeln!(self.out, "- {}", display_rel(rel))?;
                    }
                }
            }
        }
        Ok(())
    }
}
