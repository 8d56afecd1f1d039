use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub abs: PathBuf,
    pub size: u64,
}

/// File count and total byte size of one tree.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    pub files: u64,
    pub bytes: u64,
}

/// An entry that could not be read while walking or comparing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileError {
    pub path: PathBuf, // relative to the root, empty for the root itself
    pub message: String,
}

#[derive(Debug)]
pub struct ScanResult {
    pub files: BTreeMap<PathBuf, FileEntry>, // rel -> entry, sorted for stable output
    pub errors: Vec<FileError>,
    pub root: PathBuf,
}

impl ScanResult {
    pub fn stats(&self) -> TreeStats {
        TreeStats {
            files: self.files.len() as u64,
            bytes: self.files.values().map(|f| f.size).sum(),
        }
    }
}

fn is_ignored(rel: &Path, patterns: &[Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }
    let name = rel.file_name().and_then(|s| s.to_str()).unwrap_or("");
    let s_rel = rel.to_string_lossy().replace('\\', "/");
    patterns
        .iter()
        .any(|pat| pat.matches(&s_rel) || pat.matches(name))
}

fn rel_to_root(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

/// Walks `root` and collects every regular file keyed by its path relative to `root`.
///
/// Symlinks are neither followed nor collected. A root that does not exist
/// or is not a directory produces an empty scan; any other walk failure is
/// logged and recorded in `errors` without stopping the walk.
pub fn scan_dir(root: &Path, patterns: &[Pattern]) -> ScanResult {
    let mut files = BTreeMap::new();
    let mut errors = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    for entry in walker.filter_entry(|e| match e.path().strip_prefix(root) {
        Ok(rel) if rel != Path::new("") => !is_ignored(rel, patterns),
        _ => true,
    }) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                if err.depth() == 0
                    && err.io_error().map(io::Error::kind) == Some(io::ErrorKind::NotFound)
                {
                    debug!("Root {} does not exist, treating it as empty", root.display());
                    continue;
                }
                let path = err.path().unwrap_or(root);
                warn!("Cannot read {}: {err}", path.display());
                errors.push(FileError {
                    path: rel_to_root(root, path),
                    message: err.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let rel = match path.strip_prefix(root) {
            Ok(rel) if rel != Path::new("") => rel.to_path_buf(),
            Ok(_) => {
                debug!("Root {} is not a directory, treating it as empty", root.display());
                continue;
            }
            Err(_) => continue,
        };

        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(err) => {
                warn!("Cannot stat {}: {err}", path.display());
                errors.push(FileError {
                    path: rel,
                    message: err.to_string(),
                });
                continue;
            }
        };

        files.insert(
            rel,
            FileEntry {
                abs: path.to_path_buf(),
                size,
            },
        );
    }

    debug!(
        "Scanned {}: {} files, {} errors",
        root.display(),
        files.len(),
        errors.len()
    );

    ScanResult {
        files,
        errors,
        root: root.to_path_buf(),
    }
}

/// Number of regular files under `root` and the sum of their sizes.
pub fn count_files_and_size(root: &Path) -> TreeStats {
    scan_dir(root, &[]).stats()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn empty_directory_has_no_files() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        assert_eq!(count_files_and_size(dir.path()), TreeStats::default());
    }

    #[test]
    fn nonexistent_root_is_empty() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let scan = scan_dir(&dir.path().join("missing"), &[]);
        assert!(scan.files.is_empty());
        assert!(scan.errors.is_empty());
        assert_eq!(scan.stats(), TreeStats::default());
    }

    #[test]
    fn file_root_is_empty() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        write(dir.path(), "file.txt", b"x");

        let scan = scan_dir(&dir.path().join("file.txt"), &[]);
        assert!(scan.files.is_empty());
        assert!(scan.errors.is_empty());
        assert_eq!(scan.stats(), TreeStats::default());
    }

    #[test]
    fn error_paths_are_relative_to_root() {
        let root = Path::new("/data/books");
        assert_eq!(
            rel_to_root(root, Path::new("/data/books/sub/x.txt")),
            PathBuf::from("sub/x.txt")
        );
        assert_eq!(rel_to_root(root, root), PathBuf::new());
    }

    #[rstest]
    #[case("a.bin")]
    #[case("x/a.bin")]
    #[case("x/y/z/a.bin")]
    fn stats_ignore_nesting_depth(#[case] rel: &str) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        write(dir.path(), rel, &[0u8; 10]);
        write(dir.path(), "top.txt", b"12345");
        write(dir.path(), "d1/d2/deep.txt", b"");

        let stats = count_files_and_size(dir.path());
        assert_eq!(stats, TreeStats { files: 3, bytes: 15 });
    }

    #[test]
    fn directories_are_not_entries() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("only/dirs/here")).unwrap();
        write(dir.path(), "only/file.txt", b"abc");

        let scan = scan_dir(dir.path(), &[]);
        let keys: Vec<_> = scan.files.keys().cloned().collect();
        assert_eq!(keys, vec![PathBuf::from("only/file.txt")]);
        assert_eq!(scan.files[&PathBuf::from("only/file.txt")].size, 3);
    }

    #[test]
    fn ignore_patterns_prune_files_and_dirs() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        write(dir.path(), "keep.txt", b"k");
        write(dir.path(), "drop.tmp", b"d");
        write(dir.path(), "cache/inner.txt", b"c");

        let patterns = vec![Pattern::new("*.tmp").unwrap(), Pattern::new("cache").unwrap()];
        let scan = scan_dir(dir.path(), &patterns);
        let keys: Vec<_> = scan.files.keys().cloned().collect();
        assert_eq!(keys, vec![PathBuf::from("keep.txt")]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_not_collected() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        write(dir.path(), "real.txt", b"data");
        std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt"))
            .unwrap();

        let stats = count_files_and_size(dir.path());
        assert_eq!(stats, TreeStats { files: 1, bytes: 4 });
    }
}
