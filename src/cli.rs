use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use glob::Pattern;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// First directory to compare (A)
    #[arg(env = "DIRCOMPARE_DIR_A")]
    pub dir_a: PathBuf,

    /// Second directory to compare (B)
    #[arg(env = "DIRCOMPARE_DIR_B")]
    pub dir_b: PathBuf,

    /// Glob patterns to ignore (can be repeated or comma separated)
    #[arg(short, long, value_delimiter = ',', num_args = 1..)]
    pub ignore: Vec<String>,

    /// Log walk and comparison details to stderr
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Default)]
pub struct Options {
    pub ignore_patterns: Vec<Pattern>,
}

pub fn build_options(args: &Args) -> Result<Options> {
    let patterns = args
        .ignore
        .iter()
        .map(|s| Pattern::new(s).with_context(|| format!("Invalid glob pattern: {s}")))
        .collect::<Result<Vec<_>>>()?;

    Ok(Options {
        ignore_patterns: patterns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_roots_and_comma_separated_ignores() {
        let args = Args::parse_from(["dircompare", "out/books", "books", "-i", "*.tmp,cache/*"]);
        assert_eq!(args.dir_a, PathBuf::from("out/books"));
        assert_eq!(args.dir_b, PathBuf::from("books"));

        let opts = build_options(&args).unwrap();
        assert_eq!(opts.ignore_patterns.len(), 2);
        assert!(opts.ignore_patterns[0].matches("notes.tmp"));
    }

    #[test]
    fn rejects_invalid_glob() {
        let args = Args::parse_from(["dircompare", "a", "b", "--ignore", "[unclosed"]);
        let err = build_options(&args).unwrap_err();
        assert!(err.to_string().contains("[unclosed"));
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        let res = Args::try_parse_from(["dircompare", "a", "b", "-v", "-q"]);
        assert!(res.is_err());
    }
}
