//! Where witness writes.
//!
//! Reports are plain lines on stdout, built by [`report`], [`narration`] and
//! [`preview`]. Status notes about the run itself go to stderr, colored, and
//! are gated by the `--quiet` / `--verbose` level.

pub mod narration;
pub mod preview;
pub mod report;

use colored::{ColoredString, Colorize};
use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};

/// How chatty stderr is. Ordered from least to most output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Warnings only
    Quiet = 0,
    /// Confirmations and hints as well
    Normal = 1,
    /// Run statistics as well
    Verbose = 2,
}

impl Verbosity {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Quiet,
            2 => Self::Verbose,
            _ => Self::Normal,
        }
    }
}

static LEVEL: AtomicU8 = AtomicU8::new(Verbosity::Normal as u8);

/// Set the level for the rest of the process. Called once from `main`.
pub fn set_verbosity(level: Verbosity) {
    LEVEL.store(level as u8, Ordering::Relaxed);
}

fn note(needs: Verbosity, styled: ColoredString) {
    if Verbosity::from_u8(LEVEL.load(Ordering::Relaxed)) >= needs {
        eprintln!("{styled}");
    }
}

/// A completed action, e.g. a saved snapshot.
pub fn success(message: &str) {
    note(Verbosity::Normal, message.green());
}

/// Something the user should look at. Shown even with `--quiet`.
pub fn warning(message: &str) {
    note(Verbosity::Quiet, message.yellow().bold());
}

/// A hint that is not part of the report.
pub fn info(message: &str) {
    note(Verbosity::Normal, message.dimmed());
}

/// Detail for `--verbose` runs.
pub fn verbose(message: &str) {
    note(Verbosity::Verbose, message.dimmed());
}

/// Writes report lines to stdout and flushes.
///
/// A closed pipe (e.g. `witness list | head`) is not an error.
pub fn print_lines<I, S>(lines: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in lines {
        if writeln!(out, "{}", line.as_ref()).is_err() {
            return;
        }
    }
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(Verbosity::Quiet < Verbosity::Normal);
        assert!(Verbosity::Normal < Verbosity::Verbose);
    }

    #[test]
    fn test_from_u8_matches_discriminants() {
        for level in [Verbosity::Quiet, Verbosity::Normal, Verbosity::Verbose] {
            assert_eq!(Verbosity::from_u8(level as u8), level);
        }
        assert_eq!(Verbosity::from_u8(200), Verbosity::Normal);
    }
}
