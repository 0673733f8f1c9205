//! Utility functions and helpers.
//!
//! This module collects the small pieces shared by the scanner, the store and
//! the command layer:
//!
//! - Path manipulation (tilde expansion, root resolution, POSIX-style relative keys)
//! - Exclusion rules (hidden components and glob ignore patterns)
//! - Timestamp helpers
//!
//! # Submodules
//!
//! - [`formatters`]: Human-readable sizes, ages and timestamps
//! - [`thread_pool`]: Worker pool configuration for parallel hashing
//!
//! # Examples
//!
//! ```
//! use witness::utils::{expand_tilde, is_hidden_component};
//!
//! # fn main() -> anyhow::Result<()> {
//! let path = expand_tilde("~/workspace")?;
//! assert!(is_hidden_component(".git"));
//! # Ok(())
//! # }
//! ```

/// Output formatting helpers (sizes, ages, timestamps)
pub mod formatters;
/// Thread pool configuration for parallel operations
pub mod thread_pool;

use anyhow::Result;
use chrono::{DateTime, Utc};
use glob::Pattern;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

/// Prefix that marks a path component as hidden. Hidden components are
/// never part of a snapshot.
pub const HIDDEN_PREFIX: char = '.';

/// Expands a path starting with `~` to the user's home directory.
///
/// # Errors
///
/// Returns an error if the path is empty.
pub fn expand_tilde(path: &str) -> Result<PathBuf> {
    if path.is_empty() {
        anyhow::bail!("Path cannot be empty");
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return Ok(home);
        }
    } else if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return Ok(home.join(rest));
    }
    Ok(PathBuf::from(path))
}

/// Resolves a scan root to an absolute path.
///
/// Existing paths are canonicalized so symlinked spellings of the same
/// directory share one identity; paths that do not exist (yet) are made
/// absolute against the current directory without touching the filesystem.
#[must_use]
pub fn resolve_root(path: &Path) -> PathBuf {
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Returns `true` if a single path component is hidden (dot-prefixed).
#[must_use]
pub fn is_hidden_component(name: &str) -> bool {
    name.starts_with(HIDDEN_PREFIX)
}

/// Converts a path relative to the scan root into the snapshot key form:
/// normal components joined with `/`, regardless of platform.
///
/// Returns `None` for paths that are empty or contain non-normal components
/// (`..`, a root, a prefix) since those cannot be snapshot keys.
#[must_use]
pub fn to_relative_key(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Compiles ignore patterns into glob matchers.
///
/// Invalid patterns are reported and skipped rather than failing the scan.
#[must_use]
pub fn compile_ignore_patterns(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|raw| match Pattern::new(raw) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                tracing::warn!(pattern = %raw, error = %e, "Ignoring invalid ignore pattern");
                None
            }
        })
        .collect()
}

/// Determines whether a relative path is excluded by the ignore patterns.
///
/// A pattern excludes a path when it matches any single component
/// (so `node_modules` prunes that directory at every depth) or the whole
/// `/`-joined relative key (so `build/*.o` works as expected).
#[must_use]
pub fn should_ignore(relative_key: &str, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|pattern| {
        pattern.matches(relative_key) || relative_key.split('/').any(|c| pattern.matches(c))
    })
}

/// Converts a filesystem time into a UTC timestamp, keeping full precision.
#[must_use]
pub fn system_time_to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}
