use super::ScanOptions;
use crate::utils::{self, is_hidden_component, should_ignore, to_relative_key};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use glob::Pattern;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A file found by the walk, before fingerprinting.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Absolute path used for reading.
    pub absolute: PathBuf,
    /// Snapshot key relative to the root.
    pub key: String,
    /// Size and mtime, or `None` if the file vanished or could not be
    /// stat'ed between listing and inspection.
    pub stat: Option<(u64, DateTime<Utc>)>,
}

/// Outcome of walking a root.
#[derive(Debug)]
pub enum Walk {
    /// The root does not exist or is not a directory.
    Missing,
    /// Files that passed every exclusion rule, in walk order.
    Found(Vec<Candidate>),
}

/// Walk `root` depth-first and collect every included regular file.
///
/// Unreadable subdirectories are skipped with a warning. Failing to read the
/// root itself is an error, except when it has disappeared, which counts as
/// [`Walk::Missing`].
pub fn discover(root: &Path, options: &ScanOptions, patterns: &[Pattern]) -> Result<Walk> {
    if !root.is_dir() {
        return Ok(Walk::Missing);
    }

    let mut walker = WalkDir::new(root)
        .follow_links(options.follow_symlinks)
        .min_depth(1);
    if let Some(depth) = options.effective_max_depth() {
        walker = walker.max_depth(depth);
    }

    let mut candidates = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|e| is_included(e, root, patterns))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                if err.io_error().is_some_and(|e| e.kind() == ErrorKind::NotFound) {
                    return Ok(Walk::Missing);
                }
                return Err(err)
                    .with_context(|| format!("Failed to read scan root: {}", root.display()));
            }
            Err(err) => {
                tracing::warn!(
                    path = ?err.path(),
                    error = %err,
                    "Skipping unreadable entry"
                );
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(key) = entry
            .path()
            .strip_prefix(root)
            .ok()
            .and_then(to_relative_key)
        else {
            continue;
        };

        let stat = entry.metadata().ok().and_then(|metadata| {
            let modified = metadata.modified().ok()?;
            Some((metadata.len(), utils::system_time_to_utc(modified)))
        });

        candidates.push(Candidate {
            absolute: entry.into_path(),
            key,
            stat,
        });
    }

    Ok(Walk::Found(candidates))
}

/// Exclusion policy for one walk entry. Rejecting a directory prunes its
/// whole subtree.
fn is_included(entry: &DirEntry, root: &Path, patterns: &[Pattern]) -> bool {
    if entry.depth() == 0 {
        return true;
    }

    if is_hidden_component(&entry.file_name().to_string_lossy()) {
        return false;
    }

    if patterns.is_empty() {
        return true;
    }

    entry
        .path()
        .strip_prefix(root)
        .ok()
        .and_then(to_relative_key)
        .is_none_or(|key| !should_ignore(&key, patterns))
}
