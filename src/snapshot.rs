//! Point-in-time records of a directory subtree.
//!
//! A [`Snapshot`] maps POSIX-style relative paths to [`FileRecord`]s. It is
//! built once by the scanner (or decoded from the store) and never mutated;
//! all accessors hand out shared references.

use crate::fingerprint::ContentDigest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One observed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the scan root, `/`-separated. Unique within a snapshot.
    pub relative_path: String,
    /// Last modification time as reported by the filesystem.
    pub modified: DateTime<Utc>,
    /// Size in bytes.
    pub size: u64,
    /// Content fingerprint, or the unreadable sentinel.
    pub digest: ContentDigest,
}

/// Identifying metadata of a snapshot, without its records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    /// Resolved root that was scanned.
    pub root: PathBuf,
    /// When the scan started.
    pub captured_at: DateTime<Utc>,
    /// Number of files in the snapshot.
    pub file_count: usize,
}

/// Immutable state of a directory subtree at one moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    root: PathBuf,
    captured_at: DateTime<Utc>,
    files: BTreeMap<String, FileRecord>,
}

impl Snapshot {
    /// Build a snapshot from records. Records are keyed by their relative
    /// path; a later record with the same path replaces an earlier one.
    #[must_use]
    pub fn new<I>(root: PathBuf, captured_at: DateTime<Utc>, records: I) -> Self
    where
        I: IntoIterator<Item = FileRecord>,
    {
        let files = records
            .into_iter()
            .map(|record| (record.relative_path.clone(), record))
            .collect();
        Self {
            root,
            captured_at,
            files,
        }
    }

    /// A snapshot with no files.
    #[must_use]
    pub const fn empty(root: PathBuf, captured_at: DateTime<Utc>) -> Self {
        Self {
            root,
            captured_at,
            files: BTreeMap::new(),
        }
    }

    /// Resolved root path that was scanned.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// When the scan started.
    #[must_use]
    pub const fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// All records keyed by relative path, in ascending path order.
    #[must_use]
    pub const fn files(&self) -> &BTreeMap<String, FileRecord> {
        &self.files
    }

    /// Look up one record.
    #[must_use]
    pub fn get(&self, relative_path: &str) -> Option<&FileRecord> {
        self.files.get(relative_path)
    }

    /// Whether a path is present.
    #[must_use]
    pub fn contains(&self, relative_path: &str) -> bool {
        self.files.contains_key(relative_path)
    }

    /// Relative paths in ascending order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the snapshot holds no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all recorded files in bytes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.values().map(|r| r.size).sum()
    }

    /// Identifying metadata for reports and listings.
    #[must_use]
    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            root: self.root.clone(),
            captured_at: self.captured_at,
            file_count: self.files.len(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    /// Fixed timestamp for hand-built snapshots.
    pub fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
    }

    /// Record whose digest is derived from `content`.
    pub fn record(path: &str, content: &str) -> FileRecord {
        FileRecord {
            relative_path: path.to_string(),
            modified: at(1_700_000_000),
            size: content.len() as u64,
            digest: ContentDigest::of_bytes(content.as_bytes()),
        }
    }

    /// Snapshot from `(path, content)` pairs.
    pub fn snapshot(entries: &[(&str, &str)]) -> Snapshot {
        Snapshot::new(
            PathBuf::from("/watched"),
            at(1_700_000_100),
            entries.iter().map(|(p, c)| record(p, c)),
        )
    }
}
