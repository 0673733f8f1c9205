//! Snapshot comparison.
//!
//! [`diff`] classifies every path in the union of two snapshots exactly once:
//! created, deleted, modified (digest differs) or unchanged (digest equal).
//! Size and modification time never influence the outcome. Entries come out
//! ordered by relative path; grouping by kind is left to the presentation
//! layer.

use crate::snapshot::{FileRecord, Snapshot, SnapshotSummary};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// How a path changed between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Present only in the newer snapshot.
    Created,
    /// Present in both with different content.
    Modified,
    /// Present only in the older snapshot.
    Deleted,
}

impl ChangeKind {
    /// All kinds in report order.
    pub const ALL: [Self; 3] = [Self::Created, Self::Modified, Self::Deleted];

    /// Single-character marker used in plain listings.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Created => '+',
            Self::Modified => '~',
            Self::Deleted => '-',
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One detected difference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeEntry {
    /// Classification
    pub kind: ChangeKind,
    /// Relative path of the file
    pub relative_path: String,
}

/// Classified differences between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    /// The older snapshot.
    pub from: SnapshotSummary,
    /// The newer snapshot.
    pub to: SnapshotSummary,
    /// Changes in ascending relative-path order.
    pub entries: Vec<ChangeEntry>,
    /// Paths present in both snapshots with equal digests.
    pub unchanged_count: usize,
}

impl DiffResult {
    /// Whether anything changed.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Entries of one kind, still in path order.
    pub fn of_kind(&self, kind: ChangeKind) -> impl Iterator<Item = &ChangeEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    /// Number of entries of one kind.
    #[must_use]
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Number of distinct paths across both snapshots.
    #[must_use]
    pub fn total_paths(&self) -> usize {
        self.entries.len() + self.unchanged_count
    }
}

/// Compare `previous` against `current`.
///
/// Pure and deterministic: no I/O, inputs untouched.
#[must_use]
pub fn diff(previous: &Snapshot, current: &Snapshot) -> DiffResult {
    let mut entries = Vec::new();
    let mut unchanged_count = 0;

    let mut before = previous.files().iter().peekable();
    let mut after = current.files().iter().peekable();

    // Both maps iterate in ascending key order, so a merge walk visits the
    // union in order and classifies each path once.
    loop {
        let step = match (before.peek(), after.peek()) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some((old_key, _)), Some((new_key, _))) => old_key.cmp(new_key),
        };

        match step {
            Ordering::Less => {
                if let Some((path, _)) = before.next() {
                    entries.push(entry(ChangeKind::Deleted, path));
                }
            }
            Ordering::Greater => {
                if let Some((path, _)) = after.next() {
                    entries.push(entry(ChangeKind::Created, path));
                }
            }
            Ordering::Equal => {
                if let (Some((path, old)), Some((_, new))) = (before.next(), after.next()) {
                    if content_changed(old, new) {
                        entries.push(entry(ChangeKind::Modified, path));
                    } else {
                        unchanged_count += 1;
                    }
                }
            }
        }
    }

    DiffResult {
        from: previous.summary(),
        to: current.summary(),
        entries,
        unchanged_count,
    }
}

fn content_changed(old: &FileRecord, new: &FileRecord) -> bool {
    old.digest != new.digest
}

fn entry(kind: ChangeKind, path: &str) -> ChangeEntry {
    ChangeEntry {
        kind,
        relative_path: path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::ContentDigest;
    use crate::snapshot::fixtures::{at, record, snapshot};
    use std::path::PathBuf;

    fn paths(result: &DiffResult, kind: ChangeKind) -> Vec<&str> {
        result
            .of_kind(kind)
            .map(|e| e.relative_path.as_str())
            .collect()
    }

    #[test]
    fn test_identical_snapshots() {
        let a = snapshot(&[("a.txt", "x"), ("b/c.txt", "y")]);
        let result = diff(&a, &a);

        assert!(!result.has_changes());
        assert_eq!(result.unchanged_count, 2);
        assert_eq!(result.from, result.to);
    }

    #[test]
    fn test_created_modified_deleted() {
        let before = snapshot(&[("a.txt", "x"), ("b.txt", "y")]);
        let after = snapshot(&[("a.txt", "z"), ("c.txt", "w")]);

        let result = diff(&before, &after);

        assert_eq!(paths(&result, ChangeKind::Modified), vec!["a.txt"]);
        assert_eq!(paths(&result, ChangeKind::Deleted), vec!["b.txt"]);
        assert_eq!(paths(&result, ChangeKind::Created), vec!["c.txt"]);
        assert_eq!(result.unchanged_count, 0);
        assert_eq!(result.total_paths(), 3);
    }

    #[test]
    fn test_entries_sorted_by_path_across_kinds() {
        let before = snapshot(&[("b.txt", "1"), ("d.txt", "1")]);
        let after = snapshot(&[("a.txt", "1"), ("b.txt", "2"), ("c.txt", "1")]);

        let result = diff(&before, &after);
        let ordered: Vec<(&str, ChangeKind)> = result
            .entries
            .iter()
            .map(|e| (e.relative_path.as_str(), e.kind))
            .collect();

        assert_eq!(
            ordered,
            vec![
                ("a.txt", ChangeKind::Created),
                ("b.txt", ChangeKind::Modified),
                ("c.txt", ChangeKind::Created),
                ("d.txt", ChangeKind::Deleted),
            ]
        );
    }

    #[test]
    fn test_metadata_only_change_is_unchanged() {
        let before = snapshot(&[("a.txt", "same")]);
        let mut touched = record("a.txt", "same");
        touched.modified = at(1_800_000_000);
        touched.size = 999;
        let after = Snapshot::new(PathBuf::from("/watched"), at(1_800_000_001), [touched]);

        let result = diff(&before, &after);
        assert!(!result.has_changes());
        assert_eq!(result.unchanged_count, 1);
    }

    #[test]
    fn test_unreadable_transitions() {
        let mut locked = record("a.txt", "x");
        locked.digest = ContentDigest::Unreadable;
        let readable = snapshot(&[("a.txt", "x")]);
        let unreadable = Snapshot::new(PathBuf::from("/watched"), at(0), [locked]);

        assert_eq!(diff(&readable, &unreadable).count(ChangeKind::Modified), 1);
        assert_eq!(diff(&unreadable, &unreadable).unchanged_count, 1);
    }

    #[test]
    fn test_empty_snapshots() {
        let empty = snapshot(&[]);
        let result = diff(&empty, &empty);
        assert!(result.entries.is_empty());
        assert_eq!(result.unchanged_count, 0);

        let full = snapshot(&[("a", "1"), ("b", "2")]);
        assert_eq!(diff(&empty, &full).count(ChangeKind::Created), 2);
        assert_eq!(diff(&full, &empty).count(ChangeKind::Deleted), 2);
    }

    #[test]
    fn test_summaries_identify_inputs() {
        let before = snapshot(&[("a", "1")]);
        let after = Snapshot::new(PathBuf::from("/elsewhere"), at(9), [record("a", "1")]);
        let result = diff(&before, &after);

        assert_eq!(result.from.root, PathBuf::from("/watched"));
        assert_eq!(result.to.root, PathBuf::from("/elsewhere"));
        assert_eq!(result.to.captured_at, at(9));
        assert_eq!(result.from.file_count, 1);
    }

    #[test]
    fn test_kind_symbols() {
        assert_eq!(ChangeKind::Created.symbol(), '+');
        assert_eq!(ChangeKind::Modified.symbol(), '~');
        assert_eq!(ChangeKind::Deleted.symbol(), '-');
        assert_eq!(ChangeKind::Modified.to_string(), "modified");
    }
}
