//! Files that have not been modified for a while.
//!
//! Everything here is a pure function of a [`Snapshot`] and a reference
//! time. A "project" is a top-level directory of the scanned root; files
//! directly in the root belong to the [`ROOT_PROJECT`] group.

use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Group name for files that sit directly in the scanned root.
pub const ROOT_PROJECT: &str = ".";

/// Projects idle for longer than this are reported as stale.
pub const STALE_AFTER: Duration = Duration::from_secs(24 * 3600);

/// A file whose last modification is older than the threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DormantFile {
    /// Path relative to the snapshot root
    pub relative_path: String,
    /// Time since last modification
    pub age: Duration,
}

/// Files in `snapshot` not modified within `threshold` of `now`, oldest first.
///
/// Files with a modification time in the future are never dormant.
#[must_use]
pub fn find_dormant(snapshot: &Snapshot, threshold: Duration, now: DateTime<Utc>) -> Vec<DormantFile> {
    let mut dormant: Vec<DormantFile> = snapshot
        .files()
        .values()
        .filter_map(|record| {
            let age = (now - record.modified).to_std().ok()?;
            (age > threshold).then(|| DormantFile {
                relative_path: record.relative_path.clone(),
                age,
            })
        })
        .collect();

    dormant.sort_by(|a, b| {
        b.age
            .cmp(&a.age)
            .then_with(|| a.relative_path.cmp(&b.relative_path))
    });
    dormant
}

/// Dormant files of one project, paths relative to the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDormancy {
    /// Top-level directory name, or [`ROOT_PROJECT`]
    pub name: String,
    /// Oldest first
    pub files: Vec<DormantFile>,
}

/// Split `key` into its project and the path inside it.
fn split_project(key: &str) -> (&str, &str) {
    key.split_once('/').unwrap_or((ROOT_PROJECT, key))
}

/// Group dormant files by project, projects sorted by name.
///
/// The relative order of files within a project is kept, so grouping the
/// output of [`find_dormant`] yields oldest-first lists.
#[must_use]
pub fn group_by_project(dormant: &[DormantFile]) -> Vec<ProjectDormancy> {
    let mut groups: BTreeMap<&str, Vec<DormantFile>> = BTreeMap::new();
    for file in dormant {
        let (project, inner) = split_project(&file.relative_path);
        groups.entry(project).or_default().push(DormantFile {
            relative_path: inner.to_string(),
            age: file.age,
        });
    }

    groups
        .into_iter()
        .map(|(name, files)| ProjectDormancy {
            name: name.to_string(),
            files,
        })
        .collect()
}

/// How recently a project saw a modification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectActivity {
    /// Top-level directory name, or [`ROOT_PROJECT`]
    pub name: String,
    /// Time since the newest modification in the project
    pub idle: Duration,
    /// Files in the project
    pub file_count: usize,
}

impl ProjectActivity {
    /// Whether the project has been idle for longer than [`STALE_AFTER`].
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.idle > STALE_AFTER
    }
}

/// Projects ranked by most recent modification, most active first.
///
/// A modification time in the future counts as activity right now.
#[must_use]
pub fn rank_by_activity(snapshot: &Snapshot, now: DateTime<Utc>) -> Vec<ProjectActivity> {
    let mut projects: BTreeMap<&str, (DateTime<Utc>, usize)> = BTreeMap::new();
    for record in snapshot.files().values() {
        let (project, _) = split_project(&record.relative_path);
        let entry = projects.entry(project).or_insert((record.modified, 0));
        entry.0 = entry.0.max(record.modified);
        entry.1 += 1;
    }

    let mut ranked: Vec<ProjectActivity> = projects
        .into_iter()
        .map(|(name, (newest, file_count))| ProjectActivity {
            name: name.to_string(),
            idle: (now - newest).to_std().unwrap_or(Duration::ZERO),
            file_count,
        })
        .collect();
    ranked.sort_by(|a, b| a.idle.cmp(&b.idle).then_with(|| a.name.cmp(&b.name)));
    ranked
}

/// Remembers which files were dormant at the previous check.
#[derive(Debug, Default)]
pub struct DormancyTracker {
    previous: BTreeSet<String>,
}

impl DormancyTracker {
    /// Files in `current` that were not dormant at the previous check, in
    /// `current`'s order.
    ///
    /// On the first call every dormant file is new. A file that is touched
    /// and later goes quiet again is reported again.
    pub fn update(&mut self, current: &[DormantFile]) -> Vec<DormantFile> {
        let newly: Vec<DormantFile> = current
            .iter()
            .filter(|d| !self.previous.contains(&d.relative_path))
            .cloned()
            .collect();
        self.previous = current.iter().map(|d| d.relative_path.clone()).collect();
        newly
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::fixtures::{at, record};
    use std::path::PathBuf;

    fn aged(path: &str, modified_secs: i64) -> crate::snapshot::FileRecord {
        let mut r = record(path, path);
        r.modified = at(modified_secs);
        r
    }

    #[test]
    fn test_threshold_and_order() {
        let now = at(100_000);
        let snapshot = Snapshot::new(
            PathBuf::from("/r"),
            now,
            [
                aged("fresh.txt", 99_990),
                aged("old.txt", 10_000),
                aged("older.txt", 1_000),
                aged("edge.txt", 100_000 - 3600),
            ],
        );

        let dormant = find_dormant(&snapshot, Duration::from_secs(3600), now);
        let paths: Vec<&str> = dormant.iter().map(|d| d.relative_path.as_str()).collect();

        assert_eq!(paths, vec!["older.txt", "old.txt"]);
        assert_eq!(dormant[0].age, Duration::from_secs(99_000));
    }

    #[test]
    fn test_future_mtime_not_dormant() {
        let now = at(1_000);
        let snapshot = Snapshot::new(PathBuf::from("/r"), now, [aged("ahead.txt", 5_000)]);
        assert!(find_dormant(&snapshot, Duration::ZERO, now).is_empty());
    }

    #[test]
    fn test_equal_ages_sorted_by_path() {
        let now = at(10_000);
        let snapshot = Snapshot::new(
            PathBuf::from("/r"),
            now,
            [aged("b", 0), aged("a", 0)],
        );
        let dormant = find_dormant(&snapshot, Duration::from_secs(1), now);
        assert_eq!(dormant[0].relative_path, "a");
        assert_eq!(dormant[1].relative_path, "b");
    }

    #[test]
    fn test_group_by_project() {
        let now = at(100_000);
        let snapshot = Snapshot::new(
            PathBuf::from("/workspace"),
            now,
            [
                aged("alpha/src/lib.rs", 1_000),
                aged("alpha/notes.md", 5_000),
                aged("beta/main.py", 2_000),
                aged("loose.txt", 3_000),
                aged("beta/fresh.py", 99_999),
            ],
        );

        let groups = group_by_project(&find_dormant(&snapshot, Duration::from_secs(60), now));
        let shape: Vec<(&str, Vec<&str>)> = groups
            .iter()
            .map(|g| {
                (
                    g.name.as_str(),
                    g.files.iter().map(|f| f.relative_path.as_str()).collect(),
                )
            })
            .collect();

        assert_eq!(
            shape,
            vec![
                (".", vec!["loose.txt"]),
                ("alpha", vec!["src/lib.rs", "notes.md"]),
                ("beta", vec!["main.py"]),
            ]
        );
        assert_eq!(groups[1].files[0].age, Duration::from_secs(99_000));
    }

    #[test]
    fn test_rank_by_activity() {
        let day = 24 * 3600;
        let now = at(10 * day);
        let snapshot = Snapshot::new(
            PathBuf::from("/workspace"),
            now,
            [
                aged("busy/a.rs", 10 * day - 60),
                aged("busy/b.rs", day),
                aged("quiet/old.rs", 2 * day),
                aged("quiet/older.rs", day),
                aged("ahead/clock.rs", 11 * day),
            ],
        );

        let ranked = rank_by_activity(&snapshot, now);
        let names: Vec<&str> = ranked.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["ahead", "busy", "quiet"]);

        assert_eq!(ranked[0].idle, Duration::ZERO);
        assert_eq!(ranked[1].idle, Duration::from_secs(60));
        assert_eq!(ranked[1].file_count, 2);
        assert_eq!(ranked[2].idle, Duration::from_secs(8 * day as u64));

        let stale: Vec<&str> = ranked
            .iter()
            .filter(|p| p.is_stale())
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(stale, ["quiet"]);
    }

    #[test]
    fn test_rank_empty_snapshot() {
        let now = at(0);
        let snapshot = Snapshot::new(PathBuf::from("/r"), now, []);
        assert!(rank_by_activity(&snapshot, now).is_empty());
    }

    #[test]
    fn test_tracker_reports_only_new_dormancy() {
        let file = |path: &str, secs: u64| DormantFile {
            relative_path: path.to_string(),
            age: Duration::from_secs(secs),
        };
        let mut tracker = DormancyTracker::default();

        let first = tracker.update(&[file("a", 10), file("b", 5)]);
        assert_eq!(first.len(), 2);

        assert!(tracker.update(&[file("a", 20), file("b", 15)]).is_empty());

        let third = tracker.update(&[file("a", 30), file("c", 2)]);
        assert_eq!(third, vec![file("c", 2)]);

        // b was touched, then went quiet again
        let fourth = tracker.update(&[file("a", 40), file("b", 3), file("c", 12)]);
        assert_eq!(fourth, vec![file("b", 3)]);
    }
}
