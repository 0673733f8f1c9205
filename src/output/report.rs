//! Plain-text reports for scan results and diffs.
//!
//! Renderers return lines instead of printing so commands decide where they
//! go and tests can inspect them.

use crate::diff::{ChangeEntry, ChangeKind, DiffResult};
use crate::dormant::{DormantFile, ProjectActivity, ProjectDormancy, STALE_AFTER};
use crate::snapshot::{Snapshot, SnapshotSummary};
use crate::storage::StoredSnapshotInfo;
use crate::utils::formatters::{format_age, format_clock, format_timestamp};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Paths listed by [`render_scan`].
pub const SCAN_PREVIEW: usize = 5;

/// Width of the heavy rules around report titles.
const BANNER_WIDTH: usize = 60;

/// Width of the light section separators.
const RULE_WIDTH: usize = 40;

/// How change groups are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupLayout {
    /// Group order.
    pub order: [ChangeKind; 3],
    /// Heading for the created group.
    pub created_label: &'static str,
    /// Prefix for every line.
    pub indent: &'static str,
    /// Paths shown per group before eliding.
    pub limit: usize,
}

impl GroupLayout {
    /// `NEW`, `MODIFIED`, `DELETED`, indented: the diff-against-last report.
    #[must_use]
    pub const fn last_scan(limit: usize) -> Self {
        Self {
            order: [ChangeKind::Created, ChangeKind::Modified, ChangeKind::Deleted],
            created_label: "NEW",
            indent: "  ",
            limit,
        }
    }

    /// `CREATED`, `DELETED`, `MODIFIED`, flush left: the named comparison.
    #[must_use]
    pub const fn comparison(limit: usize) -> Self {
        Self {
            order: [ChangeKind::Created, ChangeKind::Deleted, ChangeKind::Modified],
            created_label: "CREATED",
            indent: "",
            limit,
        }
    }

    const fn label(&self, kind: ChangeKind) -> &'static str {
        match kind {
            ChangeKind::Created => self.created_label,
            ChangeKind::Modified => "MODIFIED",
            ChangeKind::Deleted => "DELETED",
        }
    }
}

/// Grouped change listing. `details` may add annotation lines under each
/// listed entry.
pub fn render_groups<F>(result: &DiffResult, layout: &GroupLayout, mut details: F) -> Vec<String>
where
    F: FnMut(&ChangeEntry) -> Vec<String>,
{
    let indent = layout.indent;
    let mut lines = Vec::new();

    for kind in layout.order {
        let entries: Vec<&ChangeEntry> = result.of_kind(kind).collect();
        if entries.is_empty() {
            continue;
        }

        lines.push(format!("{indent}{} ({}):", layout.label(kind), entries.len()));
        for entry in entries.iter().take(layout.limit) {
            lines.push(format!(
                "{indent}  {} {}",
                entry.kind.symbol(),
                entry.relative_path
            ));
            lines.extend(
                details(entry)
                    .into_iter()
                    .map(|detail| format!("{indent}    {detail}")),
            );
        }
        if entries.len() > layout.limit {
            lines.push(format!(
                "{indent}  ... and {} more",
                entries.len() - layout.limit
            ));
        }
        lines.push(String::new());
    }

    lines
}

/// `SUMMARY: N created, N deleted, N modified, N unchanged`
#[must_use]
pub fn summary_line(result: &DiffResult) -> String {
    format!(
        "SUMMARY: {} created, {} deleted, {} modified, {} unchanged",
        result.count(ChangeKind::Created),
        result.count(ChangeKind::Deleted),
        result.count(ChangeKind::Modified),
        result.unchanged_count
    )
}

/// Side-by-side report of two named snapshots.
#[must_use]
pub fn render_comparison(from_name: &str, to_name: &str, result: &DiffResult, limit: usize) -> Vec<String> {
    let mut lines = banner("WITNESS DIFF");
    lines.push(String::new());
    lines.extend(describe_side("FROM", from_name, &result.from));
    lines.push(String::new());
    lines.extend(describe_side("TO", to_name, &result.to));
    lines.push(String::new());
    lines.push("-".repeat(RULE_WIDTH));
    lines.push(String::new());
    lines.extend(render_groups(result, &GroupLayout::comparison(limit), |_| Vec::new()));
    lines.push("-".repeat(RULE_WIDTH));
    lines.push(summary_line(result));
    lines
}

fn describe_side(label: &str, name: &str, summary: &SnapshotSummary) -> [String; 2] {
    [
        format!("{label}: {name} ({})", format_timestamp(&summary.captured_at)),
        format!("  {} files", summary.file_count),
    ]
}

/// One-shot scan listing: count, mode and the first few paths.
#[must_use]
pub fn render_scan(snapshot: &Snapshot, mode: &str) -> Vec<String> {
    if snapshot.is_empty() {
        return vec!["the directory is empty, or hidden".to_string()];
    }

    let mut lines = vec![format!("i see {} files ({mode})", snapshot.len())];
    lines.extend(snapshot.paths().take(SCAN_PREVIEW).map(|p| format!("  {p}")));
    if snapshot.len() > SCAN_PREVIEW {
        lines.push(format!("  ... and {} more", snapshot.len() - SCAN_PREVIEW));
    }
    lines
}

/// Table of stored snapshots.
#[must_use]
pub fn render_list(infos: &[StoredSnapshotInfo]) -> Vec<String> {
    if infos.is_empty() {
        return vec!["no saved snapshots".to_string()];
    }

    let mut lines = vec![format!("saved snapshots ({}):", infos.len())];
    lines.extend(infos.iter().map(|info| {
        format!(
            "  {:15} {}  {:4} files  {}",
            info.name,
            format_timestamp(&info.captured_at),
            info.file_count,
            info.root.display()
        )
    }));
    lines
}

/// Dormancy report over one root.
#[must_use]
pub fn render_dormant(dormant: &[DormantFile], threshold: Duration, limit: usize) -> Vec<String> {
    let threshold_text = humantime::format_duration(threshold).to_string();

    let mut lines = banner("DORMANT FILES");
    lines.insert(2, format!(" Threshold: {threshold_text}"));
    lines.push(String::new());

    if dormant.is_empty() {
        lines.push(format!("No files older than {threshold_text} found."));
        lines.push("Everything has been touched recently.".to_string());
        return lines;
    }

    lines.extend(
        dormant
            .iter()
            .take(limit)
            .map(|d| format!("  {}: {} ago", d.relative_path, format_age(d.age))),
    );
    if dormant.len() > limit {
        lines.push(format!("  ... and {} more", dormant.len() - limit));
    }
    lines.push(String::new());
    lines.push("-".repeat(BANNER_WIDTH));
    lines.push(format!("TOTAL: {} dormant files", dormant.len()));
    lines
}

/// Dormancy report grouped by project, `limit` files shown per project.
#[must_use]
pub fn render_project_dormancy(
    projects: &[ProjectDormancy],
    threshold: Duration,
    limit: usize,
) -> Vec<String> {
    let threshold_text = humantime::format_duration(threshold).to_string();

    let mut lines = banner("DORMANT FILES REPORT");
    lines.insert(2, format!(" Threshold: {threshold_text}"));
    lines.push(String::new());

    if projects.is_empty() {
        lines.push(format!("No files older than {threshold_text} found."));
        lines.push("Everything has been touched recently.".to_string());
        return lines;
    }

    for project in projects {
        lines.push(format!("[{}] {} dormant files", project.name, project.files.len()));
        lines.extend(
            project
                .files
                .iter()
                .take(limit)
                .map(|d| format!("  {}: {} ago", d.relative_path, format_age(d.age))),
        );
        if project.files.len() > limit {
            lines.push(format!("  ... and {} more", project.files.len() - limit));
        }
        lines.push(String::new());
    }

    let total: usize = projects.iter().map(|p| p.files.len()).sum();
    lines.push("-".repeat(BANNER_WIDTH));
    lines.push(format!(
        "TOTAL: {total} dormant files across {} projects",
        projects.len()
    ));
    lines
}

/// Projects ranked by recent activity, followed by the stale ones.
#[must_use]
pub fn render_activity(ranked: &[ProjectActivity]) -> Vec<String> {
    let mut lines = banner("PROJECT ACTIVITY RANKING");
    lines.push(String::new());

    if ranked.is_empty() {
        lines.push("No projects found.".to_string());
        return lines;
    }

    lines.extend(ranked.iter().enumerate().map(|(i, project)| {
        format!(
            "  {}. {:20} last active: {} ago",
            i + 1,
            project.name,
            format_age(project.idle)
        )
    }));
    lines.push(String::new());

    let stale: Vec<&ProjectActivity> = ranked.iter().filter(|p| p.is_stale()).collect();
    if !stale.is_empty() {
        lines.push("-".repeat(BANNER_WIDTH));
        lines.push(format!(
            "STALE PROJECTS ({} untouched for {}+):",
            stale.len(),
            humantime::format_duration(STALE_AFTER)
        ));
        lines.extend(stale.iter().map(|p| format!("  - {}", p.name)));
    }
    lines
}

/// One dormancy-watch event: files that went quiet since the last check.
#[must_use]
pub fn render_newly_dormant(
    newly: &[DormantFile],
    at: &DateTime<Utc>,
    limit: usize,
) -> Vec<String> {
    let mut lines = vec![format!(
        "[{}] {} files became dormant:",
        format_clock(at),
        newly.len()
    )];
    lines.extend(newly.iter().take(limit).map(|d| format!("  {}", d.relative_path)));
    if newly.len() > limit {
        lines.push(format!("  ... and {} more", newly.len() - limit));
    }
    lines.push(String::new());
    lines
}

fn banner(title: &str) -> Vec<String> {
    vec![
        "=".repeat(BANNER_WIDTH),
        format!(" {title}"),
        "=".repeat(BANNER_WIDTH),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;
    use crate::snapshot::fixtures::{at, snapshot};
    use std::path::PathBuf;

    fn scenario() -> DiffResult {
        let before = snapshot(&[("a.txt", "x"), ("b.txt", "y"), ("same.txt", "s")]);
        let after = snapshot(&[("a.txt", "z"), ("c.txt", "w"), ("same.txt", "s")]);
        diff(&before, &after)
    }

    #[test]
    fn test_last_scan_groups() {
        let lines = render_groups(&scenario(), &GroupLayout::last_scan(10), |_| Vec::new());
        assert_eq!(
            lines,
            vec![
                "  NEW (1):",
                "    + c.txt",
                "",
                "  MODIFIED (1):",
                "    ~ a.txt",
                "",
                "  DELETED (1):",
                "    - b.txt",
                "",
            ]
        );
    }

    #[test]
    fn test_details_are_indented_under_entry() {
        let lines = render_groups(&scenario(), &GroupLayout::last_scan(10), |e| {
            if e.kind == ChangeKind::Modified {
                vec!["| tail".to_string()]
            } else {
                Vec::new()
            }
        });
        let at_modified = lines.iter().position(|l| l == "    ~ a.txt");
        assert_eq!(
            at_modified.map(|i| lines[i + 1].as_str()),
            Some("      | tail")
        );
    }

    #[test]
    fn test_groups_elide_past_limit() {
        let before = snapshot(&[]);
        let names: Vec<String> = (0..13).map(|i| format!("f{i:02}")).collect();
        let entries: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), "x")).collect();
        let result = diff(&before, &snapshot(&entries));

        let lines = render_groups(&result, &GroupLayout::comparison(10), |_| Vec::new());
        assert_eq!(lines[0], "CREATED (13):");
        assert_eq!(lines[1], "  + f00");
        assert_eq!(lines[10], "  + f09");
        assert_eq!(lines[11], "  ... and 3 more");
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(
            summary_line(&scenario()),
            "SUMMARY: 1 created, 1 deleted, 1 modified, 1 unchanged"
        );
    }

    #[test]
    fn test_comparison_report_shape() {
        let lines = render_comparison("before", "after", &scenario(), 10);
        assert_eq!(lines[1], " WITNESS DIFF");
        assert!(lines.iter().any(|l| l.starts_with("FROM: before (")));
        assert!(lines.iter().any(|l| l.starts_with("TO: after (")));
        assert!(lines.contains(&"  3 files".to_string()));

        let created = lines.iter().position(|l| l == "CREATED (1):");
        let deleted = lines.iter().position(|l| l == "DELETED (1):");
        let modified = lines.iter().position(|l| l == "MODIFIED (1):");
        assert!(created < deleted && deleted < modified);
        assert_eq!(
            lines.last().map(String::as_str),
            Some("SUMMARY: 1 created, 1 deleted, 1 modified, 1 unchanged")
        );
    }

    #[test]
    fn test_scan_listing() {
        let entries: Vec<(String, &str)> = (0..7).map(|i| (format!("f{i}"), "x")).collect();
        let pairs: Vec<(&str, &str)> = entries.iter().map(|(p, c)| (p.as_str(), *c)).collect();
        let lines = render_scan(&snapshot(&pairs), "flat");

        assert_eq!(lines[0], "i see 7 files (flat)");
        assert_eq!(lines[1], "  f0");
        assert_eq!(lines[5], "  f4");
        assert_eq!(lines[6], "  ... and 2 more");
        assert_eq!(render_scan(&snapshot(&[]), "recursive"), vec!["the directory is empty, or hidden"]);
    }

    #[test]
    fn test_list_rendering() {
        assert_eq!(render_list(&[]), vec!["no saved snapshots"]);

        let infos = [StoredSnapshotInfo {
            name: "before".to_string(),
            captured_at: at(0),
            root: PathBuf::from("/work"),
            file_count: 12,
        }];
        let lines = render_list(&infos);
        assert_eq!(lines[0], "saved snapshots (1):");
        assert!(lines[1].starts_with("  before          "));
        assert!(lines[1].ends_with("  12 files  /work"));
    }

    #[test]
    fn test_dormant_rendering() {
        let threshold = Duration::from_secs(24 * 3600);
        let empty = render_dormant(&[], threshold, 5);
        assert_eq!(empty[2], " Threshold: 1day");
        assert!(empty.contains(&"Everything has been touched recently.".to_string()));

        let files = vec![
            DormantFile {
                relative_path: "old.txt".to_string(),
                age: Duration::from_secs(3 * 86_400),
            },
            DormantFile {
                relative_path: "older.txt".to_string(),
                age: Duration::from_secs(2 * 86_400),
            },
        ];
        let lines = render_dormant(&files, threshold, 1);
        assert!(lines.contains(&"  old.txt: 3.0 days ago".to_string()));
        assert!(lines.contains(&"  ... and 1 more".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("TOTAL: 2 dormant files"));
    }

    #[test]
    fn test_project_dormancy_rendering() {
        let threshold = Duration::from_secs(3600);
        let empty = render_project_dormancy(&[], threshold, 5);
        assert_eq!(empty[1], " DORMANT FILES REPORT");
        assert_eq!(empty[2], " Threshold: 1h");
        assert_eq!(empty.last().map(String::as_str), Some("Everything has been touched recently."));

        let file = |path: &str, days: u64| DormantFile {
            relative_path: path.to_string(),
            age: Duration::from_secs(days * 86_400),
        };
        let projects = [
            ProjectDormancy {
                name: "alpha".to_string(),
                files: vec![file("src/lib.rs", 4), file("notes.md", 2), file("old.md", 2)],
            },
            ProjectDormancy {
                name: "beta".to_string(),
                files: vec![file("main.py", 3)],
            },
        ];
        let lines = render_project_dormancy(&projects, threshold, 2);
        let rule = "-".repeat(BANNER_WIDTH);

        let body: Vec<&str> = lines[5..].iter().map(String::as_str).collect();
        assert_eq!(
            body,
            [
                "[alpha] 3 dormant files",
                "  src/lib.rs: 4.0 days ago",
                "  notes.md: 2.0 days ago",
                "  ... and 1 more",
                "",
                "[beta] 1 dormant files",
                "  main.py: 3.0 days ago",
                "",
                rule.as_str(),
                "TOTAL: 4 dormant files across 2 projects",
            ]
        );
    }

    #[test]
    fn test_activity_rendering() {
        assert_eq!(render_activity(&[]).last().map(String::as_str), Some("No projects found."));

        let ranked = [
            ProjectActivity {
                name: "busy".to_string(),
                idle: Duration::from_secs(120),
                file_count: 3,
            },
            ProjectActivity {
                name: "quiet".to_string(),
                idle: Duration::from_secs(2 * 86_400),
                file_count: 1,
            },
        ];
        let lines = render_activity(&ranked);

        assert_eq!(lines[1], " PROJECT ACTIVITY RANKING");
        assert!(lines.contains(&format!("  1. {:20} last active: 2 minutes ago", "busy")));
        assert!(lines.contains(&format!("  2. {:20} last active: 2.0 days ago", "quiet")));
        assert!(lines.contains(&"STALE PROJECTS (1 untouched for 1day+):".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("  - quiet"));
    }

    #[test]
    fn test_activity_without_stale_projects() {
        let ranked = [ProjectActivity {
            name: "busy".to_string(),
            idle: Duration::from_secs(5),
            file_count: 1,
        }];
        let lines = render_activity(&ranked);
        assert!(!lines.iter().any(|l| l.starts_with("STALE")));
    }

    #[test]
    fn test_newly_dormant_rendering() {
        let newly: Vec<DormantFile> = ["a.rs", "b.rs", "c.rs"]
            .iter()
            .map(|p| DormantFile {
                relative_path: (*p).to_string(),
                age: Duration::from_secs(7200),
            })
            .collect();
        let lines = render_newly_dormant(&newly, &at(0), 2);

        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] 3 files became dormant:"));
        assert_eq!(&lines[1..], ["  a.rs", "  b.rs", "  ... and 1 more", ""]);
    }
}
