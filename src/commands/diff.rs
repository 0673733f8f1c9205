use crate::WitnessContext;
use crate::blame::{self, BlameEntry};
use crate::commands::context::CommandContext;
use crate::diff::{self, ChangeEntry, ChangeKind};
use crate::output::{self, preview, report};
use crate::utils::formatters::{format_timestamp, truncate_chars};
use anyhow::Result;
use chrono::Local;
use std::path::Path;

/// Lines of content shown per changed file
const PREVIEW_LINES: usize = 2;

/// Blame entries shown per modified file
const BLAME_ENTRIES: usize = 2;

/// Extra detail printed under each change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Details {
    /// Head of created files, tail of modified files
    pub content: bool,
    /// Recent git blame for modified files
    pub blame: bool,
}

/// Execute diff command: compare a directory against its last remembered scan
///
/// The first run only records a scan. Every later run reports the changes
/// and then remembers the new scan.
///
/// # Errors
///
/// Returns an error if:
/// - The path does not exist
/// - The root cannot be listed
/// - The new scan cannot be stored
pub fn execute(
    ctx: &WitnessContext,
    path: &Path,
    recursive: bool,
    depth: Option<usize>,
    details: Details,
) -> Result<()> {
    let root = ctx.resolve_target(path)?;
    let snapshotter = ctx.snapshotter(recursive, depth);

    let Some(previous) = ctx.load_last_scan(&root) else {
        output::print_lines(["no previous scan found for this path", "running initial scan..."]);
        let current = snapshotter.scan(&root)?;
        ctx.save_last_scan(&current)?;
        output::print_lines([
            format!("scanned {} files", current.len()),
            "run `witness diff` again to see changes".to_string(),
        ]);
        return Ok(());
    };

    let current = if ctx.config.performance.reuse_digests {
        snapshotter.scan_reusing(&root, &previous)?
    } else {
        snapshotter.scan(&root)?
    };
    let result = diff::diff(&previous, &current);

    let mut lines = vec![
        format!(
            "comparing to scan from {}",
            format_timestamp(&previous.captured_at())
        ),
        String::new(),
    ];
    if result.has_changes() {
        lines.extend(report::render_groups(
            &result,
            &report::GroupLayout::last_scan(ctx.report_limit()),
            |entry| detail_lines(&root, entry, details),
        ));
    } else {
        lines.push("  nothing has changed".to_string());
        lines.push(String::new());
    }
    output::print_lines(lines);

    ctx.save_last_scan(&current)?;
    output::info(&format!("saved new scan ({} files)", current.len()));
    Ok(())
}

/// Annotation lines for one change.
fn detail_lines(root: &Path, entry: &ChangeEntry, details: Details) -> Vec<String> {
    let path = root.join(&entry.relative_path);
    let mut lines = Vec::new();

    match entry.kind {
        ChangeKind::Created if details.content => {
            if let Some(head) = preview::head_lines(&path, PREVIEW_LINES) {
                lines.extend(head.into_iter().map(|line| format!("| {line}")));
            }
        }
        ChangeKind::Modified => {
            if details.content
                && let Some(tail) = preview::tail_lines(&path, PREVIEW_LINES)
                && !tail.is_empty()
            {
                lines.push("(end of file):".to_string());
                lines.extend(tail.into_iter().map(|line| format!("| {line}")));
            }
            if details.blame
                && let Some(entries) = blame::recent_blame(&path, BLAME_ENTRIES)
            {
                lines.push("(recent blame):".to_string());
                lines.extend(entries.iter().map(blame_line));
            }
        }
        _ => {}
    }

    lines
}

fn blame_line(entry: &BlameEntry) -> String {
    format!(
        "@ {} ({}): {}",
        truncate_chars(&entry.author, 15),
        entry.time.with_timezone(&Local).format("%m-%d %H:%M"),
        truncate_chars(&entry.summary, 30)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::tempdir;

    fn entry(kind: ChangeKind, path: &str) -> ChangeEntry {
        ChangeEntry {
            kind,
            relative_path: path.to_string(),
        }
    }

    #[test]
    fn test_content_details() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("new.txt"), "one\ntwo\nthree\n")?;
        fs::write(dir.path().join("old.txt"), "a\nb\nc")?;
        let content = Details {
            content: true,
            blame: false,
        };

        assert_eq!(
            detail_lines(dir.path(), &entry(ChangeKind::Created, "new.txt"), content),
            vec!["| one", "| two"]
        );
        assert_eq!(
            detail_lines(dir.path(), &entry(ChangeKind::Modified, "old.txt"), content),
            vec!["(end of file):", "| b", "| c"]
        );
        assert!(detail_lines(dir.path(), &entry(ChangeKind::Deleted, "gone.txt"), content).is_empty());
        assert!(
            detail_lines(dir.path(), &entry(ChangeKind::Created, "new.txt"), Details::default())
                .is_empty()
        );
        Ok(())
    }

    #[test]
    fn test_blame_line_truncates() {
        let line = blame_line(&BlameEntry {
            author: "A Very Long Author Name Indeed".to_string(),
            time: Utc.timestamp_opt(0, 0).single().unwrap_or_default(),
            summary: "x".repeat(50),
        });
        assert!(line.starts_with("@ A Very Long Aut ("));
        assert!(line.ends_with(&format!("): {}", "x".repeat(30))));
    }

    #[test]
    fn test_first_run_records_then_reports() -> Result<()> {
        let dir = tempdir()?;
        let ctx = WitnessContext::new_explicit(
            dir.path().join("store"),
            dir.path().join("config.toml"),
        )?;
        let root = dir.path().join("root");
        fs::create_dir_all(&root)?;
        fs::write(root.join("a.txt"), "x")?;

        execute(&ctx, &root, true, None, Details::default())?;
        let resolved = ctx.resolve_target(&root)?;
        assert_eq!(ctx.load_last_scan(&resolved).map(|s| s.len()), Some(1));

        fs::write(root.join("b.txt"), "y")?;
        execute(&ctx, &root, true, None, Details::default())?;
        assert_eq!(ctx.load_last_scan(&resolved).map(|s| s.len()), Some(2));
        Ok(())
    }
}
