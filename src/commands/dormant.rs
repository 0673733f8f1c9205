use crate::WitnessContext;
use crate::cancel::CancelToken;
use crate::commands::context::CommandContext;
use crate::dormant::{DormancyTracker, find_dormant, group_by_project, rank_by_activity};
use crate::output::{self, report};
use crate::poller::Poller;
use crate::signal;
use crate::snapshot::Snapshot;
use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::Duration;

/// Options for the dormant command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DormantArgs {
    /// Minimum age of a dormant file
    pub threshold: Duration,
    /// Overrides `report.limit`
    pub limit: Option<usize>,
    /// Group dormant files by top-level directory
    pub projects: bool,
    /// Rank top-level directories by their latest modification
    pub activity: bool,
    /// Keep checking and report files as they go quiet
    pub watch: bool,
    /// Overrides `watch.interval_secs` when watching
    pub interval: Option<Duration>,
}

/// Execute dormant command: report files untouched for longer than the
/// threshold, or keep watching for them
///
/// # Errors
///
/// Returns an error if:
/// - The path does not exist or cannot be listed
/// - The watch interval is zero
pub fn execute(ctx: &WitnessContext, path: &Path, args: DormantArgs) -> Result<()> {
    let root = ctx.resolve_target(path)?;
    let limit = args.limit.unwrap_or_else(|| ctx.report_limit());

    if args.watch {
        return watch(ctx, &root, &args, limit);
    }

    let snapshot = ctx.snapshotter(true, None).scan(&root)?;
    output::print_lines(report_lines(&snapshot, &args, limit, Utc::now()));
    Ok(())
}

/// Lines of a one-shot report. The plain listing is the default; `projects`
/// replaces it with the grouped one and `activity` appends the ranking.
fn report_lines(
    snapshot: &Snapshot,
    args: &DormantArgs,
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<String> {
    let mut lines = Vec::new();

    if args.projects || !args.activity {
        let dormant = find_dormant(snapshot, args.threshold, now);
        lines = if args.projects {
            report::render_project_dormancy(&group_by_project(&dormant), args.threshold, limit)
        } else {
            report::render_dormant(&dormant, args.threshold, limit)
        };
    }

    if args.activity {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.extend(report::render_activity(&rank_by_activity(snapshot, now)));
    }
    lines
}

fn watch(ctx: &WitnessContext, root: &Path, args: &DormantArgs, limit: usize) -> Result<()> {
    let interval = args.interval.unwrap_or_else(|| ctx.config.watch_interval());
    if interval.is_zero() {
        bail!("Watch interval must be greater than zero");
    }

    let snapshotter = ctx.snapshotter(true, None);
    let poller = Poller::new(root.to_path_buf(), snapshotter.options().clone(), interval)
        .with_snapshotter(snapshotter)
        .reuse_digests(ctx.config.performance.reuse_digests);

    output::print_lines([
        format!(
            "watching for files dormant > {}",
            humantime::format_duration(args.threshold)
        ),
        format!("checking every {}", humantime::format_duration(interval)),
        "press Ctrl+C to stop".to_string(),
        String::new(),
    ]);

    let token = CancelToken::new();
    signal::cancel_on_interrupt(&token);

    let threshold = args.threshold;
    let mut tracker = DormancyTracker::default();
    let outcome = poller.run_scans(&token, None, |_, current| {
        let now = Utc::now();
        let newly = tracker.update(&find_dormant(current, threshold, now));
        if newly.is_empty() {
            return false;
        }
        output::print_lines(report::render_newly_dormant(&newly, &now, limit));
        true
    });
    token.cancel();
    let stats = outcome?;

    output::print_lines([String::new(), "watching stopped".to_string()]);
    output::verbose(&format!(
        "{} checks, {} found newly dormant files, {} failed",
        stats.ticks, stats.change_events, stats.scan_errors
    ));
    Ok(())
}
