use crate::WitnessContext;
use crate::cancel::CancelToken;
use crate::commands::context::CommandContext;
use crate::diff::DiffResult;
use crate::lock::WatchLock;
use crate::output::{self, narration};
use crate::poller::Poller;
use crate::signal;
use crate::storage::SnapshotStore;
use crate::utils::formatters::format_clock;
use anyhow::{Result, bail};
use chrono::Utc;
use rand::Rng;
use std::path::Path;
use std::time::Duration;

/// Options for a watch session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchArgs {
    /// Overrides `watch.interval_secs`
    pub interval: Option<Duration>,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Deepest file depth to include
    pub depth: Option<usize>,
    /// Markers instead of narration
    pub plain: bool,
    /// Remember every scan as the last scan of the root
    pub persist: bool,
}

/// Execute watch command: report changes under a directory until interrupted
///
/// # Errors
///
/// Returns an error if:
/// - The path does not exist or the interval is zero
/// - Another watcher already holds the root
/// - The initial scan fails
/// - A scan cannot be persisted with `persist`
pub fn execute(ctx: &WitnessContext, path: &Path, args: WatchArgs) -> Result<()> {
    let root = ctx.resolve_target(path)?;
    let interval = args.interval.unwrap_or_else(|| ctx.config.watch_interval());
    if interval.is_zero() {
        bail!("Watch interval must be greater than zero");
    }

    let _lock = WatchLock::acquire(&ctx.watchers_dir(), &root)?;

    let snapshotter = ctx.snapshotter(args.recursive, args.depth);
    let mode = snapshotter.options().describe_mode();
    let mut poller = Poller::new(root.clone(), snapshotter.options().clone(), interval)
        .with_snapshotter(snapshotter)
        .reuse_digests(ctx.config.performance.reuse_digests);
    if args.persist {
        poller = poller.persist_to(ctx.store(), SnapshotStore::slot_for_root(&root));
    }

    let seed = poller.scan(None)?;
    if args.persist {
        ctx.save_last_scan(&seed)?;
    }

    output::print_lines([
        format!("witnessing: {}", root.display()),
        format!(
            "mode: {mode}, interval: {}",
            humantime::format_duration(interval)
        ),
        format!("initial state: {} files", seed.len()),
        "waiting...".to_string(),
        String::new(),
    ]);

    let token = CancelToken::new();
    signal::cancel_on_interrupt(&token);

    let narrate = ctx.config.watch.narrate && !args.plain;
    let mut rng = rand::rng();
    let outcome = poller.run_from(&token, Some(seed), |result| {
        output::print_lines(event_lines(result, narrate, &mut rng));
    });
    // Stops the signal relay when the loop ended on its own
    token.cancel();
    let stats = outcome?;

    output::print_lines([
        String::new(),
        "the watching ends".to_string(),
        format!("final state: {} files", stats.last_file_count),
    ]);
    output::verbose(&format!(
        "{} scans, {} with changes, {} failed",
        stats.ticks, stats.change_events, stats.scan_errors
    ));
    Ok(())
}

/// Lines printed for one change event: a clock stamp, then one line per entry.
fn event_lines<R: Rng + ?Sized>(result: &DiffResult, narrate: bool, rng: &mut R) -> Vec<String> {
    let mut lines = Vec::with_capacity(result.entries.len() + 2);
    lines.push(format!("[{}]", format_clock(&Utc::now())));
    for entry in &result.entries {
        lines.push(if narrate {
            narration::narrate(entry, rng)
        } else {
            narration::plain(entry)
        });
    }
    lines.push(String::new());
    lines
}
