//! Interval-driven change detection.
//!
//! A [`Poller`] seeds itself with one scan, then on every tick scans again,
//! diffs against the previous snapshot and hands non-empty results to a
//! callback. Ticks never overlap: the wait before the next tick is the
//! interval minus however long the scan took. Cancellation is checked at tick
//! boundaries and interrupts the wait immediately.

use crate::cancel::CancelToken;
use crate::diff::{self, DiffResult};
use crate::scanner::{ScanOptions, Snapshotter};
use crate::snapshot::Snapshot;
use crate::storage::SnapshotStore;
use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Counters reported when a polling loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Completed scans, the seed included.
    pub ticks: u64,
    /// Ticks whose diff had at least one entry.
    pub change_events: u64,
    /// Scans that failed and were skipped.
    pub scan_errors: u64,
    /// File count of the most recent successful scan.
    pub last_file_count: usize,
}

/// Repeatedly scans one root.
#[derive(Debug, Clone)]
pub struct Poller {
    root: PathBuf,
    snapshotter: Snapshotter,
    interval: Duration,
    persist: Option<(SnapshotStore, String)>,
    reuse_digests: bool,
}

impl Poller {
    /// Poll `root` every `interval` with the given scan options.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, options: ScanOptions, interval: Duration) -> Self {
        Self {
            root: root.into(),
            snapshotter: Snapshotter::new(options),
            interval,
            persist: None,
            reuse_digests: false,
        }
    }

    /// Use a preconfigured snapshotter.
    #[must_use]
    pub fn with_snapshotter(mut self, snapshotter: Snapshotter) -> Self {
        self.snapshotter = snapshotter;
        self
    }

    /// Save every successful scan to `name` in `store`.
    #[must_use]
    pub fn persist_to(mut self, store: SnapshotStore, name: impl Into<String>) -> Self {
        self.persist = Some((store, name.into()));
        self
    }

    /// Reuse digests of files whose size and mtime did not change since the
    /// previous tick.
    #[must_use]
    pub const fn reuse_digests(mut self, reuse: bool) -> Self {
        self.reuse_digests = reuse;
        self
    }

    /// Root being watched.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Tick interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Scan the root once, reusing digests from `previous` if enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the root exists but cannot be listed.
    pub fn scan(&self, previous: Option<&Snapshot>) -> Result<Snapshot> {
        match previous {
            Some(previous) if self.reuse_digests => {
                self.snapshotter.scan_reusing(&self.root, previous)
            }
            _ => self.snapshotter.scan(&self.root),
        }
    }

    /// Poll until `cancel` fires, seeding with a fresh scan.
    ///
    /// # Errors
    ///
    /// Returns an error only if persisting a snapshot fails. Scan failures
    /// are logged and retried on the next tick.
    pub fn run<F>(&self, cancel: &CancelToken, on_change: F) -> Result<PollStats>
    where
        F: FnMut(&DiffResult),
    {
        self.run_from(cancel, None, on_change)
    }

    /// Poll until `cancel` fires, starting from `seed` if given.
    ///
    /// # Errors
    ///
    /// Returns an error only if persisting a snapshot fails.
    pub fn run_from<F>(
        &self,
        cancel: &CancelToken,
        seed: Option<Snapshot>,
        mut on_change: F,
    ) -> Result<PollStats>
    where
        F: FnMut(&DiffResult),
    {
        self.run_scans(cancel, seed, |previous, current| {
            let Some(previous) = previous else {
                return false;
            };
            let result = diff::diff(previous, current);
            if !result.has_changes() {
                return false;
            }
            tracing::debug!(entries = result.entries.len(), "Changes detected");
            on_change(&result);
            true
        })
    }

    /// The tick loop behind [`Poller::run_from`]. `on_scan` sees every
    /// successful scan together with the one before it (`None` for the
    /// first scan of an unseeded loop) and returns whether the tick counts
    /// as a change event.
    ///
    /// # Errors
    ///
    /// Returns an error only if persisting a snapshot fails.
    pub fn run_scans<F>(
        &self,
        cancel: &CancelToken,
        seed: Option<Snapshot>,
        mut on_scan: F,
    ) -> Result<PollStats>
    where
        F: FnMut(Option<&Snapshot>, &Snapshot) -> bool,
    {
        let span = tracing::info_span!("poll", root = %self.root.display());
        let _guard = span.enter();

        let mut stats = PollStats::default();
        let mut previous = seed;
        if let Some(seed) = &previous {
            stats.last_file_count = seed.len();
        }

        tracing::info!(
            interval_ms = self.interval.as_millis(),
            seeded = previous.is_some(),
            "Polling started"
        );

        let mut scan_took = Duration::ZERO;
        let mut immediate = previous.is_none();
        loop {
            if immediate {
                if cancel.is_cancelled() {
                    break;
                }
            } else if cancel.wait_timeout(self.interval.saturating_sub(scan_took)) {
                break;
            }

            let started = Instant::now();
            let scanned = self.scan(previous.as_ref());
            scan_took = started.elapsed();

            // Drop the tick rather than report it after a stop request
            if cancel.is_cancelled() {
                break;
            }

            let current = match scanned {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    stats.scan_errors += 1;
                    tracing::warn!(error = %format!("{e:#}"), "Scan failed, retrying next tick");
                    immediate = false;
                    continue;
                }
            };
            stats.ticks += 1;
            stats.last_file_count = current.len();
            immediate = false;

            if let Some((store, name)) = &self.persist {
                store
                    .save(name, &current)
                    .with_context(|| format!("Failed to persist snapshot '{name}'"))?;
            }

            if on_scan(previous.as_ref(), &current) {
                stats.change_events += 1;
            }
            previous = Some(current);
        }

        tracing::info!(
            ticks = stats.ticks,
            changes = stats.change_events,
            errors = stats.scan_errors,
            "Polling stopped"
        );
        Ok(stats)
    }

    /// Run the loop on a background thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn<F>(self, on_change: F) -> Result<PollHandle>
    where
        F: FnMut(&DiffResult) + Send + 'static,
    {
        let token = CancelToken::new();
        let thread_token = token.clone();
        let thread = thread::Builder::new()
            .name("witness-poller".to_string())
            .spawn(move || self.run(&thread_token, on_change))
            .context("Failed to spawn poller thread")?;

        Ok(PollHandle { token, thread })
    }
}

/// Control handle for a spawned [`Poller`].
#[derive(Debug)]
pub struct PollHandle {
    token: CancelToken,
    thread: JoinHandle<Result<PollStats>>,
}

impl PollHandle {
    /// Ask the loop to stop. Does not wait.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The token the loop observes.
    #[must_use]
    pub const fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Whether the loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the loop to exit.
    ///
    /// # Errors
    ///
    /// Returns the loop's fatal error, or an error if the thread panicked.
    pub fn join(self) -> Result<PollStats> {
        self.thread
            .join()
            .map_err(|_| anyhow!("Poller thread panicked"))?
    }

    /// Cancel and wait.
    ///
    /// # Errors
    ///
    /// Same as [`PollHandle::join`].
    pub fn stop(self) -> Result<PollStats> {
        self.cancel();
        self.join()
    }
}

/// Start polling `root` in the background with default exclusions.
///
/// # Errors
///
/// Returns an error if the polling thread cannot be spawned.
pub fn start_polling<F>(
    root: &Path,
    interval: Duration,
    recursive: bool,
    max_depth: Option<usize>,
    on_change: F,
) -> Result<PollHandle>
where
    F: FnMut(&DiffResult) + Send + 'static,
{
    let options = ScanOptions::default()
        .recursive(recursive)
        .max_depth(max_depth);
    Poller::new(root, options, interval).spawn(on_change)
}
