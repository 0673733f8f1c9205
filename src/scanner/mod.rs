//! Directory snapshotter.
//!
//! The [`Snapshotter`] walks a root depth-first, applies the exclusion policy
//! (hidden components always, ignore patterns and depth limits per options),
//! then fingerprints every included file on the shared hash pool. Hashing
//! completes for every file before the [`Snapshot`] is returned, so callers
//! never see a partial scan.

/// Filesystem traversal and exclusion rules.
pub mod walk;

use crate::config::ScanConfig;
use crate::fingerprint::{ContentDigest, Fingerprinter};
use crate::snapshot::{FileRecord, Snapshot};
use crate::utils::{self, thread_pool};
use anyhow::Result;
use chrono::{DateTime, Utc};
use glob::Pattern;
use rayon::prelude::*;
use std::path::Path;
use std::time::{Instant, UNIX_EPOCH};
use walk::{Candidate, Walk};

/// What a scan includes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Descend into subdirectories. When `false` only direct children of the
    /// root are considered, whatever `max_depth` says.
    pub recursive: bool,
    /// Deepest file depth to include; the root is depth 0, its children 1.
    pub max_depth: Option<usize>,
    /// Glob patterns excluding matching path components or whole relative paths.
    pub ignore_patterns: Vec<String>,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            max_depth: None,
            ignore_patterns: Vec::new(),
            follow_symlinks: false,
        }
    }
}

impl ScanOptions {
    /// Options seeded from the `[scan]` configuration section.
    #[must_use]
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            recursive: true,
            max_depth: None,
            ignore_patterns: config.ignore_patterns.clone(),
            follow_symlinks: config.follow_symlinks,
        }
    }

    /// Set recursion.
    #[must_use]
    pub const fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set the depth limit.
    #[must_use]
    pub const fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Depth bound actually handed to the walker.
    #[must_use]
    pub fn effective_max_depth(&self) -> Option<usize> {
        if self.recursive {
            self.max_depth
        } else {
            Some(self.max_depth.map_or(1, |depth| depth.min(1)))
        }
    }

    /// Short description of the traversal mode: `recursive`, `flat` or `depth=N`.
    #[must_use]
    pub fn describe_mode(&self) -> String {
        match (self.max_depth, self.recursive) {
            (Some(depth), _) => format!("depth={depth}"),
            (None, true) => "recursive".to_string(),
            (None, false) => "flat".to_string(),
        }
    }
}

/// Scans a root into a [`Snapshot`].
#[derive(Debug, Clone)]
pub struct Snapshotter {
    /// Inclusion rules
    options: ScanOptions,
    /// Compiled ignore patterns
    patterns: Vec<Pattern>,
    /// Per-file digest strategy
    fingerprinter: Fingerprinter,
}

impl Snapshotter {
    /// Create a snapshotter with the default fingerprinter.
    #[must_use]
    pub fn new(options: ScanOptions) -> Self {
        let patterns = utils::compile_ignore_patterns(&options.ignore_patterns);
        Self {
            options,
            patterns,
            fingerprinter: Fingerprinter::default(),
        }
    }

    /// Replace the fingerprinter (e.g. to change the streaming threshold).
    #[must_use]
    pub const fn with_fingerprinter(mut self, fingerprinter: Fingerprinter) -> Self {
        self.fingerprinter = fingerprinter;
        self
    }

    /// The options this snapshotter applies.
    #[must_use]
    pub const fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Capture the current state of `root`.
    ///
    /// A missing root, or one that is not a directory, yields an empty
    /// snapshot. Individual unreadable files are recorded with the
    /// unreadable digest.
    ///
    /// # Errors
    ///
    /// Returns an error if the root exists but its listing cannot be read.
    pub fn scan(&self, root: &Path) -> Result<Snapshot> {
        self.scan_inner(root, None)
    }

    /// Capture the current state of `root`, reusing digests from `previous`
    /// for files whose size and modification time are unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the root exists but its listing cannot be read.
    pub fn scan_reusing(&self, root: &Path, previous: &Snapshot) -> Result<Snapshot> {
        self.scan_inner(root, Some(previous))
    }

    fn scan_inner(&self, root: &Path, previous: Option<&Snapshot>) -> Result<Snapshot> {
        let resolved = utils::resolve_root(root);
        let span = tracing::debug_span!("scan", root = %resolved.display());
        let _guard = span.enter();

        let captured_at = Utc::now();
        let started = Instant::now();

        let candidates = match walk::discover(&resolved, &self.options, &self.patterns)? {
            Walk::Missing => {
                tracing::debug!("Scan root missing, returning empty snapshot");
                return Ok(Snapshot::empty(resolved, captured_at));
            }
            Walk::Found(candidates) => candidates,
        };

        let previous = previous.filter(|p| p.root() == resolved.as_path());
        let discovered = candidates.len();

        let records: Vec<FileRecord> = thread_pool::run_in_pool(|| {
            candidates
                .into_par_iter()
                .map(|candidate| self.fingerprint(candidate, previous))
                .collect()
        });

        tracing::debug!(
            files = discovered,
            reuse = previous.is_some(),
            elapsed_ms = started.elapsed().as_millis(),
            "Scan complete"
        );

        Ok(Snapshot::new(resolved, captured_at, records))
    }

    fn fingerprint(&self, candidate: Candidate, previous: Option<&Snapshot>) -> FileRecord {
        let Candidate {
            absolute,
            key,
            stat,
        } = candidate;

        let Some((size, modified)) = stat else {
            return FileRecord {
                relative_path: key,
                modified: DateTime::<Utc>::from(UNIX_EPOCH),
                size: 0,
                digest: ContentDigest::Unreadable,
            };
        };

        let cached = previous
            .and_then(|p| p.get(&key))
            .filter(|r| r.size == size && r.modified == modified && !r.digest.is_unreadable())
            .map(|r| r.digest);

        let digest = cached.unwrap_or_else(|| self.fingerprinter.digest(&absolute));

        FileRecord {
            relative_path: key,
            modified,
            size,
            digest,
        }
    }
}

/// Scan `root` with the given recursion and depth limit and no ignore
/// patterns beyond the hidden-component rule.
///
/// # Errors
///
/// Returns an error if the root exists but its listing cannot be read.
pub fn scan(root: &Path, recursive: bool, max_depth: Option<usize>) -> Result<Snapshot> {
    Snapshotter::new(
        ScanOptions::default()
            .recursive(recursive)
            .max_depth(max_depth),
    )
    .scan(root)
}
