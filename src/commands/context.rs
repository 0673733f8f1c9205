use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

use crate::WitnessContext;
use crate::snapshot::Snapshot;
use crate::storage::SnapshotStore;
use crate::utils;

/// Trait providing common operations for command modules
pub trait CommandContext {
    /// Resolves a user-supplied directory to the absolute root the store
    /// keys it by.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing exists at `path`
    fn resolve_target(&self, path: &Path) -> Result<PathBuf>;

    /// Loads the last scan remembered for `root`, if any
    fn load_last_scan(&self, root: &Path) -> Option<Snapshot>;

    /// Remembers `snapshot` as the last scan of its root
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written
    fn save_last_scan(&self, snapshot: &Snapshot) -> Result<()>;

    /// Paths listed per group before eliding
    fn report_limit(&self) -> usize;
}

impl CommandContext for WitnessContext {
    fn resolve_target(&self, path: &Path) -> Result<PathBuf> {
        if !path.exists() {
            bail!("cannot witness what does not exist: {}", path.display());
        }
        Ok(utils::resolve_root(path))
    }

    fn load_last_scan(&self, root: &Path) -> Option<Snapshot> {
        self.store()
            .load_for_root(&SnapshotStore::slot_for_root(root), root)
    }

    fn save_last_scan(&self, snapshot: &Snapshot) -> Result<()> {
        self.store()
            .save(&SnapshotStore::slot_for_root(snapshot.root()), snapshot)
    }

    fn report_limit(&self) -> usize {
        self.config.report.limit.max(1)
    }
}
