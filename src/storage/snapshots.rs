use super::{MAX_ENCODED_BYTES, STORE_FORMAT_VERSION, decode, encode_within};
use crate::snapshot::Snapshot;
use crate::utils;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tempfile::NamedTempFile;
use xxhash_rust::xxh3::xxh3_64;

/// Directory holding `<name>.snap` files.
const SNAPSHOTS_DIR: &str = "snapshots";

/// Directory holding per-name writer locks.
const LOCKS_DIR: &str = "locks";

/// Extension of snapshot files.
const SNAPSHOT_EXT: &str = "snap";

/// Longest accepted snapshot name.
const MAX_NAME_LEN: usize = 128;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format_version: u32,
    name: &'a str,
    snapshot: &'a Snapshot,
}

#[derive(Deserialize)]
struct Envelope {
    format_version: u32,
    name: String,
    snapshot: Snapshot,
}

/// Listing entry for one stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSnapshotInfo {
    /// Slot name
    pub name: String,
    /// When the snapshot was captured
    pub captured_at: DateTime<Utc>,
    /// Root the snapshot describes
    pub root: PathBuf,
    /// Number of files recorded
    pub file_count: usize,
}

/// Directory-backed store of named snapshots.
///
/// Each name owns one slot; saving overwrites it whole. Writes go to a
/// temporary file that is renamed over the slot, so a concurrent `load`
/// sees either the old or the new snapshot, never a mix. Saves to the same
/// name are serialized within the process (per-name mutex) and across
/// processes (advisory file lock). Clones share the mutex table.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    compression_level: i32,
    max_bytes: usize,
    writers: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl SnapshotStore {
    /// Create a store rooted at `dir`. Nothing is touched on disk until the
    /// first save.
    #[must_use]
    pub fn new(dir: PathBuf, compression_level: i32) -> Self {
        Self {
            dir,
            compression_level,
            max_bytes: MAX_ENCODED_BYTES,
            writers: Arc::new(DashMap::new()),
        }
    }

    /// Lower the size bound for saved records.
    #[cfg(test)]
    pub(crate) const fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Name of the slot that holds the last scan of `root`.
    #[must_use]
    pub fn slot_for_root(root: &Path) -> String {
        let resolved = utils::resolve_root(root);
        let hash = xxh3_64(resolved.to_string_lossy().as_bytes());
        format!("root-{hash:016x}")
    }

    /// Check that `name` can be used as a slot name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, too long, starts with a dot or
    /// contains characters other than ASCII letters, digits, `.`, `_`, `-`.
    pub fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() {
            bail!("Snapshot name cannot be empty");
        }
        if name.len() > MAX_NAME_LEN {
            bail!("Snapshot name is longer than {MAX_NAME_LEN} characters");
        }
        if utils::is_hidden_component(name) {
            bail!("Snapshot name cannot start with '.': {name}");
        }
        if let Some(bad) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        {
            bail!("Snapshot name contains invalid character {bad:?}: {name}");
        }
        Ok(())
    }

    /// Persist `snapshot` under `name`, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid, the snapshot is too large to
    /// be read back, or the store directory cannot be written.
    pub fn save(&self, name: &str, snapshot: &Snapshot) -> Result<()> {
        Self::validate_name(name)?;

        let snapshots_dir = self.dir.join(SNAPSHOTS_DIR);
        fs::create_dir_all(&snapshots_dir).with_context(|| {
            format!(
                "Failed to create snapshot directory: {}",
                snapshots_dir.display()
            )
        })?;

        let bytes = encode_within(
            &EnvelopeRef {
                format_version: STORE_FORMAT_VERSION,
                name,
                snapshot,
            },
            self.compression_level,
            self.max_bytes,
        )
        .with_context(|| format!("Failed to save snapshot '{name}'"))?;

        let writer = Arc::clone(&self.writers.entry(name.to_string()).or_default());
        let _guard = writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _file_lock = self.lock_slot(name)?;

        let target = self.snapshot_path(name);
        let mut temp = NamedTempFile::new_in(&snapshots_dir)
            .context("Failed to create temporary snapshot file")?;
        temp.write_all(&bytes)
            .context("Failed to write snapshot data")?;
        temp.as_file()
            .sync_all()
            .context("Failed to flush snapshot data")?;
        temp.persist(&target)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to replace snapshot: {}", target.display()))?;

        tracing::debug!(
            name,
            files = snapshot.len(),
            bytes = bytes.len(),
            "Saved snapshot"
        );
        Ok(())
    }

    /// Load the snapshot stored under `name`.
    ///
    /// Missing, unreadable, corrupt and wrong-version records all come back
    /// as `None`; the caller recovers by scanning again.
    #[must_use]
    pub fn load(&self, name: &str) -> Option<Snapshot> {
        if Self::validate_name(name).is_err() {
            return None;
        }
        let path = self.snapshot_path(name);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(name, error = %e, "Failed to read stored snapshot");
                return None;
            }
        };

        match decode::<Envelope>(&bytes) {
            Ok(envelope) if envelope.format_version == STORE_FORMAT_VERSION => {
                if envelope.name != name {
                    tracing::debug!(name, stored = %envelope.name, "Snapshot file was renamed");
                }
                Some(envelope.snapshot)
            }
            Ok(envelope) => {
                tracing::warn!(
                    name,
                    version = envelope.format_version,
                    expected = STORE_FORMAT_VERSION,
                    "Ignoring snapshot with unsupported format version"
                );
                None
            }
            Err(e) => {
                tracing::warn!(name, error = %e, "Ignoring corrupt snapshot");
                None
            }
        }
    }

    /// Load `name` only if it describes `root`.
    #[must_use]
    pub fn load_for_root(&self, name: &str, root: &Path) -> Option<Snapshot> {
        let resolved = utils::resolve_root(root);
        self.load(name).filter(|s| s.root() == resolved.as_path())
    }

    /// All readable snapshots, oldest capture first.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot directory exists but cannot be read.
    pub fn list(&self) -> Result<Vec<StoredSnapshotInfo>> {
        let snapshots_dir = self.dir.join(SNAPSHOTS_DIR);
        if !snapshots_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&snapshots_dir).with_context(|| {
            format!(
                "Failed to read snapshot directory: {}",
                snapshots_dir.display()
            )
        })?;

        let mut infos = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some(SNAPSHOT_EXT) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(snapshot) = self.load(name) {
                infos.push(StoredSnapshotInfo {
                    name: name.to_string(),
                    captured_at: snapshot.captured_at(),
                    root: snapshot.root().to_path_buf(),
                    file_count: snapshot.len(),
                });
            }
        }

        infos.sort_by(|a, b| {
            a.captured_at
                .cmp(&b.captured_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(infos)
    }

    /// Delete the slot `name`. Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or the file cannot be removed.
    pub fn remove(&self, name: &str) -> Result<bool> {
        Self::validate_name(name)?;

        let writer = Arc::clone(&self.writers.entry(name.to_string()).or_default());
        let _guard = writer.lock().unwrap_or_else(PoisonError::into_inner);

        let path = self.snapshot_path(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove snapshot: {}", path.display())),
        }
    }

    fn snapshot_path(&self, name: &str) -> PathBuf {
        self.dir
            .join(SNAPSHOTS_DIR)
            .join(format!("{name}.{SNAPSHOT_EXT}"))
    }

    /// Take the cross-process writer lock for a slot. Released when the
    /// returned handle is dropped.
    fn lock_slot(&self, name: &str) -> Result<File> {
        let locks_dir = self.dir.join(LOCKS_DIR);
        fs::create_dir_all(&locks_dir).context("Failed to create locks directory")?;

        let lock_path = locks_dir.join(format!("{name}.lock"));
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("Failed to lock snapshot slot: {name}"))?;
        Ok(file)
    }
}
