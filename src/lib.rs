#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
// Allow pedantic strict lints that create false positives in this codebase
#![allow(clippy::arithmetic_side_effects)] // Counters and sizes cannot realistically overflow
#![allow(clippy::float_arithmetic)] // Required for age and interval formatting
#![allow(clippy::indexing_slicing)] // Bounds checked by logic

//! # Witness - A Quiet Observer of Filesystem Changes
//!
//! Witness captures the state of a directory tree as a [`snapshot::Snapshot`]
//! (relative path, modification time, size and content digest per file),
//! stores snapshots by name and classifies the differences between any two
//! of them as created, modified or deleted.
//!
//! ## Features
//!
//! - **Content Fingerprints**: Files are hashed with xxHash3; only content changes count
//! - **Parallel Scanning**: Digests are computed on a bounded Rayon pool
//! - **Durable Snapshots**: Bincode + Zstandard files replaced atomically
//! - **Polling Watcher**: Interval-driven change detection with clean cancellation
//!
//! ## Architecture
//!
//! - [`fingerprint`]: Per-file content digests
//! - [`scanner`]: Directory walking, exclusion rules and snapshot capture
//! - [`storage`]: Named snapshot persistence
//! - [`diff`]: Snapshot comparison
//! - [`poller`]: Repeated scan-and-diff loop
//! - [`commands`]: CLI command implementations
//! - [`output`]: Reports and terminal messages
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let before = witness::scanner::scan(Path::new("/tmp/project"), true, None)?;
//! // ... files change ...
//! let after = witness::scanner::scan(Path::new("/tmp/project"), true, None)?;
//!
//! let result = witness::diff::diff(&before, &after);
//! for entry in &result.entries {
//!     println!("{} {}", entry.kind.symbol(), entry.relative_path);
//! }
//! # Ok(())
//! # }
//! ```

/// Best-effort git blame lookups.
pub mod blame;

/// Cooperative cancellation tokens.
pub mod cancel;

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Commands module containing all CLI command implementations.
pub mod commands;

/// Configuration parsing, validation, and management.
pub mod config;

/// Snapshot comparison.
pub mod diff;

/// Files untouched for longer than a threshold.
pub mod dormant;

/// Content digests for single files.
pub mod fingerprint;

/// Watcher locking to prevent duplicate watchers of one root.
pub mod lock;

/// Output formatting and reports.
pub mod output;

/// Interval-driven scan-and-diff loop.
pub mod poller;

/// Filesystem scanning and directory traversal.
pub mod scanner;

/// Interrupt handling.
pub mod signal;

/// Snapshot data model.
pub mod snapshot;

/// Snapshot persistence.
pub mod storage;

/// Utility functions and helpers.
pub mod utils;

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Current version of the witness binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default store directory name within the home directory.
pub const DEFAULT_STORE_DIR: &str = ".witness";

/// Default configuration file path relative to home directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config/witness/config.toml";

/// Directory inside the store holding watcher locks.
pub const WATCHERS_DIR: &str = "watchers";

/// Environment variable overriding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "WITNESS_CONFIG_PATH";

/// Environment variable overriding the store directory.
pub const STORE_PATH_ENV: &str = "WITNESS_STORE_PATH";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "WITNESS_LOG";

/// Central context for all witness commands.
///
/// Holds the store location and loaded configuration.
///
/// # Examples
///
/// ```no_run
/// use witness::WitnessContext;
///
/// # fn main() -> anyhow::Result<()> {
/// // Create context with default paths
/// let ctx = WitnessContext::new()?;
///
/// // Create context with custom paths (for testing)
/// let ctx = WitnessContext::new_explicit(
///     "/tmp/test_store".into(),
///     "/tmp/test_config.toml".into()
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WitnessContext {
    /// Directory holding stored snapshots and locks.
    pub store_path: PathBuf,

    /// Path to the configuration file.
    pub config_path: PathBuf,

    /// Loaded configuration settings.
    pub config: config::Config,
}

impl WitnessContext {
    /// Creates a new `WitnessContext` by loading the configuration from the
    /// default path, honoring the path override environment variables.
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined or if the
    /// configuration file cannot be read or created.
    pub fn new() -> Result<Self> {
        let config_path = if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            PathBuf::from(path)
        } else {
            let home = dirs::home_dir().context("Could not find home directory")?;
            home.join(DEFAULT_CONFIG_PATH)
        };

        let config = config::Config::load(&config_path)?;

        let store_path = if let Ok(path) = std::env::var(STORE_PATH_ENV) {
            PathBuf::from(path)
        } else {
            config.core.store_path.clone()
        };

        if let Err(e) = utils::thread_pool::configure_from_config(&config) {
            tracing::debug!(error = %e, "Hash worker pool left as configured");
        }

        Ok(Self {
            store_path,
            config_path,
            config,
        })
    }

    /// Creates a new `WitnessContext` with explicit paths.
    /// This avoids the need for environment variable manipulation in tests.
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be loaded or created.
    pub fn new_explicit(store_path: PathBuf, config_path: PathBuf) -> Result<Self> {
        let config = if config_path.exists() {
            config::Config::load(&config_path)?
        } else {
            let mut config = config::Config::default();
            config.core.store_path.clone_from(&store_path);
            config.save(&config_path)?;
            config
        };

        Ok(Self {
            store_path,
            config_path,
            config,
        })
    }

    /// Snapshot store at the configured location.
    #[must_use]
    pub fn store(&self) -> storage::SnapshotStore {
        storage::SnapshotStore::new(self.store_path.clone(), self.config.core.compression_level)
    }

    /// Directory for watcher locks.
    #[must_use]
    pub fn watchers_dir(&self) -> PathBuf {
        self.store_path.join(WATCHERS_DIR)
    }

    /// Snapshotter using the configured exclusions and digest settings.
    #[must_use]
    pub fn snapshotter(&self, recursive: bool, max_depth: Option<usize>) -> scanner::Snapshotter {
        let options = scanner::ScanOptions::from_config(&self.config.scan)
            .recursive(recursive)
            .max_depth(max_depth);
        scanner::Snapshotter::new(options).with_fingerprinter(fingerprint::Fingerprinter::new(
            self.config.performance.stream_threshold,
        ))
    }
}
