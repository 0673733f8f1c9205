//! Command-line interface definitions for witness.
//!
//! This module contains all CLI argument parsing structures using clap's derive macros.
//! The CLI definitions are shared between the main binary and build tools (like xtask)
//! for man page generation.
//!
//! Note: Field-level documentation is provided via clap attributes,
//! so we allow missing_docs for this module to avoid redundant documentation.

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Main CLI structure for witness.
#[derive(Parser)]
#[command(
    name = "witness",
    version = crate::VERSION,
    about = "A quiet observer of filesystem changes",
    long_about = "Snapshots directory trees with xxHash3 content digests and reports what was created, modified or deleted"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// All available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Scan a directory once and list what is there
    Scan {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Only look at direct children of the directory
        #[arg(short, long)]
        flat: bool,

        /// Deepest file depth to include (direct children are depth 1)
        #[arg(short, long)]
        depth: Option<usize>,

        /// Remember this scan for a later `witness diff`
        #[arg(short, long)]
        save: bool,
    },

    /// Show what changed since the last scan of a directory
    Diff {
        /// Directory to compare
        #[arg(default_value = ".")]
        path: PathBuf,

        #[arg(short, long)]
        flat: bool,

        #[arg(short, long)]
        depth: Option<usize>,

        /// Show the first or last lines of changed text files
        #[arg(short, long)]
        content: bool,

        /// Show recent git blame for modified files
        #[arg(short, long)]
        blame: bool,
    },

    /// Watch a directory and report changes as they happen
    Watch {
        /// Directory to watch
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Time between scans (e.g. "2s", "500ms"); defaults to watch.interval_secs
        #[arg(short, long, value_parser = humantime::parse_duration)]
        interval: Option<Duration>,

        #[arg(short, long)]
        flat: bool,

        #[arg(short, long)]
        depth: Option<usize>,

        /// Print `+`, `~` and `-` markers instead of narration
        #[arg(long)]
        plain: bool,

        /// Save every scan so a later `witness diff` starts from it
        #[arg(long)]
        persist: bool,
    },

    /// Save a named snapshot of a directory
    Snapshot {
        /// Directory to capture
        path: PathBuf,

        /// Name to save under
        name: String,
    },

    /// List saved snapshots
    List,

    /// Compare two saved snapshots
    Compare {
        /// Older snapshot
        from: String,

        /// Newer snapshot
        to: String,
    },

    /// Delete a saved snapshot
    Forget {
        /// Snapshot to delete
        name: String,
    },

    /// Rotate the `now` snapshot to `prev` and show what changed
    Quick {
        /// Directory to capture
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// List files nobody has touched for a while
    Dormant {
        /// Directory to inspect
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Minimum age (e.g. "24h", "7days")
        #[arg(short, long, default_value = "24h", value_parser = humantime::parse_duration)]
        threshold: Duration,

        /// Maximum files to list (per project with --projects); defaults to report.limit
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Group dormant files by top-level directory
        #[arg(short, long)]
        projects: bool,

        /// Rank top-level directories by their latest modification
        #[arg(short, long)]
        activity: bool,

        /// Keep checking and report files as they become dormant
        #[arg(short, long, conflicts_with_all = ["projects", "activity"])]
        watch: bool,

        /// Time between checks with --watch (e.g. "1m"); defaults to watch.interval_secs
        #[arg(short, long, requires = "watch", value_parser = humantime::parse_duration)]
        interval: Option<Duration>,
    },

    /// Get and set configuration options
    Config {
        /// Configuration key (e.g. watch.interval_secs)
        key: Option<String>,

        /// Configuration value to set
        value: Option<String>,

        /// List all configuration values
        #[arg(short, long)]
        list: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
