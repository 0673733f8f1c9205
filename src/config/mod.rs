pub mod parser;

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub core: CoreConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub performance: PerformanceConfig,

    /// Report rendering options
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoreConfig {
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanConfig {
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchConfig {
    /// Seconds between polls; fractional values allowed
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,
    /// Describe changes with narrated phrases instead of plain markers
    #[serde(default = "default_narrate")]
    pub narrate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PerformanceConfig {
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,
    /// Files at least this large are hashed in chunks
    #[serde(default = "default_stream_threshold")]
    pub stream_threshold: u64,
    /// Reuse digests of files whose size and mtime are unchanged
    #[serde(default)]
    pub reuse_digests: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportConfig {
    /// Paths listed per change group before eliding
    #[serde(default = "default_report_limit")]
    pub limit: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            compression_level: default_compression_level(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: default_ignore_patterns(),
            follow_symlinks: false,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            narrate: default_narrate(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            parallel_threads: default_parallel_threads(),
            stream_threshold: default_stream_threshold(),
            reuse_digests: false,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            limit: default_report_limit(),
        }
    }
}

/// Every key accepted by [`Config::get`] and [`Config::set`].
pub const KEYS: &[&str] = &[
    "core.store_path",
    "core.compression_level",
    "scan.ignore_patterns",
    "scan.follow_symlinks",
    "watch.interval_secs",
    "watch.narrate",
    "performance.parallel_threads",
    "performance.stream_threshold",
    "performance.reuse_digests",
    "report.limit",
];

impl Config {
    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot read or parse the configuration file
    /// - Configuration file contains invalid TOML or out-of-range values
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        parser::parse_config_file(path)
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot write to the file
    /// - TOML serialization fails
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        file.write_all(toml_str.as_bytes())?;
        Ok(())
    }

    /// Poll interval as a duration.
    #[must_use]
    pub fn watch_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.watch.interval_secs).unwrap_or(Duration::from_secs(2))
    }

    /// Get a configuration value by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let (section, name) = key.split_once('.')?;

        match (section, name) {
            ("core", "store_path") => Some(self.core.store_path.display().to_string()),
            ("core", "compression_level") => Some(self.core.compression_level.to_string()),
            ("scan", "ignore_patterns") => Some(self.scan.ignore_patterns.join(",")),
            ("scan", "follow_symlinks") => Some(self.scan.follow_symlinks.to_string()),
            ("watch", "interval_secs") => Some(self.watch.interval_secs.to_string()),
            ("watch", "narrate") => Some(self.watch.narrate.to_string()),
            ("performance", "parallel_threads") => {
                Some(self.performance.parallel_threads.to_string())
            }
            ("performance", "stream_threshold") => {
                Some(self.performance.stream_threshold.to_string())
            }
            ("performance", "reuse_digests") => Some(self.performance.reuse_digests.to_string()),
            ("report", "limit") => Some(self.report.limit.to_string()),
            _ => None,
        }
    }

    /// All keys with their current values, in [`KEYS`] order.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        KEYS.iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }

    /// Set a configuration value by key
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The key format is invalid (must be section.key)
    /// - The key is unknown
    /// - The value does not parse or is out of range for the key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let (section, name) = key
            .split_once('.')
            .ok_or_else(|| anyhow!("Invalid configuration key: {key}"))?;

        match (section, name) {
            ("core", "store_path") => {
                self.core.store_path = crate::utils::expand_tilde(value)?;
            }
            ("core", "compression_level") => {
                let level: i32 = value
                    .parse()
                    .with_context(|| format!("Invalid compression level: {value}"))?;
                parser::check_compression_level(level)?;
                self.core.compression_level = level;
            }
            ("scan", "ignore_patterns") => {
                self.scan.ignore_patterns = value
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            ("scan", "follow_symlinks") => {
                self.scan.follow_symlinks = parse_bool(value)?;
            }
            ("watch", "interval_secs") => {
                let secs: f64 = value
                    .parse()
                    .with_context(|| format!("Invalid number: {value}"))?;
                parser::check_interval(secs)?;
                self.watch.interval_secs = secs;
            }
            ("watch", "narrate") => {
                self.watch.narrate = parse_bool(value)?;
            }
            ("performance", "parallel_threads") => {
                let threads: usize = value
                    .parse()
                    .with_context(|| format!("Invalid number: {value}"))?;
                if threads == 0 {
                    bail!("Parallel threads must be at least 1");
                }
                self.performance.parallel_threads = threads;
            }
            ("performance", "stream_threshold") => {
                self.performance.stream_threshold = value
                    .parse()
                    .with_context(|| format!("Invalid number: {value}"))?;
            }
            ("performance", "reuse_digests") => {
                self.performance.reuse_digests = parse_bool(value)?;
            }
            ("report", "limit") => {
                let limit: usize = value
                    .parse()
                    .with_context(|| format!("Invalid number: {value}"))?;
                if limit == 0 {
                    bail!("Report limit must be at least 1");
                }
                self.report.limit = limit;
            }
            _ => bail!("Unknown configuration key: {key}"),
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    value
        .parse()
        .with_context(|| format!("Invalid boolean: {value}"))
}

// Default functions for serde
fn default_store_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
    home.join(crate::DEFAULT_STORE_DIR)
}

const fn default_compression_level() -> i32 {
    crate::storage::DEFAULT_COMPRESSION_LEVEL
}

fn default_ignore_patterns() -> Vec<String> {
    [".git", "node_modules", "__pycache__", "*.swp", "*.tmp"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

const fn default_interval_secs() -> f64 {
    2.0
}

const fn default_narrate() -> bool {
    true
}

fn default_parallel_threads() -> usize {
    crate::utils::thread_pool::default_workers()
}

const fn default_stream_threshold() -> u64 {
    crate::fingerprint::DEFAULT_STREAM_THRESHOLD
}

const fn default_report_limit() -> usize {
    10
}
