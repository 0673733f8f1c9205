use super::{Config, KEYS};
use anyhow::{Context, Result, bail};
use std::path::Path;

/// Read, parse and validate a config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not UTF-8, is not valid
/// TOML or contains out-of-range values.
pub fn parse_config_file(path: &Path) -> Result<Config> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let content = simdutf8::basic::from_utf8(&bytes)
        .map_err(|e| anyhow::anyhow!("Invalid UTF-8 in config file: {e}"))?;

    parse_config_str(content)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

/// Parse and validate config text. Unknown keys are logged, not rejected.
///
/// # Errors
///
/// Returns an error if the text is not valid TOML for [`Config`] or a value
/// is out of range.
pub fn parse_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse TOML config")?;

    if let Ok(raw) = toml::from_str::<toml::Table>(content) {
        for key in unknown_keys(&raw) {
            tracing::warn!(key, "Unknown configuration field");
        }
    }

    validate_config(&config)?;
    Ok(config)
}

/// Check every field with a restricted range.
///
/// # Errors
///
/// Returns the first violated constraint.
pub fn validate_config(config: &Config) -> Result<()> {
    check_compression_level(config.core.compression_level)?;
    check_interval(config.watch.interval_secs)?;

    if config.performance.parallel_threads == 0 {
        bail!("Parallel threads must be at least 1");
    }

    if config.report.limit == 0 {
        bail!("Report limit must be at least 1");
    }

    Ok(())
}

pub(crate) fn check_compression_level(level: i32) -> Result<()> {
    if !(1..=22).contains(&level) {
        bail!("Compression level must be between 1 and 22");
    }
    Ok(())
}

pub(crate) fn check_interval(secs: f64) -> Result<()> {
    if !secs.is_finite() || secs <= 0.0 {
        bail!("Watch interval must be a positive number of seconds");
    }
    Ok(())
}

/// Dotted keys present in `raw` that the config does not know about.
fn unknown_keys(raw: &toml::Table) -> Vec<String> {
    let mut unknown = Vec::new();
    for (section, value) in raw {
        match value.as_table() {
            Some(table) => {
                for key in table.keys() {
                    let dotted = format!("{section}.{key}");
                    if !KEYS.contains(&dotted.as_str()) {
                        unknown.push(dotted);
                    }
                }
            }
            None => unknown.push(section.clone()),
        }
    }
    unknown
}
