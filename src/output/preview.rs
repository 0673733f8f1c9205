//! Short text excerpts of changed files.

use anyhow::{Context, Result};
use content_inspector::{ContentType, inspect};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{Level, debug, span};

use crate::utils::formatters::truncate_chars;

/// Longest excerpt line, in characters.
pub const PREVIEW_WIDTH: usize = 60;

/// Check if a file is binary by inspecting its first 8KB.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn is_binary_file(path: &Path) -> Result<bool> {
    let span = span!(Level::DEBUG, "binary_check", path = %path.display());
    let _guard = span.enter();

    let mut file = File::open(path)
        .with_context(|| format!("Failed to open file for binary check: {}", path.display()))?;

    let mut buffer = [0u8; 8192];
    let n = file
        .read(&mut buffer)
        .with_context(|| format!("Failed to read file for binary check: {}", path.display()))?;

    if n == 0 {
        return Ok(false);
    }

    let is_binary = matches!(inspect(&buffer[..n]), ContentType::BINARY);
    debug!(is_binary, bytes_checked = n, "Binary detection complete");
    Ok(is_binary)
}

/// First `count` lines of a text file, trimmed and truncated.
///
/// `None` for binary, unreadable or missing files.
#[must_use]
pub fn head_lines(path: &Path, count: usize) -> Option<Vec<String>> {
    let reader = open_text(path)?;
    let mut lines = Vec::with_capacity(count);
    for line in reader.split(b'\n').take(count) {
        lines.push(clean_line(&line.ok()?));
    }
    Some(lines)
}

/// Last `count` lines of a text file, trimmed and truncated.
///
/// `None` for binary, unreadable or missing files.
#[must_use]
pub fn tail_lines(path: &Path, count: usize) -> Option<Vec<String>> {
    let reader = open_text(path)?;
    let mut window = VecDeque::with_capacity(count + 1);
    for line in reader.split(b'\n') {
        window.push_back(line.ok()?);
        if window.len() > count {
            window.pop_front();
        }
    }
    Some(window.iter().map(|l| clean_line(l)).collect())
}

fn open_text(path: &Path) -> Option<BufReader<File>> {
    match is_binary_file(path) {
        Ok(false) => File::open(path).ok().map(BufReader::new),
        Ok(true) => None,
        Err(e) => {
            debug!(error = %e, "Preview unavailable");
            None
        }
    }
}

fn clean_line(raw: &[u8]) -> String {
    let text = match simdutf8::basic::from_utf8(raw) {
        Ok(text) => std::borrow::Cow::Borrowed(text),
        Err(_) => String::from_utf8_lossy(raw),
    };
    truncate_chars(text.trim_end(), PREVIEW_WIDTH).to_string()
}
