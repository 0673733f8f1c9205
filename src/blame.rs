//! Best-effort `git blame` lookups.
//!
//! Everything here degrades to `None`: no git binary, a file outside any
//! repository, an untracked file or a slow repository all just mean "no
//! blame available".

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Upper bound for locating the repository.
const TOPLEVEL_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound for the blame itself.
const BLAME_TIMEOUT: Duration = Duration::from_secs(10);

/// How often a running git child is checked for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// One line's attribution from `git blame`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlameEntry {
    /// Author name
    pub author: String,
    /// Author time
    pub time: DateTime<Utc>,
    /// First line of the commit message
    pub summary: String,
}

/// The `limit` most recent distinct (author, summary) attributions for
/// lines of `path`, newest first.
#[must_use]
pub fn recent_blame(path: &Path, limit: usize) -> Option<Vec<BlameEntry>> {
    match try_recent_blame(path, limit) {
        Ok(entries) if !entries.is_empty() => Some(entries),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %format!("{e:#}"), "Blame unavailable");
            None
        }
    }
}

fn try_recent_blame(path: &Path, limit: usize) -> Result<Vec<BlameEntry>> {
    let git = which::which("git").context("git not found on PATH")?;

    let absolute = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    let parent = absolute
        .parent()
        .ok_or_else(|| anyhow!("{} has no parent directory", absolute.display()))?;

    let toplevel = run_git(
        &git,
        parent,
        &[OsStr::new("rev-parse"), OsStr::new("--show-toplevel")],
        TOPLEVEL_TIMEOUT,
    )?;
    let toplevel = PathBuf::from(toplevel.trim())
        .canonicalize()
        .context("Failed to resolve repository root")?;
    let relative = absolute
        .strip_prefix(&toplevel)
        .context("File is outside the repository")?;

    let porcelain = run_git(
        &git,
        &toplevel,
        &[
            OsStr::new("blame"),
            OsStr::new("--line-porcelain"),
            OsStr::new("--"),
            relative.as_os_str(),
        ],
        BLAME_TIMEOUT,
    )?;

    Ok(most_recent(parse_porcelain(&porcelain), limit))
}

/// Run git in `dir`, returning stdout. Kills the child once `timeout` elapses.
fn run_git(git: &Path, dir: &Path, args: &[&OsStr], timeout: Duration) -> Result<String> {
    let mut child = Command::new(git)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .context("Failed to run git")?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("git stdout was not captured"))?;
    // Drain concurrently so a large blame cannot fill the pipe and stall git
    let reader = thread::spawn(move || {
        let mut buf = Vec::new();
        stdout.read_to_end(&mut buf).map(|_| buf)
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait().context("Failed to wait for git")? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            bail!("git timed out after {timeout:?}");
        }
        thread::sleep(POLL_INTERVAL);
    };

    let bytes = reader
        .join()
        .map_err(|_| anyhow!("git output reader panicked"))?
        .context("Failed to read git output")?;

    if !status.success() {
        bail!("git exited with {status}");
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Parse `git blame --line-porcelain` output into one entry per line.
/// Lines missing any of author, time or summary are dropped.
#[must_use]
pub fn parse_porcelain(output: &str) -> Vec<BlameEntry> {
    let mut entries = Vec::new();
    let mut author = None;
    let mut time = None;
    let mut summary = None;

    for line in output.lines() {
        if let Some(rest) = line.strip_prefix("author ") {
            author = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix("author-time ") {
            time = rest
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
        } else if let Some(rest) = line.strip_prefix("summary ") {
            summary = Some(rest.to_string());
        } else if line.starts_with('\t') {
            if let (Some(author), Some(time), Some(summary)) =
                (author.take(), time.take(), summary.take())
            {
                entries.push(BlameEntry {
                    author,
                    time,
                    summary,
                });
            }
        }
    }

    entries
}

/// Newest first, one entry per distinct (author, summary), at most `limit`.
#[must_use]
pub fn most_recent(mut entries: Vec<BlameEntry>, limit: usize) -> Vec<BlameEntry> {
    entries.sort_by(|a, b| b.time.cmp(&a.time));

    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert((e.author.clone(), e.summary.clone())))
        .take(limit)
        .collect()
}
