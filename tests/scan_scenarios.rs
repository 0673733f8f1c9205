mod common;

use anyhow::Result;
use common::write_file;
use filetime::{FileTime, set_file_mtime};
use std::fs;
use std::sync::mpsc;
use std::time::Duration;
use tempfile::TempDir;
use witness::config::ScanConfig;
use witness::diff::{ChangeKind, DiffResult, diff};
use witness::poller::start_polling;
use witness::scanner::{ScanOptions, Snapshotter, scan};

fn paths(result: &DiffResult, kind: ChangeKind) -> Vec<&str> {
    result
        .of_kind(kind)
        .map(|e| e.relative_path.as_str())
        .collect()
}

#[test]
fn test_create_modify_delete_scenario() -> Result<()> {
    let dir = TempDir::new()?;
    write_file(dir.path(), "a.txt", "x")?;
    write_file(dir.path(), "b.txt", "y")?;

    let first = scan(dir.path(), true, None)?;
    assert_eq!(first.len(), 2);

    write_file(dir.path(), "a.txt", "z")?;
    fs::remove_file(dir.path().join("b.txt"))?;
    write_file(dir.path(), "c.txt", "w")?;

    let second = scan(dir.path(), true, None)?;
    let result = diff(&first, &second);

    assert_eq!(paths(&result, ChangeKind::Modified), ["a.txt"]);
    assert_eq!(paths(&result, ChangeKind::Deleted), ["b.txt"]);
    assert_eq!(paths(&result, ChangeKind::Created), ["c.txt"]);
    assert_eq!(result.unchanged_count, 0);
    Ok(())
}

#[test]
fn test_empty_directory() -> Result<()> {
    let dir = TempDir::new()?;
    let first = scan(dir.path(), true, None)?;
    let second = scan(dir.path(), true, None)?;

    assert!(first.is_empty());
    let result = diff(&first, &second);
    assert!(result.entries.is_empty());
    assert_eq!(result.unchanged_count, 0);
    Ok(())
}

#[test]
fn test_non_recursive_scan() -> Result<()> {
    let dir = TempDir::new()?;
    write_file(dir.path(), "x.txt", "x")?;
    write_file(dir.path(), "sub/y.txt", "y")?;

    let snapshot = scan(dir.path(), false, None)?;
    assert_eq!(snapshot.paths().collect::<Vec<_>>(), ["x.txt"]);
    Ok(())
}

#[test]
fn test_hidden_components_excluded_at_any_depth() -> Result<()> {
    let dir = TempDir::new()?;
    write_file(dir.path(), "visible.txt", "v")?;
    write_file(dir.path(), ".env", "secret")?;
    write_file(dir.path(), ".git/config", "c")?;
    write_file(dir.path(), "src/.cache/blob", "b")?;
    write_file(dir.path(), "src/deep/.hidden/file.txt", "f")?;
    write_file(dir.path(), "src/deep/kept.txt", "k")?;

    let snapshot = scan(dir.path(), true, None)?;
    assert_eq!(
        snapshot.paths().collect::<Vec<_>>(),
        ["src/deep/kept.txt", "visible.txt"]
    );
    Ok(())
}

#[test]
fn test_root_under_hidden_directory_is_scanned() -> Result<()> {
    let dir = TempDir::new()?;
    let root = dir.path().join(".config/app");
    write_file(&root, "settings.toml", "s")?;

    assert_eq!(scan(&root, true, None)?.len(), 1);
    Ok(())
}

#[test]
fn test_missing_and_file_roots_are_empty() -> Result<()> {
    let dir = TempDir::new()?;
    let file = write_file(dir.path(), "plain.txt", "p")?;

    assert!(scan(&dir.path().join("absent"), true, None)?.is_empty());
    assert!(scan(&file, true, None)?.is_empty());
    Ok(())
}

#[test]
fn test_ignore_patterns_prune() -> Result<()> {
    let dir = TempDir::new()?;
    write_file(dir.path(), "main.rs", "m")?;
    write_file(dir.path(), "node_modules/pkg/index.js", "i")?;
    write_file(dir.path(), "notes.swp", "s")?;
    write_file(dir.path(), "build/out.tmp", "t")?;

    let snapshotter = Snapshotter::new(ScanOptions::from_config(&ScanConfig::default()));
    let snapshot = snapshotter.scan(dir.path())?;
    assert_eq!(snapshot.paths().collect::<Vec<_>>(), ["main.rs"]);
    Ok(())
}

#[test]
fn test_same_size_rewrite_with_restored_mtime() -> Result<()> {
    let dir = TempDir::new()?;
    let file = write_file(dir.path(), "data.bin", "aaaa")?;
    let mtime = FileTime::from_unix_time(1_700_000_000, 0);
    set_file_mtime(&file, mtime)?;

    let snapshotter = Snapshotter::new(ScanOptions::default());
    let before = snapshotter.scan(dir.path())?;

    fs::write(&file, "bbbb")?;
    set_file_mtime(&file, mtime)?;

    // Full hashing always sees the new content
    let rescanned = snapshotter.scan(dir.path())?;
    assert_eq!(paths(&diff(&before, &rescanned), ChangeKind::Modified), ["data.bin"]);

    // Digest reuse trusts size and mtime, so the rewrite goes unseen
    let reused = snapshotter.scan_reusing(dir.path(), &before)?;
    assert!(diff(&before, &reused).entries.is_empty());
    Ok(())
}

#[test]
fn test_touch_without_content_change_is_unchanged() -> Result<()> {
    let dir = TempDir::new()?;
    let file = write_file(dir.path(), "same.txt", "content")?;
    let before = scan(dir.path(), true, None)?;

    set_file_mtime(&file, FileTime::from_unix_time(1_000_000_000, 0))?;
    let after = scan(dir.path(), true, None)?;

    let result = diff(&before, &after);
    assert!(result.entries.is_empty());
    assert_eq!(result.unchanged_count, 1);
    Ok(())
}

#[test]
fn test_start_polling_delivers_changes() -> Result<()> {
    let dir = TempDir::new()?;
    write_file(dir.path(), "seed.txt", "s")?;

    let (tx, rx) = mpsc::channel();
    let handle = start_polling(dir.path(), Duration::from_millis(20), true, None, move |result| {
        let _ = tx.send(result.clone());
    })?;

    // Let the seed scan land before changing anything
    std::thread::sleep(Duration::from_millis(200));
    write_file(dir.path(), "added.txt", "a")?;

    let result = rx.recv_timeout(Duration::from_secs(5))?;
    let stats = handle.stop()?;

    assert_eq!(paths(&result, ChangeKind::Created), ["added.txt"]);
    assert!(stats.ticks >= 2);
    assert!(stats.change_events >= 1);
    Ok(())
}
