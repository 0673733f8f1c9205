//! Named snapshot commands: `snapshot`, `list`, `forget` and `quick`.

use crate::WitnessContext;
use crate::commands::context::CommandContext;
use crate::diff;
use crate::output::{self, report};
use anyhow::Result;
use std::path::Path;

/// Slot `quick` writes the fresh scan to.
pub const QUICK_CURRENT: &str = "now";

/// Slot `quick` moves the previous fresh scan to.
pub const QUICK_PREVIOUS: &str = "prev";

/// Scan `path` and save it under `name`.
///
/// # Errors
///
/// Returns an error if:
/// - The path does not exist or cannot be listed
/// - The name is invalid or the snapshot cannot be written
pub fn save(ctx: &WitnessContext, path: &Path, name: &str) -> Result<()> {
    let root = ctx.resolve_target(path)?;
    let snapshot = ctx.snapshotter(true, None).scan(&root)?;
    ctx.store().save(name, &snapshot)?;
    output::print_lines([format!("saved as: {name} ({} files)", snapshot.len())]);
    Ok(())
}

/// Print every stored snapshot, oldest first.
///
/// # Errors
///
/// Returns an error if the store directory exists but cannot be read.
pub fn list(ctx: &WitnessContext) -> Result<()> {
    let infos = ctx.store().list()?;
    output::print_lines(report::render_list(&infos));
    Ok(())
}

/// Delete a stored snapshot. A missing name only warns.
///
/// # Errors
///
/// Returns an error if the snapshot file exists but cannot be removed.
pub fn forget(ctx: &WitnessContext, name: &str) -> Result<()> {
    if ctx.store().remove(name)? {
        output::success(&format!("forgot '{name}'"));
    } else {
        output::warning(&format!("no snapshot named '{name}'"));
    }
    Ok(())
}

/// Save a fresh scan as `now`, keep the previous `now` as `prev` and report
/// what changed between them.
///
/// # Errors
///
/// Returns an error if:
/// - The path does not exist or cannot be listed
/// - Either snapshot cannot be written
pub fn quick(ctx: &WitnessContext, path: &Path) -> Result<()> {
    let root = ctx.resolve_target(path)?;
    let store = ctx.store();

    output::info(&format!("scanning {}...", root.display()));
    let previous = store.load(QUICK_CURRENT);
    let current = ctx.snapshotter(true, None).scan(&root)?;

    if let Some(previous) = &previous {
        store.save(QUICK_PREVIOUS, previous)?;
        output::info(&format!(
            "previous '{QUICK_CURRENT}' saved as '{QUICK_PREVIOUS}'"
        ));
    }
    store.save(QUICK_CURRENT, &current)?;
    output::info(&format!(
        "saved as '{QUICK_CURRENT}' ({} files)",
        current.len()
    ));

    match previous {
        Some(previous) => {
            let result = diff::diff(&previous, &current);
            output::print_lines(report::render_comparison(
                QUICK_PREVIOUS,
                QUICK_CURRENT,
                &result,
                ctx.report_limit(),
            ));
        }
        None => output::print_lines([format!(
            "(no previous '{QUICK_CURRENT}' to diff against)"
        )]),
    }
    Ok(())
}
