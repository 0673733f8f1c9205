use crate::WitnessContext;
use crate::commands::context::CommandContext;
use crate::output::{self, report};
use anyhow::Result;
use std::path::Path;

/// Execute scan command: capture a directory once and list what is there
///
/// # Errors
///
/// Returns an error if:
/// - The path does not exist
/// - The root cannot be listed
/// - `save` is set and the scan cannot be stored
pub fn execute(
    ctx: &WitnessContext,
    path: &Path,
    recursive: bool,
    depth: Option<usize>,
    save: bool,
) -> Result<()> {
    let root = ctx.resolve_target(path)?;
    let snapshotter = ctx.snapshotter(recursive, depth);
    let snapshot = snapshotter.scan(&root)?;

    output::print_lines(report::render_scan(
        &snapshot,
        &snapshotter.options().describe_mode(),
    ));

    if save {
        ctx.save_last_scan(&snapshot)?;
        output::success(&format!("saved scan ({} files)", snapshot.len()));
    }

    Ok(())
}
