use crate::WitnessContext;
use crate::commands::context::CommandContext;
use crate::diff;
use crate::output::{self, report};
use anyhow::{Result, anyhow};

/// Execute compare command: report the changes between two stored snapshots
///
/// # Errors
///
/// Returns an error if either snapshot is missing or unreadable
pub fn execute(ctx: &WitnessContext, from: &str, to: &str) -> Result<()> {
    let store = ctx.store();
    let older = store
        .load(from)
        .ok_or_else(|| anyhow!("no snapshot named '{from}' (see `witness list`)"))?;
    let newer = store
        .load(to)
        .ok_or_else(|| anyhow!("no snapshot named '{to}' (see `witness list`)"))?;

    if older.root() != newer.root() {
        output::warning(&format!(
            "snapshots cover different directories: {} and {}",
            older.root().display(),
            newer.root().display()
        ));
    }

    let result = diff::diff(&older, &newer);
    output::print_lines(report::render_comparison(
        from,
        to,
        &result,
        ctx.report_limit(),
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_compare_missing_snapshot() -> Result<()> {
        let dir = tempdir()?;
        let ctx = WitnessContext::new_explicit(
            dir.path().join("store"),
            dir.path().join("config.toml"),
        )?;
        let snapshot = ctx.snapshotter(true, None).scan(dir.path())?;
        ctx.store().save("here", &snapshot)?;

        assert!(execute(&ctx, "here", "here").is_ok());
        let err = execute(&ctx, "here", "absent").err().map(|e| e.to_string());
        assert_eq!(
            err.as_deref(),
            Some("no snapshot named 'absent' (see `witness list`)")
        );
        Ok(())
    }
}
