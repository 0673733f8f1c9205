use crate::WitnessContext;
use crate::output;
use anyhow::{Result, bail};
use colored::Colorize;

/// Execute config command to get/set configuration values
///
/// # Errors
///
/// Returns an error if:
/// - The key is unknown
/// - The value is invalid for the key
/// - Failed to save configuration
pub fn execute(
    ctx: &mut WitnessContext,
    key: Option<&str>,
    value: Option<String>,
    list: bool,
) -> Result<()> {
    // If --list flag is set or no key is provided, show all configuration
    let Some(key) = key.filter(|_| !list) else {
        show_all_config(ctx);
        return Ok(());
    };

    if let Some(val) = value {
        ctx.config.set(key, &val)?;
        ctx.config.save(&ctx.config_path)?;
        output::success(&format!("Set {key} = {val}"));
    } else if let Some(val) = ctx.config.get(key) {
        output::print_lines([val]);
    } else {
        bail!("Unknown configuration key: {key}");
    }

    Ok(())
}

/// Show all configuration values, grouped by section
fn show_all_config(ctx: &WitnessContext) {
    let mut current_section = "";
    for (key, value) in ctx.config.entries() {
        let (section, name) = key.split_once('.').unwrap_or(("", key));
        if section != current_section {
            if !current_section.is_empty() {
                println!();
            }
            println!("{}", format!("[{section}]").bold());
            current_section = section;
        }
        println!("  {name} = {value}");
    }
}
