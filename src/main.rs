use anyhow::Result;
use clap::{Command, CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;
use witness::cli::{Cli, Commands};
use witness::output::{self, Verbosity};
use witness::{WitnessContext, commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    output::set_verbosity(if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    });

    if let Commands::Completion { shell } = cli.command {
        print_completions(shell, &mut Cli::command());
        return Ok(());
    }

    let mut ctx = WitnessContext::new()?;

    match cli.command {
        Commands::Scan {
            path,
            flat,
            depth,
            save,
        } => commands::scan::execute(&ctx, &path, !flat, depth, save),
        Commands::Diff {
            path,
            flat,
            depth,
            content,
            blame,
        } => commands::diff::execute(
            &ctx,
            &path,
            !flat,
            depth,
            commands::diff::Details { content, blame },
        ),
        Commands::Watch {
            path,
            interval,
            flat,
            depth,
            plain,
            persist,
        } => commands::watch::execute(
            &ctx,
            &path,
            commands::watch::WatchArgs {
                interval,
                recursive: !flat,
                depth,
                plain,
                persist,
            },
        ),
        Commands::Snapshot { path, name } => commands::snapshot::save(&ctx, &path, &name),
        Commands::List => commands::snapshot::list(&ctx),
        Commands::Forget { name } => commands::snapshot::forget(&ctx, &name),
        Commands::Quick { path } => commands::snapshot::quick(&ctx, &path),
        Commands::Compare { from, to } => commands::compare::execute(&ctx, &from, &to),
        Commands::Dormant {
            path,
            threshold,
            limit,
            projects,
            activity,
            watch,
            interval,
        } => commands::dormant::execute(
            &ctx,
            &path,
            commands::dormant::DormantArgs {
                threshold,
                limit,
                projects,
                activity,
                watch,
                interval,
            },
        ),
        Commands::Config { key, value, list } => {
            commands::config::execute(&mut ctx, key.as_deref(), value, list)
        }
        Commands::Completion { .. } => Ok(()),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(witness::LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("witness={default_level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn print_completions<G: Generator>(g: G, cmd: &mut Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
