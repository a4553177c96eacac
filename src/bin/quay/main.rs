//! Quay CLI - import and export resolution for CMake projects

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use quay::ops::fetch::CloneError;
use quay::resolver::ImportError;
use quay::util::{ColorChoice, Diagnostic, GlobalContext, Shell};

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let color = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let shell = Arc::new(Shell::from_flags(
        cli.quiet,
        cli.verbose,
        color,
        cli.wants_json(),
    ));

    if let Err(e) = run(cli, &shell) {
        report_error(&e, &shell);
        std::process::exit(1);
    }
}

fn run(cli: Cli, shell: &Arc<Shell>) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("quay=debug")
    } else if cli.quiet || cli.wants_json() {
        EnvFilter::new("quay=error")
    } else {
        EnvFilter::new("quay=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(cli.verbose);
    ctx.set_color(shell.use_color());
    ctx.set_registry(cli.registry.clone());

    match cli.command {
        Commands::Init(args) => commands::init::execute(args, &ctx, shell),
        Commands::Gen => commands::gen::execute(&ctx, shell),
        Commands::Fetch => commands::fetch::execute(&ctx, shell),
        Commands::Clone(args) => commands::clone::execute(args, &ctx, shell),
        Commands::List(args) => commands::list::execute(args, &ctx, shell),
        Commands::Tree(args) => commands::tree::execute(args, &ctx, shell),
        Commands::Diag(args) => commands::diag::execute(args, &ctx, shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Print an error, as a diagnostic with notes and help when quay knows it.
fn report_error(e: &anyhow::Error, shell: &Shell) {
    shell.diagnostic(&error_diagnostic(e));
}

fn error_diagnostic(e: &anyhow::Error) -> Diagnostic {
    let (cause, mut diag) = if let Some(err) = e.downcast_ref::<ImportError>() {
        (err.to_string(), err.to_diagnostic())
    } else if let Some(err) = e.downcast_ref::<CloneError>() {
        (err.to_string(), err.to_diagnostic())
    } else {
        return Diagnostic::error(format!("{:#}", e));
    };

    // Added context becomes the headline, the known error its first note.
    let headline = e.to_string();
    if headline != cause {
        let message = std::mem::replace(&mut diag.message, headline);
        diag.notes.insert(0, message);
    }
    diag
}
