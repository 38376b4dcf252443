//! ctgen CLI - component-testing scaffolding for Nx-style workspaces

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ctgen::errors::GeneratorError;
use ctgen::util::diagnostic;

mod cli;
mod commands;

use cli::{Cli, Commands};

/// Options shared by every command.
pub struct GlobalOptions {
    pub verbose: bool,
    pub workspace: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<GeneratorError>() {
            Some(err) => diagnostic::emit(&err.to_diagnostic(), color),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("ctgen=debug")
    } else {
        EnvFilter::new("ctgen=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let global = GlobalOptions {
        verbose: cli.verbose,
        workspace: cli.workspace,
    };

    match cli.command {
        Commands::ComponentProject(args) => commands::component_project::execute(args, &global),
        Commands::DevServer(args) => commands::dev_server::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
