//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use ctgen::core::build_config::Compiler;
use ctgen::ops::component_project::ComponentType;
use ctgen::ops::install::PackageManager;

/// ctgen - scaffold Cypress component testing into workspace projects
#[derive(Parser)]
#[command(name = "ctgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Workspace root (defaults to the nearest directory with workspace.json or nx.json)
    #[arg(long, global = true, env = "CTGEN_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a Cypress component-test target to a project
    ComponentProject(ComponentProjectArgs),

    /// Compose the component dev server configuration
    DevServer(DevServerArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct ComponentProjectArgs {
    /// Project to add component testing to
    #[arg(long)]
    pub project: String,

    /// Compiler used by the component dev server (babel or swc)
    #[arg(long, default_value = "babel")]
    pub compiler: Compiler,

    /// Kind of components under test (react, next or other)
    #[arg(long, default_value = "react")]
    pub component_type: ComponentType,

    /// Overwrite an existing component testing setup
    #[arg(long)]
    pub force: bool,

    /// Show the changes without writing them
    #[arg(long)]
    pub dry_run: bool,

    /// Do not run the package manager
    #[arg(long)]
    pub skip_install: bool,

    /// Package manager to install with (npm, yarn or pnpm)
    #[arg(long)]
    pub package_manager: Option<PackageManager>,
}

#[derive(Args)]
pub struct DevServerArgs {
    /// JSON file holding the framework's base build configuration
    #[arg(long)]
    pub base_config: PathBuf,

    /// tsconfig used by the dev server (defaults to tsconfig.cy.json)
    #[arg(long)]
    pub ts_config: Option<String>,

    /// Compiler rule to add (babel or swc, defaults to babel)
    #[arg(long)]
    pub compiler: Option<Compiler>,

    /// Dev server options as a JSON object
    #[arg(long)]
    pub options: Option<String>,

    /// Where to write the composed launch configuration
    #[arg(short, long, default_value = "dev-server.json")]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
