//! `ctgen component-project` command

use std::io::IsTerminal;

use anyhow::Result;

use crate::cli::ComponentProjectArgs;
use crate::commands::workspace_root;
use crate::GlobalOptions;
use ctgen::core::tree::FileChange;
use ctgen::core::versions::Versions;
use ctgen::core::workspace::Workspace;
use ctgen::ops::component_project::{provision_component_testing, ComponentProjectOptions};
use ctgen::ops::finalize::DeferredAction;
use ctgen::ops::install::{InstallOutcome, Installer};
use ctgen::ops::probe::NodeModulesProbe;
use ctgen::util::config::{
    global_config_path, load_config, workspace_config_path, InstallConfig,
};
use ctgen::util::fs::to_slash;

/// Combine command-line flags with the `[install]` configuration.
///
/// Flags win over configuration.
pub fn build_installer(
    args: &ComponentProjectArgs,
    install: &InstallConfig,
    progress: bool,
) -> Installer {
    Installer {
        package_manager: args.package_manager.or(install.package_manager),
        skip: args.skip_install || install.skip.unwrap_or(false),
        progress,
    }
}

pub fn execute(args: ComponentProjectArgs, global: &GlobalOptions) -> Result<()> {
    let root = workspace_root(global)?;
    let config = load_config(global_config_path().as_deref(), &workspace_config_path(&root));
    let versions = Versions::with_overrides(&config.versions);

    let mut workspace = Workspace::load(&root)?;
    let options = ComponentProjectOptions {
        project: args.project.clone(),
        compiler: args.compiler,
        component_type: args.component_type,
        force: args.force,
    };
    let probe = NodeModulesProbe::new(&root);

    let pending = provision_component_testing(&mut workspace, &options, &probe, &versions)?;

    if args.dry_run {
        for change in workspace.tree().list_changes() {
            print_change(&change);
        }
        for action in pending.actions() {
            if let DeferredAction::InstallPackages { added } = action {
                eprintln!("  Would install {}", added.join(", "));
            }
        }
        eprintln!("\nNOTE: The \"dryRun\" flag means no changes were made.");
        return Ok(());
    }

    let progress = !global.verbose && std::io::stderr().is_terminal();
    let installer = build_installer(&args, &config.install, progress);
    let report = pending.run(&mut workspace, &installer)?;

    for change in &report.changes {
        print_change(change);
    }
    match report.install {
        Some(InstallOutcome::Installed(pm)) => eprintln!("   Installed dependencies with {}", pm),
        Some(InstallOutcome::Skipped) => {
            eprintln!("     Skipped dependency installation, run your package manager to finish")
        }
        None => {}
    }
    eprintln!(
        "     Created component testing setup for `{}` ({}, {})",
        args.project, args.compiler, args.component_type
    );

    Ok(())
}

fn print_change(change: &FileChange) {
    eprintln!("{} {}", change.kind, to_slash(&change.path));
}
