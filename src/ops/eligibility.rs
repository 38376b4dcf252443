//! Decide whether component testing may be scaffolded and whether Cypress
//! itself needs to be installed.

use crate::core::project::ProjectConfiguration;
use crate::core::tree::Tree;
use crate::errors::GeneratorError;
use crate::ops::component_project::ComponentProjectOptions;
use crate::ops::probe::VersionProbe;
use crate::util::fs::join_path_fragments;

/// Oldest Cypress major version with component testing support.
pub const MIN_CYPRESS_MAJOR: u64 = 10;

/// Name of the Cypress configuration file generated at the project root.
pub const CYPRESS_CONFIG_FILE: &str = "cypress.config.ts";

/// Outcome of a successful eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallDecision {
    /// Whether `cypress` must be added to the dev dependencies
    pub install: bool,
}

/// Evaluate eligibility from already-gathered facts.
///
/// The checks run in a fixed order. An existing setup is a conflict unless
/// `force` is set, in which case Cypress is always (re)installed. Otherwise
/// a missing Cypress gets installed, 10+ is reused and anything older fails.
pub fn evaluate_eligibility(
    project: &ProjectConfiguration,
    config_file_exists: bool,
    options: &ComponentProjectOptions,
    installed: Option<u64>,
) -> Result<InstallDecision, GeneratorError> {
    if project.has_component_test_target() || config_file_exists {
        if !options.force {
            return Err(GeneratorError::Conflict {
                project: options.project.clone(),
            });
        }
        if installed.is_some_and(|major| major >= MIN_CYPRESS_MAJOR) {
            // Forced runs overwrite the config and reinstall the runner even
            // when a compatible one is present.
            tracing::warn!(
                "--force reinstalls cypress although version {} is already installed",
                installed.unwrap_or_default()
            );
        }
        return Ok(InstallDecision { install: true });
    }

    match installed {
        None => Ok(InstallDecision { install: true }),
        Some(major) if major >= MIN_CYPRESS_MAJOR => Ok(InstallDecision { install: false }),
        Some(major) => Err(GeneratorError::UnsupportedVersion { found: major }),
    }
}

/// Check the installed version of Cypress for `project`.
///
/// Looks for `cypress.config.ts` at the project root through the staged
/// tree and asks `probe` for the installed major version.
pub fn check_installed_cypress(
    tree: &Tree,
    options: &ComponentProjectOptions,
    project: &ProjectConfiguration,
    probe: &dyn VersionProbe,
) -> Result<InstallDecision, GeneratorError> {
    let config_file = join_path_fragments(&[project.root_dir(), CYPRESS_CONFIG_FILE]);
    let installed = probe.installed_major_version();
    tracing::debug!(
        "eligibility for `{}`: config file exists={}, installed cypress={:?}",
        options.project,
        tree.exists(&config_file),
        installed
    );
    evaluate_eligibility(project, tree.exists(&config_file), options, installed)
}
