//! Generator error types and diagnostics.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Errors that abort a generator run.
///
/// None of these are retried. The caller is expected to fix the cause (or
/// pass `--force`) and run the generator again.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum GeneratorError {
    #[error(
        "the project `{project}` already has a cypress component testing target. \
         Please use the --force flag to overwrite the existing project."
    )]
    #[diagnostic(code(ctgen::component_project::conflict), help("re-run with `--force` to overwrite the existing setup"))]
    Conflict { project: String },

    #[error("Cypress version 10 or greater is required (found {found})")]
    #[diagnostic(
        code(ctgen::component_project::unsupported_version),
        help("upgrade Cypress to 10.0.0 or newer")
    )]
    UnsupportedVersion { found: u64 },

    #[error(
        "Expected project tsconfig.json to exist. Please create one. \
         Expected {path} to exist. Found none."
    )]
    #[diagnostic(code(ctgen::component_project::missing_config))]
    MissingConfig { path: String },

    #[error("Could not find a webpack config for next. is @nrwl/next installed?")]
    #[diagnostic(code(ctgen::dev_server::config_not_found), help("install `@nrwl/next` so the Next.js webpack config can be discovered"))]
    ConfigNotFound,

    #[error("cannot find configuration for project `{project}`")]
    #[diagnostic(code(ctgen::workspace::project_not_found))]
    ProjectNotFound {
        project: String,
        suggestions: Vec<String>,
    },
}

impl GeneratorError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            GeneratorError::Conflict { project } => diag
                .with_context(format!(
                    "`{}` has a `test-cmp` target or a cypress.config.ts file",
                    project
                ))
                .with_suggestion(suggestions::USE_FORCE),

            GeneratorError::UnsupportedVersion { found } => diag
                .with_context(format!("installed cypress major version is {}", found))
                .with_suggestion(suggestions::UPGRADE_CYPRESS),

            GeneratorError::MissingConfig { path } => diag
                .with_location(path)
                .with_suggestion(format!(
                    "Create {} with a `references` array before generating",
                    path
                )),

            GeneratorError::ConfigNotFound => {
                diag.with_suggestion(suggestions::INSTALL_NEXT_PLUGIN)
            }

            GeneratorError::ProjectNotFound {
                suggestions: similar,
                ..
            } => {
                let diag = if similar.is_empty() {
                    diag
                } else {
                    diag.with_context(format!("did you mean: {}?", similar.join(", ")))
                };
                diag.with_suggestion(suggestions::LIST_PROJECTS)
            }
        }
    }
}
