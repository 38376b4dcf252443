//! Implementation of `ctgen component-project`.
//!
//! Adds a Cypress component-test target to an existing project: checks the
//! installed runner, renders the support files, wires `tsconfig.cy.json`
//! into the project tsconfig, registers the `test-cmp` target and records the
//! dev dependencies. Nothing reaches the disk here; the returned
//! [`PendingFinalization`] writes and installs.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::build_config::Compiler;
use crate::core::package_json::{add_dev_dependencies, DependencyDelta};
use crate::core::project::{TargetConfiguration, COMPONENT_TEST_TARGET_NAME};
use crate::core::tree::Tree;
use crate::core::versions::Versions;
use crate::core::workspace::Workspace;
use crate::errors::GeneratorError;
use crate::ops::eligibility::{check_installed_cypress, CYPRESS_CONFIG_FILE};
use crate::ops::finalize::{DeferredAction, PendingFinalization};
use crate::ops::probe::VersionProbe;
use crate::ops::templates::{
    generate_files, Substitutions, COMPONENT_PROJECT_TEMPLATES, REACT_MOUNT_COMMAND,
};
use crate::util::fs::{join_path_fragments, offset_from_root};

/// Executor that runs the component-test target.
pub const CYPRESS_EXECUTOR: &str = "@nrwl/cypress:cypress";

/// tsconfig reference added to the project tsconfig.
pub const TSCONFIG_CY_REFERENCE: &str = "./tsconfig.cy.json";

/// UI framework flavour of the components under test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    #[default]
    React,
    Next,
    Other,
}

impl ComponentType {
    /// Whether components are mounted through `@cypress/react`.
    pub fn uses_react(&self) -> bool {
        matches!(self, ComponentType::React | ComponentType::Next)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentType::React => write!(f, "react"),
            ComponentType::Next => write!(f, "next"),
            ComponentType::Other => write!(f, "other"),
        }
    }
}

impl FromStr for ComponentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "react" => Ok(ComponentType::React),
            "next" => Ok(ComponentType::Next),
            "other" => Ok(ComponentType::Other),
            other => Err(format!(
                "unknown component type `{}` (expected react, next or other)",
                other
            )),
        }
    }
}

/// Options for [`provision_component_testing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentProjectOptions {
    /// Project id in the workspace
    pub project: String,

    /// Compiler used by the component dev server
    pub compiler: Compiler,

    pub component_type: ComponentType,

    /// Overwrite an existing component-test setup
    pub force: bool,
}

impl ComponentProjectOptions {
    pub fn new(project: impl Into<String>) -> Self {
        ComponentProjectOptions {
            project: project.into(),
            compiler: Compiler::default(),
            component_type: ComponentType::default(),
            force: false,
        }
    }
}

/// Scaffold component testing into `options.project`.
///
/// Every change is staged in the workspace tree. Errors from the eligibility
/// check abort before anything is staged; a missing project tsconfig aborts
/// before the project record and `package.json` are touched.
pub fn provision_component_testing(
    workspace: &mut Workspace,
    options: &ComponentProjectOptions,
    probe: &dyn VersionProbe,
    versions: &Versions,
) -> Result<PendingFinalization> {
    let mut project = workspace.read_project(&options.project)?;
    let decision = check_installed_cypress(workspace.tree(), options, &project, probe)?;
    let root = project.root_dir().to_string();

    let generated = generate_files(
        workspace.tree_mut(),
        COMPONENT_PROJECT_TEMPLATES,
        &root,
        &substitutions(options, &root),
    );
    tracing::debug!("generated {} file(s) for `{}`", generated.len(), options.project);

    add_tsconfig_reference(workspace.tree_mut(), &root)?;

    let cypress_config = join_path_fragments(&[root.as_str(), CYPRESS_CONFIG_FILE]);
    project.targets.insert(
        COMPONENT_TEST_TARGET_NAME.to_string(),
        TargetConfiguration::new(CYPRESS_EXECUTOR)
            .with_option("cypressConfig", cypress_config)
            .with_option("testingType", "component"),
    );
    workspace.write_project(&options.project, project)?;

    let delta = dependency_delta(options, decision.install, versions);
    let added = add_dev_dependencies(workspace.tree_mut(), &delta)?;

    let mut pending = PendingFinalization::new();
    pending.push(DeferredAction::FormatFiles);
    if added.is_empty() {
        tracing::info!("package.json already lists every required package");
    } else {
        tracing::info!("added dev dependencies: {}", added.join(", "));
        pending.push(DeferredAction::InstallPackages { added });
    }
    Ok(pending)
}

fn substitutions(options: &ComponentProjectOptions, root: &str) -> Substitutions {
    let mount_command = if options.component_type.uses_react() {
        REACT_MOUNT_COMMAND
    } else {
        ""
    };
    [
        ("projectRoot", root.to_string()),
        ("offsetFromRoot", offset_from_root(root)),
        ("project", options.project.clone()),
        ("compiler", options.compiler.to_string()),
        ("componentType", options.component_type.to_string()),
        ("mountCommand", mount_command.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Reference `tsconfig.cy.json` from the project's `tsconfig.json`.
///
/// The entry is appended after existing references unless an identical one
/// is already listed, so a forced re-run does not duplicate it.
fn add_tsconfig_reference(tree: &mut Tree, root: &str) -> Result<()> {
    let path = join_path_fragments(&[root, "tsconfig.json"]);
    if !tree.is_file(&path) {
        return Err(GeneratorError::MissingConfig { path }.into());
    }

    tree.update_json(&path, |tsconfig| {
        let Some(tsconfig) = tsconfig.as_object_mut() else {
            bail!("{} must contain a JSON object", path);
        };
        let references = tsconfig
            .entry("references")
            .or_insert_with(|| Value::Array(Vec::new()));
        let Some(references) = references.as_array_mut() else {
            bail!("`references` in {} must be an array", path);
        };

        let reference = json!({ "path": TSCONFIG_CY_REFERENCE });
        if references.contains(&reference) {
            tracing::debug!("{} already references {}", path, TSCONFIG_CY_REFERENCE);
        } else {
            references.push(reference);
        }
        Ok(())
    })
}

/// Packages the component-test setup needs.
pub fn dependency_delta(
    options: &ComponentProjectOptions,
    install_cypress: bool,
    versions: &Versions,
) -> DependencyDelta {
    let mut delta = DependencyDelta::new();
    delta.insert("@cypress/webpack-dev-server", &versions.cypress_webpack_dev_server);
    delta.insert("html-webpack-plugin", &versions.html_webpack_plugin);
    if install_cypress {
        delta.insert("cypress", &versions.cypress);
    }
    if options.component_type.uses_react() {
        delta.insert("@cypress/react", &versions.cypress_react);
        if options.compiler == Compiler::Swc {
            delta.insert("@swc/core", &versions.swc_core);
            delta.insert("swc-loader", &versions.swc_loader);
        }
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::package_json::PACKAGE_JSON;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    /// A workspace with `libs/cool-lib` and a jest `test` target.
    fn cool_lib_workspace(tsconfig: Option<&str>) -> (TempDir, Workspace) {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "nx.json", "{}");
        write(tmp.path(), "package.json", r#"{ "name": "acme", "devDependencies": {} }"#);
        write(
            tmp.path(),
            "libs/cool-lib/project.json",
            r#"{
  "name": "cool-lib",
  "root": "libs/cool-lib",
  "sourceRoot": "libs/cool-lib/src",
  "projectType": "library",
  "targets": {
    "test": {
      "executor": "@nrwl/jest:jest",
      "options": { "jestConfig": "libs/cool-lib/jest.config.js" }
    }
  }
}"#,
        );
        if let Some(tsconfig) = tsconfig {
            write(tmp.path(), "libs/cool-lib/tsconfig.json", tsconfig);
        }
        let ws = Workspace::load(tmp.path()).unwrap();
        (tmp, ws)
    }

    fn options(
        compiler: Compiler,
        component_type: ComponentType,
        force: bool,
    ) -> ComponentProjectOptions {
        ComponentProjectOptions {
            project: "cool-lib".to_string(),
            compiler,
            component_type,
            force,
        }
    }

    fn dev_dependencies(ws: &Workspace) -> serde_json::Map<String, Value> {
        let manifest: Value = ws.tree().read_json(PACKAGE_JSON).unwrap().unwrap();
        manifest["devDependencies"].as_object().unwrap().clone()
    }

    fn references(ws: &Workspace) -> Vec<Value> {
        let tsconfig: Value = ws
            .tree()
            .read_json("libs/cool-lib/tsconfig.json")
            .unwrap()
            .unwrap();
        tsconfig["references"].as_array().unwrap().clone()
    }

    #[test]
    fn test_scaffold_with_babel_and_no_cypress() {
        let (_tmp, mut ws) = cool_lib_workspace(Some(r#"{ "files": [] }"#));
        let opts = options(Compiler::Babel, ComponentType::React, false);

        let pending =
            provision_component_testing(&mut ws, &opts, &None::<u64>, &Versions::default()).unwrap();

        let project = ws.read_project("cool-lib").unwrap();
        let target = &project.targets[COMPONENT_TEST_TARGET_NAME];
        assert_eq!(target.executor, "@nrwl/cypress:cypress");
        assert_eq!(target.options["cypressConfig"], "libs/cool-lib/cypress.config.ts");
        assert_eq!(target.options["testingType"], "component");
        assert_eq!(project.targets["test"].executor, "@nrwl/jest:jest");

        assert!(ws.tree().exists("libs/cool-lib/cypress.config.ts"));
        assert!(ws.tree().exists("libs/cool-lib/cypress"));
        assert_eq!(references(&ws), vec![json!({ "path": "./tsconfig.cy.json" })]);

        let dev = dev_dependencies(&ws);
        assert_eq!(dev["cypress"], "^10.2.0");
        assert!(dev.contains_key("@cypress/react"));
        assert!(dev.contains_key("@cypress/webpack-dev-server"));
        assert!(dev.contains_key("html-webpack-plugin"));
        assert!(!dev.contains_key("@swc/core"));
        assert!(!dev.contains_key("swc-loader"));

        assert_eq!(pending.actions().len(), 2);
        assert_eq!(pending.actions()[0], DeferredAction::FormatFiles);
        assert!(matches!(
            &pending.actions()[1],
            DeferredAction::InstallPackages { added } if added.contains(&"cypress".to_string())
        ));
    }

    #[test]
    fn test_scaffold_with_swc_and_cypress_10() {
        let (_tmp, mut ws) = cool_lib_workspace(Some("{}"));
        let opts = options(Compiler::Swc, ComponentType::React, false);

        provision_component_testing(&mut ws, &opts, &Some(10u64), &Versions::default()).unwrap();

        let dev = dev_dependencies(&ws);
        assert!(!dev.contains_key("cypress"));
        assert_eq!(dev["@swc/core"], "^1.2.173");
        assert_eq!(dev["swc-loader"], "0.1.15");

        let config = ws
            .tree()
            .read_to_string("libs/cool-lib/cypress.config.ts")
            .unwrap()
            .unwrap();
        assert!(config.contains("'swc'"));
        let support = ws
            .tree()
            .read_to_string("libs/cool-lib/cypress/support/component.ts")
            .unwrap()
            .unwrap();
        assert!(support.contains("Cypress.Commands.add('mount', mount)"));
    }

    #[test]
    fn test_unsupported_cypress_leaves_workspace_untouched() {
        let (_tmp, mut ws) = cool_lib_workspace(Some("{}"));
        let opts = options(Compiler::Babel, ComponentType::React, false);

        let err = provision_component_testing(&mut ws, &opts, &Some(9u64), &Versions::default())
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<GeneratorError>(),
            Some(GeneratorError::UnsupportedVersion { found: 9 })
        ));
        assert!(!ws.tree().has_changes());
    }

    #[test]
    fn test_existing_setup_requires_force() {
        let (_tmp, mut ws) = cool_lib_workspace(Some("{}"));
        let versions = Versions::default();

        provision_component_testing(
            &mut ws,
            &options(Compiler::Babel, ComponentType::React, false),
            &Some(10u64),
            &versions,
        )
        .unwrap();

        let err = provision_component_testing(
            &mut ws,
            &options(Compiler::Babel, ComponentType::React, false),
            &Some(10u64),
            &versions,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GeneratorError>(),
            Some(GeneratorError::Conflict { .. })
        ));

        // Forcing twice still yields one target and one reference.
        for _ in 0..2 {
            provision_component_testing(
                &mut ws,
                &options(Compiler::Swc, ComponentType::React, true),
                &Some(10u64),
                &versions,
            )
            .unwrap();
        }
        let project = ws.read_project("cool-lib").unwrap();
        assert_eq!(
            project
                .targets
                .keys()
                .filter(|k| k.as_str() == COMPONENT_TEST_TARGET_NAME)
                .count(),
            1
        );
        assert_eq!(references(&ws).len(), 1);
        assert!(dev_dependencies(&ws).contains_key("cypress"));
    }

    #[test]
    fn test_existing_references_keep_their_order() {
        let (_tmp, mut ws) = cool_lib_workspace(Some(
            r#"{
  // project tsconfig
  "references": [{ "path": "./tsconfig.lib.json" }, { "path": "./tsconfig.spec.json" }]
}"#,
        ));
        let opts = options(Compiler::Babel, ComponentType::Other, false);

        provision_component_testing(&mut ws, &opts, &Some(12u64), &Versions::default()).unwrap();

        assert_eq!(
            references(&ws),
            vec![
                json!({ "path": "./tsconfig.lib.json" }),
                json!({ "path": "./tsconfig.spec.json" }),
                json!({ "path": "./tsconfig.cy.json" }),
            ]
        );
    }

    #[test]
    fn test_tsconfig_with_trailing_commas() {
        let (_tmp, mut ws) = cool_lib_workspace(Some(
            r#"{
  "references": [
    { "path": "./tsconfig.lib.json" },
  ],
}"#,
        ));
        let opts = options(Compiler::Babel, ComponentType::React, false);

        provision_component_testing(&mut ws, &opts, &Some(10u64), &Versions::default()).unwrap();

        assert_eq!(
            references(&ws),
            vec![
                json!({ "path": "./tsconfig.lib.json" }),
                json!({ "path": "./tsconfig.cy.json" }),
            ]
        );
    }

    #[test]
    fn test_missing_tsconfig_names_the_path() {
        let (_tmp, mut ws) = cool_lib_workspace(None);
        let opts = options(Compiler::Babel, ComponentType::React, false);

        let err = provision_component_testing(&mut ws, &opts, &None::<u64>, &Versions::default())
            .unwrap_err();

        match err.downcast_ref::<GeneratorError>() {
            Some(GeneratorError::MissingConfig { path }) => {
                assert_eq!(path, "libs/cool-lib/tsconfig.json")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!ws.read_project("cool-lib").unwrap().has_component_test_target());
        assert!(dev_dependencies(&ws).is_empty());
    }

    #[test]
    fn test_unknown_project_is_reported() {
        let (_tmp, mut ws) = cool_lib_workspace(Some("{}"));
        let opts = ComponentProjectOptions::new("cool");

        let err = provision_component_testing(&mut ws, &opts, &None::<u64>, &Versions::default())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GeneratorError>(),
            Some(GeneratorError::ProjectNotFound { suggestions, .. }) if suggestions == &["cool-lib".to_string()]
        ));
    }

    #[test]
    fn test_present_packages_skip_install() {
        let (tmp, _) = cool_lib_workspace(Some("{}"));
        write(
            tmp.path(),
            "package.json",
            r#"{
  "devDependencies": {
    "@cypress/webpack-dev-server": "^1.8.0",
    "html-webpack-plugin": "^5.0.0"
  }
}"#,
        );
        let mut ws = Workspace::load(tmp.path()).unwrap();
        let opts = options(Compiler::Swc, ComponentType::Other, false);

        let pending =
            provision_component_testing(&mut ws, &opts, &Some(10u64), &Versions::default()).unwrap();

        assert_eq!(pending.actions(), &[DeferredAction::FormatFiles]);
        assert_eq!(dev_dependencies(&ws)["@cypress/webpack-dev-server"], "^1.8.0");
    }

    #[test]
    fn test_dependency_delta_by_component_type() {
        let versions = Versions::default();

        let other_opts = options(Compiler::Swc, ComponentType::Other, false);
        let other = dependency_delta(&other_opts, false, &versions);
        let names: Vec<&str> = other.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["@cypress/webpack-dev-server", "html-webpack-plugin"]);

        let next_opts = options(Compiler::Swc, ComponentType::Next, false);
        let next = dependency_delta(&next_opts, true, &versions);
        for name in ["cypress", "@cypress/react", "@swc/core", "swc-loader"] {
            assert!(next.iter().any(|(n, _)| n == name), "{name}");
        }
    }

    #[test]
    fn test_parse_component_type() {
        assert_eq!("next".parse::<ComponentType>().unwrap(), ComponentType::Next);
        assert!("vue".parse::<ComponentType>().is_err());
    }
}
