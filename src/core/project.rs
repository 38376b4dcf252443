//! Project configuration records - what a workspace knows about a project.
//!
//! A record mirrors the contents of a `project.json` file (or an inline
//! entry of `workspace.json`). Fields this crate doesn't interpret are kept
//! in `extra` so a rewrite never drops them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved name of the component-test target.
pub const COMPONENT_TEST_TARGET_NAME: &str = "test-cmp";

/// Whether a project is deployable or consumed by other projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    #[serde(alias = "app")]
    Application,
    #[serde(alias = "lib")]
    Library,
}

/// A named, executor-bound task runnable against a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetConfiguration {
    /// Executor identifier, e.g. `@nrwl/cypress:cypress`
    pub executor: String,

    /// Options handed to the executor
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TargetConfiguration {
    /// Create a target for the given executor with no options.
    pub fn new(executor: impl Into<String>) -> Self {
        TargetConfiguration {
            executor: executor.into(),
            options: Map::new(),
            extra: Map::new(),
        }
    }

    /// Set an option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Declarative descriptor of one project's build and test targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfiguration {
    /// Project root relative to the workspace root, e.g. `libs/cool-lib`
    pub root: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<ProjectType>,

    /// Targets in file order
    #[serde(default)]
    pub targets: IndexMap<String, TargetConfiguration>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectConfiguration {
    /// Create a record rooted at `root` with no targets.
    pub fn new(root: impl Into<String>) -> Self {
        ProjectConfiguration {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Whether the reserved component-test target is registered.
    pub fn has_component_test_target(&self) -> bool {
        self.targets.contains_key(COMPONENT_TEST_TARGET_NAME)
    }

    /// The project root without a trailing slash, `""` for the workspace root.
    pub fn root_dir(&self) -> &str {
        let trimmed = self.root.trim_end_matches('/');
        if trimmed == "." {
            ""
        } else {
            trimmed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_project_json() {
        let config: ProjectConfiguration = serde_json::from_value(json!({
            "$schema": "../../node_modules/nx/schemas/project-schema.json",
            "root": "libs/cool-lib",
            "sourceRoot": "libs/cool-lib/src",
            "projectType": "library",
            "tags": ["scope:shared"],
            "targets": {
                "test": {
                    "executor": "@nrwl/jest:jest",
                    "outputs": ["coverage/libs/cool-lib"],
                    "options": { "jestConfig": "libs/cool-lib/jest.config.js" }
                }
            }
        }))
        .unwrap();

        assert_eq!(config.root_dir(), "libs/cool-lib");
        assert_eq!(config.project_type, Some(ProjectType::Library));
        assert!(!config.has_component_test_target());
        let test = &config.targets["test"];
        assert_eq!(test.executor, "@nrwl/jest:jest");
        assert_eq!(test.extra["outputs"], json!(["coverage/libs/cool-lib"]));
        assert_eq!(config.extra["tags"], json!(["scope:shared"]));
    }

    #[test]
    fn test_unknown_fields_survive_rewrite() {
        let input = json!({
            "root": "apps/web",
            "projectType": "application",
            "implicitDependencies": ["api"],
            "targets": {}
        });
        let config: ProjectConfiguration = serde_json::from_value(input.clone()).unwrap();

        assert_eq!(serde_json::to_value(&config).unwrap(), input);
    }

    #[test]
    fn test_targets_keep_file_order() {
        let mut config: ProjectConfiguration = serde_json::from_value(json!({
            "root": "libs/cool-lib",
            "targets": {
                "test": { "executor": "@nrwl/jest:jest" },
                "lint": { "executor": "@nrwl/linter:eslint" },
                "build": { "executor": "@nrwl/js:tsc" }
            }
        }))
        .unwrap();
        config.targets.insert(
            COMPONENT_TEST_TARGET_NAME.to_string(),
            TargetConfiguration::new("@nrwl/cypress:cypress"),
        );

        let text = serde_json::to_string(&config).unwrap();
        let positions: Vec<usize> = ["\"test\"", "\"lint\"", "\"build\"", "\"test-cmp\""]
            .iter()
            .map(|key| text.find(key).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{text}");
    }

    #[test]
    fn test_target_builder() {
        let target = TargetConfiguration::new("@nrwl/cypress:cypress")
            .with_option("testingType", "component");

        assert_eq!(
            serde_json::to_value(&target).unwrap(),
            json!({
                "executor": "@nrwl/cypress:cypress",
                "options": { "testingType": "component" }
            })
        );
    }

    #[test]
    fn test_root_dir_variants() {
        assert_eq!(ProjectConfiguration::new("libs/a/").root_dir(), "libs/a");
        assert_eq!(ProjectConfiguration::new(".").root_dir(), "");
    }
}
