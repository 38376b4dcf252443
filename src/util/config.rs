//! Configuration file support for ctgen.
//!
//! ctgen reads two configuration file locations:
//! - Global: `~/.ctgen/config.toml` - User-wide defaults
//! - Project: `<workspace>/.ctgen/config.toml` - Workspace-specific overrides
//!
//! Workspace config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ops::install::PackageManager;

/// ctgen configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pinned package versions used for the dev-dependency delta
    pub versions: VersionOverrides,

    /// Dependency installation settings
    pub install: InstallConfig,
}

/// Per-package version overrides. Unset entries keep the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct VersionOverrides {
    pub cypress: Option<String>,
    pub cypress_webpack_dev_server: Option<String>,
    pub html_webpack_plugin: Option<String>,
    pub cypress_react: Option<String>,
    pub swc_core: Option<String>,
    pub swc_loader: Option<String>,
}

impl VersionOverrides {
    fn merge(&mut self, other: VersionOverrides) {
        fn take(slot: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *slot = value;
            }
        }
        take(&mut self.cypress, other.cypress);
        take(
            &mut self.cypress_webpack_dev_server,
            other.cypress_webpack_dev_server,
        );
        take(&mut self.html_webpack_plugin, other.html_webpack_plugin);
        take(&mut self.cypress_react, other.cypress_react);
        take(&mut self.swc_core, other.swc_core);
        take(&mut self.swc_loader, other.swc_loader);
    }
}

/// Dependency installation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InstallConfig {
    /// Package manager to use instead of lockfile detection
    pub package_manager: Option<PackageManager>,

    /// Never run the package manager after updating package.json
    pub skip: Option<bool>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        self.versions.merge(other.versions);
        if other.install.package_manager.is_some() {
            self.install.package_manager = other.install.package_manager;
        }
        if other.install.skip.is_some() {
            self.install.skip = other.install.skip;
        }
    }
}

/// Load merged configuration from global and workspace locations.
///
/// Order of precedence (highest to lowest):
/// 1. Workspace config (.ctgen/config.toml)
/// 2. Global config (~/.ctgen/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, workspace_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global) = global_path {
        config.merge(Config::load_or_default(global));
    }
    config.merge(Config::load_or_default(workspace_path));

    config
}

/// Get the global ctgen config directory (~/.ctgen).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".ctgen"))
}

/// Get the global config path (~/.ctgen/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the workspace config path (.ctgen/config.toml).
pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(".ctgen").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(
            r#"
[versions]
cypress = "^10.4.0"
swc-loader = "0.2.3"

[install]
package-manager = "pnpm"
"#,
        )
        .unwrap();

        assert_eq!(config.versions.cypress.as_deref(), Some("^10.4.0"));
        assert_eq!(config.versions.swc_loader.as_deref(), Some("0.2.3"));
        assert!(config.versions.swc_core.is_none());
        assert_eq!(config.install.package_manager, Some(PackageManager::Pnpm));
        assert!(config.install.skip.is_none());
    }

    #[test]
    fn test_workspace_config_overrides_global() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let workspace = tmp.path().join("workspace.toml");
        std::fs::write(
            &global,
            "[versions]\ncypress = \"^10.0.0\"\ncypress-react = \"^6.0.0\"\n",
        )
        .unwrap();
        std::fs::write(&workspace, "[versions]\ncypress = \"^10.3.0\"\n").unwrap();

        let config = load_config(Some(&global), &workspace);
        assert_eq!(config.versions.cypress.as_deref(), Some("^10.3.0"));
        assert_eq!(config.versions.cypress_react.as_deref(), Some("^6.0.0"));
    }

    #[test]
    fn test_workspace_can_turn_install_back_on() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let workspace = tmp.path().join("workspace.toml");
        std::fs::write(&global, "[install]\nskip = true\npackage-manager = \"yarn\"\n").unwrap();
        std::fs::write(&workspace, "[install]\nskip = false\n").unwrap();

        let config = load_config(Some(&global), &workspace);
        assert_eq!(config.install.skip, Some(false));
        assert_eq!(config.install.package_manager, Some(PackageManager::Yarn));

        let config = load_config(Some(&global), &tmp.path().join("absent.toml"));
        assert_eq!(config.install.skip, Some(true));
    }

    #[test]
    fn test_broken_config_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[versions\n").unwrap();

        assert_eq!(Config::load_or_default(&path), Config::default());
    }
}
