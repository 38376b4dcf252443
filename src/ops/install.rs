//! Package manager detection and dependency installation.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::util::process::{find_executable, ProcessBuilder};

/// A Node package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Npm,
    Yarn,
    Pnpm,
}

impl PackageManager {
    /// Guess the package manager from the lockfile in `root`, npm if none.
    pub fn detect(root: &Path) -> Self {
        if root.join("yarn.lock").exists() {
            PackageManager::Yarn
        } else if root.join("pnpm-lock.yaml").exists() {
            PackageManager::Pnpm
        } else {
            PackageManager::Npm
        }
    }

    /// Executable name.
    pub fn program(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
        }
    }

    /// Arguments that install everything listed in `package.json`.
    pub fn install_args(&self) -> &'static [&'static str] {
        match self {
            PackageManager::Npm => &["install", "--no-audit", "--no-fund"],
            PackageManager::Yarn => &["install"],
            PackageManager::Pnpm => &["install"],
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

impl FromStr for PackageManager {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "npm" => Ok(PackageManager::Npm),
            "yarn" => Ok(PackageManager::Yarn),
            "pnpm" => Ok(PackageManager::Pnpm),
            other => Err(format!(
                "unknown package manager `{}` (expected npm, yarn or pnpm)",
                other
            )),
        }
    }
}

/// Runs the package manager after `package.json` changed.
#[derive(Debug, Clone, Default)]
pub struct Installer {
    /// Use this package manager instead of lockfile detection
    pub package_manager: Option<PackageManager>,

    /// Skip installation entirely
    pub skip: bool,

    /// Show a spinner while the package manager runs
    pub progress: bool,
}

/// What an install step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed(PackageManager),
    Skipped,
}

impl Installer {
    /// An installer that never runs anything.
    pub fn skipping() -> Self {
        Installer {
            skip: true,
            ..Default::default()
        }
    }

    /// Install the dependencies of the workspace at `root`.
    pub fn install(&self, root: &Path) -> Result<InstallOutcome> {
        if self.skip {
            tracing::info!("skipping dependency installation");
            return Ok(InstallOutcome::Skipped);
        }

        let pm = self
            .package_manager
            .unwrap_or_else(|| PackageManager::detect(root));
        let Some(program) = find_executable(pm.program()) else {
            bail!(
                "`{}` was not found in PATH\n\
                 \n\
                 Install it, or re-run with `--skip-install` and install dependencies manually.",
                pm
            );
        };

        let spinner = self.progress.then(|| spinner(pm, &program));
        let result = ProcessBuilder::new(&program)
            .args(pm.install_args())
            .cwd(root)
            .exec_and_check();
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        result?;

        tracing::info!("installed dependencies with {}", pm);
        Ok(InstallOutcome::Installed(pm))
    }
}

fn spinner(pm: PackageManager, program: &Path) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(format!("Installing packages with {} ({})", pm, program.display()));
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_detect_from_lockfile() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(PackageManager::detect(tmp.path()), PackageManager::Npm);

        std::fs::write(tmp.path().join("pnpm-lock.yaml"), "").unwrap();
        assert_eq!(PackageManager::detect(tmp.path()), PackageManager::Pnpm);

        std::fs::write(tmp.path().join("yarn.lock"), "").unwrap();
        assert_eq!(PackageManager::detect(tmp.path()), PackageManager::Yarn);
    }

    #[test]
    fn test_skipping_installer() {
        let tmp = TempDir::new().unwrap();
        let outcome = Installer::skipping().install(tmp.path()).unwrap();
        assert_eq!(outcome, InstallOutcome::Skipped);
    }

    #[test]
    fn test_parse_package_manager() {
        assert_eq!("pnpm".parse::<PackageManager>().unwrap(), PackageManager::Pnpm);
        assert!("bun".parse::<PackageManager>().is_err());
    }
}
