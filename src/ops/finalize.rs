//! Deferred work returned by generators.
//!
//! Generators stage every file and configuration change eagerly but leave the
//! expensive steps (formatting and writing to disk, running the package
//! manager) to a [`PendingFinalization`]. Callers running several generators
//! merge their finalizations and pay for those steps once.

use std::path::PathBuf;

use anyhow::Result;
use serde_json::Value;

use crate::core::tree::{FileChange, Tree};
use crate::core::workspace::Workspace;
use crate::ops::install::{InstallOutcome, Installer};

/// A step to run after all generators are done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredAction {
    /// Normalize staged JSON files and write the tree to disk
    FormatFiles,

    /// Run the package manager; lists the packages that were added
    InstallPackages { added: Vec<String> },
}

/// Collected deferred actions, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingFinalization {
    actions: Vec<DeferredAction>,
}

/// What running a finalization did.
#[derive(Debug, Default)]
pub struct FinalizeReport {
    /// Files written or removed on disk
    pub changes: Vec<FileChange>,

    /// Result of the install step, if one was scheduled
    pub install: Option<InstallOutcome>,
}

impl PendingFinalization {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an action. Duplicates collapse into the existing entry.
    pub fn push(&mut self, action: DeferredAction) {
        match action {
            DeferredAction::FormatFiles => {
                if !self.actions.contains(&DeferredAction::FormatFiles) {
                    self.actions.push(DeferredAction::FormatFiles);
                }
            }
            DeferredAction::InstallPackages { added } => {
                let existing = self.actions.iter_mut().find_map(|a| match a {
                    DeferredAction::InstallPackages { added } => Some(added),
                    DeferredAction::FormatFiles => None,
                });
                match existing {
                    Some(existing) => {
                        for name in added {
                            if !existing.contains(&name) {
                                existing.push(name);
                            }
                        }
                    }
                    None => self.actions.push(DeferredAction::InstallPackages { added }),
                }
            }
        }
    }

    /// Combine with another generator's finalization.
    pub fn merge(mut self, other: PendingFinalization) -> Self {
        for action in other.actions {
            self.push(action);
        }
        self
    }

    pub fn actions(&self) -> &[DeferredAction] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run every scheduled action in order.
    pub fn run(self, workspace: &mut Workspace, installer: &Installer) -> Result<FinalizeReport> {
        let mut report = FinalizeReport::default();
        for action in self.actions {
            match action {
                DeferredAction::FormatFiles => {
                    format_files(workspace.tree_mut())?;
                    report.changes = workspace.tree_mut().flush()?;
                }
                DeferredAction::InstallPackages { added } => {
                    tracing::debug!("installing {} new package(s): {}", added.len(), added.join(", "));
                    report.install = Some(installer.install(workspace.root())?);
                }
            }
        }
        Ok(report)
    }
}

/// Re-serialize every staged `.json` file as two-space pretty JSON.
pub fn format_files(tree: &mut Tree) -> Result<()> {
    let json_files: Vec<PathBuf> = tree
        .staged_files()
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .map(PathBuf::from)
        .collect();

    for path in json_files {
        match tree.read_json::<Value>(&path) {
            Ok(Some(value)) => tree.write_json(&path, &value)?,
            Ok(None) => {}
            Err(e) => tracing::warn!("leaving {} unformatted: {:#}", path.display(), e),
        }
    }
    Ok(())
}
