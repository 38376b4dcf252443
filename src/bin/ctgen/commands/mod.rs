//! Command implementations

pub mod completions;
pub mod component_project;
pub mod dev_server;

use std::path::PathBuf;

use anyhow::{Context, Result};

use ctgen::core::workspace::find_workspace_root;

use crate::GlobalOptions;

/// The workspace to operate on: `--workspace` or the nearest one above the
/// current directory.
pub fn workspace_root(global: &GlobalOptions) -> Result<PathBuf> {
    let start = match &global.workspace {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to get current directory")?,
    };
    find_workspace_root(&start)
}
