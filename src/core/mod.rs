//! Core data structures for ctgen.
//!
//! This module contains the foundational types the generators work on:
//! - The staged file tree and the workspace project arena
//! - Project configuration records and targets
//! - The root package manifest and the version table
//! - Bundler build configurations and loader rules

pub mod build_config;
pub mod package_json;
pub mod project;
pub mod tree;
pub mod versions;
pub mod workspace;

pub use build_config::{BuildConfiguration, Compiler, LoaderRule, RuleCondition, RuleUse, UseItem};
pub use package_json::DependencyDelta;
pub use project::{
    ProjectConfiguration, ProjectType, TargetConfiguration, COMPONENT_TEST_TARGET_NAME,
};
pub use tree::Tree;
pub use versions::Versions;
pub use workspace::{find_workspace_root, Workspace};
