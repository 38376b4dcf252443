//! ctgen - component-testing scaffolding for Nx-style workspaces
//!
//! This crate provides the library behind the `ctgen` binary: the staged
//! workspace model, the component-project generator and the dev server
//! configuration composer.

pub mod core;
pub mod errors;
pub mod ops;
pub mod util;

pub use crate::core::{
    BuildConfiguration, Compiler, ProjectConfiguration, Tree, Versions, Workspace,
};
pub use errors::GeneratorError;
pub use ops::{compose_dev_server_factory, provision_component_testing, PendingFinalization};
pub use util::config::Config;
