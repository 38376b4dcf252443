//! High-level operations.
//!
//! This module contains the implementation of ctgen commands.

pub mod component_project;
pub mod dev_server;
pub mod eligibility;
pub mod finalize;
pub mod install;
pub mod probe;
pub mod templates;

pub use component_project::{
    provision_component_testing, ComponentProjectOptions, ComponentType,
};
pub use dev_server::{
    compose_dev_server_factory, ComponentDevServer, ConfigDiscovery, DevServer, EmitDevServer,
    ExtendConfig, FileConfigDiscovery, StartRequest,
};
pub use eligibility::{check_installed_cypress, evaluate_eligibility, InstallDecision};
pub use finalize::{DeferredAction, FinalizeReport, PendingFinalization};
pub use install::{InstallOutcome, Installer, PackageManager};
pub use probe::{NodeModulesProbe, VersionProbe};
