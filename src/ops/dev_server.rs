//! Build configuration for the component-test dev server.
//!
//! [`compose_dev_server_factory`] captures the compiler choice and an optional
//! caller transform. Nothing happens until [`ComponentDevServer::start`]:
//! the base configuration is discovered, the compiler and CSS-module rules
//! are appended, the transform runs last and the result is handed to a
//! [`DevServer`].

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::build_config::{css_modules_loader, lib_loader, BuildConfiguration, Compiler};
use crate::core::tree::{strip_jsonc, to_pretty_json};
use crate::errors::GeneratorError;
use crate::util::fs;

/// tsconfig used when the caller doesn't name one.
pub const DEFAULT_TS_CONFIG: &str = "tsconfig.cy.json";

/// HTML template the dev server renders components into.
pub const NEXT_TEMPLATE: &str = "next.template.html";

/// Framework whose babel preset and config discovery are used.
const FRAMEWORK_LIB: &str = "next";

/// Finds the framework's own build configuration.
pub trait ConfigDiscovery {
    /// `Ok(None)` means the framework has no discoverable configuration.
    fn find_base_config(&self, options: &Value) -> Result<Option<BuildConfiguration>>;
}

/// Launches a dev server from a composed configuration.
pub trait DevServer {
    type Handle;

    fn start(&self, request: StartRequest) -> Result<Self::Handle>;
}

/// Everything a dev server needs to start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    /// Options passed through from the test runner
    pub options: Value,

    /// Composed build configuration
    pub config: BuildConfiguration,

    pub template: String,

    pub ts_config_path: String,
}

/// Caller transform applied after the built-in rules.
pub type ExtendConfig = Box<dyn Fn(BuildConfiguration) -> BuildConfiguration>;

/// A configured but not yet started component dev server.
pub struct ComponentDevServer {
    ts_config_path: String,
    compiler: Compiler,
    extend_config: Option<ExtendConfig>,
}

impl fmt::Debug for ComponentDevServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDevServer")
            .field("ts_config_path", &self.ts_config_path)
            .field("compiler", &self.compiler)
            .field("extend_config", &self.extend_config.is_some())
            .finish()
    }
}

/// Build a dev server factory. `None` selects `tsconfig.cy.json` and babel.
pub fn compose_dev_server_factory(
    ts_config_path: Option<&str>,
    compiler: Option<Compiler>,
    extend_config: Option<ExtendConfig>,
) -> ComponentDevServer {
    ComponentDevServer {
        ts_config_path: ts_config_path.unwrap_or(DEFAULT_TS_CONFIG).to_string(),
        compiler: compiler.unwrap_or_default(),
        extend_config,
    }
}

impl ComponentDevServer {
    pub fn ts_config_path(&self) -> &str {
        &self.ts_config_path
    }

    pub fn compiler(&self) -> Compiler {
        self.compiler
    }

    /// Layer the compiler and CSS-module rules over `base`, then apply the
    /// caller transform.
    pub fn compose(&self, mut base: BuildConfiguration) -> BuildConfiguration {
        base.push_rule(lib_loader(self.compiler, FRAMEWORK_LIB));
        base.push_rule(css_modules_loader());
        tracing::debug!(
            "composed {} loader rule(s) with {}",
            base.rules().len(),
            self.compiler
        );
        match &self.extend_config {
            Some(extend) => extend(base),
            None => base,
        }
    }

    /// Discover the base configuration, compose it and start `server`.
    pub fn start<D, S>(&self, discovery: &D, server: &S, options: Value) -> Result<S::Handle>
    where
        D: ConfigDiscovery + ?Sized,
        S: DevServer + ?Sized,
    {
        let Some(base) = discovery.find_base_config(&options)? else {
            return Err(GeneratorError::ConfigNotFound.into());
        };

        let config = self.compose(base);
        tracing::info!("starting component dev server with {}", self.ts_config_path);
        server.start(StartRequest {
            options,
            config,
            template: NEXT_TEMPLATE.to_string(),
            ts_config_path: self.ts_config_path.clone(),
        })
    }
}

/// Reads a JSON-serialized base configuration from a file.
#[derive(Debug, Clone)]
pub struct FileConfigDiscovery {
    path: PathBuf,
}

impl FileConfigDiscovery {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileConfigDiscovery { path: path.into() }
    }
}

impl ConfigDiscovery for FileConfigDiscovery {
    fn find_base_config(&self, _options: &Value) -> Result<Option<BuildConfiguration>> {
        if !self.path.is_file() {
            tracing::debug!("no base config at {}", self.path.display());
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?;
        let config = serde_json::from_str(&strip_jsonc(&text))
            .with_context(|| format!("invalid build configuration: {}", self.path.display()))?;
        Ok(Some(config))
    }
}

/// Writes the start request to a launch file instead of running a server.
#[derive(Debug, Clone)]
pub struct EmitDevServer {
    output: PathBuf,
}

impl EmitDevServer {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        EmitDevServer {
            output: output.into(),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl DevServer for EmitDevServer {
    type Handle = PathBuf;

    fn start(&self, request: StartRequest) -> Result<PathBuf> {
        let text = to_pretty_json(&request).context("failed to serialize dev server request")?;
        fs::write_string(&self.output, &text)?;
        Ok(self.output.clone())
    }
}
