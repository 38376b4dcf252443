//! Package versions written into `package.json`.
//!
//! The table is built once at startup from the built-in defaults plus any
//! `[versions]` overrides from configuration, then passed by reference to
//! the generators that need it.

use crate::util::config::VersionOverrides;

pub const CYPRESS_VERSION: &str = "^10.2.0";
pub const CYPRESS_WEBPACK_DEV_SERVER_VERSION: &str = "^2.0.0";
pub const HTML_WEBPACK_PLUGIN_VERSION: &str = "^5.5.0";
pub const CYPRESS_REACT_VERSION: &str = "^6.0.0";
pub const SWC_CORE_VERSION: &str = "^1.2.173";
pub const SWC_LOADER_VERSION: &str = "0.1.15";

/// Immutable version table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versions {
    pub cypress: String,
    pub cypress_webpack_dev_server: String,
    pub html_webpack_plugin: String,
    pub cypress_react: String,
    pub swc_core: String,
    pub swc_loader: String,
}

impl Default for Versions {
    fn default() -> Self {
        Versions {
            cypress: CYPRESS_VERSION.to_string(),
            cypress_webpack_dev_server: CYPRESS_WEBPACK_DEV_SERVER_VERSION.to_string(),
            html_webpack_plugin: HTML_WEBPACK_PLUGIN_VERSION.to_string(),
            cypress_react: CYPRESS_REACT_VERSION.to_string(),
            swc_core: SWC_CORE_VERSION.to_string(),
            swc_loader: SWC_LOADER_VERSION.to_string(),
        }
    }
}

impl Versions {
    /// Built-in defaults with configured overrides applied.
    pub fn with_overrides(overrides: &VersionOverrides) -> Self {
        let defaults = Versions::default();
        let pick = |value: &Option<String>, default: String| value.clone().unwrap_or(default);
        Versions {
            cypress: pick(&overrides.cypress, defaults.cypress),
            cypress_webpack_dev_server: pick(
                &overrides.cypress_webpack_dev_server,
                defaults.cypress_webpack_dev_server,
            ),
            html_webpack_plugin: pick(&overrides.html_webpack_plugin, defaults.html_webpack_plugin),
            cypress_react: pick(&overrides.cypress_react, defaults.cypress_react),
            swc_core: pick(&overrides.swc_core, defaults.swc_core),
            swc_loader: pick(&overrides.swc_loader, defaults.swc_loader),
        }
    }
}
