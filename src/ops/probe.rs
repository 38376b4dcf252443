//! Detection of the Cypress version installed in the workspace.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Reports the major version of the installed test runner, if any.
pub trait VersionProbe {
    fn installed_major_version(&self) -> Option<u64>;
}

/// A fixed answer, for callers that already know the installed version.
impl VersionProbe for Option<u64> {
    fn installed_major_version(&self) -> Option<u64> {
        *self
    }
}

/// Reads `node_modules/cypress/package.json` under the workspace root.
#[derive(Debug, Clone)]
pub struct NodeModulesProbe {
    manifest: PathBuf,
}

#[derive(Deserialize)]
struct PackageVersion {
    version: String,
}

impl NodeModulesProbe {
    pub fn new(workspace_root: &Path) -> Self {
        NodeModulesProbe {
            manifest: workspace_root
                .join("node_modules")
                .join("cypress")
                .join("package.json"),
        }
    }
}

impl VersionProbe for NodeModulesProbe {
    fn installed_major_version(&self) -> Option<u64> {
        let text = std::fs::read_to_string(&self.manifest).ok()?;
        let parsed: PackageVersion = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("ignoring unreadable {}: {}", self.manifest.display(), e);
                return None;
            }
        };

        let major = parse_major(&parsed.version);
        tracing::debug!(
            "found cypress {} (major {:?}) at {}",
            parsed.version,
            major,
            self.manifest.display()
        );
        major
    }
}

/// Major component of a version string, tolerating non-semver spellings
/// such as `10.3` or `v9`.
fn parse_major(version: &str) -> Option<u64> {
    if let Ok(v) = semver::Version::parse(version) {
        return Some(v.major);
    }
    let digits: String = version
        .trim_start_matches('v')
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
