//! Root `package.json` dependency updates.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde_json::{Map, Value};

use crate::core::tree::Tree;

/// Path of the workspace manifest, relative to the workspace root.
pub const PACKAGE_JSON: &str = "package.json";

/// Additive set of development dependencies (package name -> version).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyDelta {
    entries: BTreeMap<String, String>,
}

impl DependencyDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package; a later insert of the same name replaces the version.
    pub fn insert(&mut self, name: impl Into<String>, version: impl Into<String>) {
        self.entries.insert(name.into(), version.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Merge `delta` into the `devDependencies` of the root `package.json`.
///
/// Packages already listed in `dependencies` or `devDependencies` keep their
/// current version. A missing `package.json` is created. Returns the names
/// that were actually added; an empty result means the file was not touched.
pub fn add_dev_dependencies(tree: &mut Tree, delta: &DependencyDelta) -> Result<Vec<String>> {
    let mut manifest: Value = tree
        .read_json(PACKAGE_JSON)?
        .unwrap_or_else(|| Value::Object(Map::new()));
    let Some(existing) = manifest.as_object() else {
        bail!("{} must contain a JSON object", PACKAGE_JSON);
    };

    let listed = |section: &str, name: &str| {
        existing
            .get(section)
            .and_then(Value::as_object)
            .is_some_and(|deps| deps.contains_key(name))
    };

    let added: Vec<(String, String)> = delta
        .iter()
        .filter(|&(name, _)| !listed("dependencies", name) && !listed("devDependencies", name))
        .map(|(name, version)| (name.to_string(), version.to_string()))
        .collect();

    if added.is_empty() {
        tracing::debug!("all requested dev dependencies are already present");
        return Ok(Vec::new());
    }

    let Some(root) = manifest.as_object_mut() else {
        bail!("{} must contain a JSON object", PACKAGE_JSON);
    };
    let dev = root
        .entry("devDependencies")
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(dev) = dev.as_object_mut() else {
        bail!("`devDependencies` in {} must be an object", PACKAGE_JSON);
    };
    for (name, version) in &added {
        tracing::debug!("adding dev dependency {}@{}", name, version);
        dev.insert(name.clone(), Value::String(version.clone()));
    }
    dev.sort_keys();

    tree.write_json(PACKAGE_JSON, &manifest)?;
    Ok(added.into_iter().map(|(name, _)| name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn delta(pairs: &[(&str, &str)]) -> DependencyDelta {
        let mut delta = DependencyDelta::new();
        for (name, version) in pairs {
            delta.insert(*name, *version);
        }
        delta
    }

    #[test]
    fn test_adds_missing_dev_dependencies_sorted() {
        let tmp = TempDir::new().unwrap();
        let mut tree = Tree::new(tmp.path());
        tree.write_json(
            PACKAGE_JSON,
            &json!({
                "name": "@acme/source",
                "devDependencies": { "typescript": "~4.7.2" }
            }),
        )
        .unwrap();

        let added = add_dev_dependencies(
            &mut tree,
            &delta(&[("cypress", "^10.2.0"), ("html-webpack-plugin", "^5.5.0")]),
        )
        .unwrap();

        assert_eq!(added, vec!["cypress", "html-webpack-plugin"]);
        let manifest: Value = tree.read_json(PACKAGE_JSON).unwrap().unwrap();
        let keys: Vec<_> = manifest["devDependencies"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["cypress", "html-webpack-plugin", "typescript"]);
        assert_eq!(manifest["name"], "@acme/source");
    }

    #[test]
    fn test_never_overwrites_existing_versions() {
        let tmp = TempDir::new().unwrap();
        let mut tree = Tree::new(tmp.path());
        tree.write_json(
            PACKAGE_JSON,
            &json!({
                "dependencies": { "@cypress/react": "5.0.0" },
                "devDependencies": { "cypress": "10.0.1" }
            }),
        )
        .unwrap();

        let added = add_dev_dependencies(
            &mut tree,
            &delta(&[("cypress", "^10.2.0"), ("@cypress/react", "^6.0.0")]),
        )
        .unwrap();

        assert!(added.is_empty());
        let manifest: Value = tree.read_json(PACKAGE_JSON).unwrap().unwrap();
        assert_eq!(manifest["devDependencies"]["cypress"], "10.0.1");
        assert!(manifest["devDependencies"].get("@cypress/react").is_none());
    }

    #[test]
    fn test_creates_missing_manifest() {
        let tmp = TempDir::new().unwrap();
        let mut tree = Tree::new(tmp.path());

        add_dev_dependencies(&mut tree, &delta(&[("swc-loader", "0.1.15")])).unwrap();

        let manifest: Value = tree.read_json(PACKAGE_JSON).unwrap().unwrap();
        assert_eq!(manifest, json!({ "devDependencies": { "swc-loader": "0.1.15" } }));
    }
}
