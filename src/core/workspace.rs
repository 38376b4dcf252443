//! Workspace - the project arena and its backing file tree.
//!
//! Projects are discovered once when the workspace is loaded and kept in an
//! in-memory arena keyed by project id. Generators read a clone of a record,
//! modify it, and hand the whole record back; the workspace then stages the
//! matching file rewrite in its [`Tree`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use walkdir::WalkDir;

use crate::core::project::ProjectConfiguration;
use crate::core::tree::Tree;
use crate::errors::GeneratorError;
use crate::util::fs;

/// Workspace-level project index.
pub const WORKSPACE_FILE: &str = "workspace.json";

/// Nx configuration file, marks a workspace root even without `workspace.json`.
pub const NX_FILE: &str = "nx.json";

/// Per-project configuration file.
pub const PROJECT_FILE: &str = "project.json";

/// Directories never searched for `project.json` files.
const IGNORED_DIRS: &[&str] = &["node_modules", "dist", "tmp", "coverage"];

/// Where a project's record is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RecordLocation {
    /// A standalone `project.json` at this workspace-relative path
    ProjectFile(PathBuf),
    /// Inline under `projects.<id>` in `workspace.json`
    Inline,
}

#[derive(Debug, Clone)]
struct ProjectEntry {
    location: RecordLocation,
    config: ProjectConfiguration,
}

/// A loaded workspace.
#[derive(Debug)]
pub struct Workspace {
    tree: Tree,
    projects: BTreeMap<String, ProjectEntry>,
}

/// Find the workspace root containing `start`.
pub fn find_workspace_root(start: &Path) -> Result<PathBuf> {
    match fs::find_ancestor_with(start, &[WORKSPACE_FILE, NX_FILE]) {
        Some(root) => Ok(root),
        None => bail!(
            "could not find `{}` or `{}` in `{}` or any parent directory",
            WORKSPACE_FILE,
            NX_FILE,
            start.display()
        ),
    }
}

impl Workspace {
    /// Load the workspace rooted at `root`.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self> {
        Self::from_tree(Tree::new(root))
    }

    /// Load projects through an existing tree.
    ///
    /// Projects are taken from `workspace.json` when it exists, otherwise
    /// every `project.json` below the root is picked up.
    pub fn from_tree(tree: Tree) -> Result<Self> {
        let mut ws = Workspace {
            tree,
            projects: BTreeMap::new(),
        };

        if ws.tree.is_file(WORKSPACE_FILE) {
            ws.load_workspace_json()?;
        } else {
            ws.scan_project_files()?;
        }

        tracing::debug!(
            "loaded {} project(s) from {}",
            ws.projects.len(),
            ws.tree.root().display()
        );
        Ok(ws)
    }

    fn load_workspace_json(&mut self) -> Result<()> {
        let index: Value = self
            .tree
            .read_json(WORKSPACE_FILE)?
            .unwrap_or_else(|| Value::Object(Default::default()));

        let Some(projects) = index.get("projects").and_then(Value::as_object) else {
            return Ok(());
        };

        for (id, entry) in projects {
            let loaded = match entry {
                Value::String(root) => {
                    let file = PathBuf::from(fs::join_path_fragments(&[root.as_str(), PROJECT_FILE]));
                    let config = self.read_project_file(&file)?;
                    ProjectEntry {
                        location: RecordLocation::ProjectFile(file),
                        config,
                    }
                }
                Value::Object(_) => ProjectEntry {
                    location: RecordLocation::Inline,
                    config: serde_json::from_value(entry.clone()).with_context(|| {
                        format!("invalid configuration for project `{}` in {}", id, WORKSPACE_FILE)
                    })?,
                },
                other => bail!(
                    "invalid entry for project `{}` in {}: expected a path or an object, found {}",
                    id,
                    WORKSPACE_FILE,
                    other
                ),
            };
            self.projects.insert(id.clone(), loaded);
        }
        Ok(())
    }

    fn scan_project_files(&mut self) -> Result<()> {
        let root = self.tree.root().to_path_buf();
        let walker = WalkDir::new(&root).into_iter().filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            e.depth() == 0 || !(name.starts_with('.') || IGNORED_DIRS.contains(&&*name))
        });

        for entry in walker {
            let entry = entry.with_context(|| format!("failed to scan {}", root.display()))?;
            if !entry.file_type().is_file() || entry.file_name() != PROJECT_FILE {
                continue;
            }

            let file = fs::relative_path(&root, entry.path());
            let config = self.read_project_file(&file)?;
            let id = match config.extra.get("name").and_then(Value::as_str) {
                Some(name) => name.to_string(),
                None => file
                    .parent()
                    .and_then(Path::file_name)
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            };

            if let Some(previous) = self.projects.get(&id) {
                tracing::warn!(
                    "project `{}` is defined twice ({:?} and {}); keeping the first",
                    id,
                    previous.location,
                    file.display()
                );
                continue;
            }
            self.projects.insert(
                id,
                ProjectEntry {
                    location: RecordLocation::ProjectFile(file),
                    config,
                },
            );
        }
        Ok(())
    }

    fn read_project_file(&self, file: &Path) -> Result<ProjectConfiguration> {
        self.tree
            .read_json(file)?
            .with_context(|| format!("project configuration `{}` does not exist", file.display()))
    }

    /// The workspace root on disk.
    pub fn root(&self) -> &Path {
        self.tree.root()
    }

    /// The staged file tree.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The staged file tree, mutably.
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    /// Ids of all known projects, sorted.
    pub fn project_names(&self) -> impl Iterator<Item = &str> {
        self.projects.keys().map(String::as_str)
    }

    /// Read a copy of a project's configuration record.
    pub fn read_project(&self, id: &str) -> Result<ProjectConfiguration, GeneratorError> {
        match self.projects.get(id) {
            Some(entry) => Ok(entry.config.clone()),
            None => Err(GeneratorError::ProjectNotFound {
                project: id.to_string(),
                suggestions: self.similar_names(id),
            }),
        }
    }

    /// Replace a project's whole configuration record and stage the rewrite.
    pub fn write_project(&mut self, id: &str, config: ProjectConfiguration) -> Result<()> {
        let Some(entry) = self.projects.get_mut(id) else {
            return Err(GeneratorError::ProjectNotFound {
                project: id.to_string(),
                suggestions: Vec::new(),
            }
            .into());
        };
        entry.config = config;
        let entry = entry.clone();

        match entry.location {
            RecordLocation::ProjectFile(file) => self.tree.write_json(&file, &entry.config)?,
            RecordLocation::Inline => {
                let record = serde_json::to_value(&entry.config)?;
                self.tree.update_json(WORKSPACE_FILE, |index| {
                    index["projects"][id] = record;
                    Ok(())
                })?;
            }
        }
        tracing::debug!("updated configuration for project `{}`", id);
        Ok(())
    }

    fn similar_names(&self, id: &str) -> Vec<String> {
        let needle = id.to_lowercase();
        self.projects
            .keys()
            .filter(|name| {
                let name = name.to_lowercase();
                name.contains(&needle) || needle.contains(&name)
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::project::{ProjectType, TargetConfiguration};
    use serde_json::json;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_load_from_workspace_json() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "workspace.json",
            r#"{
  "version": 2,
  "projects": {
    "cool-lib": "libs/cool-lib",
    "web": { "root": "apps/web", "projectType": "application", "targets": {} }
  }
}"#,
        );
        write(
            tmp.path(),
            "libs/cool-lib/project.json",
            r#"{ "root": "libs/cool-lib", "projectType": "library", "targets": {} }"#,
        );

        let ws = Workspace::load(tmp.path()).unwrap();
        assert_eq!(ws.project_names().collect::<Vec<_>>(), vec!["cool-lib", "web"]);
        assert_eq!(
            ws.read_project("cool-lib").unwrap().project_type,
            Some(ProjectType::Library)
        );
        assert_eq!(ws.read_project("web").unwrap().root, "apps/web");
    }

    #[test]
    fn test_scan_project_files_without_index() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "nx.json", "{}");
        write(
            tmp.path(),
            "libs/cool-lib/project.json",
            r#"{ "name": "cool-lib", "root": "libs/cool-lib" }"#,
        );
        write(tmp.path(), "apps/web/project.json", r#"{ "root": "apps/web" }"#);
        write(
            tmp.path(),
            "node_modules/pkg/project.json",
            r#"{ "root": "node_modules/pkg" }"#,
        );

        let ws = Workspace::load(tmp.path()).unwrap();
        assert_eq!(ws.project_names().collect::<Vec<_>>(), vec!["cool-lib", "web"]);
    }

    #[test]
    fn test_read_missing_project_suggests_names() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "nx.json", "{}");
        write(tmp.path(), "libs/cool-lib/project.json", r#"{ "root": "libs/cool-lib" }"#);

        let ws = Workspace::load(tmp.path()).unwrap();
        match ws.read_project("cool").unwrap_err() {
            GeneratorError::ProjectNotFound {
                project,
                suggestions,
            } => {
                assert_eq!(project, "cool");
                assert_eq!(suggestions, vec!["cool-lib".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_write_project_replaces_record() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "nx.json", "{}");
        write(tmp.path(), "libs/cool-lib/project.json", r#"{ "root": "libs/cool-lib" }"#);
        let mut ws = Workspace::load(tmp.path()).unwrap();

        let mut config = ws.read_project("cool-lib").unwrap();
        config
            .targets
            .insert("lint".to_string(), TargetConfiguration::new("@nrwl/linter:eslint"));
        ws.write_project("cool-lib", config).unwrap();

        assert!(ws.read_project("cool-lib").unwrap().targets.contains_key("lint"));
        let staged: Value = ws.tree().read_json("libs/cool-lib/project.json").unwrap().unwrap();
        assert_eq!(staged["targets"]["lint"]["executor"], "@nrwl/linter:eslint");
        // Nothing reaches the disk until the tree is flushed.
        let on_disk = std::fs::read_to_string(tmp.path().join("libs/cool-lib/project.json")).unwrap();
        assert!(!on_disk.contains("lint"));
    }

    #[test]
    fn test_write_inline_project() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "workspace.json",
            r#"{ "version": 2, "projects": { "web": { "root": "apps/web" } } }"#,
        );
        let mut ws = Workspace::load(tmp.path()).unwrap();

        let mut config = ws.read_project("web").unwrap();
        config.source_root = Some("apps/web/src".to_string());
        ws.write_project("web", config).unwrap();

        let index: Value = ws.tree().read_json(WORKSPACE_FILE).unwrap().unwrap();
        assert_eq!(index["version"], json!(2));
        assert_eq!(index["projects"]["web"]["sourceRoot"], "apps/web/src");
    }

    #[test]
    fn test_find_workspace_root() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "workspace.json", "{}");
        let nested = tmp.path().join("libs/cool-lib");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_workspace_root(&nested).unwrap(), tmp.path());
    }
}
