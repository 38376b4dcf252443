//! Staged file tree over the workspace root.
//!
//! Generators never touch the disk directly. Reads fall through to the
//! filesystem unless a staged change shadows the path; writes and deletes are
//! buffered until [`Tree::flush`] commits them. This lets a caller inspect or
//! discard everything a generator did (`--dry-run`).

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::util::fs;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Staged {
    Write(Vec<u8>),
    Delete,
}

/// What a flushed (or pending) change does to the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Create => write!(f, "CREATE"),
            ChangeKind::Update => write!(f, "UPDATE"),
            ChangeKind::Delete => write!(f, "DELETE"),
        }
    }
}

/// A pending change to a workspace-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// In-memory view of the workspace with staged modifications.
#[derive(Debug)]
pub struct Tree {
    root: PathBuf,
    staged: BTreeMap<PathBuf, Staged>,
}

impl Tree {
    /// Create a tree rooted at the workspace directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Tree {
            root: root.into(),
            staged: BTreeMap::new(),
        }
    }

    /// The workspace root on disk.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key(path: impl AsRef<Path>) -> PathBuf {
        fs::normalize_relative(path.as_ref())
    }

    /// Whether a file or directory exists at `path`, staged changes included.
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        let key = Self::key(path);
        match self.staged.get(&key) {
            Some(Staged::Write(_)) => return true,
            Some(Staged::Delete) => return false,
            None => {}
        }
        // A directory exists if anything staged lives beneath it.
        let staged_child = self
            .staged
            .iter()
            .any(|(p, s)| matches!(s, Staged::Write(_)) && p.starts_with(&key) && *p != key);
        staged_child || self.root.join(&key).exists()
    }

    /// Whether a file (not a directory) exists at `path`.
    pub fn is_file(&self, path: impl AsRef<Path>) -> bool {
        let key = Self::key(path);
        match self.staged.get(&key) {
            Some(Staged::Write(_)) => true,
            Some(Staged::Delete) => false,
            None => self.root.join(&key).is_file(),
        }
    }

    /// Read raw file contents, or `None` if the file doesn't exist.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<Option<Vec<u8>>> {
        let key = Self::key(path);
        match self.staged.get(&key) {
            Some(Staged::Write(bytes)) => Ok(Some(bytes.clone())),
            Some(Staged::Delete) => Ok(None),
            None => {
                let on_disk = self.root.join(&key);
                if !on_disk.is_file() {
                    return Ok(None);
                }
                std::fs::read(&on_disk)
                    .map(Some)
                    .with_context(|| format!("failed to read file: {}", on_disk.display()))
            }
        }
    }

    /// Read a file as UTF-8 text, or `None` if the file doesn't exist.
    pub fn read_to_string(&self, path: impl AsRef<Path>) -> Result<Option<String>> {
        let path = path.as_ref();
        match self.read(path)? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .with_context(|| format!("file is not valid UTF-8: {}", path.display())),
            None => Ok(None),
        }
    }

    /// Stage a write.
    pub fn write(&mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let key = Self::key(path);
        tracing::trace!("staged write {}", key.display());
        self.staged.insert(key, Staged::Write(contents.into()));
    }

    /// Stage a delete.
    pub fn delete(&mut self, path: impl AsRef<Path>) {
        let key = Self::key(path);
        tracing::trace!("staged delete {}", key.display());
        self.staged.insert(key, Staged::Delete);
    }

    /// Parse a JSON file, accepting comments and trailing commas.
    pub fn read_json<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> Result<Option<T>> {
        let path = path.as_ref();
        let Some(text) = self.read_to_string(path)? else {
            return Ok(None);
        };
        serde_json::from_str(&strip_jsonc(&text))
            .map(Some)
            .with_context(|| format!("failed to parse JSON: {}", path.display()))
    }

    /// Serialize `value` as pretty JSON and stage the write.
    pub fn write_json<T: Serialize>(&mut self, path: impl AsRef<Path>, value: &T) -> Result<()> {
        let path = path.as_ref();
        let text = to_pretty_json(value)
            .with_context(|| format!("failed to serialize JSON: {}", path.display()))?;
        self.write(path, text);
        Ok(())
    }

    /// Read-modify-write a JSON file that must already exist.
    pub fn update_json<F>(&mut self, path: impl AsRef<Path>, update: F) -> Result<()>
    where
        F: FnOnce(&mut Value) -> Result<()>,
    {
        let path = path.as_ref();
        let Some(mut json) = self.read_json::<Value>(path)? else {
            bail!("cannot update `{}`: file does not exist", path.display());
        };
        update(&mut json)?;
        self.write_json(path, &json)
    }

    /// Workspace-relative paths of staged files, writes only.
    pub fn staged_files(&self) -> impl Iterator<Item = &Path> {
        self.staged.iter().filter_map(|(p, s)| match s {
            Staged::Write(_) => Some(p.as_path()),
            Staged::Delete => None,
        })
    }

    /// Changes that a flush would apply, in path order.
    pub fn list_changes(&self) -> Vec<FileChange> {
        self.staged
            .iter()
            .filter_map(|(path, staged)| {
                let on_disk = self.root.join(path).is_file();
                let kind = match staged {
                    Staged::Write(_) if on_disk => ChangeKind::Update,
                    Staged::Write(_) => ChangeKind::Create,
                    Staged::Delete if on_disk => ChangeKind::Delete,
                    Staged::Delete => return None,
                };
                Some(FileChange {
                    path: path.clone(),
                    kind,
                })
            })
            .collect()
    }

    /// Whether anything is staged.
    pub fn has_changes(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Commit all staged changes to disk.
    pub fn flush(&mut self) -> Result<Vec<FileChange>> {
        let changes = self.list_changes();
        for (path, staged) in std::mem::take(&mut self.staged) {
            let target = self.root.join(&path);
            match staged {
                Staged::Write(bytes) => fs::write_bytes(&target, &bytes)?,
                Staged::Delete => fs::remove_file_if_exists(&target)?,
            }
        }
        tracing::debug!("flushed {} change(s) to {}", changes.len(), self.root.display());
        Ok(changes)
    }
}

/// Pretty-print JSON with two-space indentation and a trailing newline.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    Ok(text)
}

/// Reduce JSON-with-comments to plain JSON: drop `//` and `/* */` comments
/// and commas that directly precede a closing `]` or `}`.
pub fn strip_jsonc(content: &str) -> String {
    drop_trailing_commas(&strip_comments(content))
}

fn strip_comments(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                result.push(c);
            }
            ('/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    prev = skipped;
                }
            }
            _ => result.push(c),
        }
    }

    result
}

fn drop_trailing_commas(content: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let mut result = String::with_capacity(content.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
            if matches!(next, Some(']') | Some('}')) {
                continue;
            }
        }
        result.push(c);
    }

    result
}
