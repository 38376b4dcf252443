//! Bundler build configuration and the loader rules ctgen layers onto it.
//!
//! The model follows the shape of a webpack configuration. Only the parts
//! ctgen touches are typed; everything else round-trips through `extra`.
//! Rule shapes ctgen does not interpret are kept verbatim.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Transpiler used for project sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compiler {
    #[default]
    Babel,
    Swc,
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compiler::Babel => write!(f, "babel"),
            Compiler::Swc => write!(f, "swc"),
        }
    }
}

impl FromStr for Compiler {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "babel" => Ok(Compiler::Babel),
            "swc" => Ok(Compiler::Swc),
            other => Err(format!("unknown compiler `{}` (expected `babel` or `swc`)", other)),
        }
    }
}

/// A `test`/`exclude` condition.
///
/// Strings are regex sources and arrays match when any element matches.
/// Other shapes round-trip unchanged and never match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleCondition {
    Pattern(String),
    Any(Vec<RuleCondition>),
    Opaque(Value),
}

impl RuleCondition {
    pub fn pattern(source: impl Into<String>) -> Self {
        RuleCondition::Pattern(source.into())
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            RuleCondition::Pattern(source) => pattern_matches(source, path),
            RuleCondition::Any(conditions) => conditions.iter().any(|c| c.matches(path)),
            RuleCondition::Opaque(_) => false,
        }
    }
}

/// Object form of a `use` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseEntry {
    pub loader: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UseEntry {
    pub fn new(loader: impl Into<String>) -> Self {
        UseEntry {
            loader: loader.into(),
            options: None,
            extra: Map::new(),
        }
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }
}

/// One element of a `use` value: a loader name, an entry object, or
/// something kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UseItem {
    Loader(String),
    Entry(UseEntry),
    Opaque(Value),
}

impl UseItem {
    pub fn loader(&self) -> Option<&str> {
        match self {
            UseItem::Loader(name) => Some(name.as_str()),
            UseItem::Entry(entry) => Some(entry.loader.as_str()),
            UseItem::Opaque(_) => None,
        }
    }
}

/// A rule's `use` value, either a chain or a single item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleUse {
    Chain(Vec<UseItem>),
    Single(UseItem),
}

impl RuleUse {
    fn items(&self) -> &[UseItem] {
        match self {
            RuleUse::Chain(items) => items,
            RuleUse::Single(item) => std::slice::from_ref(item),
        }
    }
}

/// A module rule: which files it applies to and how they are loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoaderRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<RuleCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<RuleCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loader: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,

    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<RuleUse>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LoaderRule {
    /// Whether this rule applies to `path`.
    ///
    /// A rule without `test` matches nothing. Patterns that fail to compile
    /// are treated as non-matching.
    pub fn matches(&self, path: &str) -> bool {
        let Some(test) = &self.test else {
            return false;
        };
        test.matches(path) && !self.exclude.as_ref().is_some_and(|e| e.matches(path))
    }

    /// Loader names this rule applies, in order. Opaque `use` items are
    /// skipped.
    pub fn loaders(&self) -> Vec<&str> {
        let uses = self.uses.as_ref().map(RuleUse::items).unwrap_or_default();
        self.loader
            .as_deref()
            .into_iter()
            .chain(uses.iter().filter_map(UseItem::loader))
            .collect()
    }
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    match Regex::new(pattern) {
        Ok(re) => re.is_match(path),
        Err(e) => {
            tracing::warn!("ignoring invalid rule pattern `{}`: {}", pattern, e);
            false
        }
    }
}

/// `module` settings: the ordered rule list plus anything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleSettings {
    #[serde(default)]
    pub rules: Vec<LoaderRule>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A bundler build configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,

    #[serde(default)]
    pub module: ModuleSettings,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BuildConfiguration {
    /// Append a rule after every existing one.
    pub fn push_rule(&mut self, rule: LoaderRule) {
        self.module.rules.push(rule);
    }

    pub fn rules(&self) -> &[LoaderRule] {
        &self.module.rules
    }

    /// The rule that decides how `path` is loaded.
    ///
    /// Rules are evaluated in order and the last match wins, so a rule
    /// appended later overrides an earlier one for the same files.
    pub fn effective_rule_for(&self, path: &str) -> Option<&LoaderRule> {
        self.module.rules.iter().rev().find(|r| r.matches(path))
    }
}

/// Transpilation rule for sources of a library built with `compiler`.
pub fn lib_loader(compiler: Compiler, lib_name: &str) -> LoaderRule {
    match compiler {
        Compiler::Babel => LoaderRule {
            test: Some(RuleCondition::pattern(r"\.(js|jsx|mjs|ts|tsx)$")),
            exclude: Some(RuleCondition::pattern("node_modules")),
            loader: Some("babel-loader".to_string()),
            options: Some(json!({
                "presets": [[format!("@nrwl/{}/babel", lib_name)]],
                "rootMode": "upward",
                "babelrc": true
            })),
            ..Default::default()
        },
        Compiler::Swc => LoaderRule {
            test: Some(RuleCondition::pattern(r"\.(j|t)sx?$")),
            exclude: Some(RuleCondition::pattern("node_modules")),
            loader: Some("swc-loader".to_string()),
            options: Some(json!({
                "jsc": {
                    "parser": {
                        "syntax": "typescript",
                        "decorators": true,
                        "tsx": true
                    },
                    "transform": {
                        "react": { "runtime": "automatic" }
                    },
                    "loose": true
                }
            })),
            ..Default::default()
        },
    }
}

/// Loader rule for CSS modules.
///
/// The extension is matched case-insensitively without inline flags, so the
/// pattern also compiles as a JavaScript `RegExp`.
pub fn css_modules_loader() -> LoaderRule {
    LoaderRule {
        test: Some(RuleCondition::pattern(r"\.[cC][sS][sS]$")),
        uses: Some(RuleUse::Chain(vec![
            UseItem::Entry(UseEntry::new("style-loader")),
            UseItem::Entry(UseEntry::new("css-loader").with_options(json!({ "modules": true }))),
        ])),
        ..Default::default()
    }
}
