//! Configuration schema for forge projects.
//!
//! The merged configuration is kept as a `serde_json::Value` tree because
//! target names are user-defined keys. Typed views are deserialised from it on
//! demand.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fmt;
use std::path::PathBuf;

use crate::build::StepConfig;

/// One or more glob patterns. Accepts a single string or an array of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "OneOrMany")]
pub struct Patterns(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Patterns {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(p) => Patterns(vec![p]),
            OneOrMany::Many(ps) => Patterns(ps),
        }
    }
}

impl Patterns {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Patterns(patterns.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a Patterns {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Lifecycle commands run around a target's compilation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HooksConfig {
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub after: Option<String>,
}

/// Configuration of a single build target.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Entry globs, relative to the input root (required)
    pub entries: Patterns,
    /// Globs subtracted from the entries
    #[serde(default)]
    pub exclude: Patterns,
    /// Output subdirectory, relative to the output root
    #[serde(default)]
    pub output: PathBuf,
    /// Compiler name; defaults to the target name
    #[serde(default)]
    pub compiler: Option<String>,
    /// Globs watched for changes (watch mode only)
    #[serde(default)]
    pub observe: Patterns,
    /// Collapse the mirrored subdirectory structure
    #[serde(default)]
    pub flatten: bool,
    /// Force the output extension
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub hooks: HooksConfig,
    /// Named post-process steps, applied in declaration order
    #[serde(default)]
    pub postprocess: IndexMap<String, StepConfig>,
    /// Compiler-specific keys
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl TargetConfig {
    /// Build a target config from entry patterns with every other field defaulted.
    pub fn with_entries(entries: Patterns) -> Self {
        Self {
            entries,
            exclude: Patterns::default(),
            output: PathBuf::new(),
            compiler: None,
            observe: Patterns::default(),
            flatten: false,
            ext: None,
            hooks: HooksConfig::default(),
            postprocess: IndexMap::new(),
            options: Map::new(),
        }
    }

    /// Name of the compiler bound to this target.
    pub fn compiler_name<'a>(&'a self, target: &'a str) -> &'a str {
        self.compiler.as_deref().unwrap_or(target)
    }

    /// Patterns to watch; entries are used when `observe` is not set.
    pub fn observe_patterns(&self) -> &Patterns {
        if self.observe.is_empty() {
            &self.entries
        } else {
            &self.observe
        }
    }

    /// Compiler-specific string option.
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }
}

/// How a target name resolves against the configuration tree.
#[derive(Debug, Clone)]
pub enum TargetSlot {
    /// Explicitly disabled with `false`
    Disabled,
    /// No configuration, or configuration without `entries`
    Missing,
    /// Configuration present but malformed
    Invalid(String),
    Ready(Box<TargetConfig>),
}

impl TargetSlot {
    /// Classify the value stored under a target name.
    pub fn classify(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Bool(false)) => TargetSlot::Disabled,
            Some(Value::Object(map)) if map.contains_key("entries") => {
                match serde_json::from_value::<TargetConfig>(Value::Object(map.clone())) {
                    Ok(cfg) => TargetSlot::Ready(Box::new(cfg)),
                    Err(e) => TargetSlot::Invalid(e.to_string()),
                }
            }
            Some(Value::Object(_)) | Some(Value::Null) | None => TargetSlot::Missing,
            Some(other) => TargetSlot::Invalid(format!("expected an object or false, got {}", other)),
        }
    }
}

/// Static asset copy settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CopyConfig {
    #[serde(default)]
    pub entries: Patterns,
    #[serde(default)]
    pub exclude: Patterns,
    #[serde(default)]
    pub output: PathBuf,
}

/// Watch mode configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Debounce delay in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
}

fn default_debounce_ms() -> u32 {
    100
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: default_debounce_ms() }
    }
}

/// Development server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServeConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    1234
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

/// Global settings: directories, default targets, and the tool sections.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_input")]
    pub input: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Targets compiled when none are requested
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub serve: ServeConfig,
    /// Custom CLI commands: name to shell command
    #[serde(default)]
    pub commands: IndexMap<String, String>,
}

fn default_input() -> PathBuf {
    PathBuf::from("src/")
}

fn default_output() -> PathBuf {
    PathBuf::from("dist/")
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "serve.port")
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' {}", self.field, self.message)
    }
}

impl Settings {
    /// Validate the settings and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.output.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "output".to_string(),
                message: "must be a non-empty path".to_string(),
            });
        }

        for (i, target) in self.targets.iter().enumerate() {
            if target.trim().is_empty() {
                errors.push(ConfigValidationError {
                    field: format!("targets[{}]", i),
                    message: "must be a non-empty target name".to_string(),
                });
            }
        }

        if self.watch.debounce_ms == 0 {
            errors.push(ConfigValidationError {
                field: "watch.debounce_ms".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        if self.serve.port == 0 {
            errors.push(ConfigValidationError {
                field: "serve.port".to_string(),
                message: "must be a positive port number".to_string(),
            });
        }

        errors
    }
}

/// Built-in defaults every user configuration is merged over.
pub fn base_config() -> Value {
    json!({
        "input": "src/",
        "output": "dist/",
        "targets": ["css", "svg"],

        "css": {
            "observe": "**/*.css",
            "entries": "assets/css/*.css",
            "output": "assets/"
        },

        "svg": {
            "observe": "**/*.svg",
            "entries": "assets/icons/*.svg",
            "output": "assets/"
        },

        "copy": {
            "entries": ["assets/**"],
            "exclude": ["assets/icons/**", "assets/css/**"],
            "output": ""
        },

        "watch": { "debounce_ms": 100 },
        "serve": { "host": "127.0.0.1", "port": 1234 }
    })
}
