//! Configuration discovery and loading.
//!
//! A logical config name `X` is looked up in the project root through an
//! ordered list of loader strategies; the first one that finds a value wins and
//! is deep-merged over the caller's defaults:
//!
//! 1. `X.config.toml`, `X.config.json5`
//! 2. `.Xrc.toml`, `.Xrc.json5`, `.Xrc.json`
//! 3. `.Xrc` (strict JSON)
//! 4. the `X` key of `package.json`
//!
//! Files are read on every call, so a long-running watcher sees edits.

use serde_json::Value;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use super::merge::deep_merge;

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Parse error in one of the supported formats
    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    /// Merged tree does not match the expected shape
    #[error("Invalid configuration: {0}")]
    Shape(#[from] serde_json::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// Text formats understood by the loaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json5,
    Json,
}

impl Format {
    fn parse(self, path: &Path, contents: &str) -> Result<Value, ConfigError> {
        let parsed = match self {
            Format::Toml => toml::from_str::<Value>(contents).map_err(|e| e.to_string()),
            Format::Json5 => json5::from_str::<Value>(contents).map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str::<Value>(contents).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| ConfigError::Parse { path: path.to_path_buf(), message })
    }
}

/// Where a configuration override came from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub path: PathBuf,
    pub value: Value,
}

/// A loader strategy: project root and logical name to an optional value.
pub type LoaderStrategy = fn(&Path, &str) -> Result<Option<ConfigSource>, ConfigError>;

/// Strategies in precedence order.
pub const STRATEGIES: [LoaderStrategy; 4] =
    [load_config_module, load_rc_with_ext, load_rc_json, load_manifest_field];

/// Read and parse `path` if it exists.
fn read_if_exists(path: PathBuf, format: Format) -> Result<Option<ConfigSource>, ConfigError> {
    if !path.is_file() {
        return Ok(None);
    }
    let contents =
        fs::read_to_string(&path).map_err(|source| ConfigError::Io { path: path.clone(), source })?;
    let value = format.parse(&path, &contents)?;
    Ok(Some(ConfigSource { path, value }))
}

fn first_of(
    root: &Path,
    candidates: &[(String, Format)],
) -> Result<Option<ConfigSource>, ConfigError> {
    for (file, format) in candidates {
        if let Some(found) = read_if_exists(root.join(file), *format)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// `X.config.toml`, then `X.config.json5`.
pub fn load_config_module(root: &Path, name: &str) -> Result<Option<ConfigSource>, ConfigError> {
    first_of(
        root,
        &[
            (format!("{}.config.toml", name), Format::Toml),
            (format!("{}.config.json5", name), Format::Json5),
        ],
    )
}

/// `.Xrc.toml`, `.Xrc.json5`, then `.Xrc.json`.
pub fn load_rc_with_ext(root: &Path, name: &str) -> Result<Option<ConfigSource>, ConfigError> {
    first_of(
        root,
        &[
            (format!(".{}rc.toml", name), Format::Toml),
            (format!(".{}rc.json5", name), Format::Json5),
            (format!(".{}rc.json", name), Format::Json),
        ],
    )
}

/// `.Xrc` as plain JSON.
pub fn load_rc_json(root: &Path, name: &str) -> Result<Option<ConfigSource>, ConfigError> {
    read_if_exists(root.join(format!(".{}rc", name)), Format::Json)
}

/// Key `X` of the project's `package.json`.
pub fn load_manifest_field(root: &Path, name: &str) -> Result<Option<ConfigSource>, ConfigError> {
    let Some(manifest) = read_if_exists(root.join("package.json"), Format::Json)? else {
        return Ok(None);
    };
    Ok(manifest
        .value
        .get(name)
        .cloned()
        .map(|value| ConfigSource { path: manifest.path, value }))
}

/// Find the first override source for `name`.
pub fn find_override(root: &Path, name: &str) -> Result<Option<ConfigSource>, ConfigError> {
    for strategy in STRATEGIES {
        if let Some(source) = strategy(root, name)? {
            return Ok(Some(source));
        }
    }
    Ok(None)
}

/// Load the configuration named `name` and merge it over `defaults`.
///
/// Absence of any override yields `defaults` unchanged. An override that is
/// not an object is ignored.
pub fn load_rc(root: &Path, name: &str, defaults: Value) -> Result<Value, ConfigError> {
    let mut config = defaults;
    match find_override(root, name)? {
        Some(source) if source.value.is_object() => {
            debug!(name, path = %source.path.display(), "loaded configuration override");
            deep_merge(&mut config, source.value);
        }
        Some(source) => {
            debug!(name, path = %source.path.display(), "ignoring non-object configuration");
        }
        None => debug!(name, "no configuration override found"),
    }
    Ok(config)
}

/// Whether `dir` holds any forge configuration source.
fn has_config(dir: &Path, name: &str) -> bool {
    let candidates = [
        format!("{}.config.toml", name),
        format!("{}.config.json5", name),
        format!(".{}rc.toml", name),
        format!(".{}rc.json5", name),
        format!(".{}rc.json", name),
        format!(".{}rc", name),
    ];
    candidates.iter().any(|c| dir.join(c).is_file())
}

/// Find the project root by walking up from `start`.
///
/// The root is the first directory holding a config file for `name`, else the
/// first holding a `package.json`.
pub fn find_project_root_from(start: PathBuf, name: &str) -> Option<PathBuf> {
    let mut current = start.clone();
    loop {
        if has_config(&current, name) {
            return Some(current);
        }
        if !current.pop() {
            break;
        }
    }

    let mut current = start;
    loop {
        if current.join("package.json").is_file() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Find the project root from the current working directory, falling back to it.
pub fn find_project_root(name: &str) -> PathBuf {
    let cwd = env::current_dir().unwrap_or_default();
    find_project_root_from(cwd.clone(), name).unwrap_or(cwd)
}
