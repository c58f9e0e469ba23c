//! Build context containing configuration and environment for a build.

use crate::config::{
    base_config, deep_merge, load_rc, ConfigError, CopyConfig, Settings, TargetSlot,
};
use crate::env::Env;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Logical configuration name used for file lookup.
pub const CONFIG_NAME: &str = "forge";

/// Build context: the merged configuration tree, its typed settings, the
/// project root, and the build environment.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Merged configuration tree
    config: Value,
    /// Typed view of the global settings
    settings: Settings,
    /// Project root directory (where the config file lives)
    project_root: PathBuf,
    env: Env,
}

impl BuildContext {
    /// Create a context from an already merged configuration tree.
    pub fn new(config: Value, project_root: PathBuf, env: Env) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_value(config.clone())?;

        let errors = settings.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
        }

        Ok(Self { config, settings, project_root, env })
    }

    /// Load the project configuration from `project_root`, merged over the defaults.
    pub fn load(project_root: PathBuf, env: Env) -> Result<Self, ConfigError> {
        let config = load_rc(&project_root, CONFIG_NAME, base_config())?;
        Self::new(config, project_root, env)
    }

    /// Merge `overrides` over the defaults without touching the filesystem.
    pub fn from_overrides(
        overrides: Value,
        project_root: PathBuf,
        env: Env,
    ) -> Result<Self, ConfigError> {
        let mut config = base_config();
        deep_merge(&mut config, overrides);
        Self::new(config, project_root, env)
    }

    /// Get the merged configuration tree.
    pub fn config(&self) -> &Value {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn env(&self) -> Env {
        self.env
    }

    pub fn is_production(&self) -> bool {
        self.env.is_production()
    }

    pub fn is_debug(&self) -> bool {
        self.env.debug
    }

    /// Get the input directory (resolved to absolute path).
    pub fn input_dir(&self) -> PathBuf {
        self.resolve_path(&self.settings.input)
    }

    /// Get the output directory (resolved to absolute path).
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.settings.output)
    }

    /// Targets compiled when the caller names none.
    pub fn default_targets(&self) -> &[String] {
        &self.settings.targets
    }

    /// Classify the configuration stored under `name`.
    pub fn target(&self, name: &str) -> TargetSlot {
        TargetSlot::classify(self.config.get(name))
    }

    /// Static copy settings, if the `copy` section is an object.
    pub fn copy_config(&self) -> Result<Option<CopyConfig>, ConfigError> {
        match self.config.get("copy") {
            Some(value @ Value::Object(_)) => Ok(Some(serde_json::from_value(value.clone())?)),
            _ => Ok(None),
        }
    }

    /// Resolve a path relative to the project root.
    ///
    /// If the path is absolute, returns it unchanged.
    /// If relative, joins it with the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}
