//! Post-process steps applied to compiler output.
//!
//! A target's `postprocess` table maps step names to their configuration.
//! Steps run in declaration order; each receives the previous step's output.

use indexmap::IndexMap;
use serde::de::{Deserializer, Error as _};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Options object passed to a step.
pub type StepOptions = Map<String, Value>;

/// Error raised by a post-process step.
#[derive(Debug, Error)]
#[error("post-process step '{step}' failed: {message}")]
pub struct PostProcessError {
    pub step: String,
    pub message: String,
}

impl PostProcessError {
    pub fn new(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self { step: step.into(), message: message.into() }
    }
}

/// A named output transformation.
pub trait PostProcessor: Send + Sync {
    fn process(&self, output: String, options: &StepOptions) -> Result<String, PostProcessError>;
}

impl<F> PostProcessor for F
where
    F: Fn(String, &StepOptions) -> Result<String, PostProcessError> + Send + Sync,
{
    fn process(&self, output: String, options: &StepOptions) -> Result<String, PostProcessError> {
        self(output, options)
    }
}

/// Configuration of one step.
#[derive(Clone)]
pub enum StepConfig {
    /// `false`: never run
    Disabled,
    /// `true` (empty options) or an options object
    Options(StepOptions),
    /// In-process step supplied by code, run instead of a registered one
    Custom(Arc<dyn PostProcessor>),
}

impl fmt::Debug for StepConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepConfig::Disabled => write!(f, "Disabled"),
            StepConfig::Options(opts) => f.debug_tuple("Options").field(opts).finish(),
            StepConfig::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for StepConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Bool(false) => Ok(StepConfig::Disabled),
            Value::Bool(true) | Value::Null => Ok(StepConfig::Options(Map::new())),
            Value::Object(map) => Ok(StepConfig::Options(map)),
            other => Err(D::Error::custom(format!(
                "post-process step must be false, true or an options object, got {}",
                other
            ))),
        }
    }
}

impl StepConfig {
    /// Whether `file` is listed in this step's `exclude` option.
    ///
    /// An entry matches the full path, the file name, or a trailing run of
    /// path components.
    fn excludes(&self, file: &Path) -> bool {
        let StepConfig::Options(opts) = self else {
            return false;
        };
        let Some(Value::Array(list)) = opts.get("exclude") else {
            return false;
        };
        list.iter().filter_map(Value::as_str).any(|entry| {
            let entry = Path::new(entry);
            file == entry || file.ends_with(entry)
        })
    }
}

/// Steps a compiler makes available by name.
#[derive(Clone, Default)]
pub struct StepRegistry {
    steps: IndexMap<String, Arc<dyn PostProcessor>>,
}

impl fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.steps.keys()).finish()
    }
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `step` under `name`, replacing any previous step of that name.
    pub fn register(&mut self, name: impl Into<String>, step: impl PostProcessor + 'static) {
        self.steps.insert(name.into(), Arc::new(step));
    }

    pub fn with(mut self, name: impl Into<String>, step: impl PostProcessor + 'static) -> Self {
        self.register(name, step);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn PostProcessor>> {
        self.steps.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }
}

/// Run the configured steps over `output`.
///
/// Disabled steps, steps excluding `file`, and names with neither a custom
/// implementation nor a registered step are skipped.
pub fn post_process(
    file: &Path,
    output: String,
    steps: &IndexMap<String, StepConfig>,
    available: &StepRegistry,
) -> Result<String, PostProcessError> {
    let no_options = StepOptions::new();
    let mut output = output;

    for (name, config) in steps {
        if matches!(config, StepConfig::Disabled) || config.excludes(file) {
            continue;
        }
        output = match config {
            StepConfig::Custom(step) => step.process(output, &no_options)?,
            StepConfig::Options(opts) => match available.get(name) {
                Some(step) => step.process(output, opts)?,
                None => {
                    tracing::debug!(step = %name, "no post-process step registered, skipping");
                    output
                }
            },
            StepConfig::Disabled => output,
        };
    }

    Ok(output)
}

/// Prepend `options.text` followed by a newline.
pub fn banner(output: String, options: &StepOptions) -> Result<String, PostProcessError> {
    match options.get("text").and_then(Value::as_str) {
        Some(text) if !text.is_empty() => Ok(format!("{}\n{}", text, output)),
        _ => Ok(output),
    }
}

/// Minify a stylesheet.
pub fn minify(output: String, _options: &StepOptions) -> Result<String, PostProcessError> {
    crate::compilers::css::print_css(&output, true)
        .map_err(|e| PostProcessError::new("minify", e.to_string()))
}

/// Steps every built-in compiler understands.
pub fn builtin_steps() -> StepRegistry {
    StepRegistry::new().with("banner", banner).with("minify", minify)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn steps(value: Value) -> IndexMap<String, StepConfig> {
        serde_json::from_value(value).unwrap()
    }

    fn upper(output: String, _: &StepOptions) -> Result<String, PostProcessError> {
        Ok(output.to_uppercase())
    }

    fn suffix(output: String, opts: &StepOptions) -> Result<String, PostProcessError> {
        let tail = opts.get("with").and_then(Value::as_str).unwrap_or("!");
        Ok(format!("{}{}", output, tail))
    }

    fn registry() -> StepRegistry {
        StepRegistry::new().with("upper", upper).with("suffix", suffix)
    }

    #[test]
    fn test_steps_run_in_declaration_order() {
        let cfg = steps(json!({"suffix": {"with": "?"}, "upper": true}));
        let out = post_process(Path::new("a.css"), "a".into(), &cfg, &registry()).unwrap();
        assert_eq!(out, "A?");

        let cfg = steps(json!({"suffix": {"with": "x"}, "upper": {}}));
        let out = post_process(Path::new("a.css"), "a".into(), &cfg, &registry()).unwrap();
        assert_eq!(out, "AX");

        let cfg = steps(json!({"upper": {}, "suffix": {"with": "x"}}));
        let out = post_process(Path::new("a.css"), "a".into(), &cfg, &registry()).unwrap();
        assert_eq!(out, "Ax");
    }

    #[test]
    fn test_disabled_step_is_skipped() {
        let cfg = steps(json!({"upper": false}));
        let out = post_process(Path::new("a.css"), "a".into(), &cfg, &registry()).unwrap();
        assert_eq!(out, "a");
    }

    #[test]
    fn test_excluded_file_is_skipped() {
        let cfg = steps(json!({"upper": {"exclude": ["foo.css"]}}));
        let reg = registry();

        let skipped = post_process(Path::new("/dist/foo.css"), "x".into(), &cfg, &reg).unwrap();
        let applied = post_process(Path::new("/dist/bar.css"), "x".into(), &cfg, &reg).unwrap();

        assert_eq!(skipped, "x");
        assert_eq!(applied, "X");
    }

    #[test]
    fn test_unknown_step_is_ignored() {
        let cfg = steps(json!({"autoprefixer": {}}));
        let out = post_process(Path::new("a.css"), "a".into(), &cfg, &registry()).unwrap();
        assert_eq!(out, "a");
    }

    #[test]
    fn test_custom_step_overrides_registry() {
        let mut cfg = steps(json!({"upper": true}));
        let custom: Arc<dyn PostProcessor> =
            Arc::new(|out: String, _: &StepOptions| -> Result<String, PostProcessError> {
                Ok(format!("<{}>", out))
            });
        cfg.insert("upper".to_string(), StepConfig::Custom(custom));

        let out = post_process(Path::new("a.css"), "a".into(), &cfg, &registry()).unwrap();
        assert_eq!(out, "<a>");
    }

    #[test]
    fn test_step_error_propagates() {
        let failing = StepRegistry::new().with(
            "boom",
            |_: String, _: &StepOptions| -> Result<String, PostProcessError> {
                Err(PostProcessError::new("boom", "bad input"))
            },
        );
        let cfg = steps(json!({"boom": true}));
        let err = post_process(Path::new("a.css"), "a".into(), &cfg, &failing).unwrap_err();
        assert_eq!(err.step, "boom");
    }

    #[test]
    fn test_invalid_step_value() {
        let result: Result<IndexMap<String, StepConfig>, _> =
            serde_json::from_value(json!({"upper": 3}));
        assert!(result.is_err());
    }

    #[test]
    fn test_banner() {
        let opts: StepOptions = serde_json::from_value(json!({"text": "/* v1 */"})).unwrap();
        assert_eq!(banner("a{}".into(), &opts).unwrap(), "/* v1 */\na{}");
        assert_eq!(banner("a{}".into(), &StepOptions::new()).unwrap(), "a{}");
    }

    #[test]
    fn test_builtin_minify() {
        let out = minify(".a {\n  color: red;\n}\n".into(), &StepOptions::new()).unwrap();
        assert_eq!(out, ".a{color:red}");
    }
}
