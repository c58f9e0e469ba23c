//! Watch mode for automatic rebuilds on file changes
//!
//! Each watched target owns the `observe` globs from its configuration (its
//! `entries` when none are set). A debounced change under the input root
//! recompiles exactly the targets whose globs match the changed path.

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEvent, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::build::progress::ProgressEvent;
use crate::build::{compile_patterns, BuildContext, BuildError, BuildPipeline, DiscoveryError, PatternSet};
use crate::config::TargetSlot;

/// Error during watch mode
#[derive(Debug, Error)]
pub enum WatchError {
    /// Failed to initialize file watcher
    #[error("failed to initialize file watcher: {0}")]
    WatcherInit(#[source] notify::Error),
    /// Failed to add watch path
    #[error("failed to watch path: {0}")]
    WatchPath(#[source] notify::Error),
    /// Channel receive error
    #[error("watch channel error: {0}")]
    Channel(String),
    /// Input directory not found
    #[error("input directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error(transparent)]
    Pattern(#[from] DiscoveryError),
    /// Fatal configuration error raised by a rebuild
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Globs that trigger a rebuild of one target.
#[derive(Debug, Clone)]
pub struct WatchTarget {
    pub name: String,
    pub patterns: PatternSet,
}

impl WatchTarget {
    pub fn matches(&self, path: &Path) -> bool {
        self.patterns.matches(path)
    }
}

/// Build the watch list for `targets` (the default targets when empty).
///
/// Targets that are disabled, missing, or invalid are not watched.
pub fn watch_plan(ctx: &BuildContext, targets: &[String]) -> Result<Vec<WatchTarget>, DiscoveryError> {
    let names = if targets.is_empty() { ctx.default_targets() } else { targets };
    let input = ctx.input_dir();

    let mut plan = Vec::new();
    for name in names {
        let TargetSlot::Ready(target) = ctx.target(name) else {
            tracing::debug!(target_name = %name, "not watching unconfigured target");
            continue;
        };
        let patterns = compile_patterns(&input, target.observe_patterns().iter())?;
        plan.push(WatchTarget { name: name.clone(), patterns });
    }
    Ok(plan)
}

/// Targets affected by any of `paths`, in plan order and without duplicates.
pub fn affected_targets(plan: &[WatchTarget], paths: &[PathBuf]) -> Vec<String> {
    plan.iter()
        .filter(|target| paths.iter().any(|p| target.matches(p)))
        .map(|target| target.name.clone())
        .collect()
}

/// Format duration for display
fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

fn changed_paths(events: Vec<DebouncedEvent>) -> Vec<PathBuf> {
    events
        .into_iter()
        .filter(|e| matches!(e.kind, DebouncedEventKind::Any | DebouncedEventKind::AnyContinuous))
        .map(|e| e.path)
        .collect()
}

/// Recompile the targets affected by `paths`, one at a time.
///
/// Returns the names of the rebuilt targets.
pub fn rebuild(
    pipeline: &mut BuildPipeline,
    plan: &[WatchTarget],
    paths: &[PathBuf],
) -> Result<Vec<String>, BuildError> {
    let affected = affected_targets(plan, paths);
    for name in &affected {
        let start = Instant::now();
        let result = pipeline.compile(std::slice::from_ref(name))?;
        if !result.has_failures() {
            pipeline.reporter().report(ProgressEvent::TaskCompleted {
                message: format!("rebuilt {} in {}", name, format_duration(start.elapsed())),
            });
        }
    }
    Ok(affected)
}

/// Watch for file changes and rebuild automatically.
///
/// Blocks until the watcher channel closes. Existing files do not trigger a
/// build when watching starts; every rebuild finishes before further events
/// are handled.
pub fn watch_and_rebuild(pipeline: &mut BuildPipeline, targets: &[String]) -> Result<(), WatchError> {
    let input = pipeline.context().input_dir();
    if !input.exists() {
        return Err(WatchError::SourceNotFound(input));
    }

    let plan = watch_plan(pipeline.context(), targets)?;
    let debounce = Duration::from_millis(u64::from(pipeline.context().settings().watch.debounce_ms));

    let (tx, rx) = channel();
    let mut debouncer = new_debouncer(debounce, tx).map_err(WatchError::WatcherInit)?;
    debouncer.watcher().watch(&input, RecursiveMode::Recursive).map_err(WatchError::WatchPath)?;

    let names: Vec<&str> = plan.iter().map(|t| t.name.as_str()).collect();
    pipeline.reporter().report(ProgressEvent::TaskStarted {
        task: "watch".to_string(),
        detail: names.join(", "),
    });

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let paths = changed_paths(events);
                tracing::debug!(?paths, "files changed");
                rebuild(pipeline, &plan, &paths)?;
            }
            Ok(Err(error)) => {
                tracing::warn!("watch error: {:?}", error);
            }
            Err(e) => return Err(WatchError::Channel(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::progress::NullProgress;
    use crate::env::Env;
    use serde_json::json;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context(root: &Path) -> BuildContext {
        BuildContext::from_overrides(
            json!({
                "targets": ["css", "svg", "txt"],
                "svg": false,
                "txt": {"entries": "*.txt", "compiler": "raw"}
            }),
            root.to_path_buf(),
            Env::development(),
        )
        .unwrap()
    }

    #[test]
    fn test_watch_plan_skips_unconfigured_targets() {
        let ctx = context(Path::new("/project"));
        let plan = watch_plan(&ctx, &[]).unwrap();
        let names: Vec<_> = plan.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["css", "txt"]);
    }

    #[test]
    fn test_affected_targets_uses_observe_then_entries() {
        let ctx = context(Path::new("/project"));
        let plan = watch_plan(&ctx, &[]).unwrap();

        let css = affected_targets(&plan, &[PathBuf::from("/project/src/assets/css/partials/a.css")]);
        assert_eq!(css, vec!["css"]);

        let txt = affected_targets(&plan, &[PathBuf::from("/project/src/notes.txt")]);
        assert_eq!(txt, vec!["txt"]);

        let nested = affected_targets(&plan, &[PathBuf::from("/project/src/deep/notes.txt")]);
        assert!(nested.is_empty());
    }

    #[test]
    fn test_rebuild_compiles_only_affected_target() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/a.txt"), "hello").unwrap();

        let ctx = context(temp.path());
        let plan = watch_plan(&ctx, &[]).unwrap();
        let mut pipeline = BuildPipeline::new(ctx).with_reporter(Arc::new(NullProgress::new()));

        let rebuilt = rebuild(&mut pipeline, &plan, &[temp.path().join("src/a.txt")]).unwrap();

        assert_eq!(rebuilt, vec!["txt"]);
        assert!(temp.path().join("dist/a.txt").exists());
        assert!(!temp.path().join("dist/assets").exists());
    }

    #[test]
    fn test_watch_error_source_not_found() {
        let mut pipeline = BuildPipeline::new(context(Path::new("/nonexistent/forge")))
            .with_reporter(Arc::new(NullProgress::new()));
        let err = watch_and_rebuild(&mut pipeline, &[]).unwrap_err();
        assert!(matches!(err, WatchError::SourceNotFound(_)));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }
}
