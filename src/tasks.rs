//! High-level tasks built on the pipeline: `nuke`, `copy` and `build`.

use crate::build::progress::ProgressEvent;
use crate::build::{compile_patterns, discover_files, BuildError, BuildPipeline, BuildResult, DiscoveryError};
use crate::config::ConfigError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error raised by a task.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Build(#[from] BuildError),
}

impl TaskError {
    fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        TaskError::Io { action, path: path.into(), source }
    }
}

/// Outcome of the `build` task.
#[derive(Debug)]
pub struct BuildOutcome {
    pub compile: BuildResult,
    /// Number of static files copied
    pub copied: usize,
}

impl BuildOutcome {
    pub fn has_failures(&self) -> bool {
        self.compile.has_failures()
    }
}

/// Remove the output root. A missing directory is not an error.
pub fn nuke(pipeline: &BuildPipeline) -> Result<(), TaskError> {
    let output = pipeline.context().output_dir();
    pipeline.reporter().report(ProgressEvent::TaskStarted {
        task: "nuke".to_string(),
        detail: output.display().to_string(),
    });

    match fs::remove_dir_all(&output) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("{} does not exist, nothing to remove", output.display());
        }
        Err(e) => return Err(TaskError::io("failed to remove", output, e)),
    }

    pipeline.reporter().report(ProgressEvent::TaskCompleted {
        message: format!("removed {}", output.display()),
    });
    Ok(())
}

fn copy_file(from: &Path, to: &Path) -> Result<(), TaskError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| TaskError::io("failed to create", parent, e))?;
    }
    fs::copy(from, to).map_err(|e| TaskError::io("failed to copy", from, e))?;
    Ok(())
}

/// Copy `copy.entries` minus `copy.exclude` into the output root, keeping
/// paths relative to the input root. Returns the number of files copied.
pub fn copy(pipeline: &BuildPipeline) -> Result<usize, TaskError> {
    let ctx = pipeline.context();
    let Some(config) = ctx.copy_config()? else {
        tracing::debug!("copy is disabled");
        return Ok(0);
    };

    let input = ctx.input_dir();
    let dest = ctx.output_dir().join(&config.output);
    pipeline.reporter().report(ProgressEvent::TaskStarted {
        task: "copy".to_string(),
        detail: config.entries.as_slice().join(", "),
    });

    let excludes = compile_patterns(&input, config.exclude.iter())?;
    let mut copied = 0;
    for entry in config.entries.iter() {
        for file in discover_files(&input, entry, &excludes)? {
            let Ok(relative) = file.strip_prefix(&input) else {
                continue;
            };
            copy_file(&file, &dest.join(relative))?;
            copied += 1;
        }
    }

    pipeline.reporter().report(ProgressEvent::TaskCompleted {
        message: format!("copied {} file{}", copied, if copied == 1 { "" } else { "s" }),
    });
    Ok(copied)
}

/// Nuke, compile the default targets, then copy static assets.
pub fn build(pipeline: &mut BuildPipeline) -> Result<BuildOutcome, TaskError> {
    nuke(pipeline)?;
    let compile = pipeline.compile(&[])?;
    let copied = copy(pipeline)?;
    Ok(BuildOutcome { compile, copied })
}
