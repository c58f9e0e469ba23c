//! Build result types.
//!
//! Contains types for representing the outcome of build operations.

use crate::build::CompiledArtifact;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};

const KB: u64 = 1024;
const MB: u64 = KB * 1024;

/// Why a target produced nothing without failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Configured as `false`
    Disabled,
    /// No configuration or no `entries`
    MissingConfig,
    /// Configuration could not be read
    InvalidConfig(String),
    /// Entries matched no files, or the compiler produced nothing
    NoEntries,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Disabled => write!(f, "falsy config"),
            SkipReason::MissingConfig => write!(f, "missing config"),
            SkipReason::InvalidConfig(e) => write!(f, "invalid config: {}", e),
            SkipReason::NoEntries => write!(f, "no entries"),
        }
    }
}

/// Status of a single build target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    /// At least one artifact, no errors
    Built,
    Skipped(SkipReason),
    /// A hook or an entry failed; artifacts from other entries are kept
    Failed,
}

impl BuildStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, BuildStatus::Failed)
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStatus::Built => write!(f, "built"),
            BuildStatus::Skipped(reason) => write!(f, "skipped ({})", reason),
            BuildStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Result of building a single target.
#[derive(Debug, Clone)]
pub struct TargetResult {
    pub target: String,
    pub status: BuildStatus,
    /// Artifacts in production order
    pub artifacts: Vec<CompiledArtifact>,
    /// Hook and entry failures
    pub errors: Vec<String>,
    pub duration: Duration,
}

impl TargetResult {
    /// Create a skipped result.
    pub fn skipped(target: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            target: target.into(),
            status: BuildStatus::Skipped(reason),
            artifacts: vec![],
            errors: vec![],
            duration: Duration::ZERO,
        }
    }

    /// Derive the status from what the target produced.
    pub fn finished(
        target: impl Into<String>,
        artifacts: Vec<CompiledArtifact>,
        errors: Vec<String>,
        duration: Duration,
    ) -> Self {
        let status = if !errors.is_empty() {
            BuildStatus::Failed
        } else if artifacts.is_empty() {
            BuildStatus::Skipped(SkipReason::NoEntries)
        } else {
            BuildStatus::Built
        };
        Self { target: target.into(), status, artifacts, errors, duration }
    }

    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }
}

/// Result of a complete build run.
#[derive(Debug, Default)]
pub struct BuildResult {
    /// Results for each target, in run order
    pub targets: Vec<TargetResult>,
    /// Total build duration
    pub total_duration: Duration,
}

impl BuildResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, result: TargetResult) {
        self.targets.push(result);
    }

    pub fn get(&self, target: &str) -> Option<&TargetResult> {
        self.targets.iter().find(|r| r.target == target)
    }

    pub fn built_count(&self) -> usize {
        self.targets.iter().filter(|r| matches!(r.status, BuildStatus::Built)).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.targets.iter().filter(|r| matches!(r.status, BuildStatus::Skipped(_))).count()
    }

    pub fn failed_count(&self) -> usize {
        self.targets.iter().filter(|r| r.is_failure()).count()
    }

    /// Whether any hook or compilation failed during the run.
    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }

    /// Every artifact produced, in run order.
    pub fn artifacts(&self) -> impl Iterator<Item = &CompiledArtifact> {
        self.targets.iter().flat_map(|r| r.artifacts.iter())
    }

    pub fn artifact_count(&self) -> usize {
        self.targets.iter().map(|r| r.artifacts.len()).sum()
    }

    /// Every recorded error message, prefixed with its target.
    pub fn errors(&self) -> Vec<String> {
        self.targets
            .iter()
            .flat_map(|r| r.errors.iter().map(move |e| format!("{}: {}", r.target, e)))
            .collect()
    }

    /// Tabular listing of every artifact: status, path relative to `root`, size, cache flag.
    pub fn summary_table(&self, root: &Path) -> String {
        summary_table(self.artifacts(), root)
    }
}

/// Format a byte count as `x.xx kb`, or `x.xx mb` above one mebibyte.
pub fn format_size(bytes: u64) -> String {
    if bytes > MB {
        format!("{:.2} mb", bytes as f64 / MB as f64)
    } else {
        format!("{:.2} kb", bytes as f64 / KB as f64)
    }
}

/// Render artifacts as an aligned table without headers.
pub fn summary_table<'a, I>(artifacts: I, root: &Path) -> String
where
    I: IntoIterator<Item = &'a CompiledArtifact>,
{
    let mut builder = Builder::default();
    for artifact in artifacts {
        let shown = artifact.filename.strip_prefix(root).unwrap_or(&artifact.filename);
        builder.push_record([
            "✓".to_string(),
            shown.display().to_string(),
            format_size(artifact.size),
            if artifact.cached { "(cached)".to_string() } else { String::new() },
        ]);
    }

    let mut table = builder.build();
    table.with(Style::blank()).modify(Columns::one(2), Alignment::right());
    table.to_string()
}
