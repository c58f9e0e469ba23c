//! Input resolution for build targets.
//!
//! Expands an entry glob (relative to the input root) into the files it
//! matches, minus the target's excludes, and records the path prefix that
//! precedes the first `**` so outputs can mirror the source layout.

use crate::build::BuildContext;
use crate::config::TargetConfig;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error during source discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Invalid glob pattern
    #[error("Invalid glob pattern '{0}': {1}")]
    InvalidPattern(String, #[source] globset::Error),
}

/// Per-entry input context handed to a compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputContext {
    /// Entry pattern this context was resolved from
    pub entry: String,
    /// Matched files, absolute and sorted
    pub files: Vec<PathBuf>,
    /// Entry text before the first `**` (empty without one)
    pub base: String,
    /// `base` resolved against the input root
    pub base_dir: PathBuf,
    /// Absolute destination directory
    pub dest: PathBuf,
}

impl InputContext {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Whether the entry recurses, in which case outputs mirror the source tree.
    pub fn is_recursive(&self) -> bool {
        self.entry.contains("**")
    }
}

/// Globs compiled against a root directory.
///
/// Paths are matched relative to the root; anything outside it never matches.
#[derive(Debug, Clone)]
pub struct PatternSet {
    root: PathBuf,
    set: GlobSet,
}

impl PatternSet {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn matches(&self, path: &Path) -> bool {
        match path.strip_prefix(&self.root) {
            Ok(relative) => self.set.is_match(relative),
            Err(_) => false,
        }
    }
}

/// Portion of `entry` before its first `**`, or empty.
pub fn wildcard_base(entry: &str) -> &str {
    match entry.find("**") {
        Some(idx) => &entry[..idx],
        None => "",
    }
}

/// Give `**` glued to other characters (`**.css`, `a**`) its own path
/// segment, so the shorthand `**.css` means `**/*.css`.
pub fn normalize_globstar(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut rest = pattern;
    while let Some(idx) = rest.find("**") {
        let (before, after) = (&rest[..idx], &rest[idx + 2..]);
        out.push_str(before);
        if !(before.is_empty() || before.ends_with('/')) {
            out.push('/');
        }
        out.push_str("**");
        if !(after.is_empty() || after.starts_with('/')) {
            out.push_str("/*");
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

/// Directory part of `pattern` before the first segment with a metacharacter.
fn literal_prefix(pattern: &str) -> PathBuf {
    let segments: Vec<&str> = pattern.split('/').collect();
    let dirs = &segments[..segments.len().saturating_sub(1)];
    dirs.iter()
        .take_while(|segment| !segment.contains(['*', '?', '[', '{']))
        .filter(|segment| !segment.is_empty() && **segment != ".")
        .collect()
}

/// Compile globs relative to `root` (used for entries, excludes and watch patterns).
///
/// `*` never crosses a `/`; `**` spans directories and `{a,b}` expands.
pub fn compile_patterns<'a, I>(root: &Path, globs: I) -> Result<PatternSet, DiscoveryError>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut builder = GlobSetBuilder::new();
    for glob in globs {
        let normalized = normalize_globstar(glob.trim_start_matches("./"));
        let compiled = GlobBuilder::new(&normalized)
            .literal_separator(true)
            .build()
            .map_err(|e| DiscoveryError::InvalidPattern(glob.clone(), e))?;
        builder.add(compiled);
    }
    let set = builder.build().map_err(|e| DiscoveryError::InvalidPattern(String::new(), e))?;
    Ok(PatternSet { root: root.to_path_buf(), set })
}

/// Discover files under `root` matching `pattern` and none of `excludes`.
///
/// Only regular files are returned, sorted and deduplicated. The walk starts
/// at the pattern's literal directory prefix and ignores `.gitignore` rules.
pub fn discover_files(
    root: &Path,
    pattern: &str,
    excludes: &PatternSet,
) -> Result<Vec<PathBuf>, DiscoveryError> {
    let pattern = pattern.to_string();
    let matcher = compile_patterns(root, std::iter::once(&pattern))?;

    let start = root.join(literal_prefix(pattern.trim_start_matches("./")));
    if !start.exists() {
        return Ok(Vec::new());
    }

    let mut files = BTreeSet::new();
    for entry in WalkBuilder::new(&start).standard_filters(false).follow_links(true).build() {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if path.is_file() && matcher.matches(path) && !excludes.matches(path) {
                    files.insert(path.to_path_buf());
                }
            }
            Err(e) => {
                tracing::warn!("error reading path: {}", e);
            }
        }
    }

    Ok(files.into_iter().collect())
}

/// Destination directory for a target: output root plus the target's subdirectory.
pub fn target_dest(ctx: &BuildContext, target: &TargetConfig) -> PathBuf {
    let out = ctx.output_dir();
    if target.output.as_os_str().is_empty() {
        out
    } else {
        out.join(&target.output)
    }
}

/// Resolve one entry pattern of a target into its input context.
///
/// An empty file list is a valid result and means there is nothing to do.
pub fn resolve_input(
    entry: &str,
    ctx: &BuildContext,
    target: &TargetConfig,
) -> Result<InputContext, DiscoveryError> {
    let input = ctx.input_dir();
    let excludes = compile_patterns(&input, target.exclude.iter())?;
    let files = discover_files(&input, entry, &excludes)?;

    let base = wildcard_base(entry).to_string();
    let base_dir = if base.is_empty() { input.clone() } else { input.join(&base) };

    Ok(InputContext {
        entry: entry.to_string(),
        files,
        base,
        base_dir,
        dest: target_dest(ctx, target),
    })
}
