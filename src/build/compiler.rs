//! Compiler plugin contract and registry.

use crate::build::{BuildContext, CompiledArtifact, DiscoveryError, InputContext, PostProcessError, Writer};
use crate::config::TargetConfig;
use indexmap::IndexMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a whole entry's compilation.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    PostProcess(#[from] PostProcessError),
    #[error("{}: {message}", path.display())]
    Syntax { path: PathBuf, message: String },
    #[error("{0}")]
    Other(String),
}

impl CompileError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompileError::Read { path: path.into(), source }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompileError::Write { path: path.into(), source }
    }
}

/// A compiler backend.
///
/// Receives one resolved entry and returns one artifact per file written.
/// Recoverable per-file problems should be handled internally; returning an
/// error marks the whole entry as failed.
pub trait Compiler: Send + Sync {
    fn compile(
        &self,
        input: &InputContext,
        ctx: &BuildContext,
        target: &TargetConfig,
        writer: &mut Writer,
    ) -> Result<Vec<CompiledArtifact>, CompileError>;
}

impl<F> Compiler for F
where
    F: Fn(&InputContext, &BuildContext, &TargetConfig, &mut Writer) -> Result<Vec<CompiledArtifact>, CompileError>
        + Send
        + Sync,
{
    fn compile(
        &self,
        input: &InputContext,
        ctx: &BuildContext,
        target: &TargetConfig,
        writer: &mut Writer,
    ) -> Result<Vec<CompiledArtifact>, CompileError> {
        self(input, ctx, target, writer)
    }
}

/// Compilers by name. Later registrations replace earlier ones.
#[derive(Clone, Default)]
pub struct CompilerRegistry {
    compilers: IndexMap<String, Arc<dyn Compiler>>,
}

impl fmt::Debug for CompilerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.compilers.keys()).finish()
    }
}

impl CompilerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in compilers.
    pub fn builtin() -> Self {
        crate::compilers::register_builtins(Self::new())
    }

    pub fn register(&mut self, name: impl Into<String>, compiler: impl Compiler + 'static) {
        self.compilers.insert(name.into(), Arc::new(compiler));
    }

    pub fn with(mut self, name: impl Into<String>, compiler: impl Compiler + 'static) -> Self {
        self.register(name, compiler);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Compiler>> {
        self.compilers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.compilers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.compilers.keys().map(String::as_str)
    }
}
