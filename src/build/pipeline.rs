//! Build pipeline orchestration.
//!
//! The pipeline runs the requested targets strictly in order. For each target
//! it classifies the configuration, binds the compiler, runs the before hook,
//! compiles every entry, and runs the after hook. Hook and entry failures are
//! recorded on the target and never stop the run; only an unknown compiler
//! aborts it.

use crate::build::progress::{ConsoleProgress, ProgressEvent, ProgressReporter};
use crate::build::{
    exec_hook, resolve_input, BuildContext, BuildResult, CompileError, CompiledArtifact, Compiler,
    CompilerRegistry, Hook, HookContext, HookStage, PostProcessor, SkipReason, StepConfig,
    TargetResult, Writer,
};
use crate::config::{TargetConfig, TargetSlot};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Error that aborts a whole build run.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A target names a compiler that is not registered
    #[error("target '{target}' uses unknown compiler '{compiler}'")]
    UnknownCompiler { target: String, compiler: String },
}

/// Render an error, with its source chain when `detailed`.
pub(crate) fn describe(err: &dyn StdError, detailed: bool) -> String {
    let mut message = err.to_string();
    if detailed {
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
    }
    message
}

/// Build pipeline for executing builds.
pub struct BuildPipeline {
    /// Build context
    context: BuildContext,
    compilers: CompilerRegistry,
    /// Writer and its cache, kept for the pipeline's lifetime
    writer: Writer,
    /// Programmatic hooks, taking precedence over configured shell hooks
    hooks: HashMap<(String, HookStage), Hook>,
    /// Programmatic post-process steps per target
    steps: HashMap<String, IndexMap<String, Arc<dyn PostProcessor>>>,
    reporter: Arc<dyn ProgressReporter>,
}

impl std::fmt::Debug for BuildPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildPipeline")
            .field("context", &self.context)
            .field("compilers", &self.compilers)
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl BuildPipeline {
    /// Create a pipeline with the built-in compilers and console output.
    pub fn new(context: BuildContext) -> Self {
        let writer = Writer::new(context.is_production());
        Self {
            context,
            compilers: CompilerRegistry::builtin(),
            writer,
            hooks: HashMap::new(),
            steps: HashMap::new(),
            reporter: Arc::new(ConsoleProgress::new()),
        }
    }

    /// Register a compiler, replacing any compiler of the same name.
    pub fn with_compiler(mut self, name: impl Into<String>, compiler: impl Compiler + 'static) -> Self {
        self.compilers.register(name, compiler);
        self
    }

    /// Replace the whole compiler registry.
    pub fn with_compilers(mut self, compilers: CompilerRegistry) -> Self {
        self.compilers = compilers;
        self
    }

    /// Attach a hook to `target`, overriding the configured command for that stage.
    pub fn with_hook(mut self, target: impl Into<String>, stage: HookStage, hook: Hook) -> Self {
        self.hooks.insert((target.into(), stage), hook);
        self
    }

    /// Attach an in-process post-process step to `target`.
    ///
    /// A step whose name is already configured keeps its position; a new name
    /// runs after the configured steps.
    pub fn with_step(
        mut self,
        target: impl Into<String>,
        name: impl Into<String>,
        step: impl PostProcessor + 'static,
    ) -> Self {
        self.steps.entry(target.into()).or_default().insert(name.into(), Arc::new(step));
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Get the build context.
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    pub fn compilers(&self) -> &CompilerRegistry {
        &self.compilers
    }

    pub fn writer(&self) -> &Writer {
        &self.writer
    }

    pub fn reporter(&self) -> Arc<dyn ProgressReporter> {
        Arc::clone(&self.reporter)
    }

    /// Compile `targets`, or the configured default targets when empty.
    ///
    /// Returns `Err` only when a target is bound to an unknown compiler.
    pub fn compile(&mut self, targets: &[String]) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let names: Vec<String> = if targets.is_empty() {
            self.context.default_targets().to_vec()
        } else {
            targets.to_vec()
        };

        if self.context.is_debug() {
            tracing::debug!(config = %self.context.config(), "resolved configuration");
        }
        self.reporter.report(ProgressEvent::TaskStarted {
            task: "compile".to_string(),
            detail: names.join(", "),
        });

        let mut result = BuildResult::new();
        for name in &names {
            let target_result = self.compile_target(name)?;
            result.add_result(target_result);
        }
        result.total_duration = start.elapsed();

        if result.artifact_count() > 0 {
            self.reporter.report(ProgressEvent::Summary {
                table: result.summary_table(self.context.project_root()),
            });
        }
        tracing::debug!(
            built = result.built_count(),
            skipped = result.skipped_count(),
            failed = result.failed_count(),
            elapsed = ?result.total_duration,
            "compile finished"
        );

        Ok(result)
    }

    /// Compile one target.
    fn compile_target(&mut self, name: &str) -> Result<TargetResult, BuildError> {
        let mut target = match self.context.target(name) {
            TargetSlot::Ready(target) => *target,
            TargetSlot::Disabled => return Ok(self.skip(name, SkipReason::Disabled)),
            TargetSlot::Missing => return Ok(self.skip(name, SkipReason::MissingConfig)),
            TargetSlot::Invalid(message) => {
                tracing::warn!(target_name = %name, "invalid target configuration: {}", message);
                return Ok(self.skip(name, SkipReason::InvalidConfig(message)));
            }
        };
        self.apply_steps(name, &mut target);

        let compiler_name = target.compiler_name(name).to_string();
        let compiler = self.compilers.get(&compiler_name).ok_or_else(|| BuildError::UnknownCompiler {
            target: name.to_string(),
            compiler: compiler_name.clone(),
        })?;
        tracing::debug!(target_name = %name, compiler = %compiler_name, "compiling target");

        let start = Instant::now();
        let mut artifacts: Vec<CompiledArtifact> = Vec::new();
        let mut errors: Vec<String> = Vec::new();

        if let Err(message) = self.run_hook(name, HookStage::Before, &target) {
            errors.push(message);
        }

        for entry in target.entries.iter() {
            match self.compile_entry(entry, compiler.as_ref(), &target) {
                Ok(mut produced) => artifacts.append(&mut produced),
                Err(e) => {
                    let message = describe(&e, self.context.is_debug());
                    tracing::error!(target_name = %name, entry = %entry, "compilation failed: {}", describe(&e, true));
                    self.reporter.report(ProgressEvent::TargetFailed {
                        target: name.to_string(),
                        message: message.clone(),
                    });
                    errors.push(message);
                }
            }
        }

        if let Err(message) = self.run_hook(name, HookStage::After, &target) {
            errors.push(message);
        }

        if artifacts.is_empty() {
            self.reporter.report(ProgressEvent::TargetSkipped {
                target: name.to_string(),
                reason: SkipReason::NoEntries,
            });
        }

        Ok(TargetResult::finished(name, artifacts, errors, start.elapsed()))
    }

    fn skip(&self, name: &str, reason: SkipReason) -> TargetResult {
        self.reporter.report(ProgressEvent::TargetSkipped {
            target: name.to_string(),
            reason: reason.clone(),
        });
        TargetResult::skipped(name, reason)
    }

    /// Merge programmatic steps into the target's post-process table.
    fn apply_steps(&self, name: &str, target: &mut TargetConfig) {
        if let Some(steps) = self.steps.get(name) {
            for (step, processor) in steps {
                target.postprocess.insert(step.clone(), StepConfig::Custom(Arc::clone(processor)));
            }
        }
    }

    /// Resolve and compile a single entry; an entry matching nothing yields no artifacts.
    fn compile_entry(
        &mut self,
        entry: &str,
        compiler: &dyn Compiler,
        target: &TargetConfig,
    ) -> Result<Vec<CompiledArtifact>, CompileError> {
        let input = resolve_input(entry, &self.context, target)?;
        if input.is_empty() {
            tracing::debug!(entry = %entry, "entry matched no files");
            return Ok(Vec::new());
        }
        if self.context.is_debug() {
            tracing::debug!(?input, "input context");
        }
        compiler.compile(&input, &self.context, target, &mut self.writer)
    }

    /// Run the hook for `stage`, if any. Failures are reported and returned as text.
    fn run_hook(&self, name: &str, stage: HookStage, target: &TargetConfig) -> Result<(), String> {
        let configured = match stage {
            HookStage::Before => target.hooks.before.as_deref(),
            HookStage::After => target.hooks.after.as_deref(),
        };
        let hook = match self.hooks.get(&(name.to_string(), stage)) {
            Some(hook) => hook.clone(),
            None => match configured {
                Some(command) => Hook::shell(command),
                None => return Ok(()),
            },
        };

        let ctx = HookContext { target: name, stage, project_root: self.context.project_root() };
        exec_hook(&hook, &ctx, self.context.is_debug()).map_err(|e| {
            let message = describe(&e, self.context.is_debug());
            tracing::error!(target_name = %name, %stage, "hook failed: {}", describe(&e, true));
            self.reporter.report(ProgressEvent::HookFailed {
                target: name.to_string(),
                stage,
                message: message.clone(),
            });
            format!("{} hook: {}", stage, message)
        })
    }
}
