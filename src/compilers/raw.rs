//! Pass-through compiler.

use crate::build::{
    builtin_steps, post_process, resolve_output, BuildContext, CompileError, CompiledArtifact,
    Compiler, Content, InputContext, StepRegistry, Writer,
};
use crate::config::TargetConfig;
use std::fs;

/// Writes every matched file to its output path unchanged, except for
/// post-processing of textual files. Non-UTF-8 files are copied as binary.
#[derive(Debug, Clone)]
pub struct RawCompiler {
    steps: StepRegistry,
}

impl Default for RawCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl RawCompiler {
    pub fn new() -> Self {
        Self { steps: builtin_steps() }
    }
}

impl Compiler for RawCompiler {
    fn compile(
        &self,
        input: &InputContext,
        _ctx: &BuildContext,
        target: &TargetConfig,
        writer: &mut Writer,
    ) -> Result<Vec<CompiledArtifact>, CompileError> {
        let mut artifacts = Vec::with_capacity(input.files.len());

        for file in &input.files {
            let bytes = fs::read(file).map_err(|e| CompileError::read(file, e))?;
            let paths = resolve_output(file, input, target, None);

            let content = match String::from_utf8(bytes) {
                Ok(text) => Content::Text(post_process(file, text, &target.postprocess, &self.steps)?),
                Err(e) => Content::Binary(e.into_bytes()),
            };

            let artifact =
                writer.write(&paths.outfile, content).map_err(|e| CompileError::write(&paths.outfile, e))?;
            artifacts.push(artifact);
        }

        Ok(artifacts)
    }
}
