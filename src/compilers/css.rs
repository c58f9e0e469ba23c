//! Stylesheet compiler backed by lightningcss.

use crate::build::{
    builtin_steps, post_process, resolve_output, BuildContext, CompileError, CompiledArtifact,
    Compiler, InputContext, StepRegistry, Writer,
};
use crate::config::TargetConfig;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use parcel_sourcemap::SourceMap;
use std::fs;
use thiserror::Error;

/// Stylesheet parse or print failure.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CssError(String);

/// Printed stylesheet and, when requested, its source map as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintedCss {
    pub code: String,
    pub map: Option<String>,
}

/// Parse `css` and print it back, minified or pretty.
pub fn print_css(css: &str, minify: bool) -> Result<String, CssError> {
    print_css_named(css, "input.css", minify, false).map(|printed| printed.code)
}

/// Parse and print `css`, recording `filename` as the map source when `source_map` is set.
pub fn print_css_named(
    css: &str,
    filename: &str,
    minify: bool,
    source_map: bool,
) -> Result<PrintedCss, CssError> {
    let options = ParserOptions { filename: filename.to_string(), ..ParserOptions::default() };
    let mut sheet = StyleSheet::parse(css, options).map_err(|e| CssError(e.to_string()))?;

    if minify {
        sheet.minify(MinifyOptions::default()).map_err(|e| CssError(e.to_string()))?;
    }

    let mut map = if source_map {
        let mut map = SourceMap::new("/");
        let index = map.add_source(filename);
        map.set_source_content(index as usize, css).map_err(|e| CssError(format!("{:?}", e)))?;
        Some(map)
    } else {
        None
    };

    let printed = sheet
        .to_css(PrinterOptions { minify, source_map: map.as_mut(), ..PrinterOptions::default() })
        .map_err(|e| CssError(e.to_string()))?;

    let map = match map.as_mut() {
        Some(map) => Some(map.to_json(None).map_err(|e| CssError(format!("{:?}", e)))?),
        None => None,
    };
    Ok(PrintedCss { code: printed.code, map })
}

/// Compiles each matched stylesheet to `<stem>.css` under its mirrored path.
///
/// Development builds also write a `.css.map` source map next to each output.
#[derive(Debug, Clone)]
pub struct CssCompiler {
    steps: StepRegistry,
}

impl Default for CssCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl CssCompiler {
    pub fn new() -> Self {
        Self { steps: builtin_steps() }
    }
}

impl Compiler for CssCompiler {
    fn compile(
        &self,
        input: &InputContext,
        ctx: &BuildContext,
        target: &TargetConfig,
        writer: &mut Writer,
    ) -> Result<Vec<CompiledArtifact>, CompileError> {
        let mut artifacts = Vec::with_capacity(input.files.len());

        for file in &input.files {
            let source = fs::read_to_string(file).map_err(|e| CompileError::read(file, e))?;
            let name = file.display().to_string();
            let production = ctx.is_production();
            let printed = print_css_named(&source, &name, production, !production)
                .map_err(|e| CompileError::Syntax { path: file.clone(), message: e.to_string() })?;

            let paths = resolve_output(file, input, target, Some("css"));
            let css = post_process(file, printed.code, &target.postprocess, &self.steps)?;

            artifacts.push(
                writer.write(&paths.outfile, css).map_err(|e| CompileError::write(&paths.outfile, e))?,
            );
            if let Some(map) = printed.map {
                artifacts.push(
                    writer.write(&paths.outmap, map).map_err(|e| CompileError::write(&paths.outmap, e))?,
                );
            }
        }

        Ok(artifacts)
    }
}
