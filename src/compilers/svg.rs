//! SVG sprite compiler.
//!
//! All icons matched by one entry are combined into a single sprite of
//! `<symbol>` elements, each addressable as `sprite.svg#<file stem>`.

use crate::build::{
    builtin_steps, post_process, BuildContext, CompileError, CompiledArtifact, Compiler,
    InputContext, StepRegistry, Writer,
};
use crate::config::TargetConfig;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Sprite file name used when the target sets no `sprite` option.
pub const DEFAULT_SPRITE: &str = "sprite.svg";

const SVG_ROOT: &str = r"(?s)<svg\b([^>]*)>(.*)</svg>";
const VIEW_BOX: &str = r#"\bviewBox\s*=\s*"([^"]*)""#;

static SVG_ROOT_RE: OnceLock<Regex> = OnceLock::new();
static VIEW_BOX_RE: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct SvgSpriteCompiler {
    steps: StepRegistry,
}

impl Default for SvgSpriteCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgSpriteCompiler {
    pub fn new() -> Self {
        Self { steps: builtin_steps() }
    }
}

/// Compile `pattern` once per process.
fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> Result<&'static Regex, CompileError> {
    if let Some(re) = cell.get() {
        return Ok(re);
    }
    let re = Regex::new(pattern).map_err(|e| CompileError::Other(e.to_string()))?;
    Ok(cell.get_or_init(|| re))
}

/// Wrap one icon's markup in a `<symbol>` named after its file stem.
fn symbol(file: &Path, source: &str, root: &Regex, view_box: &Regex) -> Result<String, CompileError> {
    let id = file.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let caps = root.captures(source).ok_or_else(|| CompileError::Syntax {
        path: file.to_path_buf(),
        message: "no <svg> root element".to_string(),
    })?;

    let attrs = caps.get(1).map_or("", |m| m.as_str());
    let body = caps.get(2).map_or("", |m| m.as_str()).trim();

    Ok(match view_box.captures(attrs).and_then(|c| c.get(1)) {
        Some(vb) => format!(r#"<symbol id="{}" viewBox="{}">{}</symbol>"#, id, vb.as_str(), body),
        None => format!(r#"<symbol id="{}">{}</symbol>"#, id, body),
    })
}

impl Compiler for SvgSpriteCompiler {
    fn compile(
        &self,
        input: &InputContext,
        _ctx: &BuildContext,
        target: &TargetConfig,
        writer: &mut Writer,
    ) -> Result<Vec<CompiledArtifact>, CompileError> {
        let root = regex(&SVG_ROOT_RE, SVG_ROOT)?;
        let view_box = regex(&VIEW_BOX_RE, VIEW_BOX)?;

        let mut symbols = Vec::with_capacity(input.files.len());
        for file in &input.files {
            let source = fs::read_to_string(file).map_err(|e| CompileError::read(file, e))?;
            symbols.push(symbol(file, &source, root, view_box)?);
        }

        let sprite = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" style="display:none">{}</svg>"#,
            symbols.join("")
        );

        let outfile = input.dest.join(target.option_str("sprite").unwrap_or(DEFAULT_SPRITE));
        let sprite = post_process(&outfile, sprite, &target.postprocess, &self.steps)?;
        let artifact = writer.write(&outfile, sprite).map_err(|e| CompileError::write(&outfile, e))?;

        Ok(vec![artifact])
    }
}
