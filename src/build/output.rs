//! Output path derivation.

use crate::build::InputContext;
use crate::config::TargetConfig;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Output locations derived for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// File name with the output extension (e.g. `main.css`)
    pub outname: String,
    /// Mirrored subdirectory relative to the destination (empty when flattened)
    pub outbase: PathBuf,
    /// `dest` joined with `outbase`
    pub outdest: PathBuf,
    /// Full output file path
    pub outfile: PathBuf,
    /// Source map sibling (`outfile` + `.map`)
    pub outmap: PathBuf,
}

/// Normalise an extension to its dotted form (`css` and `.css` both give `.css`).
fn dotted(ext: &str) -> String {
    if ext.is_empty() || ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    }
}

/// Compute where `file` compiles to.
///
/// The extension is taken from `target.ext`, then `fallback_ext`, then the
/// source file. Unless the target is flattened, the file's directory relative
/// to the entry's wildcard base is recreated under the destination. Entries
/// without `**`, and files that do not live under the base, land directly in
/// the destination.
pub fn resolve_output(
    file: &Path,
    ctx: &InputContext,
    target: &TargetConfig,
    fallback_ext: Option<&str>,
) -> OutputPaths {
    let stem = file.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let source_ext = file.extension().map(|e| format!(".{}", e.to_string_lossy()));

    let ext = target
        .ext
        .as_deref()
        .map(dotted)
        .or_else(|| fallback_ext.map(dotted))
        .or(source_ext)
        .unwrap_or_default();
    let outname = format!("{}{}", stem, ext);

    let outbase = if target.flatten || !ctx.is_recursive() {
        PathBuf::new()
    } else {
        file.parent()
            .and_then(|dir| dir.strip_prefix(&ctx.base_dir).ok())
            .map(Path::to_path_buf)
            .unwrap_or_default()
    };

    let outdest = if outbase.as_os_str().is_empty() { ctx.dest.clone() } else { ctx.dest.join(&outbase) };
    let outfile = outdest.join(&outname);

    let mut map: OsString = outfile.clone().into_os_string();
    map.push(".map");
    let outmap = PathBuf::from(map);

    OutputPaths { outname, outbase, outdest, outfile, outmap }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::wildcard_base;
    use crate::config::Patterns;

    fn input(entry: &str) -> InputContext {
        let base = wildcard_base(entry);
        InputContext {
            entry: entry.to_string(),
            files: vec![],
            base: base.to_string(),
            base_dir: PathBuf::from("/project/src").join(base),
            dest: PathBuf::from("/project/dist/assets"),
        }
    }

    fn target() -> TargetConfig {
        TargetConfig::with_entries(Patterns::new(["assets/**/*.scss"]))
    }

    #[test]
    fn test_mirrors_subdirectory() {
        let file = Path::new("/project/src/assets/foo/bar/main.scss");
        let out = resolve_output(file, &input("assets/**/*.scss"), &target(), Some(".css"));
        assert_eq!(out.outname, "main.css");
        assert_eq!(out.outbase, PathBuf::from("foo/bar"));
        assert_eq!(out.outdest, PathBuf::from("/project/dist/assets/foo/bar"));
        assert_eq!(out.outfile, PathBuf::from("/project/dist/assets/foo/bar/main.css"));
        assert_eq!(out.outmap, PathBuf::from("/project/dist/assets/foo/bar/main.css.map"));
    }

    #[test]
    fn test_flatten_drops_subdirectory() {
        let mut target = target();
        target.flatten = true;
        let file = Path::new("/project/src/assets/foo/bar/main.scss");
        let out = resolve_output(file, &input("assets/**/*.scss"), &target, Some(".css"));
        assert_eq!(out.outbase, PathBuf::new());
        assert_eq!(out.outfile, PathBuf::from("/project/dist/assets/main.css"));
    }

    #[test]
    fn test_file_at_base_root() {
        let file = Path::new("/project/src/assets/main.scss");
        let out = resolve_output(file, &input("assets/**/*.scss"), &target(), None);
        assert_eq!(out.outfile, PathBuf::from("/project/dist/assets/main.scss"));
    }

    #[test]
    fn test_entry_without_globstar_lands_in_dest() {
        let file = Path::new("/project/src/assets/css/main.scss");
        let out = resolve_output(file, &input("assets/css/*.scss"), &target(), Some("css"));
        assert_eq!(out.outfile, PathBuf::from("/project/dist/assets/main.css"));
    }

    #[test]
    fn test_root_globstar_mirrors_from_input_root() {
        let ctx = input("**.html");
        let top = resolve_output(Path::new("/project/src/index.html"), &ctx, &target(), None);
        let nested = resolve_output(Path::new("/project/src/blog/index.html"), &ctx, &target(), None);

        assert_eq!(top.outfile, PathBuf::from("/project/dist/assets/index.html"));
        assert_eq!(nested.outfile, PathBuf::from("/project/dist/assets/blog/index.html"));
    }

    #[test]
    fn test_extension_precedence() {
        let file = Path::new("/project/src/assets/main.scss");

        let out = resolve_output(file, &input("assets/**/*.scss"), &target(), None);
        assert_eq!(out.outname, "main.scss");

        let out = resolve_output(file, &input("assets/**/*.scss"), &target(), Some(".css"));
        assert_eq!(out.outname, "main.css");

        let mut forced = target();
        forced.ext = Some("txt".to_string());
        let out = resolve_output(file, &input("assets/**/*.scss"), &forced, Some(".css"));
        assert_eq!(out.outname, "main.txt");
    }

    #[test]
    fn test_file_outside_base() {
        let file = Path::new("/elsewhere/main.scss");
        let out = resolve_output(file, &input("assets/**/*.scss"), &target(), None);
        assert_eq!(out.outfile, PathBuf::from("/project/dist/assets/main.scss"));
    }
}
