//! Built-in compiler backends.
//!
//! | Name  | Input            | Output                                   |
//! |-------|------------------|------------------------------------------|
//! | `raw` | any file         | the file, post-processed, at its mirrored path |
//! | `css` | stylesheets      | normalised CSS, minified in production   |
//! | `svg` | icon files       | one `<symbol>` sprite per entry          |
//!
//! User-registered compilers replace these by name.

pub mod css;
pub mod raw;
pub mod svg;

use crate::build::CompilerRegistry;

pub use css::CssCompiler;
pub use raw::RawCompiler;
pub use svg::SvgSpriteCompiler;

/// Add the built-in compilers to `registry`.
pub fn register_builtins(registry: CompilerRegistry) -> CompilerRegistry {
    registry
        .with("raw", RawCompiler::new())
        .with("css", CssCompiler::new())
        .with("svg", SvgSpriteCompiler::new())
}
