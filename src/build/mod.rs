//! Build pipeline module for forge
//!
//! Turns the configured targets into compiled artifacts under the output root.
//!
//! # Overview
//!
//! The build pipeline consists of:
//! - **Discovery**: expand each entry glob under the input root into a file list
//! - **Compilation**: hand each entry's input context to the target's compiler
//! - **Output**: derive output paths, run post-process steps, write through the cache
//!
//! # Example
//!
//! ```ignore
//! use forge_assets::build::{BuildContext, BuildPipeline};
//! use forge_assets::env::Env;
//!
//! let context = BuildContext::load(project_root, Env::resolve(None, false))?;
//! let mut pipeline = BuildPipeline::new(context);
//!
//! let result = pipeline.compile(&[])?;
//! println!("Wrote {} files", result.artifact_count());
//! ```

pub mod compiler;
pub mod context;
pub mod discovery;
pub mod hooks;
pub mod output;
pub mod pipeline;
pub mod postprocess;
pub mod progress;
pub mod result;
pub mod writer;

pub use compiler::*;
pub use context::*;
pub use discovery::*;
pub use hooks::*;
pub use output::*;
pub use pipeline::*;
pub use postprocess::*;
pub use result::*;
pub use writer::*;
