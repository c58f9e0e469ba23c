//! Forge - declarative asset build pipeline
//!
//! This library provides functionality to:
//! - Merge project configuration over built-in defaults
//! - Compile configured targets through pluggable compilers
//! - Copy static assets, watch sources, and serve the output directory

pub mod build;
pub mod cli;
pub mod compilers;
pub mod config;
pub mod env;
#[cfg(feature = "serve")]
pub mod serve;
pub mod tasks;
pub mod watch;
