//! Configuration module for forge
//!
//! Loads `forge.config.toml` (or one of the other supported sources) and
//! merges it over the built-in defaults.

pub mod loader;
pub mod merge;
pub mod schema;

pub use loader::{find_project_root, load_rc, ConfigError, ConfigSource};
pub use merge::{deep_merge, merged};
pub use schema::*;
