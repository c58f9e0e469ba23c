//! Build environment: production vs development mode and the debug flag.

use std::env;
use std::fmt;

/// Build mode. Production disables the write cache and minifies output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Development,
    Production,
}

impl Mode {
    /// Parse a mode name (`production`, `prod`, `development`, `dev`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Mode::Production),
            "development" | "dev" => Some(Mode::Development),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Development => write!(f, "development"),
            Mode::Production => write!(f, "production"),
        }
    }
}

/// Mode and debug flag for one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Env {
    pub mode: Mode,
    pub debug: bool,
}

impl Env {
    pub fn development() -> Self {
        Self { mode: Mode::Development, debug: false }
    }

    pub fn production() -> Self {
        Self { mode: Mode::Production, debug: false }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn is_production(&self) -> bool {
        self.mode == Mode::Production
    }

    /// Resolve the environment from CLI flags, falling back to process variables.
    ///
    /// Precedence: explicit flag, then `FORGE_ENV`, then `NODE_ENV`, then development.
    /// Debug is on when the flag is set or `FORGE_DEBUG` is `true`/`1`.
    pub fn resolve(flag_mode: Option<Mode>, flag_debug: bool) -> Self {
        let mode = flag_mode
            .or_else(|| env::var("FORGE_ENV").ok().and_then(|v| Mode::from_name(&v)))
            .or_else(|| env::var("NODE_ENV").ok().and_then(|v| Mode::from_name(&v)))
            .unwrap_or_default();

        let debug = flag_debug
            || env::var("FORGE_DEBUG").map(|v| matches!(v.as_str(), "true" | "1")).unwrap_or(false);

        Self { mode, debug }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_vars() {
        env::remove_var("FORGE_ENV");
        env::remove_var("NODE_ENV");
        env::remove_var("FORGE_DEBUG");
    }

    #[test]
    fn test_mode_from_name() {
        assert_eq!(Mode::from_name("production"), Some(Mode::Production));
        assert_eq!(Mode::from_name(" Dev "), Some(Mode::Development));
        assert_eq!(Mode::from_name("staging"), None);
    }

    #[test]
    #[serial]
    fn test_resolve_defaults_to_development() {
        clear_vars();
        let env = Env::resolve(None, false);
        assert_eq!(env.mode, Mode::Development);
        assert!(!env.debug);
    }

    #[test]
    #[serial]
    fn test_resolve_flag_beats_variables() {
        clear_vars();
        env::set_var("FORGE_ENV", "production");
        let env = Env::resolve(Some(Mode::Development), false);
        assert_eq!(env.mode, Mode::Development);
        clear_vars();
    }

    #[test]
    #[serial]
    fn test_resolve_node_env_fallback() {
        clear_vars();
        env::set_var("NODE_ENV", "production");
        env::set_var("FORGE_DEBUG", "true");
        let env = Env::resolve(None, false);
        assert!(env.is_production());
        assert!(env.debug);
        clear_vars();
    }
}
