//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod build;
mod custom;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::build::{BuildContext, CONFIG_NAME};
use crate::config::find_project_root;
use crate::env::{Env, Mode};

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Forge - declarative asset build pipeline
#[derive(Parser)]
#[command(name = "forge")]
#[command(about = "Forge - compile, copy, watch and serve front-end assets")]
#[command(version)]
pub struct Cli {
    /// Build for production (minified output, no write cache)
    #[arg(long, global = true, conflicts_with = "development")]
    pub production: bool,

    /// Build for development (default unless FORGE_ENV or NODE_ENV say otherwise)
    #[arg(long, global = true)]
    pub development: bool,

    /// Log the resolved configuration and every input context
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    fn mode(&self) -> Option<Mode> {
        if self.production {
            Some(Mode::Production)
        } else if self.development {
            Some(Mode::Development)
        } else {
            None
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Delete the output directory
    Nuke,

    /// Copy static assets into the output directory
    Copy,

    /// Compile targets (all default targets when none are named)
    Compile {
        /// Target names
        targets: Vec<String>,
    },

    /// Recompile targets when their observed files change
    Watch {
        /// Target names
        targets: Vec<String>,
    },

    /// Nuke, compile every default target, then copy static assets
    Build,

    /// Build, watch, and serve the output directory over HTTP
    #[cfg(feature = "serve")]
    Serve {
        /// Port to listen on (defaults to `serve.port`)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (defaults to `serve.host`)
        #[arg(long)]
        host: Option<String>,
    },

    /// A custom command from the `commands` configuration section
    #[command(external_subcommand)]
    External(Vec<String>),
}

/// Install the tracing subscriber: `FORGE_LOG` when set, else `debug` or `warn`.
fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_env("FORGE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

/// Load the project configuration from the nearest project root.
pub(crate) fn load_context(env: Env) -> Result<BuildContext, ExitCode> {
    let root = find_project_root(CONFIG_NAME);
    tracing::debug!("project root: {}", root.display());
    BuildContext::load(root, env).map_err(|e| {
        eprintln!("Error loading config: {}", e);
        ExitCode::from(EXIT_ERROR)
    })
}

fn banner(env: Env) -> String {
    format!("forge v{} ({})", env!("CARGO_PKG_VERSION"), env.mode)
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let env = Env::resolve(cli.mode(), cli.debug);
    init_logging(env.debug);

    println!("{}", banner(env));

    match cli.command {
        Commands::Nuke => build::run_nuke(env),
        Commands::Copy => build::run_copy(env),
        Commands::Compile { targets } => build::run_compile(env, &targets),
        Commands::Watch { targets } => build::run_watch(env, &targets),
        Commands::Build => build::run_build(env),
        #[cfg(feature = "serve")]
        Commands::Serve { port, host } => build::run_serve(env, port, host),
        Commands::External(args) => custom::run_custom(env, &args),
    }
}
