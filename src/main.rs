//! Forge - command-line asset build pipeline

use std::process::ExitCode;

use forge_assets::cli;

fn main() -> ExitCode {
    cli::run()
}
