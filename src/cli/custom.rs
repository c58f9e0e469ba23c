//! Custom commands declared in the `commands` configuration section

use std::process::ExitCode;

use super::{load_context, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::build::run_shell;
use crate::env::Env;

/// Run `args[0]` as a configured custom command, passing the rest as arguments.
pub fn run_custom(env: Env, args: &[String]) -> ExitCode {
    let Some((name, rest)) = args.split_first() else {
        eprintln!("Error: missing command");
        return ExitCode::from(EXIT_INVALID_ARGS);
    };

    let ctx = match load_context(env) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let Some(command) = ctx.settings().commands.get(name) else {
        eprintln!("Error: unknown command '{}'", name);
        let known: Vec<&str> = ctx.settings().commands.keys().map(String::as_str).collect();
        if !known.is_empty() {
            eprintln!("Custom commands: {}", known.join(", "));
        }
        eprintln!("Run 'forge --help' for the built-in commands");
        return ExitCode::from(EXIT_INVALID_ARGS);
    };

    let command = if rest.is_empty() { command.clone() } else { format!("{} {}", command, rest.join(" ")) };
    tracing::debug!(%name, %command, "running custom command");

    let mode = env.mode.to_string();
    match run_shell(&command, ctx.project_root(), &[("FORGE_ENV", mode.as_str())], true) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
