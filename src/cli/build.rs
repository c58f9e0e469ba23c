//! Pipeline command implementations (nuke, copy, compile, watch, build, serve)

use std::process::ExitCode;

use super::{load_context, EXIT_ERROR, EXIT_SUCCESS};
use crate::build::{BuildPipeline, BuildResult};
use crate::env::Env;
use crate::tasks;

fn pipeline(env: Env) -> Result<BuildPipeline, ExitCode> {
    load_context(env).map(BuildPipeline::new)
}

fn exit_for(result: &BuildResult) -> ExitCode {
    if result.has_failures() {
        eprintln!(
            "{} of {} target{} failed",
            result.failed_count(),
            result.targets.len(),
            if result.targets.len() == 1 { "" } else { "s" }
        );
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}

/// Run the nuke command
pub fn run_nuke(env: Env) -> ExitCode {
    let pipeline = match pipeline(env) {
        Ok(p) => p,
        Err(code) => return code,
    };
    match tasks::nuke(&pipeline) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the copy command
pub fn run_copy(env: Env) -> ExitCode {
    let pipeline = match pipeline(env) {
        Ok(p) => p,
        Err(code) => return code,
    };
    match tasks::copy(&pipeline) {
        Ok(_) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the compile command
pub fn run_compile(env: Env, targets: &[String]) -> ExitCode {
    let mut pipeline = match pipeline(env) {
        Ok(p) => p,
        Err(code) => return code,
    };
    match pipeline.compile(targets) {
        Ok(result) => exit_for(&result),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the build command
pub fn run_build(env: Env) -> ExitCode {
    let mut pipeline = match pipeline(env) {
        Ok(p) => p,
        Err(code) => return code,
    };
    match tasks::build(&mut pipeline) {
        Ok(outcome) => exit_for(&outcome.compile),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the watch command
pub fn run_watch(env: Env, targets: &[String]) -> ExitCode {
    let mut pipeline = match pipeline(env) {
        Ok(p) => p,
        Err(code) => return code,
    };

    println!("Press Ctrl+C to stop");
    match crate::watch::watch_and_rebuild(&mut pipeline, targets) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Watch error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the serve command: build, watch in the background, serve the output.
#[cfg(feature = "serve")]
pub fn run_serve(env: Env, port: Option<u16>, host: Option<String>) -> ExitCode {
    let mut pipeline = match pipeline(env) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let outcome = match tasks::build(&mut pipeline) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    if outcome.has_failures() {
        eprintln!("Build finished with errors; serving anyway");
    }

    let settings = pipeline.context().settings().serve.clone();
    let host = host.unwrap_or(settings.host);
    let port = port.unwrap_or(settings.port);
    let root = pipeline.context().output_dir();

    std::thread::spawn(move || {
        if let Err(e) = crate::watch::watch_and_rebuild(&mut pipeline, &[]) {
            eprintln!("Watch error: {}", e);
        }
    });

    println!("Serving {} at http://{}:{}", root.display(), host, port);
    println!("Press Ctrl+C to stop");
    match crate::serve::serve_blocking(root, &host, port) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
