//! CLI integration tests
//!
//! Run the `forge` binary inside temporary projects and check exit codes,
//! console output and the files it leaves behind.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn forge(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_forge"))
        .args(args)
        .current_dir(root)
        .env_remove("NODE_ENV")
        .env_remove("FORGE_ENV")
        .env_remove("FORGE_DEBUG")
        .env_remove("FORGE_LOG")
        .output()
        .expect("failed to run forge")
}

fn project(config: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".forgerc.json"), config).unwrap();
    fs::create_dir_all(temp.path().join("src/assets/css")).unwrap();
    temp
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_compile_named_target() {
    let temp = project(r#"{"notes": {"entries": "*.txt", "compiler": "raw"}}"#);
    fs::write(temp.path().join("src/a.txt"), "hello").unwrap();

    let output = forge(temp.path(), &["compile", "notes"]);

    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout(&output).starts_with("forge v"));
    assert!(stdout(&output).contains("(development)"));
    assert!(stdout(&output).contains("dist/a.txt"));
    assert_eq!(fs::read_to_string(temp.path().join("dist/a.txt")).unwrap(), "hello");
}

#[test]
fn test_compile_failure_exits_one() {
    let temp = project("{}");
    fs::write(temp.path().join("src/assets/css/bad.css"), "..broken { color: red }").unwrap();
    fs::write(temp.path().join("src/assets/css/good.css"), ".ok { color: red }").unwrap();

    let output = forge(temp.path(), &["--production", "compile", "css"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("(production)"));
    assert!(stdout(&output).contains("✕ error css"));
}

#[test]
fn test_unknown_compiler_exits_one() {
    let temp = project(r#"{"t": {"entries": "*.txt", "compiler": "missing"}}"#);
    let output = forge(temp.path(), &["compile", "t"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown compiler 'missing'"));
}

#[test]
fn test_unknown_subcommand_exits_two() {
    let temp = project("{}");
    let output = forge(temp.path(), &["frobnicate"]);
    assert_eq!(output.status.code(), Some(2));
}

#[cfg(unix)]
#[test]
fn test_custom_command_runs_in_project_root() {
    let temp = project(r#"{"commands": {"hello": "echo hi > hello.txt"}}"#);
    let nested = temp.path().join("src/assets");

    let output = forge(&nested, &["hello"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(fs::read_to_string(temp.path().join("hello.txt")).unwrap().trim(), "hi");
}

#[test]
fn test_build_nukes_compiles_and_copies() {
    let temp = project("{}");
    fs::write(temp.path().join("src/assets/css/site.css"), "a { color: red }").unwrap();
    fs::create_dir_all(temp.path().join("src/assets/img")).unwrap();
    fs::write(temp.path().join("src/assets/img/logo.png"), [0u8, 1, 2]).unwrap();
    fs::create_dir_all(temp.path().join("dist")).unwrap();
    fs::write(temp.path().join("dist/stale.txt"), "old").unwrap();

    let output = forge(temp.path(), &["build"]);

    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(!temp.path().join("dist/stale.txt").exists());
    assert!(temp.path().join("dist/assets/site.css").exists());
    assert!(temp.path().join("dist/assets/img/logo.png").exists());
    assert!(!temp.path().join("dist/assets/css/site.css").exists());
}

#[test]
fn test_nuke_without_output_succeeds() {
    let temp = project("{}");
    let output = forge(temp.path(), &["nuke"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_invalid_config_exits_one() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".forgerc.json"), "{ not json").unwrap();
    let output = forge(temp.path(), &["compile"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error loading config"));
}
