//! Configuration integration tests
//!
//! Loader precedence, deep merging over the built-in defaults, re-reading on
//! every load, and environment resolution.

use serde_json::json;
use serial_test::serial;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use forge_assets::build::{BuildContext, CONFIG_NAME};
use forge_assets::config::{base_config, find_project_root, load_rc, merged, ConfigError, TargetSlot};
use forge_assets::env::{Env, Mode};

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn test_deep_merge_properties() {
    let merged_obj = merged(&json!({"a": {"x": 1, "y": 2}}), &json!({"a": {"y": 3, "z": 4}}));
    assert_eq!(merged_obj, json!({"a": {"x": 1, "y": 3, "z": 4}}));

    let merged_arr = merged(&json!({"a": [1, 2]}), &json!({"a": [3]}));
    assert_eq!(merged_arr, json!({"a": [3]}));
}

#[test]
fn test_loader_precedence() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "package.json", r#"{"forge": {"output": "from-manifest/"}}"#);
    write(temp.path(), ".forgerc", r#"{"output": "from-rc/"}"#);
    write(temp.path(), ".forgerc.json5", "{ output: 'from-rc-json5/' }");
    write(temp.path(), "forge.config.toml", "output = \"from-module/\"");

    let steps = [
        ("forge.config.toml", "from-rc-json5/"),
        (".forgerc.json5", "from-rc/"),
        (".forgerc", "from-manifest/"),
        ("package.json", "dist/"),
    ];

    let cfg = load_rc(temp.path(), CONFIG_NAME, base_config()).unwrap();
    assert_eq!(cfg["output"], "from-module/");

    for (remove, expected) in steps {
        fs::remove_file(temp.path().join(remove)).unwrap();
        let cfg = load_rc(temp.path(), CONFIG_NAME, base_config()).unwrap();
        assert_eq!(cfg["output"], expected, "after removing {}", remove);
    }
}

#[test]
fn test_override_merges_into_default_target() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), ".forgerc.json", r#"{"css": {"output": "styles/", "flatten": true}}"#);

    let ctx = BuildContext::load(temp.path().to_path_buf(), Env::development()).unwrap();
    let TargetSlot::Ready(css) = ctx.target("css") else {
        panic!("css should stay configured");
    };
    assert_eq!(css.entries.as_slice(), &["assets/css/*.css".to_string()]);
    assert_eq!(css.output, Path::new("styles/"));
    assert!(css.flatten);
}

#[test]
fn test_config_is_reread_on_each_load() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), ".forgerc.json", r#"{"input": "one/"}"#);
    let first = load_rc(temp.path(), CONFIG_NAME, base_config()).unwrap();

    write(temp.path(), ".forgerc.json", r#"{"input": "two/"}"#);
    let second = load_rc(temp.path(), CONFIG_NAME, base_config()).unwrap();

    assert_eq!(first["input"], "one/");
    assert_eq!(second["input"], "two/");
}

#[test]
fn test_parse_errors_name_the_file() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "forge.config.toml", "output = ");

    let err = load_rc(temp.path(), CONFIG_NAME, base_config()).unwrap_err();
    match err {
        ConfigError::Parse { path, .. } => assert!(path.ends_with("forge.config.toml")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_invalid_settings_rejected() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), ".forgerc.json", r#"{"watch": {"debounce_ms": 0}}"#);

    let err = BuildContext::load(temp.path().to_path_buf(), Env::development()).unwrap_err();
    assert!(err.to_string().contains("watch.debounce_ms"));
}

#[test]
#[serial]
fn test_project_root_found_from_subdirectory() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), ".forgerc", "{}");
    let nested = temp.path().join("src/assets");
    fs::create_dir_all(&nested).unwrap();

    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(&nested).unwrap();
    let root = find_project_root(CONFIG_NAME);
    std::env::set_current_dir(previous).unwrap();

    assert_eq!(root.canonicalize().unwrap(), temp.path().canonicalize().unwrap());
}

#[test]
#[serial]
fn test_env_resolution_order() {
    std::env::set_var("NODE_ENV", "production");
    std::env::remove_var("FORGE_ENV");
    std::env::remove_var("FORGE_DEBUG");
    assert_eq!(Env::resolve(None, false).mode, Mode::Production);

    std::env::set_var("FORGE_ENV", "development");
    assert_eq!(Env::resolve(None, false).mode, Mode::Development);
    assert_eq!(Env::resolve(Some(Mode::Production), false).mode, Mode::Production);

    std::env::set_var("FORGE_DEBUG", "1");
    assert!(Env::resolve(None, false).debug);

    std::env::remove_var("NODE_ENV");
    std::env::remove_var("FORGE_ENV");
    std::env::remove_var("FORGE_DEBUG");
}
