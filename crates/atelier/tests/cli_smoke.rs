use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn atelier(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("atelier").expect("binary exists");
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env("XDG_STATE_HOME", home.path().join(".local/state"))
        .env("XDG_DATA_HOME", home.path().join(".local/share"))
        .env("HOSTNAME", "atelier-test-host")
        .env_remove("ATELIER_REMOTE")
        .env_remove("ATELIER_TOKEN")
        .env_remove("ATELIER_LOG");
    cmd
}

#[test]
fn help_displays_usage() {
    let home = TempDir::new().unwrap();
    atelier(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("attach"));
}

#[test]
fn attach_without_target_is_rejected() {
    let home = TempDir::new().unwrap();
    atelier(&home)
        .arg("attach")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn list_prints_configured_projects() {
    let home = TempDir::new().unwrap();
    fs::create_dir_all(home.path().join("code/api")).unwrap();
    let config_dir = home.path().join(".config/atelier");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        r#"
[[actions]]
name = "build"
command = "make"

[[projects]]
name = "api"
path = "~/code/api"
"#,
    )
    .unwrap();

    atelier(&home)
        .args(["list", "--projects"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("SOURCE"))
        .stdout(predicate::str::contains("Project  api"))
        .stdout(predicate::str::contains("~/code/api"))
        .stdout(predicate::str::contains("build, shell"));
}

#[test]
fn invalid_config_fails_with_context() {
    let home = TempDir::new().unwrap();
    let config_dir = home.path().join(".config/atelier");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "[[projects]]\nname = \"api\"\n").unwrap();

    atelier(&home)
        .args(["list", "--projects"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing path"));
}

#[test]
fn completions_are_generated() {
    let home = TempDir::new().unwrap();
    atelier(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("atelier"));
}

#[test]
fn login_stores_token() {
    let home = TempDir::new().unwrap();
    atelier(&home).args(["login", "s3cret"]).assert().success();
    let stored = fs::read_to_string(home.path().join(".local/share/atelier/token")).unwrap();
    assert_eq!(stored.trim(), "s3cret");
}
