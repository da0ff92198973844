//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;

fn quill() -> Command {
    let mut cmd = Command::cargo_bin("quill").unwrap();
    cmd.env_remove("DATABASE_URL").env_remove("QUILL_CONFIG");
    cmd
}

#[test]
fn test_serve_help() {
    quill()
        .arg("serve")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Keep content in memory"))
        .stdout(predicate::str::contains("--admin"));
}

#[test]
fn test_migrate_help() {
    quill()
        .arg("migrate")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--database-url"));
}

#[test]
fn test_migrate_without_database_fails() {
    let dir = tempfile::tempdir().unwrap();
    quill()
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .arg("migrate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATABASE_URL not set"));
}

#[test]
fn test_config_path_honours_flag() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");

    quill()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .arg("path")
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    quill()
        .arg("--config")
        .arg(&path)
        .args(["config", "init"])
        .assert()
        .success();

    quill()
        .arg("--config")
        .arg(&path)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    quill()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("page_size = 6"))
        .stdout(predicate::str::contains("related_count = 3"));
}

#[test]
fn test_config_show_applies_database_url_env() {
    let dir = tempfile::tempdir().unwrap();

    quill()
        .env("DATABASE_URL", "postgres://localhost/quill_test")
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("postgres://localhost/quill_test"));
}
