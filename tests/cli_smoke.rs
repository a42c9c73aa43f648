//! CLI smoke tests for the gsync binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn gsync() -> Command {
    Command::cargo_bin("gsync").expect("binary builds")
}

#[test]
fn help_lists_the_commands() {
    gsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("variants"));
}

#[test]
fn variants_count_uses_the_stock_space() {
    let dir = TempDir::new().unwrap();
    gsync()
        .args(["--cwd", dir.path().to_str().unwrap()])
        .args(["variants", "--count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("504"));
}

#[test]
fn variants_respects_a_custom_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("glyphsync.toml"),
        r#"
            [[axis]]
            name = "style"
            label = "Style"
            values = [{ token = "solid", label = "Solid" }, { token = "duotone", label = "Duotone" }]
        "#,
    )
    .unwrap();

    gsync()
        .args(["--cwd", dir.path().to_str().unwrap()])
        .arg("variants")
        .assert()
        .success()
        .stdout(predicate::str::contains("Style=Solid"))
        .stdout(predicate::str::contains("Style=Duotone"));
}

#[test]
fn plan_reports_full_generate_for_a_missing_target() {
    let dir = TempDir::new().unwrap();
    let list = dir.path().join("icons.json");
    std::fs::write(&list, r#"{"icons": ["home", "wifi"]}"#).unwrap();

    gsync()
        .args(["--cwd", dir.path().to_str().unwrap()])
        .arg("plan")
        .args(["--list", list.to_str().unwrap()])
        .args(["--target", dir.path().join("library").to_str().unwrap()])
        .args(["--source-version", "v1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("home: full-generate"))
        .stdout(predicate::str::contains("wifi: full-generate"));
}

#[test]
fn sync_rejects_a_malformed_version_token() {
    let dir = TempDir::new().unwrap();
    let list = dir.path().join("icons.json");
    std::fs::write(&list, r#"{"icons": ["home"]}"#).unwrap();

    gsync()
        .args(["--cwd", dir.path().to_str().unwrap()])
        .arg("sync")
        .args(["--list", list.to_str().unwrap()])
        .args(["--target", dir.path().join("library").to_str().unwrap()])
        .args(["--source-version", "two words"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("source-version"));
}

#[test]
fn sync_fails_cleanly_on_a_missing_list() {
    let dir = TempDir::new().unwrap();
    gsync()
        .args(["--cwd", dir.path().to_str().unwrap()])
        .arg("sync")
        .args(["--list", dir.path().join("nope.json").to_str().unwrap()])
        .args(["--target", dir.path().join("library").to_str().unwrap()])
        .args(["--source-version", "v1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("entity list"));
}

#[test]
fn plan_rejects_an_empty_icon_list() {
    let dir = TempDir::new().unwrap();
    let list = dir.path().join("icons.json");
    std::fs::write(&list, r#"{"icons": []}"#).unwrap();

    gsync()
        .args(["--cwd", dir.path().to_str().unwrap()])
        .arg("plan")
        .args(["--list", list.to_str().unwrap()])
        .args(["--target", dir.path().join("library").to_str().unwrap()])
        .args(["--source-version", "v1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty"));
}
