//! End-to-end tests driving the binary against the fixture Tauri project.
//!
//! The Tauri CLI is replaced by `true`/`false` through `--tauri-script`, so
//! these tests only run on unix hosts.

#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const TRIPLE: &str = "x86_64-unknown-linux-gnu";

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/app")
}

/// Copies the fixture project into a fresh temporary directory.
fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let source = fixture();
    for entry in WalkDir::new(&source) {
        let entry = entry.unwrap();
        let dest = dir.path().join(entry.path().strip_prefix(&source).unwrap());
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).unwrap();
        } else {
            fs::copy(entry.path(), &dest).unwrap();
        }
    }
    dir
}

fn deb_path(root: &Path) -> PathBuf {
    root.join("target")
        .join(TRIPLE)
        .join("release/bundle/deb/fixture-app_0.4.2_amd64.deb")
}

fn bundler(root: &Path, script: &str) -> Command {
    let mut cmd = Command::cargo_bin("kodegen_bundler_tauri").unwrap();
    for var in ["GITHUB_TOKEN", "GITHUB_REPOSITORY", "GITHUB_OUTPUT", "INPUT_TAGNAME", "INPUT_RELEASEID"] {
        cmd.env_remove(var);
    }
    cmd.env("CARGO_TARGET_DIR", root.join("target"))
        .arg("--tauri-script")
        .arg(script)
        .arg("--args")
        .arg(format!("--target {TRIPLE}"))
        .arg(root);
    cmd
}

#[test]
fn builds_and_writes_step_outputs() {
    let dir = project();
    let deb = deb_path(dir.path());
    fs::create_dir_all(deb.parent().unwrap()).unwrap();
    fs::write(&deb, b"deb").unwrap();
    let outputs = dir.path().join("github_output");

    bundler(dir.path(), "true")
        .env("GITHUB_OUTPUT", &outputs)
        .assert()
        .success();

    let written = fs::read_to_string(&outputs).unwrap();
    assert!(written.contains("appVersion=0.4.2\n"));
    assert!(written.contains(&format!("artifactPaths=[\"{}\"]", deb.display())));
    assert!(!written.contains("releaseId="));
}

#[test]
fn nothing_built_without_tag_succeeds() {
    let dir = project();
    bundler(dir.path(), "true").assert().success();
}

#[test]
fn nothing_built_with_tag_fails() {
    let dir = project();
    bundler(dir.path(), "true")
        .args(["--tag-name", "v__VERSION__", "--owner", "tauri-apps", "--repo", "demo"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No artifacts were found."));
}

#[test]
fn failing_build_reports_the_command() {
    let dir = project();
    bundler(dir.path(), "false")
        .args(["--retry-attempts", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Command `false build --target x86_64-unknown-linux-gnu` failed"));
}

#[test]
fn missing_project_fails() {
    let dir = tempfile::tempdir().unwrap();
    bundler(dir.path(), "true")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Couldn't detect path of tauri app"));
}

#[test]
fn upload_requires_repository() {
    let dir = project();
    bundler(dir.path(), "true")
        .args(["--release-id", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing required argument: owner"));
}

#[test]
fn help_lists_release_inputs() {
    Command::cargo_bin("kodegen_bundler_tauri")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--tag-name").and(predicate::str::contains("--tauri-script")));
}
