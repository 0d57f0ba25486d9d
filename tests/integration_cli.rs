//! Integration tests for the `weave` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;
use weave::test_utils::TopologyFixture;

fn weave() -> Command {
    let mut cmd = Command::cargo_bin("weave").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_report_layered() {
    let temp = TempDir::new().unwrap();
    let path = TopologyFixture::layered().write_to(temp.path()).unwrap();

    weave()
        .arg("report")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("No circular dependencies"))
        .stdout(predicate::str::contains("Root services (no dependencies):"))
        .stdout(predicate::str::contains("Service: users"));
}

#[test]
fn test_report_cyclic() {
    let temp = TempDir::new().unwrap();
    let path = TopologyFixture::cyclic().write_to(temp.path()).unwrap();

    weave()
        .arg("report")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("First cycle: a -> b -> c -> a"))
        .stdout(predicate::str::contains("cycle 2: b -> d -> b"));
}

#[test]
fn test_dot_output() {
    let temp = TempDir::new().unwrap();
    let path = TopologyFixture::cyclic().write_to(temp.path()).unwrap();

    weave()
        .arg("dot")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph DependencyGraph {"))
        .stdout(predicate::str::contains("fillcolor=lightcoral"))
        .stdout(predicate::str::contains("color=red, penwidth=2.0"));
}

#[test]
fn test_config_file_sets_rankdir() {
    let temp = TempDir::new().unwrap();
    let path = TopologyFixture::layered().write_to(temp.path()).unwrap();
    let config = temp.path().join("weave.toml");
    fs::write(&config, "[render]\nrankdir = \"LR\"\nnode_shape = \"ellipse\"\n").unwrap();

    weave()
        .arg("--config")
        .arg(&config)
        .arg("dot")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("rankdir=LR;"))
        .stdout(predicate::str::contains("shape=ellipse"));
}

#[test]
fn test_invalid_config_file() {
    let temp = TempDir::new().unwrap();
    let path = TopologyFixture::layered().write_to(temp.path()).unwrap();
    let config = temp.path().join("weave.toml");
    fs::write(&config, "[render]\nrankdir = \"sideways\"\n").unwrap();

    weave()
        .arg("--config")
        .arg(&config)
        .arg("report")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("rankdir"));
}

#[test]
fn test_cycles_output() {
    let temp = TempDir::new().unwrap();
    let path = TopologyFixture::cyclic().write_to(temp.path()).unwrap();

    weave()
        .arg("cycles")
        .arg(&path)
        .assert()
        .success()
        .stdout("a -> b -> c -> a\nb -> d -> b\n");
}

#[test]
fn test_cycles_none() {
    let temp = TempDir::new().unwrap();
    let path = TopologyFixture::layered().write_to(temp.path()).unwrap();

    weave()
        .arg("cycles")
        .arg(&path)
        .assert()
        .success()
        .stdout("No circular dependencies found.\n");
}

#[test]
fn test_graph_json() {
    let temp = TempDir::new().unwrap();
    let path = TopologyFixture::layered().write_to(temp.path()).unwrap();

    let output = weave()
        .arg("graph")
        .arg(&path)
        .args(["--format", "json"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["dependencies"]["api"], serde_json::json!(["database", "users"]));
    assert_eq!(json["dependents"]["api"], serde_json::json!([]));
}

#[test]
fn test_graph_order_fails_on_cycles() {
    let temp = TempDir::new().unwrap();
    let path = TopologyFixture::cyclic().write_to(temp.path()).unwrap();

    weave()
        .arg("graph")
        .arg(&path)
        .args(["--format", "order"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Circular dependency detected: a -> b -> c -> a"));
}

#[test]
fn test_check_success() {
    let temp = TempDir::new().unwrap();
    let path = TopologyFixture::layered().write_to(temp.path()).unwrap();

    weave()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Built 3 services"))
        .stdout(predicate::str::contains("circular").not());
}

#[test]
fn test_check_warns_about_cycles() {
    let temp = TempDir::new().unwrap();
    let path = TopologyFixture::cyclic().write_to(temp.path()).unwrap();

    weave()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 circular dependencies"));
}

#[test]
fn test_check_deny_cycles() {
    let temp = TempDir::new().unwrap();
    let path = TopologyFixture::cyclic().write_to(temp.path()).unwrap();

    weave()
        .arg("check")
        .arg("--deny-cycles")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Circular dependency detected"))
        .stderr(predicate::str::contains("--deny-cycles"));
}

#[test]
fn test_check_failing_provider() {
    let temp = TempDir::new().unwrap();
    let path = TopologyFixture::failing().write_to(temp.path()).unwrap();

    weave()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("service [cache] build failed"))
        .stderr(predicate::str::contains("suggestion"));
}

#[test]
fn test_check_missing_dependency() {
    let temp = TempDir::new().unwrap();
    let path = TopologyFixture::missing_dependency().write_to(temp.path()).unwrap();

    weave()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("service [ghost] not found"));
}

#[test]
fn test_missing_topology_file() {
    let temp = TempDir::new().unwrap();

    weave()
        .arg("report")
        .arg(temp.path().join("nope.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load topology"));
}

#[test]
fn test_invalid_topology_syntax() {
    let temp = TempDir::new().unwrap();
    let path = TopologyFixture::invalid_syntax().write_to(temp.path()).unwrap();

    weave().arg("report").arg(&path).assert().failure();
}

#[test]
fn test_verbose_logs_to_stderr() {
    let temp = TempDir::new().unwrap();
    let path = TopologyFixture::layered().write_to(temp.path()).unwrap();

    weave()
        .arg("--verbose")
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("Built service [users]"));
}

#[test]
fn test_quiet_keeps_stderr_clean() {
    let temp = TempDir::new().unwrap();
    let path = TopologyFixture::layered().write_to(temp.path()).unwrap();

    weave().arg("--quiet").arg("check").arg(&path).assert().success().stderr("");
}
