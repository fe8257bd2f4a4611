//! Integration tests for the pipewright binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn pipewright(temp: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("pipewright"));
    cmd.current_dir(temp.path())
        .env_remove("PIPEWRIGHT_CONFIG")
        .env_remove("RUST_LOG")
        .env("PIPEWRIGHT_STORAGE_PATH", temp.path().join("storage"));
    cmd
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

const FAILING_JOB: &str = r#"
workspace: ws
secret_envs: [API_TOKEN=hunter2]
steps:
  - name: hello
    type: shell
    spec:
      scripts: ["echo token is $API_TOKEN"]
  - name: broken
    type: shell
    spec:
      scripts: ["exit 3"]
  - name: never
    type: shell
    spec:
      scripts: ["echo should-not-run"]
  - name: cleanup
    type: shell
    on_failure: true
    spec:
      scripts: ["echo cleaning up"]
"#;

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    pipewright(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("merge"))
        .stdout(predicate::str::contains("sync"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    pipewright(&temp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
#[cfg(unix)]
fn run_succeeds_and_prints_summary() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    write(
        &temp.path().join("job.yaml"),
        "workspace: ws\nsteps:\n  - name: greet\n    type: shell\n    spec:\n      scripts: [\"echo hello from step\"]\n",
    );

    pipewright(&temp)
        .args(["run", "--job", "job.yaml", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello from step"))
        .stdout(predicate::str::contains("1 completed, 0 failed, 0 skipped"));
    Ok(())
}

#[test]
#[cfg(unix)]
fn run_masks_secrets_and_honours_on_failure() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    write(&temp.path().join("job.yaml"), FAILING_JOB);

    pipewright(&temp)
        .args(["run", "--job", "job.yaml", "--no-color"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("token is ********"))
        .stdout(predicate::str::contains("hunter2").not())
        .stdout(predicate::str::contains("should-not-run").not())
        .stdout(predicate::str::contains("cleaning up"))
        .stdout(predicate::str::contains("never (skipped)"))
        .stderr(predicate::str::contains("Step 'broken' failed"));
    Ok(())
}

#[test]
fn run_reports_missing_job() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    pipewright(&temp)
        .args(["run", "--job", "missing.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration not found"));
    Ok(())
}

fn agent_config(temp: &TempDir, server: &MockServer) -> std::path::PathBuf {
    let path = temp.path().join("agent.yaml");
    write(
        &path,
        &format!(
            "code_hosts:\n  - id: 1\n    type: github\n    address: {}\n    access_token: ghp_test\n",
            server.base_url()
        ),
    );
    path
}

#[test]
fn merge_prints_merged_values() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let server = MockServer::start();
    let base = server.mock(|when, then| {
        when.method(GET).path("/repos/acme/charts/contents/base.yaml");
        then.status(200).body("replicas: 1\nimage:\n  tag: v1\n");
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/charts/contents/prod.yaml");
        then.status(200).body("replicas: 3\n");
    });
    let config = agent_config(&temp, &server);

    pipewright(&temp)
        .arg("--config")
        .arg(&config)
        .args([
            "merge",
            "--codehost-id",
            "1",
            "--owner",
            "acme",
            "--repo",
            "charts",
            "--branch",
            "main",
            "base.yaml",
            "prod.yaml",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("replicas: 3"))
        .stdout(predicate::str::contains("tag: v1"));

    base.assert();
    Ok(())
}

#[test]
fn merge_lists_every_failed_path() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/charts/contents/a.yaml");
        then.status(200).body("a: 1\n");
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/charts/contents/b.yaml");
        then.status(500).body("boom");
    });
    let config = agent_config(&temp, &server);

    pipewright(&temp)
        .arg("--config")
        .arg(&config)
        .args([
            "merge",
            "--codehost-id",
            "1",
            "--owner",
            "acme",
            "--repo",
            "charts",
            "a.yaml",
            "b.yaml",
            "c.yaml",
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("2 values file(s) could not be fetched"))
        .stderr(predicate::str::contains("path b.yaml"))
        .stderr(predicate::str::contains("path c.yaml"));
    Ok(())
}

#[test]
fn sync_reports_variable_set_drift() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let sets = temp.path().join("sets");
    write(&sets.join("prod.yaml"), "replicas: 3\n");
    let config = temp.path().join("agent.yaml");
    write(&config, &format!("variable_sets_dir: {}\n", sets.display()));
    write(
        &temp.path().join("source.yaml"),
        "source: variableSet\nautoSync: true\nsourceID: prod\n",
    );
    write(&temp.path().join("current.yaml"), "replicas: 1\n");

    pipewright(&temp)
        .arg("--config")
        .arg(&config)
        .args(["sync", "--source", "source.yaml", "--current", "current.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("changed\nreplicas: 3"));

    pipewright(&temp)
        .arg("--config")
        .arg(&config)
        .args(["sync", "--source", "source.yaml", "--current", "current.yaml", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"changed\": true"));
    Ok(())
}

#[test]
fn sync_without_auto_sync_is_unchanged() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    write(
        &temp.path().join("source.yaml"),
        "source: variableSet\nautoSync: false\nsourceID: prod\n",
    );
    write(&temp.path().join("current.yaml"), "replicas: 1\n");

    pipewright(&temp)
        .args(["sync", "--source", "source.yaml", "--current", "current.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::diff("unchanged\n"));
    Ok(())
}
