//! Integration tests for values fetching, merging and drift detection.

use httpmock::prelude::*;
use pipewright::config::{CodeHost, CodeHostKind};
use pipewright::values::{
    ConcurrentFetchMerger, CustomYaml, DirVariableSetStore, GitWorkingCopy, HttpRepoDownloader,
    RepoCoordinates, RepoDownloader, ValueSourceSyncer,
};
use pipewright::PipewrightError;
use std::fs;
use tempfile::TempDir;

fn host(id: i64, kind: CodeHostKind, address: String, token: &str) -> CodeHost {
    CodeHost {
        id,
        kind,
        address,
        namespace: String::new(),
        access_token: token.into(),
    }
}

fn coords(codehost_id: i64) -> RepoCoordinates {
    RepoCoordinates {
        codehost_id,
        owner: "acme".into(),
        repo: "charts".into(),
        branch: "main".into(),
        ..Default::default()
    }
}

fn yaml(text: &str) -> serde_yaml::Value {
    serde_yaml::from_str(text).unwrap()
}

#[test]
fn github_download_sends_token_and_ref() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/repos/acme/charts/contents/env/prod.yaml")
            .query_param("ref", "main")
            .header("Authorization", "Bearer ghp_abc")
            .header("Accept", "application/vnd.github.raw");
        then.status(200).body("replicas: 3\n");
    });
    let github = host(1, CodeHostKind::Github, server.base_url(), "ghp_abc");

    let body = HttpRepoDownloader::new()
        .unwrap()
        .download(Some(&github), &coords(1), "env/prod.yaml")
        .unwrap();

    mock.assert();
    assert_eq!(body, b"replicas: 3\n");
}

#[test]
fn gitee_download_passes_access_token_query() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v5/repos/acme/charts/raw/values.yaml")
            .query_param("ref", "main")
            .query_param("access_token", "gitee-tok");
        then.status(200).body("a: 1\n");
    });
    let gitee = host(2, CodeHostKind::Gitee, server.base_url(), "gitee-tok");

    let body = HttpRepoDownloader::new()
        .unwrap()
        .download(Some(&gitee), &coords(2), "values.yaml")
        .unwrap();

    mock.assert();
    assert_eq!(body, b"a: 1\n");
}

#[test]
fn public_link_needs_no_code_host() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/acme/charts/main/values.yaml");
        then.status(200).body("public: true\n");
    });
    let downloader = HttpRepoDownloader::new()
        .unwrap()
        .with_raw_base(server.base_url());
    let hosts: Vec<CodeHost> = Vec::new();
    let temp = TempDir::new().unwrap();
    let working_copy = GitWorkingCopy::new(temp.path());
    let merger = ConcurrentFetchMerger::new(temp.path(), &hosts, &downloader, &working_copy);
    let coords = RepoCoordinates {
        repo_link: "https://github.com/acme/charts".into(),
        branch: "main".into(),
        ..Default::default()
    };

    let merged = merger.merge(&["values.yaml".to_string()], &coords).unwrap();

    assert_eq!(yaml(&merged), yaml("public: true"));
}

#[test]
fn merge_applies_later_files_over_earlier_ones() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/charts/contents/base.yaml");
        then.status(200)
            .body("replicas: 1\nimage:\n  repository: nginx\n  tag: v1\n");
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/charts/contents/prod.yaml");
        then.status(200).body("replicas: 3\nimage:\n  tag: v2\n");
    });
    let hosts = vec![host(1, CodeHostKind::Github, server.base_url(), "")];
    let downloader = HttpRepoDownloader::new().unwrap();
    let temp = TempDir::new().unwrap();
    let working_copy = GitWorkingCopy::new(temp.path());
    let merger = ConcurrentFetchMerger::new(temp.path(), &hosts, &downloader, &working_copy);

    let merged = merger
        .merge(&["base.yaml".to_string(), "prod.yaml".to_string()], &coords(1))
        .unwrap();

    assert_eq!(
        yaml(&merged),
        yaml("replicas: 3\nimage: {repository: nginx, tag: v2}")
    );
}

#[test]
fn merge_reports_every_failed_path() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/charts/contents/ok.yaml");
        then.status(200).body("a: 1\n");
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/charts/contents/gone.yaml");
        then.status(404);
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/charts/contents/broken.yaml");
        then.status(500);
    });
    let hosts = vec![host(1, CodeHostKind::Github, server.base_url(), "")];
    let downloader = HttpRepoDownloader::new().unwrap();
    let temp = TempDir::new().unwrap();
    let working_copy = GitWorkingCopy::new(temp.path());
    let merger = ConcurrentFetchMerger::new(temp.path(), &hosts, &downloader, &working_copy);
    let paths = ["gone.yaml", "ok.yaml", "broken.yaml"].map(String::from);

    let err = merger.merge(&paths, &coords(1)).unwrap_err();

    let aggregated = match err {
        PipewrightError::AggregatedFetch(aggregated) => aggregated,
        other => panic!("expected aggregated fetch error, got {other:?}"),
    };
    let failed: Vec<String> = aggregated.failures().iter().map(|f| f.path()).collect();
    assert_eq!(failed, vec!["gone.yaml", "broken.yaml"]);
}

#[test]
fn merge_with_unknown_code_host_fails() {
    let hosts: Vec<CodeHost> = Vec::new();
    let downloader = HttpRepoDownloader::new().unwrap();
    let temp = TempDir::new().unwrap();
    let working_copy = GitWorkingCopy::new(temp.path());
    let merger = ConcurrentFetchMerger::new(temp.path(), &hosts, &downloader, &working_copy);

    let err = merger
        .merge(&["values.yaml".to_string()], &coords(42))
        .unwrap_err();

    assert!(matches!(err, PipewrightError::CodeHostNotFound { .. }));
}

#[test]
fn git_source_drift_is_detected_over_http() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/repos/acme/charts/contents/values.yaml")
            .query_param("ref", "main");
        then.status(200).body("image:\n  tag: v3\n");
    });
    let hosts = vec![host(1, CodeHostKind::Github, server.base_url(), "")];
    let downloader = HttpRepoDownloader::new().unwrap();
    let temp = TempDir::new().unwrap();
    let sets = DirVariableSetStore::new(temp.path());
    let syncer = ValueSourceSyncer::new(&hosts, &downloader, &sets);
    let source: CustomYaml = serde_json::from_str(
        r#"{
            "source": "gitRepo",
            "autoSync": true,
            "sourceDetail": {
                "loadPath": "values.yaml",
                "gitRepoConfig": {"codehostID": 1, "owner": "acme", "repo": "charts", "branch": "main"}
            }
        }"#,
    )
    .unwrap();

    let drifted = syncer
        .sync_yaml_from_source(Some(&source), "image: {tag: v2}")
        .unwrap();
    assert!(drifted.changed);
    assert_eq!(drifted.value, "image:\n  tag: v3\n");

    let same = syncer
        .sync_yaml_from_source(Some(&source), "image: {tag: v3}")
        .unwrap();
    assert!(!same.changed);
}

#[test]
fn variable_set_drift_reads_from_directory() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("prod.yaml"), "replicas: 3\n").unwrap();
    let hosts: Vec<CodeHost> = Vec::new();
    let downloader = HttpRepoDownloader::new().unwrap();
    let sets = DirVariableSetStore::new(temp.path());
    let syncer = ValueSourceSyncer::new(&hosts, &downloader, &sets);
    let source: CustomYaml =
        serde_yaml::from_str("source: variableSet\nautoSync: true\nsourceID: prod\n").unwrap();

    let outcome = syncer
        .sync_yaml_from_source(Some(&source), "replicas: 2\n")
        .unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.value, "replicas: 3\n");

    let missing: CustomYaml =
        serde_yaml::from_str("source: variableSet\nautoSync: true\nsourceID: qa\n").unwrap();
    let err = syncer
        .sync_yaml_from_source(Some(&missing), "replicas: 2\n")
        .unwrap_err();
    assert!(matches!(err, PipewrightError::LookupError { .. }));
}
