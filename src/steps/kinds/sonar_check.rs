//! SonarQube quality gate checks.
//!
//! A scanner run leaves `.scannerwork/report-task.txt` in the scanned
//! directory. The step waits for the server to finish processing that task
//! and fails when the resulting quality gate status is `ERROR`.

use anyhow::{anyhow, bail, Context};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::debug;

use crate::error::{PipewrightError, Result};
use crate::steps::context::JobContext;
use crate::steps::executor::StepExecutor;

const REPORT_TASK_FILE: &str = ".scannerwork/report-task.txt";

/// Waits for a SonarQube analysis and checks its quality gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SonarCheckStep {
    pub sonar_server: String,
    pub sonar_token: String,
    /// Scanned directory, relative to the workspace.
    pub check_dir: String,
    pub poll_interval_secs: u64,
    pub max_attempts: u32,
}

impl Default for SonarCheckStep {
    fn default() -> Self {
        Self {
            sonar_server: String::new(),
            sonar_token: String::new(),
            check_dir: ".".to_string(),
            poll_interval_secs: 5,
            max_attempts: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CeTaskResponse {
    task: CeTask,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CeTask {
    status: String,
    #[serde(default)]
    analysis_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QualityGateResponse {
    project_status: ProjectStatus,
}

#[derive(Debug, Deserialize)]
struct ProjectStatus {
    status: String,
}

/// Read `ceTaskId` from a scanner report-task file.
pub fn read_ce_task_id(report_task: &Path) -> anyhow::Result<String> {
    let content = fs::read_to_string(report_task)
        .with_context(|| format!("failed to read {}", report_task.display()))?;

    content
        .lines()
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| key.trim() == "ceTaskId")
        .map(|(_, value)| value.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| anyhow!("ceTaskId not found in {}", report_task.display()))
}

impl SonarCheckStep {
    /// API URL under the server address with one encoded query parameter.
    fn server_url(&self, segments: &[&str], key: &str, value: &str) -> anyhow::Result<Url> {
        let base = &self.sonar_server;
        let mut url =
            Url::parse(base).with_context(|| format!("invalid sonar server address {}", base))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("sonar server address {} cannot be a base", base))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().append_pair(key, value);
        Ok(url)
    }

    fn get<T: serde::de::DeserializeOwned>(&self, client: &Client, url: &Url) -> anyhow::Result<T> {
        let response = client
            .get(url.clone())
            .basic_auth(&self.sonar_token, Some(""))
            .send()
            .with_context(|| format!("request to {} failed", url))?;

        if !response.status().is_success() {
            bail!("HTTP {} from {}", response.status(), url);
        }

        response
            .json()
            .with_context(|| format!("invalid response from {}", url))
    }

    /// Poll the compute engine until the task finishes; returns its analysis id.
    fn wait_for_analysis(&self, client: &Client, task_id: &str) -> anyhow::Result<String> {
        let url = self.server_url(&["api", "ce", "task"], "id", task_id)?;
        let attempts = self.max_attempts.max(1);

        for attempt in 1..=attempts {
            let body: CeTaskResponse = self.get(client, &url)?;
            debug!("Sonar task {} status {} (attempt {})", task_id, body.task.status, attempt);

            match body.task.status.as_str() {
                "SUCCESS" => {
                    return body
                        .task
                        .analysis_id
                        .ok_or_else(|| anyhow!("task {} has no analysis id", task_id));
                }
                "FAILED" | "CANCELED" => {
                    bail!("sonar task {} ended with status {}", task_id, body.task.status)
                }
                _ => thread::sleep(Duration::from_secs(self.poll_interval_secs)),
            }
        }

        bail!("sonar task {} did not finish after {} attempts", task_id, attempts)
    }

    /// Run the full check and return the quality gate status.
    pub fn check(&self, workspace: &Path) -> anyhow::Result<String> {
        let report_task = workspace.join(&self.check_dir).join(REPORT_TASK_FILE);
        let task_id = read_ce_task_id(&report_task)?;

        let client = Client::builder()
            .user_agent("pipewright")
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;

        let analysis_id = self.wait_for_analysis(&client, &task_id)?;
        let url = self.server_url(
            &["api", "qualitygates", "project_status"],
            "analysisId",
            &analysis_id,
        )?;
        let gate: QualityGateResponse = self.get(&client, &url)?;
        Ok(gate.project_status.status)
    }
}

impl StepExecutor for SonarCheckStep {
    fn run(&self, step: &str, ctx: &mut JobContext) -> Result<()> {
        let output = ctx.output.with_secrets([self.sonar_token.clone()]);
        let failed = |message: String| PipewrightError::StepExecutionError {
            step: step.to_string(),
            message: output.masker.mask(&message),
        };

        if self.sonar_server.is_empty() {
            return Err(failed("sonar_server is required".to_string()));
        }

        let status = self
            .check(&ctx.workspace)
            .map_err(|e| failed(format!("{:#}", e)))?;

        output.emit(&format!("Sonar quality gate status: {}", status));
        if status == "ERROR" {
            return Err(failed("sonar quality gate failed".to_string()));
        }
        Ok(())
    }
}
