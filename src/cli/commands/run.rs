//! Run command implementation.
//!
//! The `pipewright run` command executes the steps of a job.

use tracing::info;

use crate::cli::args::RunArgs;
use crate::config::{load_job, AgentConfig};
use crate::error::Result;
use crate::runner::{RunProgress, StepRunner};
use crate::steps::JobContext;

use super::dispatcher::{Command, CommandResult};
use super::display::{step_line, totals_line, Theme};

/// The run command implementation.
pub struct RunCommand<'a> {
    config: &'a AgentConfig,
    theme: &'a Theme,
    args: RunArgs,
}

impl<'a> RunCommand<'a> {
    /// Create a new run command.
    pub fn new(config: &'a AgentConfig, theme: &'a Theme, args: RunArgs) -> Self {
        Self {
            config,
            theme,
            args,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &RunArgs {
        &self.args
    }
}

impl Command for RunCommand<'_> {
    fn execute(&self) -> Result<CommandResult> {
        let job = load_job(&self.args.job)?;
        std::fs::create_dir_all(&job.workspace)?;
        let mut ctx = JobContext::from_job(&job, &self.config.storage_path);

        info!(
            "Running {} step(s) in {}",
            job.steps.len(),
            job.workspace.display()
        );

        let runner = StepRunner::new();
        let outcome = runner.run_with_progress(&job.steps, &mut ctx, |event| {
            if let RunProgress::StepStarting { name, index, total } = event {
                step_header(self.theme, name, index, total);
            }
        });

        println!();
        for report in &outcome.reports {
            println!("{}", step_line(self.theme, report));
        }
        println!(
            "\n{}",
            totals_line(
                self.theme,
                &outcome.reports,
                outcome.finished_at - outcome.started_at
            )
        );

        match outcome.into_result() {
            Ok(()) => Ok(CommandResult::success()),
            Err(e) => {
                eprintln!("{}", self.theme.error.apply_to(format!("Error: {}", e)));
                Ok(CommandResult::failure(1))
            }
        }
    }
}

fn step_header(theme: &Theme, name: &str, index: usize, total: usize) {
    println!(
        "{} {}",
        theme.dim.apply_to(format!("[{}/{}]", index + 1, total)),
        theme.header.apply_to(name)
    );
}
