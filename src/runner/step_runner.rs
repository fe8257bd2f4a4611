//! Sequential step execution with on-failure semantics.

use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::{error, info};

use crate::error::{PipewrightError, Result};
use crate::runner::dispatch::{KindDispatcher, StepDispatch};
use crate::steps::{JobContext, Step, StepReport, StepStatus};

/// Progress events emitted while a run advances.
#[derive(Debug)]
pub enum RunProgress<'a> {
    /// A step is about to be dispatched.
    StepStarting {
        name: &'a str,
        index: usize,
        total: usize,
    },
    /// A step was dispatched and returned.
    StepFinished { report: &'a StepReport },
    /// A step was not dispatched because an earlier step failed.
    StepSkipped { name: &'a str },
}

/// Everything known about a finished run.
#[derive(Debug)]
pub struct RunOutcome {
    /// Whether any dispatched step failed.
    pub failed: bool,

    /// Error of the most recently failed step.
    ///
    /// A later failure replaces an earlier one, and a later success leaves it
    /// in place.
    pub last_error: Option<PipewrightError>,

    /// One entry per step, in list order.
    pub reports: Vec<StepReport>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunOutcome {
    /// Collapse into the run's return value: the last error, if any.
    pub fn into_result(self) -> Result<()> {
        match self.last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Number of reports with `status`.
    pub fn count(&self, status: StepStatus) -> usize {
        self.reports.iter().filter(|r| r.status == status).count()
    }
}

/// Runs a job's steps one at a time, in order.
///
/// Once a step fails, later steps run only when marked `on_failure`.
#[derive(Debug, Default)]
pub struct StepRunner<D = KindDispatcher> {
    dispatcher: D,
}

impl StepRunner<KindDispatcher> {
    /// Runner over the built-in step kinds.
    pub fn new() -> Self {
        Self {
            dispatcher: KindDispatcher,
        }
    }
}

impl<D: StepDispatch> StepRunner<D> {
    /// Runner over a custom dispatcher.
    pub fn with_dispatcher(dispatcher: D) -> Self {
        Self { dispatcher }
    }

    /// Run every step.
    pub fn run_steps(&self, steps: &[Step], ctx: &mut JobContext) -> RunOutcome {
        self.run_with_progress(steps, ctx, |_| {})
    }

    /// Run every step, reporting progress as it happens.
    pub fn run_with_progress(
        &self,
        steps: &[Step],
        ctx: &mut JobContext,
        mut on_progress: impl FnMut(RunProgress<'_>),
    ) -> RunOutcome {
        let started_at = Utc::now();
        let total = steps.len();
        let mut has_failed = false;
        let mut last_error = None;
        let mut reports = Vec::with_capacity(total);

        for (index, step) in steps.iter().enumerate() {
            if has_failed && !step.on_failure {
                on_progress(RunProgress::StepSkipped { name: &step.name });
                reports.push(StepReport {
                    name: step.name.clone(),
                    step_type: step.step_type.clone(),
                    status: StepStatus::Skipped,
                    duration: Default::default(),
                    error: None,
                });
                continue;
            }

            on_progress(RunProgress::StepStarting {
                name: &step.name,
                index,
                total,
            });

            let step_start = Instant::now();
            let result = self.dispatcher.dispatch(step, ctx);
            let duration = step_start.elapsed();

            let report = match result {
                Ok(()) => StepReport {
                    name: step.name.clone(),
                    step_type: step.step_type.clone(),
                    status: StepStatus::Completed,
                    duration,
                    error: None,
                },
                Err(e) => {
                    error!("Failed to execute step '{}': {}", step.name, e);
                    let report = StepReport {
                        name: step.name.clone(),
                        step_type: step.step_type.clone(),
                        status: StepStatus::Failed,
                        duration,
                        error: Some(e.to_string()),
                    };
                    has_failed = true;
                    last_error = Some(e);
                    report
                }
            };

            on_progress(RunProgress::StepFinished { report: &report });
            reports.push(report);
        }

        let outcome = RunOutcome {
            failed: has_failed,
            last_error,
            reports,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            "Ran {} step(s): {} completed, {} failed, {} skipped",
            total,
            outcome.count(StepStatus::Completed),
            outcome.count(StepStatus::Failed),
            outcome.count(StepStatus::Skipped)
        );
        outcome
    }
}

/// Run `steps` with the built-in kinds and return the last step error, if any.
pub fn run_steps(steps: &[Step], ctx: &mut JobContext) -> Result<()> {
    StepRunner::new().run_steps(steps, ctx).into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Dispatcher that records calls and fails the steps it was told to.
    #[derive(Default)]
    struct Recording {
        failures: HashMap<String, String>,
        calls: RefCell<Vec<String>>,
    }

    impl Recording {
        fn failing(names: &[(&str, &str)]) -> Self {
            Self {
                failures: names
                    .iter()
                    .map(|(n, m)| (n.to_string(), m.to_string()))
                    .collect(),
                calls: RefCell::default(),
            }
        }
    }

    impl StepDispatch for Recording {
        fn dispatch(&self, step: &Step, _ctx: &mut JobContext) -> Result<()> {
            self.calls.borrow_mut().push(step.name.clone());
            match self.failures.get(&step.name) {
                Some(message) => Err(PipewrightError::StepExecutionError {
                    step: step.name.clone(),
                    message: message.clone(),
                }),
                None => Ok(()),
            }
        }
    }

    fn step(name: &str) -> Step {
        Step::new(name, "shell", serde_yaml::Value::Null)
    }

    fn ctx() -> JobContext {
        JobContext::new("/ws", "/storage")
    }

    #[test]
    fn all_steps_run_when_nothing_fails() {
        let runner = StepRunner::with_dispatcher(Recording::default());
        let outcome = runner.run_steps(&[step("a"), step("b")], &mut ctx());

        assert!(!outcome.failed);
        assert!(outcome.last_error.is_none());
        assert_eq!(*runner.dispatcher.calls.borrow(), vec!["a", "b"]);
        assert_eq!(outcome.count(StepStatus::Completed), 2);
    }

    #[test]
    fn on_failure_step_runs_and_first_error_is_returned() {
        let runner = StepRunner::with_dispatcher(Recording::failing(&[("b", "E1")]));
        let steps = [step("a"), step("b"), step("c").always_run()];

        let outcome = runner.run_steps(&steps, &mut ctx());

        assert_eq!(*runner.dispatcher.calls.borrow(), vec!["a", "b", "c"]);
        assert!(outcome.failed);
        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.to_string(), "Step 'b' failed: E1");
    }

    #[test]
    fn steps_after_failure_are_skipped() {
        let runner = StepRunner::with_dispatcher(Recording::failing(&[("a", "boom")]));
        let steps = [step("a"), step("b"), step("c")];

        let outcome = runner.run_steps(&steps, &mut ctx());

        assert_eq!(*runner.dispatcher.calls.borrow(), vec!["a"]);
        let statuses: Vec<_> = outcome.reports.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![StepStatus::Failed, StepStatus::Skipped, StepStatus::Skipped]
        );
    }

    #[test]
    fn later_failure_overwrites_earlier_error() {
        let runner =
            StepRunner::with_dispatcher(Recording::failing(&[("a", "first"), ("c", "second")]));
        let steps = [step("a"), step("b"), step("c").always_run()];

        let outcome = runner.run_steps(&steps, &mut ctx());

        assert_eq!(*runner.dispatcher.calls.borrow(), vec!["a", "c"]);
        assert!(outcome.into_result().unwrap_err().to_string().contains("second"));
    }

    #[test]
    fn later_success_keeps_recorded_error() {
        let runner = StepRunner::with_dispatcher(Recording::failing(&[("a", "first")]));
        let steps = [step("a"), step("cleanup").always_run()];

        let outcome = runner.run_steps(&steps, &mut ctx());

        assert!(outcome.failed);
        assert!(outcome.into_result().unwrap_err().to_string().contains("first"));
    }

    #[test]
    fn unknown_type_fails_step_without_aborting_run() {
        let steps = [
            Step::new("mystery", "helm", serde_yaml::Value::Null),
            Step::new("cleanup", "shell", serde_yaml::Value::Null).always_run(),
        ];

        let outcome = StepRunner::new().run_steps(&steps, &mut ctx());

        assert_eq!(outcome.reports[0].status, StepStatus::Failed);
        assert_eq!(outcome.reports[1].status, StepStatus::Completed);
        assert!(matches!(
            outcome.last_error,
            Some(PipewrightError::StepTypeUnknown { .. })
        ));
    }

    #[test]
    fn progress_reports_skips_without_starting_them() {
        let runner = StepRunner::with_dispatcher(Recording::failing(&[("a", "boom")]));
        let mut events = Vec::new();

        runner.run_with_progress(&[step("a"), step("b")], &mut ctx(), |event| {
            events.push(match event {
                RunProgress::StepStarting { name, .. } => format!("start {name}"),
                RunProgress::StepFinished { report } => format!("finish {}", report.name),
                RunProgress::StepSkipped { name } => format!("skip {name}"),
            });
        });

        assert_eq!(events, vec!["start a", "finish a", "skip b"]);
    }

    #[test]
    fn empty_run_succeeds() {
        let outcome = StepRunner::new().run_steps(&[], &mut ctx());
        assert!(outcome.started_at <= outcome.finished_at);
        assert!(outcome.into_result().is_ok());
    }
}
