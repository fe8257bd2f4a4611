//! Routing a step to the executor for its kind.

use tracing::debug;

use crate::error::{PipewrightError, Result};
use crate::steps::{JobContext, Step, StepKind};

/// Runs one step. [`StepRunner`](super::StepRunner) only knows this seam.
pub trait StepDispatch {
    /// Run `step` to completion inside `ctx`.
    fn dispatch(&self, step: &Step, ctx: &mut JobContext) -> Result<()>;
}

/// Dispatcher over the closed [`StepKind`] set.
#[derive(Debug, Clone, Copy, Default)]
pub struct KindDispatcher;

impl StepDispatch for KindDispatcher {
    fn dispatch(&self, step: &Step, ctx: &mut JobContext) -> Result<()> {
        let kind = StepKind::from_step(step)?;
        debug!("Dispatching step '{}' as {}", step.name, kind.type_name());

        kind.executor()
            .run(&step.name, ctx)
            .map_err(|e| into_step_error(&step.name, e))
    }
}

/// Executor failures surface as `StepExecutionError`, keeping the cause text.
fn into_step_error(step: &str, err: PipewrightError) -> PipewrightError {
    match err {
        e @ (PipewrightError::StepExecutionError { .. }
        | PipewrightError::StepTypeUnknown { .. }
        | PipewrightError::InvalidStepSpec { .. }) => e,
        other => PipewrightError::StepExecutionError {
            step: step.to_string(),
            message: other.to_string(),
        },
    }
}
