//! Step execution orchestration.

pub mod dispatch;
pub mod step_runner;

pub use dispatch::{KindDispatcher, StepDispatch};
pub use step_runner::{run_steps, RunOutcome, RunProgress, StepRunner};
