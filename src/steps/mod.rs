//! Step decoding and execution.
//!
//! A job is a list of [`Step`]s. Each step carries a type tag and a raw
//! payload; [`StepKind::from_step`] decodes the payload into one of the
//! typed executors in [`kinds`], and the [`StepExecutor`] runs it against
//! the run's [`JobContext`].
//!
//! # Example
//!
//! ```no_run
//! use pipewright::steps::{JobContext, Step, StepKind};
//!
//! let step = Step::new("build", "shell", serde_yaml::from_str("scripts: [make]").unwrap());
//! let mut ctx = JobContext::new("/tmp/ws", "/tmp/storage");
//!
//! let kind = StepKind::from_step(&step).unwrap();
//! kind.executor().run(&step.name, &mut ctx).unwrap();
//! ```

pub mod context;
pub mod executor;
pub mod kind;
pub mod kinds;
pub mod step;

pub use context::JobContext;
pub use executor::{format_duration, StepExecutor, StepReport, StepStatus};
pub use kind::StepKind;
pub use step::Step;
