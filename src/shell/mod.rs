//! Shell command execution and live output redaction.

pub mod command;
pub mod redactor;

pub use command::{
    execute_streaming, parse_env_entries, run_checked, run_script, CommandOptions, CommandResult,
};
pub use redactor::{stdout_sink, OutputChannel, OutputRedactor, SharedSink};
