//! Pipewright CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use pipewright::cli::commands::display::Theme;
use pipewright::cli::{Cli, CommandDispatcher};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
///
/// Logs go to stderr; step output owns stdout.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("pipewright=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pipewright=info"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("Pipewright starting with args: {:?}", cli);

    let theme = Theme::detect(cli.no_color);
    let result = CommandDispatcher::from_cli(&cli, theme.clone())
        .and_then(|dispatcher| dispatcher.dispatch(&cli));

    match result {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            eprintln!("{}", theme.error.apply_to(format!("Error: {}", e)));
            ExitCode::from(1)
        }
    }
}
