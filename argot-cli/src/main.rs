//! CLI entry point for the argot toolbox.
//!
//! Dispatches the process arguments into the toolbox container, prints the
//! resulting lines to stdout, and maps failures to exit codes: help and
//! version displays exit 0, usage errors exit 2, and anything else exits 1.

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};

use argot_cli::{
    cli::{CliError, render_output, run_cli},
    logging::{self, LoggingError},
};
use argot_core::DispatchError;
use tracing::{error, field};

const USAGE_EXIT: u8 = 2;

/// Run the toolbox on the process arguments, then render and flush the
/// output lines.
fn try_main() -> Result<()> {
    let lines = run_cli(std::env::args().skip(1)).context("failed to execute command")?;
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    render_output(&lines, &mut writer).context("failed to render output")?;
    writer.flush().context("failed to flush output")?;
    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        report_logging_init_error(&err);
        return ExitCode::FAILURE;
    }

    let Err(err) = try_main() else {
        return ExitCode::SUCCESS;
    };

    let cli_error = err.downcast_ref::<CliError>();
    if let Some(CliError::Dispatch(DispatchError::Parse { source })) = cli_error {
        // Help goes to stdout, usage errors to stderr.
        if let Err(print_err) = source.print() {
            error!(error = %print_err, "failed to print usage");
        }
        return if source.use_stderr() {
            ExitCode::from(USAGE_EXIT)
        } else {
            ExitCode::SUCCESS
        };
    }

    let code_field = cli_error
        .and_then(CliError::dispatch_code)
        .map(|code| field::display(code.as_str()));
    let spec_code_field = cli_error
        .and_then(CliError::spec_code)
        .map(|code| field::display(code.as_str()));

    error!(
        error = %format_args!("{err:#}"),
        code = code_field,
        spec_code = spec_code_field,
        "command execution failed"
    );
    ExitCode::FAILURE
}

#[expect(
    clippy::print_stderr,
    reason = "Emit one-off diagnostic before tracing is initialized"
)]
fn report_logging_init_error(err: &LoggingError) {
    eprintln!("failed to initialize logging: {err}");
}
