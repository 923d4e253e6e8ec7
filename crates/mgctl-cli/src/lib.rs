//! Control client runtime for MoltenGamepad.
//!
//! The module owns argument parsing, endpoint resolution and the connected
//! session. The runtime takes its input and output streams as parameters so
//! it can be exercised from the binary entrypoint and from tests alike.

use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use mgctl_config::SocketEndpoint;

mod cli;
mod dispatch;
mod errors;
mod interactive;
mod issuer;
mod output;
mod pending;
mod receiver;
mod session;
mod shutdown;
mod telemetry;
mod transport;

#[cfg(all(test, unix))]
mod tests;

use cli::Cli;
use errors::{AppError, exit_status};
use output::{Console, Stream};
use session::{run_session, status_line};

/// Name printed by `--version`.
const PROGRAM_NAME: &str = "moltengamepadctl";

/// Runs the client with the provided arguments and IO handles.
///
/// `input` is only read in interactive mode. Diagnostics from the tracing
/// subscriber go to the process stderr, not to `stderr`.
#[must_use]
pub fn run<I, R, W, E>(args: I, input: R, stdout: W, stderr: E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write + Send,
    E: Write + Send,
{
    let console = Console::new(stdout, stderr);
    run_with_console(args, input, &console).map_or_else(
        |error| {
            let _ = console.err_line(format_args!("{error}"));
            error.exit_code()
        },
        |()| ExitCode::from(exit_status::SUCCESS),
    )
}

fn run_with_console<I, R, W, E>(args: I, input: R, console: &Console<W, E>) -> Result<(), AppError>
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write + Send,
    E: Write + Send,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) if error.kind() == ErrorKind::DisplayHelp => {
            return console
                .write(Stream::Stdout, &error.render().to_string())
                .map_err(AppError::WriteOutput);
        }
        Err(error) => return Err(AppError::CliUsage(error)),
    };

    if cli.version {
        return console
            .out_line(format_args!(
                "{PROGRAM_NAME} version {}",
                env!("CARGO_PKG_VERSION")
            ))
            .map_err(AppError::WriteOutput);
    }

    telemetry::initialise(&cli.config)?;
    let endpoint = cli.config.resolve_endpoint()?;
    status_line(
        console,
        cli.output,
        &format!("connecting to {}  ... ", endpoint_label(&endpoint)),
    )?;
    let connection = transport::connect(&endpoint)?;
    run_session(&cli, connection, input, console)
}

/// Unix endpoints are shown as their socket path.
fn endpoint_label(endpoint: &SocketEndpoint) -> String {
    endpoint
        .unix_path()
        .map_or_else(|| endpoint.to_string(), ToString::to_string)
}
