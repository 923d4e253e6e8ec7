//! One connected session: receive loop, foreground requests, shutdown.

use std::io::{BufRead, Write};
use std::sync::atomic::AtomicBool;
use std::thread;

use tracing::info;

use crate::cli::Cli;
use crate::dispatch::Dispatcher;
use crate::errors::AppError;
use crate::interactive::run_interactive;
use crate::issuer::RequestIssuer;
use crate::output::{Console, OutputFormat};
use crate::pending::PendingRequests;
use crate::receiver::{self, ReceiveLoop};
use crate::shutdown::{self, ShutdownCoordinator};
use crate::transport::Connection;

const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Runs the session over an established connection.
///
/// The receive loop runs on a scoped thread and is always joined before this
/// returns. A fatal foreground error closes the connection without waiting
/// for outstanding requests.
pub(crate) fn run_session<R, W, E>(
    cli: &Cli,
    connection: Connection,
    input: R,
    console: &Console<W, E>,
) -> Result<(), AppError>
where
    R: BufRead,
    W: Write + Send,
    E: Write + Send,
{
    let reader = connection
        .try_clone()
        .map_err(AppError::CloneConnection)?;
    let writer = connection
        .try_clone()
        .map_err(AppError::CloneConnection)?;
    let pending = PendingRequests::new();
    let shutdown_flag = AtomicBool::new(false);
    let coordinator = ShutdownCoordinator::new(
        &pending,
        &shutdown_flag,
        connection,
        cli.config.wait_timeout(),
    );

    thread::scope(|scope| {
        let receive_loop = ReceiveLoop::new(
            reader,
            &pending,
            Dispatcher::new(cli.output),
            console,
            &shutdown_flag,
        );
        let handle = match receiver::spawn(scope, receive_loop) {
            Ok(handle) => handle,
            Err(error) => {
                coordinator.abort();
                return Err(AppError::SpawnReceiver(error));
            }
        };

        let mut foreground = Foreground {
            issuer: RequestIssuer::new(writer, &pending),
            console,
            format: cli.output,
        };
        let result = foreground.run(cli, input);
        let drain = if result.is_ok() {
            Some(coordinator.finish())
        } else {
            coordinator.abort();
            None
        };

        let exit = handle.join().map_err(|_| AppError::ReceiverPanicked)?;
        info!(target: SESSION_TARGET, exit = %exit, "session finished");
        result?;
        drain.map_or(Ok(()), |settled| shutdown::outcome(settled, &exit))
    })
}

/// The foreground half of a session: subscriptions, `--exec` commands and
/// interactive input.
struct Foreground<'a, S, W, E> {
    issuer: RequestIssuer<'a, S>,
    console: &'a Console<W, E>,
    format: OutputFormat,
}

impl<S, W, E> Foreground<'_, S, W, E>
where
    S: Write,
    W: Write,
    E: Write,
{
    fn run<R: BufRead>(&mut self, cli: &Cli, input: R) -> Result<(), AppError> {
        self.issuer.subscribe_events()?;
        for command in &cli.exec {
            self.status(&format!("Running: {command}"))?;
            self.submit(command)?;
        }
        if cli.interactive {
            let submitted = run_interactive(input, |command| self.submit(command))?;
            info!(target: SESSION_TARGET, submitted, "interactive input finished");
        }
        Ok(())
    }

    /// Sends one command; failures that leave the connection usable are
    /// reported and skipped.
    fn submit(&mut self, command: &str) -> Result<(), AppError> {
        match self.issuer.eval(command) {
            Ok(_) => Ok(()),
            Err(error) if !error.is_fatal() => self
                .console
                .err_line(format_args!("{error}"))
                .map_err(AppError::WriteOutput),
            Err(error) => Err(error.into()),
        }
    }

    /// Progress lines are for people; JSON output keeps stdout machine-readable.
    fn status(&self, line: &str) -> Result<(), AppError> {
        status_line(self.console, self.format, line)
    }
}

/// Writes a progress line in human output mode and logs it otherwise.
pub(crate) fn status_line<W: Write, E: Write>(
    console: &Console<W, E>,
    format: OutputFormat,
    line: &str,
) -> Result<(), AppError> {
    match format {
        OutputFormat::Human => console
            .out_line(format_args!("{line}"))
            .map_err(AppError::WriteOutput),
        OutputFormat::Json => {
            info!(target: SESSION_TARGET, "{line}");
            Ok(())
        }
    }
}
