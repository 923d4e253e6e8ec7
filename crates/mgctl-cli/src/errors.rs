//! Error types and exit-code mapping for the CLI runtime.

use std::io;
use std::process::ExitCode;

use mgctl_config::ConfigError;
use thiserror::Error;

use crate::issuer::IssueError;
use crate::telemetry::TelemetryError;
use crate::transport::ConnectError;

/// Process exit statuses distinguishing the ways a run can end.
pub(crate) mod exit_status {
    /// Help or version output was shown, or every request completed.
    pub(crate) const SUCCESS: u8 = 0;
    /// An unexpected IO failure.
    pub(crate) const FAILURE: u8 = 1;
    /// Command-line arguments were rejected.
    pub(crate) const USAGE: u8 = 2;
    /// The receive loop stopped while requests were still pending.
    pub(crate) const OUTSTANDING: u8 = 3;
    /// The wait for outstanding requests exceeded `--wait-timeout`.
    pub(crate) const TIMED_OUT: u8 = 4;
    /// No control socket could be resolved.
    pub(crate) const NO_ENDPOINT: u8 = 255;
    /// The local socket could not be created.
    pub(crate) const SOCKET: u8 = 254;
    /// Connecting to the control socket failed.
    pub(crate) const CONNECT: u8 = 253;
}

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Connect(#[from] ConnectError),
    #[error("failed to duplicate connection handle: {0}")]
    CloneConnection(io::Error),
    #[error("failed to start receive loop: {0}")]
    SpawnReceiver(io::Error),
    #[error("receive loop panicked")]
    ReceiverPanicked,
    #[error(transparent)]
    Issue(#[from] IssueError),
    #[error("failed to read command input: {0}")]
    ReadInput(io::Error),
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
    #[error("{reason}; {count} request(s) never completed: {ids}")]
    RequestsOutstanding {
        reason: String,
        count: usize,
        ids: String,
    },
    #[error("timed out waiting for {count} request(s) to complete: {ids}")]
    WaitTimedOut { count: usize, ids: String },
}

impl AppError {
    /// Maps the error onto the process exit status.
    pub(crate) fn exit_code(&self) -> ExitCode {
        let status = match self {
            Self::CliUsage(_) => exit_status::USAGE,
            Self::Config(ConfigError::NoEndpoint) => exit_status::NO_ENDPOINT,
            Self::Connect(ConnectError::Socket { .. }) => exit_status::SOCKET,
            Self::Connect(_) => exit_status::CONNECT,
            Self::RequestsOutstanding { .. } => exit_status::OUTSTANDING,
            Self::WaitTimedOut { .. } => exit_status::TIMED_OUT,
            Self::Telemetry(_)
            | Self::CloneConnection(_)
            | Self::SpawnReceiver(_)
            | Self::ReceiverPanicked
            | Self::Issue(_)
            | Self::ReadInput(_)
            | Self::WriteOutput(_) => exit_status::FAILURE,
        };
        ExitCode::from(status)
    }
}

/// Formats request ids as a comma-separated list.
pub(crate) fn join_ids<T: std::fmt::Display>(ids: &[T]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::no_endpoint(AppError::Config(ConfigError::NoEndpoint), exit_status::NO_ENDPOINT)]
    #[case::socket(
        AppError::Connect(ConnectError::Socket {
            endpoint: "unix:///tmp/mg.sock".into(),
            source: io::Error::other("no descriptors"),
        }),
        exit_status::SOCKET
    )]
    #[case::connect(
        AppError::Connect(ConnectError::Connect {
            endpoint: "unix:///tmp/mg.sock".into(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        }),
        exit_status::CONNECT
    )]
    #[case::outstanding(
        AppError::RequestsOutstanding { reason: "connection closed".into(), count: 1, ids: "3".into() },
        exit_status::OUTSTANDING
    )]
    #[case::timeout(AppError::WaitTimedOut { count: 1, ids: "3".into() }, exit_status::TIMED_OUT)]
    fn exit_codes_are_distinct(#[case] error: AppError, #[case] expected: u8) {
        assert_eq!(error.exit_code(), ExitCode::from(expected));
    }

    #[test]
    fn joins_ids_in_order() {
        assert_eq!(join_ids(&[1, 2, 5]), "1, 2, 5");
        assert_eq!(join_ids::<i32>(&[]), "");
    }
}
