//! Shared configuration for the MoltenGamepad control client.
//!
//! The crate resolves where the control socket lives and how the client
//! reports its own diagnostics. [`Config`] is a `clap` argument group so the
//! CLI can flatten it into its parser while environment variables provide the
//! next layer down.

use std::time::Duration;

use clap::Args;
use thiserror::Error;

mod defaults;
mod logging;
mod socket;

pub use defaults::{
    DEFAULT_LOG_FILTER, SOCKET_FILE_NAME, default_log_filter, default_log_format,
    default_socket_endpoint,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError};

/// Environment variable overriding the control socket location.
pub const SOCKET_ENV: &str = "MG_SOCKET_PATH";

/// Environment variable overriding the log filter.
pub const LOG_FILTER_ENV: &str = "MGCTL_LOG";

/// Connection and diagnostics settings for one client run.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Path to the MoltenGamepad control socket (or a `unix://`/`tcp://` URL).
    #[arg(
        short = 'S',
        long = "socket-path",
        env = SOCKET_ENV,
        value_name = "PATH"
    )]
    pub socket_path: Option<SocketEndpoint>,
    /// Tracing filter for client diagnostics (for example `debug`).
    #[arg(long, env = LOG_FILTER_ENV, default_value = DEFAULT_LOG_FILTER, value_name = "FILTER")]
    pub log_filter: String,
    /// Format used for client diagnostics on stderr.
    #[arg(long, default_value_t = LogFormat::Compact, value_name = "FORMAT")]
    pub log_format: LogFormat,
    /// Gives up waiting for outstanding requests after this many seconds.
    #[arg(long, value_name = "SECONDS")]
    pub wait_timeout: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: None,
            log_filter: default_log_filter().to_owned(),
            log_format: default_log_format(),
            wait_timeout: None,
        }
    }
}

impl Config {
    /// Returns the configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the bound on the shutdown wait, if any.
    #[must_use]
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout.map(Duration::from_secs)
    }

    /// Resolves the control socket, preferring an explicit override.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoEndpoint`] when no override was supplied and
    /// no runtime directory is available to derive the default from.
    pub fn resolve_endpoint(&self) -> Result<SocketEndpoint, ConfigError> {
        self.socket_path
            .clone()
            .or_else(default_socket_endpoint)
            .ok_or(ConfigError::NoEndpoint)
    }
}

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither an override nor a runtime directory was available.
    #[error("could not determine socket path; pass --socket-path or set XDG_RUNTIME_DIR")]
    NoEndpoint,
}
