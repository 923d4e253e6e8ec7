//! Command-line interface definition.

use clap::Parser;
use mgctl_config::Config;

use crate::output::OutputFormat;

/// Sends commands to a running MoltenGamepad instance and prints its replies.
#[derive(Parser, Debug)]
#[command(name = "moltengamepadctl", disable_version_flag = true)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) config: Config,
    /// Sends a command to MoltenGamepad. May be repeated.
    #[arg(short = 'e', long = "exec", value_name = "COMMAND")]
    pub(crate) exec: Vec<String>,
    /// Reads and sends commands from standard input until `quit`.
    #[arg(short = 'i', long)]
    pub(crate) interactive: bool,
    /// Controls how received messages are rendered.
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub(crate) output: OutputFormat,
    /// Displays the version string.
    #[arg(short = 'v', long)]
    pub(crate) version: bool,
}
