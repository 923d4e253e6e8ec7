//! CLI entrypoint for the MoltenGamepad control client.
//!
//! The binary delegates to [`mgctl_cli::run`], which parses arguments,
//! connects to the control socket and streams requests and replies.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    mgctl_cli::run(
        std::env::args_os(),
        io::stdin().lock(),
        io::stdout(),
        io::stderr(),
    )
}
