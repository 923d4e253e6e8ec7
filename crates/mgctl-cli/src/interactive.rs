//! Line-oriented command input.

use std::borrow::Cow;
use std::io::BufRead;

use tracing::warn;

use crate::errors::AppError;

const INPUT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::input");

/// Prefix of the line that ends interactive input.
pub(crate) const QUIT_COMMAND: &str = "quit";

/// What an input line asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputLine<'a> {
    Command(&'a str),
    Blank,
    Quit,
}

/// Classifies one line of input after trimming leading spaces and the line
/// terminator. Any line starting with `quit` ends input.
pub(crate) fn classify(line: &str) -> InputLine<'_> {
    let command = line
        .trim_start_matches(' ')
        .trim_end_matches(['\n', '\r']);
    if command.starts_with(QUIT_COMMAND) {
        InputLine::Quit
    } else if command.trim().is_empty() {
        InputLine::Blank
    } else {
        InputLine::Command(command)
    }
}

/// Reads commands from `input` until `quit` or end of input, passing each to
/// `submit`. Returns the number of commands submitted.
///
/// Bytes that are not valid UTF-8 are replaced with U+FFFD.
pub(crate) fn run_interactive<R, F>(mut input: R, mut submit: F) -> Result<usize, AppError>
where
    R: BufRead,
    F: FnMut(&str) -> Result<(), AppError>,
{
    let mut raw = Vec::new();
    let mut submitted = 0;
    loop {
        raw.clear();
        if input
            .read_until(b'\n', &mut raw)
            .map_err(AppError::ReadInput)?
            == 0
        {
            break;
        }
        let line = String::from_utf8_lossy(&raw);
        if matches!(line, Cow::Owned(_)) {
            warn!(target: INPUT_TARGET, "input line is not valid UTF-8; invalid bytes replaced");
        }
        match classify(&line) {
            InputLine::Quit => break,
            InputLine::Blank => {}
            InputLine::Command(command) => {
                submit(command)?;
                submitted += 1;
            }
        }
    }
    Ok(submitted)
}
