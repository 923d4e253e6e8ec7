//! Rendering of received messages.
//!
//! The dispatcher only sees messages already correlated with a request id.
//! Removing completed ids from the pending registry is the receive loop's job.

use std::io::{self, Write};

use mgctl_protocol::{ArgCursor, Argument, Message, RequestId, address};
use serde::Serialize;

use crate::output::{Console, OutputFormat, Stream};

/// A message rendered for one output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Rendered {
    pub(crate) stream: Stream,
    pub(crate) text: String,
}

impl Rendered {
    const fn stdout(text: String) -> Self {
        Self {
            stream: Stream::Stdout,
            text,
        }
    }

    const fn stderr(text: String) -> Self {
        Self {
            stream: Stream::Stderr,
            text,
        }
    }
}

#[derive(Serialize)]
struct JsonMessage<'a> {
    id: RequestId,
    address: &'a str,
    arguments: &'a [Argument],
}

/// Turns decoded messages into user-visible output.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Dispatcher {
    format: OutputFormat,
}

impl Dispatcher {
    pub(crate) const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Renders `message` and writes it to the console. `cursor` holds the
    /// arguments after the request id.
    pub(crate) fn dispatch<W: Write, E: Write>(
        &self,
        message: &Message,
        id: RequestId,
        cursor: ArgCursor<'_>,
        console: &Console<W, E>,
    ) -> io::Result<()> {
        let rendered = self.render(message, id, cursor)?;
        console.write(rendered.stream, &rendered.text)
    }

    pub(crate) fn render(
        &self,
        message: &Message,
        id: RequestId,
        cursor: ArgCursor<'_>,
    ) -> io::Result<Rendered> {
        match self.format {
            OutputFormat::Human => Ok(render_human(message, cursor)),
            OutputFormat::Json => render_json(message, id),
        }
    }
}

fn render_human(message: &Message, mut cursor: ArgCursor<'_>) -> Rendered {
    if message.matches(address::TEXT) {
        let text = cursor.pop_str().unwrap_or_default();
        Rendered::stdout(format!("{text}\n"))
    } else if message.matches(address::ERROR) {
        let text = cursor.pop_str().unwrap_or_default();
        let path = cursor.pop_str().unwrap_or_default();
        let line = cursor.pop_int().unwrap_or(-1);
        Rendered::stderr(format!("{}\n", render_error(text, path, line)))
    } else {
        Rendered::stdout(render_generic(message.address(), cursor))
    }
}

/// Formats an error report, appending `(path)` or `(path:line)` when known.
pub(crate) fn render_error(text: &str, path: &str, line: i32) -> String {
    match (path.is_empty(), line >= 0) {
        (true, _) => text.to_owned(),
        (false, true) => format!("{text}({path}:{line})"),
        (false, false) => format!("{text}({path})"),
    }
}

/// Formats the address followed by every remaining argument and a newline.
fn render_generic(address: &str, mut cursor: ArgCursor<'_>) -> String {
    let mut line = format!("{address}: ");
    while let Some(argument) = cursor.pop_any() {
        let rendered = match argument {
            Argument::Int(value) => value.to_string(),
            Argument::Bool(value) => value.to_string(),
            Argument::Str(value) => format!("\"{value}\""),
        };
        line.push_str(&rendered);
        line.push(' ');
    }
    line.push('\n');
    line
}

fn render_json(message: &Message, id: RequestId) -> io::Result<Rendered> {
    let record = JsonMessage {
        id,
        address: message.address(),
        arguments: message.arguments().get(1..).unwrap_or_default(),
    };
    let mut text = serde_json::to_string(&record)?;
    text.push('\n');
    Ok(Rendered::stdout(text))
}
