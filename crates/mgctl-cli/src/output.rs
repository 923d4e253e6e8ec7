//! Output streams shared between the foreground and the receive loop.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use clap::ValueEnum;

/// How received messages are rendered.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text lines for people.
    #[default]
    Human,
    /// One JSON object per received message.
    Json,
}

/// Destination stream for a rendered line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Stream {
    Stdout,
    Stderr,
}

struct Streams<W, E> {
    stdout: W,
    stderr: E,
}

/// Serialises writes from both threads onto stdout and stderr.
///
/// Each call writes and flushes under one lock so lines from the two threads
/// never interleave mid-line.
pub(crate) struct Console<W, E> {
    streams: Mutex<Streams<W, E>>,
}

impl<W: Write, E: Write> Console<W, E> {
    pub(crate) const fn new(stdout: W, stderr: E) -> Self {
        Self {
            streams: Mutex::new(Streams { stdout, stderr }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Streams<W, E>> {
        self.streams.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes pre-rendered text to `stream`.
    pub(crate) fn write(&self, stream: Stream, text: &str) -> io::Result<()> {
        let mut streams = self.lock();
        match stream {
            Stream::Stdout => write_flushed(&mut streams.stdout, text),
            Stream::Stderr => write_flushed(&mut streams.stderr, text),
        }
    }

    /// Writes a formatted line to stdout.
    pub(crate) fn out_line(&self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.write(Stream::Stdout, &format!("{args}\n"))
    }

    /// Writes a formatted line to stderr.
    pub(crate) fn err_line(&self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.write(Stream::Stderr, &format!("{args}\n"))
    }
}

fn write_flushed<T: Write>(sink: &mut T, text: &str) -> io::Result<()> {
    sink.write_all(text.as_bytes())?;
    sink.flush()
}

#[cfg(test)]
impl<W, E> Console<W, E> {
    pub(crate) fn into_inner(self) -> (W, E) {
        let streams = self
            .streams
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        (streams.stdout, streams.stderr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_reach_their_stream() {
        let console = Console::new(Vec::new(), Vec::new());
        console.out_line(format_args!("hello {}", 1)).expect("stdout");
        console.err_line(format_args!("oops")).expect("stderr");
        console.write(Stream::Stdout, "raw").expect("raw stdout");

        let (stdout, stderr) = console.into_inner();
        assert_eq!(String::from_utf8(stdout).expect("utf8"), "hello 1\nraw");
        assert_eq!(String::from_utf8(stderr).expect("utf8"), "oops\n");
    }
}
