//! Background loop reading responses from the peer.
//!
//! The loop is the only reader of the connection. It decodes each frame,
//! removes completed ids from the pending registry and hands every message
//! carrying a request id to the dispatcher, in arrival order. Whatever ends the loop, the registry is
//! closed on the way out so the shutdown wait never outlives the reader.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, Scope, ScopedJoinHandle};

use mgctl_protocol::{DecodeError, FrameError, FrameReader, Message, address, decode_packet};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;
use crate::output::Console;
use crate::pending::PendingRequests;

pub(crate) const RECEIVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::receiver");
const RECEIVER_THREAD_NAME: &str = "mgctl-receiver";

/// Failures that end the receive loop.
#[derive(Debug, Error)]
pub(crate) enum ReceiveError {
    #[error("invalid frame: {0}")]
    Frame(#[from] FrameError),
    #[error("invalid message: {0}")]
    Decode(#[from] DecodeError),
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}

/// Why the receive loop ended.
#[derive(Debug)]
pub(crate) enum ReceiverExit {
    /// The foreground closed the connection.
    Stopped,
    /// The peer closed the connection between frames.
    PeerClosed,
    /// A read, decode or output error.
    Failed(ReceiveError),
}

impl fmt::Display for ReceiverExit {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => formatter.write_str("receive loop stopped"),
            Self::PeerClosed => formatter.write_str("connection closed by peer"),
            Self::Failed(error) => write!(formatter, "receive loop failed: {error}"),
        }
    }
}

/// Reads frames until the connection ends.
pub(crate) struct ReceiveLoop<'a, R, W, E> {
    frames: FrameReader<R>,
    pending: &'a PendingRequests,
    dispatcher: Dispatcher,
    console: &'a Console<W, E>,
    shutdown: &'a AtomicBool,
}

impl<'a, R, W, E> ReceiveLoop<'a, R, W, E>
where
    R: Read,
    W: Write,
    E: Write,
{
    pub(crate) const fn new(
        reader: R,
        pending: &'a PendingRequests,
        dispatcher: Dispatcher,
        console: &'a Console<W, E>,
        shutdown: &'a AtomicBool,
    ) -> Self {
        Self {
            frames: FrameReader::new(reader),
            pending,
            dispatcher,
            console,
            shutdown,
        }
    }

    /// Runs until the connection ends, then closes the registry.
    pub(crate) fn run(mut self) -> ReceiverExit {
        let exit = self.pump();
        match &exit {
            ReceiverExit::Stopped => debug!(target: RECEIVER_TARGET, "receive loop stopped"),
            ReceiverExit::PeerClosed => info!(
                target: RECEIVER_TARGET,
                pending = self.pending.len(),
                "connection closed by peer"
            ),
            ReceiverExit::Failed(error) => warn!(
                target: RECEIVER_TARGET,
                error = %error,
                pending = self.pending.len(),
                "receive loop failed"
            ),
        }
        self.pending.close();
        exit
    }

    fn pump(&mut self) -> ReceiverExit {
        loop {
            let frame = match self.frames.read_frame() {
                Ok(frame) => frame,
                Err(_) if self.shutdown.load(Ordering::Acquire) => return ReceiverExit::Stopped,
                Err(FrameError::Closed) => return ReceiverExit::PeerClosed,
                Err(error) => return ReceiverExit::Failed(error.into()),
            };
            if let Err(error) = self.handle_frame(&frame) {
                return ReceiverExit::Failed(error);
            }
        }
    }

    fn handle_frame(&self, frame: &[u8]) -> Result<(), ReceiveError> {
        let messages = decode_packet(frame)?;
        debug!(
            target: RECEIVER_TARGET,
            bytes = frame.len(),
            messages = messages.len(),
            "frame received"
        );
        messages
            .iter()
            .try_for_each(|message| self.handle_message(message))
    }

    /// Messages without a leading integer id cannot be correlated and are
    /// skipped.
    fn handle_message(&self, message: &Message) -> Result<(), ReceiveError> {
        let Some((id, cursor)) = message.correlate() else {
            debug!(
                target: RECEIVER_TARGET,
                address = message.address(),
                "message carries no request id; skipped"
            );
            return Ok(());
        };
        if message.matches(address::DONE) {
            let found = self.pending.remove(id);
            debug!(target: RECEIVER_TARGET, %id, found, "request completed");
        }
        self.dispatcher
            .dispatch(message, id, cursor, self.console)
            .map_err(ReceiveError::Output)
    }
}

/// Starts `receive_loop` on a named thread inside `scope`.
pub(crate) fn spawn<'scope, R, W, E>(
    scope: &'scope Scope<'scope, '_>,
    receive_loop: ReceiveLoop<'scope, R, W, E>,
) -> io::Result<ScopedJoinHandle<'scope, ReceiverExit>>
where
    R: Read + Send + 'scope,
    W: Write + Send + 'scope,
    E: Write + Send + 'scope,
{
    thread::Builder::new()
        .name(RECEIVER_THREAD_NAME.to_owned())
        .spawn_scoped(scope, move || receive_loop.run())
}
