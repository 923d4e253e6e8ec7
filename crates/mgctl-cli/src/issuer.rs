//! Foreground request construction and transmission.

use std::io::{self, Write};

use mgctl_protocol::{
    EncodeError, FrameError, Request, RequestId, address, encode_frame,
};
use thiserror::Error;
use tracing::debug;

use crate::pending::PendingRequests;

const ISSUER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::issuer");

/// Failures raised while issuing a request.
#[derive(Debug, Error)]
pub(crate) enum IssueError {
    #[error("failed to encode {address} request: {source}")]
    Encode {
        address: String,
        #[source]
        source: EncodeError,
    },
    #[error("request {id} cannot be framed: {source}")]
    Frame {
        id: RequestId,
        #[source]
        source: FrameError,
    },
    #[error("failed to send request {id}: {source}")]
    Send {
        id: RequestId,
        #[source]
        source: io::Error,
    },
    #[error("request ids exhausted")]
    IdsExhausted,
}

impl IssueError {
    /// Returns true when no further request can be sent.
    pub(crate) const fn is_fatal(&self) -> bool {
        matches!(self, Self::Send { .. } | Self::IdsExhausted)
    }
}

/// Allocates ids and writes requests to the connection.
///
/// Each id is registered as pending before its bytes are written, so a
/// completion can never arrive for an id the registry does not know.
pub(crate) struct RequestIssuer<'a, W> {
    writer: W,
    pending: &'a PendingRequests,
    next_id: Option<RequestId>,
}

impl<'a, W: Write> RequestIssuer<'a, W> {
    pub(crate) const fn new(writer: W, pending: &'a PendingRequests) -> Self {
        Self {
            writer,
            pending,
            next_id: Some(RequestId::FIRST),
        }
    }

    /// Sends `request` under a fresh id and returns the id.
    ///
    /// The id counter advances even when the request cannot be encoded, so
    /// ids are never reused.
    pub(crate) fn issue(&mut self, request: &Request) -> Result<RequestId, IssueError> {
        let id = self.next_id.ok_or(IssueError::IdsExhausted)?;
        self.next_id = id.next();

        let payload = request.encode(id).map_err(|source| IssueError::Encode {
            address: request.address().to_owned(),
            source,
        })?;
        let frame = encode_frame(&payload).map_err(|source| IssueError::Frame { id, source })?;

        self.pending.add(id);
        if let Err(source) = self
            .writer
            .write_all(&frame)
            .and_then(|()| self.writer.flush())
        {
            self.pending.remove(id);
            return Err(IssueError::Send { id, source });
        }
        debug!(
            target: ISSUER_TARGET,
            %id,
            address = request.address(),
            bytes = frame.len(),
            "request sent"
        );
        Ok(id)
    }

    /// Subscribes to device plug and player slot events.
    pub(crate) fn subscribe_events(&mut self) -> Result<(), IssueError> {
        for channel in [address::PLUG_CHANNEL, address::SLOT_CHANNEL] {
            self.issue(&Request::listen(channel, true))?;
        }
        Ok(())
    }

    /// Asks the peer to execute `command`.
    pub(crate) fn eval(&mut self, command: &str) -> Result<RequestId, IssueError> {
        self.issue(&Request::eval(command))
    }
}
