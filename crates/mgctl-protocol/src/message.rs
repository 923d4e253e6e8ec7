//! Messages, request ids, and the typed request builder.

use std::fmt;

use serde::Serialize;

use crate::address;
use crate::argument::{ArgCursor, Argument};
use crate::codec::encode_message;
use crate::error::EncodeError;

/// Integer tag correlating a request with its responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(i32);

impl RequestId {
    /// The first id handed out in a session.
    pub const FIRST: Self = Self(1);

    /// Wraps a raw id as carried on the wire.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Returns the id following this one, or `None` once ids are exhausted.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A decoded message: an address pattern and its ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    address: String,
    arguments: Vec<Argument>,
}

impl Message {
    /// Builds a message from its parts.
    #[must_use]
    pub fn new(address: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Self {
            address: address.into(),
            arguments,
        }
    }

    /// The address pattern, for example `/eval`.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// All arguments, including the leading request id.
    #[must_use]
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Returns true when the address pattern equals `address`.
    #[must_use]
    pub fn matches(&self, address: &str) -> bool {
        self.address == address
    }

    /// A cursor over every argument.
    #[must_use]
    pub fn cursor(&self) -> ArgCursor<'_> {
        ArgCursor::new(&self.arguments)
    }

    /// Splits off the leading request id.
    ///
    /// Returns `None` when the first argument is missing or not an integer;
    /// such a message cannot be correlated with a request.
    #[must_use]
    pub fn correlate(&self) -> Option<(RequestId, ArgCursor<'_>)> {
        let mut cursor = self.cursor();
        let id = cursor.pop_int()?;
        Some((RequestId::new(id), cursor))
    }

    /// Encodes the message to its wire representation.
    ///
    /// # Errors
    ///
    /// See [`encode_message`].
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        encode_message(&self.address, &self.arguments)
    }
}

/// A request waiting for an id.
///
/// Arguments are appended through typed methods so a value can never
/// disagree with the type tag written for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    address: String,
    arguments: Vec<Argument>,
}

impl Request {
    /// Starts a request for `address` with no arguments beyond the id.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            arguments: Vec::new(),
        }
    }

    /// Subscribes to or unsubscribes from a named event channel.
    #[must_use]
    pub fn listen(channel: impl Into<String>, enabled: bool) -> Self {
        Self::new(address::LISTEN).string(channel).boolean(enabled)
    }

    /// Asks the peer to execute a command string.
    #[must_use]
    pub fn eval(command: impl Into<String>) -> Self {
        Self::new(address::EVAL).string(command)
    }

    /// Appends an integer argument.
    #[must_use]
    pub fn int(mut self, value: i32) -> Self {
        self.arguments.push(Argument::Int(value));
        self
    }

    /// Appends a boolean argument.
    #[must_use]
    pub fn boolean(mut self, value: bool) -> Self {
        self.arguments.push(Argument::Bool(value));
        self
    }

    /// Appends a string argument.
    #[must_use]
    pub fn string(mut self, value: impl Into<String>) -> Self {
        self.arguments.push(Argument::Str(value.into()));
        self
    }

    /// The address pattern this request targets.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Arguments following the request id.
    #[must_use]
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Produces the message sent for `id`, with the id as first argument.
    #[must_use]
    pub fn to_message(&self, id: RequestId) -> Message {
        let mut arguments = Vec::with_capacity(self.arguments.len() + 1);
        arguments.push(Argument::Int(id.get()));
        arguments.extend(self.arguments.iter().cloned());
        Message::new(self.address.clone(), arguments)
    }

    /// Encodes the request for `id`.
    ///
    /// # Errors
    ///
    /// See [`encode_message`].
    pub fn encode(&self, id: RequestId) -> Result<Vec<u8>, EncodeError> {
        self.to_message(id).encode()
    }
}
