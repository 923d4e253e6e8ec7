//! Error types for message encoding, decoding, and framing.

use std::io;

use thiserror::Error;

/// Errors raised while serialising a message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// Address patterns must start with `/`.
    #[error("address pattern '{0}' must start with '/'")]
    InvalidAddress(String),
    /// Strings are NUL-terminated on the wire.
    #[error("string argument at position {index} contains a NUL byte")]
    InteriorNul {
        /// Zero-based argument position, counting the request id.
        index: usize,
    },
}

/// Errors raised while parsing a received payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload ended before the element being read was complete.
    #[error("payload truncated at offset {offset}")]
    Truncated {
        /// Offset at which more bytes were required.
        offset: usize,
    },
    /// A string was not terminated within the payload.
    #[error("unterminated string at offset {offset}")]
    UnterminatedString {
        /// Offset of the string's first byte.
        offset: usize,
    },
    /// A string was not valid UTF-8.
    #[error("string at offset {offset} is not valid UTF-8")]
    InvalidUtf8 {
        /// Offset of the string's first byte.
        offset: usize,
    },
    /// The payload was neither a message nor a bundle.
    #[error("payload does not start with an address pattern or bundle marker")]
    NotAMessage,
    /// The type tag string did not start with `,`.
    #[error("type tag string '{0}' must start with ','")]
    MissingTypeTags(String),
    /// A type tag outside the supported set was received.
    #[error("unsupported argument type tag '{0}'")]
    UnsupportedTag(char),
    /// A bundle element declared a size that does not fit the bundle.
    #[error("bundle element size {size} is invalid at offset {offset}")]
    InvalidElementSize {
        /// Declared element size.
        size: i32,
        /// Offset of the size field.
        offset: usize,
    },
    /// Bytes remained after the last argument.
    #[error("{0} unexpected trailing bytes after message arguments")]
    TrailingBytes(usize),
}

/// Errors raised while reading or writing length-prefixed frames.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The stream ended cleanly on a frame boundary.
    #[error("connection closed")]
    Closed,
    /// The stream ended inside a length prefix or payload.
    #[error("frame truncated: expected {expected} bytes, received {received}")]
    Truncated {
        /// Bytes the frame declared.
        expected: usize,
        /// Bytes actually read before end of stream.
        received: usize,
    },
    /// A frame declared a zero-length payload.
    #[error("frame declared an empty payload")]
    Empty,
    /// A frame declared or carried a payload at or above the maximum.
    #[error("frame length {length} exceeds the maximum of {max} bytes")]
    Oversized {
        /// Declared or actual payload length.
        length: usize,
        /// Exclusive upper bound on payload length.
        max: usize,
    },
    /// The underlying stream failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}
