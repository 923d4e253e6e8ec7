//! Length-prefixed framing for message payloads.
//!
//! ```text
//! ┌────────────────┬──────────────────────┐
//! │ Length         │ Payload              │
//! │ u32, 4 bytes   │ Length bytes         │
//! │ little-endian  │ one message/bundle   │
//! └────────────────┴──────────────────────┘
//! ```
//!
//! Payload lengths must be non-zero and strictly below [`MAX_FRAME_LEN`].

use std::io::{self, Read, Write};

use crate::error::FrameError;

/// Exclusive upper bound on payload length.
pub const MAX_FRAME_LEN: usize = 128 * 1024;

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Prepends the length prefix to `payload`.
///
/// # Errors
///
/// Returns [`FrameError::Empty`] or [`FrameError::Oversized`] when the peer
/// would reject the frame.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let prefix = length_prefix(payload.len())?;
    let mut frame = Vec::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    frame.extend_from_slice(&prefix);
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Writes `payload` as one frame and flushes the writer.
///
/// # Errors
///
/// Returns the bound violations of [`encode_frame`] or the writer's IO error.
pub fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError>
where
    W: Write + ?Sized,
{
    let frame = encode_frame(payload)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

#[expect(clippy::little_endian_bytes, reason = "peer writes native u32 length")]
fn length_prefix(length: usize) -> Result<[u8; LENGTH_PREFIX_LEN], FrameError> {
    validate_length(length)?;
    let declared = u32::try_from(length).map_err(|_| FrameError::Oversized {
        length,
        max: MAX_FRAME_LEN,
    })?;
    Ok(declared.to_le_bytes())
}

fn validate_length(length: usize) -> Result<(), FrameError> {
    if length == 0 {
        return Err(FrameError::Empty);
    }
    if length >= MAX_FRAME_LEN {
        return Err(FrameError::Oversized {
            length,
            max: MAX_FRAME_LEN,
        });
    }
    Ok(())
}

/// Reads whole frames from a byte stream.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
}

impl<R: Read> FrameReader<R> {
    /// Wraps a readable stream.
    pub const fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Blocks until one complete frame payload has been read.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Closed`] when the stream ends before any prefix
    /// byte, [`FrameError::Truncated`] when it ends mid-frame,
    /// [`FrameError::Empty`]/[`FrameError::Oversized`] for out-of-bounds
    /// lengths, and [`FrameError::Io`] for stream failures.
    #[expect(clippy::little_endian_bytes, reason = "peer writes native u32 length")]
    pub fn read_frame(&mut self) -> Result<Vec<u8>, FrameError> {
        let mut prefix = [0_u8; LENGTH_PREFIX_LEN];
        let received = read_full(&mut self.inner, &mut prefix)?;
        if received == 0 {
            return Err(FrameError::Closed);
        }
        if received < LENGTH_PREFIX_LEN {
            return Err(FrameError::Truncated {
                expected: LENGTH_PREFIX_LEN,
                received,
            });
        }

        let declared = u32::from_le_bytes(prefix);
        let length = usize::try_from(declared).map_err(|_| FrameError::Oversized {
            length: usize::MAX,
            max: MAX_FRAME_LEN,
        })?;
        validate_length(length)?;

        let mut payload = Vec::with_capacity(length);
        let body_len = (&mut self.inner)
            .take(declared.into())
            .read_to_end(&mut payload)?;
        if body_len < length {
            return Err(FrameError::Truncated {
                expected: length,
                received: body_len,
            });
        }
        Ok(payload)
    }
}

/// Fills `buffer` unless the stream ends first, returning the bytes read.
fn read_full<R: Read>(reader: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while let Some(remaining) = buffer.get_mut(filled..) {
        if remaining.is_empty() {
            break;
        }
        match reader.read(remaining) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error),
        }
    }
    Ok(filled)
}
