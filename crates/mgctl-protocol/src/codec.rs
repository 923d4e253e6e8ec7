//! Message body codec.
//!
//! Payloads follow OSC 1.0:
//! ```text
//! <address>\0 pad4 | ,<tags>\0 pad4 | <argument data>...
//! ```
//! Integers are big-endian. Strings are NUL-terminated and padded with NUL
//! bytes to a multiple of four. Booleans carry no data beyond their tag. A
//! payload may also be a `#bundle`: the marker, an 8-byte time tag, and
//! size-prefixed elements that are themselves messages or bundles.

use crate::argument::Argument;
use crate::error::{DecodeError, EncodeError};
use crate::message::Message;

const BUNDLE_MARKER: &[u8] = b"#bundle\0";
const TIME_TAG_LEN: usize = 8;

/// Serialises one message.
///
/// The output is a pure function of the inputs.
///
/// # Errors
///
/// Returns [`EncodeError::InvalidAddress`] when `address` does not start with
/// `/` or contains a NUL byte, and [`EncodeError::InteriorNul`] when a string
/// argument contains a NUL byte.
#[expect(clippy::big_endian_bytes, reason = "OSC integers are big-endian")]
pub fn encode_message(address: &str, arguments: &[Argument]) -> Result<Vec<u8>, EncodeError> {
    if !address.starts_with('/') || address.contains('\0') {
        return Err(EncodeError::InvalidAddress(address.to_owned()));
    }

    let mut tags = Vec::with_capacity(arguments.len() + 1);
    tags.push(b',');
    tags.extend(arguments.iter().map(Argument::type_tag));

    let mut buffer = Vec::with_capacity(64);
    push_padded(&mut buffer, address.as_bytes());
    push_padded(&mut buffer, &tags);
    for (index, argument) in arguments.iter().enumerate() {
        match argument {
            Argument::Int(value) => buffer.extend_from_slice(&value.to_be_bytes()),
            Argument::Bool(_) => {}
            Argument::Str(value) => {
                if value.contains('\0') {
                    return Err(EncodeError::InteriorNul { index });
                }
                push_padded(&mut buffer, value.as_bytes());
            }
        }
    }
    Ok(buffer)
}

/// Parses every message contained in `payload`, flattening bundles.
///
/// # Errors
///
/// Returns a [`DecodeError`] describing the first malformed element; no
/// partial results are returned.
pub fn decode_packet(payload: &[u8]) -> Result<Vec<Message>, DecodeError> {
    let mut messages = Vec::new();
    decode_into(payload, 0, &mut messages)?;
    Ok(messages)
}

fn decode_into(
    payload: &[u8],
    base_offset: usize,
    messages: &mut Vec<Message>,
) -> Result<(), DecodeError> {
    if payload.starts_with(BUNDLE_MARKER) {
        decode_bundle(payload, base_offset, messages)
    } else if payload.first() == Some(&b'/') {
        messages.push(decode_message(payload, base_offset)?);
        Ok(())
    } else if payload.is_empty() {
        Err(DecodeError::Truncated {
            offset: base_offset,
        })
    } else {
        Err(DecodeError::NotAMessage)
    }
}

fn decode_bundle(
    payload: &[u8],
    base_offset: usize,
    messages: &mut Vec<Message>,
) -> Result<(), DecodeError> {
    let mut reader = Reader::new(payload, base_offset);
    reader.take(BUNDLE_MARKER.len() + TIME_TAG_LEN)?;
    while !reader.is_empty() {
        let size_offset = reader.offset();
        let size = reader.read_i32()?;
        let length = usize::try_from(size)
            .ok()
            .filter(|length| *length > 0 && length % 4 == 0 && *length <= reader.len())
            .ok_or(DecodeError::InvalidElementSize {
                size,
                offset: size_offset,
            })?;
        let element_offset = reader.offset();
        let element = reader.take(length)?;
        decode_into(element, element_offset, messages)?;
    }
    Ok(())
}

fn decode_message(payload: &[u8], base_offset: usize) -> Result<Message, DecodeError> {
    let mut reader = Reader::new(payload, base_offset);
    let address = reader.read_string()?;
    if reader.is_empty() {
        return Ok(Message::new(address, Vec::new()));
    }

    let tags = reader.read_string()?;
    let Some(tags_body) = tags.strip_prefix(',') else {
        return Err(DecodeError::MissingTypeTags(tags));
    };

    let mut arguments = Vec::with_capacity(tags_body.len());
    for tag in tags_body.chars() {
        let argument = match tag {
            'i' => Argument::Int(reader.read_i32()?),
            'T' => Argument::Bool(true),
            'F' => Argument::Bool(false),
            's' => Argument::Str(reader.read_string()?),
            other => return Err(DecodeError::UnsupportedTag(other)),
        };
        arguments.push(argument);
    }

    if !reader.is_empty() {
        return Err(DecodeError::TrailingBytes(reader.len()));
    }
    Ok(Message::new(address, arguments))
}

fn push_padded(buffer: &mut Vec<u8>, bytes: &[u8]) {
    buffer.extend_from_slice(bytes);
    buffer.push(0);
    while buffer.len() % 4 != 0 {
        buffer.push(0);
    }
}

const fn padded_len(length: usize) -> usize {
    (length + 3) & !3
}

/// Bounds-checked cursor over a payload slice.
struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    const fn new(bytes: &'a [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    const fn len(&self) -> usize {
        self.bytes.len()
    }

    const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    const fn offset(&self) -> usize {
        self.offset
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        if count > self.bytes.len() {
            return Err(DecodeError::Truncated {
                offset: self.offset,
            });
        }
        let (head, tail) = self.bytes.split_at(count);
        self.bytes = tail;
        self.offset += count;
        Ok(head)
    }

    #[expect(clippy::big_endian_bytes, reason = "OSC integers are big-endian")]
    fn read_i32(&mut self) -> Result<i32, DecodeError> {
        let offset = self.offset;
        let bytes = self.take(4)?;
        let array: [u8; 4] = bytes
            .try_into()
            .map_err(|_| DecodeError::Truncated { offset })?;
        Ok(i32::from_be_bytes(array))
    }

    fn read_string(&mut self) -> Result<String, DecodeError> {
        let offset = self.offset;
        let terminator = self
            .bytes
            .iter()
            .position(|byte| *byte == 0)
            .ok_or(DecodeError::UnterminatedString { offset })?;
        let padded = self.take(padded_len(terminator + 1))?;
        let text = padded
            .get(..terminator)
            .ok_or(DecodeError::Truncated { offset })?;
        String::from_utf8(text.to_vec()).map_err(|_| DecodeError::InvalidUtf8 { offset })
    }
}
