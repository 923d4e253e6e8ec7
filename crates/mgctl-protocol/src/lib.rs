//! Wire protocol for the MoltenGamepad control socket.
//!
//! Requests and responses are addressed messages with typed positional
//! arguments. By convention the first argument of every request and response
//! is the [`RequestId`] correlating them. Each message travels in a
//! length-prefixed [frame](frame).

pub mod address;
mod argument;
mod codec;
mod error;
pub mod frame;
mod message;

pub use argument::{ArgCursor, Argument};
pub use codec::{decode_packet, encode_message};
pub use error::{DecodeError, EncodeError, FrameError};
pub use frame::{FrameReader, MAX_FRAME_LEN, encode_frame, write_frame};
pub use message::{Message, Request, RequestId};
