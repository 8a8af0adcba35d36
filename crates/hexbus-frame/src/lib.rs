//! Hex-framed wire codec for single-character message indices.
//!
//! Every message on the wire is a short ASCII-safe frame:
//! - A 1-byte index identifying the message type
//! - The literal separator `-`
//! - The hex encoding of the payload (two digits per payload byte)
//!
//! The frame stays loggable on any serial console, and the decoded payload
//! length is always `(frame_len - 2) / 2`.

pub mod codec;
pub mod error;

pub use codec::{
    decode_frame, decode_frame_derived, derived_frame_len, encode_frame, Frame, HEADER_SIZE,
    MAX_PAYLOAD, SEPARATOR,
};
pub use error::{FrameError, Result};
