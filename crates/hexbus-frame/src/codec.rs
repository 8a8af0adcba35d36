use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: index (1) + separator (1) = 2 bytes.
pub const HEADER_SIZE: usize = 2;

/// Separator between the index byte and the hex payload.
pub const SEPARATOR: u8 = b'-';

/// Maximum payload size in raw bytes. Message lengths are 16-bit quantities
/// on the wire protocols this codec targets.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// A framed message: one index byte plus the decoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The message type index.
    pub index: u8,
    /// The decoded payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(index: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            index,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + hex digits).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + 2 * self.payload.len()
    }
}

/// Encode a payload into the wire format, appending to `dst`.
///
/// Wire format:
/// ```text
/// ┌────────────┬───────────┬─────────────────────────┐
/// │ Index (1B) │ Sep (1B)  │ Hex payload (2B / byte) │
/// │ any != '-' │ '-'       │ lowercase hex digits    │
/// └────────────┴───────────┴─────────────────────────┘
/// ```
///
/// The index may be any byte except the separator itself; printable ASCII
/// keeps frames loggable. Callers holding a C-style NUL-terminated buffer
/// derive the slice first (e.g. `CStr::to_bytes`).
pub fn encode_frame(index: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if index == SEPARATOR {
        return Err(FrameError::ReservedIndex);
    }
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(HEADER_SIZE + 2 * payload.len());
    dst.put_u8(index);
    dst.put_u8(SEPARATOR);
    dst.put_slice(hex::encode(payload).as_bytes());
    Ok(())
}

/// Decode a frame from a buffer whose length is the frame's logical size.
///
/// A two-byte frame (`"A-"`) is valid and carries an empty payload. Hex
/// transcoding is delegated entirely to the `hex` codec; odd-length or
/// non-digit payload runs surface as [`FrameError::Hex`].
pub fn decode_frame(frame: &[u8]) -> Result<Frame> {
    if frame.len() < HEADER_SIZE {
        return Err(FrameError::TooShort { len: frame.len() });
    }
    if frame[1] != SEPARATOR {
        return Err(FrameError::MissingSeparator { found: frame[1] });
    }
    let payload = if frame.len() > HEADER_SIZE {
        Bytes::from(hex::decode(&frame[HEADER_SIZE..])?)
    } else {
        Bytes::new()
    };
    Ok(Frame {
        index: frame[0],
        payload,
    })
}

/// Legacy derivation of a frame's logical size from its buffer length:
/// `floor(len / 2) - 1`.
///
/// This is a best-effort approximation, not an inverse of [`encode_frame`]:
/// the 2-byte header is not hex-encoded while the remainder is, so the
/// arithmetic under-counts and the derived size truncates the frame. It is
/// kept only for compatibility with callers that cannot supply a logical
/// size. Prefer passing the real frame length (the slice length) to
/// [`decode_frame`].
pub fn derived_frame_len(frame: &[u8]) -> usize {
    (frame.len() / 2).saturating_sub(1)
}

/// Decode a frame using the [`derived_frame_len`] approximation as its
/// logical size. Compatibility fallback; see `derived_frame_len` for the
/// caveats.
pub fn decode_frame_derived(frame: &[u8]) -> Result<Frame> {
    let len = derived_frame_len(frame).min(frame.len());
    decode_frame(&frame[..len])
}
