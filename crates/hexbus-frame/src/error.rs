/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The buffer is shorter than the 2-byte frame header.
    #[error("frame too short ({len} bytes, need at least 2)")]
    TooShort { len: usize },

    /// Byte 1 of the frame is not the `-` separator.
    #[error("missing '-' separator at byte 1 (found 0x{found:02x})")]
    MissingSeparator { found: u8 },

    /// The payload exceeds the maximum encodable size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The index byte collides with the frame separator.
    #[error("index byte '-' is reserved as the frame separator")]
    ReservedIndex,

    /// The payload run is not a whole number of hex digit pairs.
    #[error("invalid hex payload: {0}")]
    Hex(#[from] hex::FromHexError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
