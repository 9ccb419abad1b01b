/// Errors that can occur while framing or unframing.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Frame type 0 is reserved as the "no header" sentinel.
    #[error("frame type 0 is reserved")]
    ZeroType,

    /// The header checksum does not match its type and size fields.
    #[error("header crc mismatch (expected 0x{expected:04x}, got 0x{actual:04x})")]
    CrcMismatch { expected: u16, actual: u16 },

    /// The payload does not fit the size field or the configured maximum.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The underlying link failed.
    #[error("frame transport error: {0}")]
    Transport(#[from] linkrpc_transport::TransportError),

    /// The link stopped accepting bytes part-way through a frame.
    #[error("link closed (incomplete frame)")]
    Closed,
}

pub type Result<T> = std::result::Result<T, FrameError>;

impl From<std::io::Error> for FrameError {
    fn from(err: std::io::Error) -> Self {
        FrameError::Transport(linkrpc_transport::TransportError::Io(err))
    }
}
