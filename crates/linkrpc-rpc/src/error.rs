use linkrpc_codec::Value;

/// Errors that can occur while calling or dispatching.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The arguments could not be encoded, or a payload could not be decoded.
    #[error("codec error: {0}")]
    Codec(#[from] linkrpc_codec::CodecError),

    /// The frame could not be written.
    #[error("frame error: {0}")]
    Frame(#[from] linkrpc_frame::FrameError),

    /// The payload decoded to an empty value sequence.
    #[error("rpc payload carries no function id")]
    MissingFunctionId,

    /// The first value is not an integer in the UInt16 range.
    #[error("invalid function id: {0:?}")]
    InvalidFunctionId(Value),

    /// A frame of another type reached the RPC layer.
    #[error("rpc given frame type {actual}, expected {expected}")]
    WrongFrameType { expected: u16, actual: u16 },

    /// The reader thread could not be started.
    #[error("failed to spawn reader thread: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RpcError>;
