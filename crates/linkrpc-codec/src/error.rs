use crate::value::ValueType;

/// Errors that can occur while encoding or decoding values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// More values than the one-byte count field can describe.
    #[error("too many values ({count}, max {max})")]
    TooManyValues { count: usize, max: usize },

    /// An integer does not fit the width of its declared type.
    #[error("value {value} out of range for {ty}")]
    OutOfRange { ty: ValueType, value: i64 },

    /// A string is longer than the one-byte length field allows.
    #[error("string too long ({len} bytes, max {max})")]
    StringTooLong { len: usize, max: usize },

    /// A maximum-length string ends in NUL and would lose that byte on decode.
    #[error("string of {len} bytes cannot end in NUL")]
    AmbiguousTerminator { len: usize },

    /// A type id that maps to no known type.
    #[error("unknown type id 0x{0:02x}")]
    UnknownType(u8),

    /// A known type the codec has no rule for.
    #[error("unsupported type {0}")]
    UnsupportedType(ValueType),

    /// The buffer ended before the layout said it would.
    #[error("buffer truncated (need {needed} bytes, have {available})")]
    Truncated { needed: usize, available: usize },

    /// A string payload is not valid UTF-8.
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,
}

pub type Result<T> = std::result::Result<T, CodecError>;
