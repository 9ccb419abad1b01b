//! Well-known frame types.
//!
//! Type 0 never appears on the wire. Every other value is free for
//! application use; only the RPC type is fixed here.

/// RPC messages: a serialized value sequence led by a UInt16 function id.
pub const RPC: u16 = 8;

/// Returns a human-readable name for a frame type.
pub fn type_name(frame_type: u16) -> &'static str {
    match frame_type {
        0 => "INVALID",
        RPC => "RPC",
        _ => "USER",
    }
}

/// Returns true if `frame_type` may appear in a header.
pub fn is_valid(frame_type: u16) -> bool {
    frame_type != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(type_name(RPC), "RPC");
        assert_eq!(type_name(0), "INVALID");
        assert_eq!(type_name(1), "USER");
        assert_eq!(type_name(u16::MAX), "USER");
    }

    #[test]
    fn zero_is_the_only_invalid_type() {
        assert!(!is_valid(0));
        assert!(is_valid(1));
        assert!(is_valid(RPC));
    }
}
