use crate::crc::crc16;
use crate::error::{FrameError, Result};
use crate::frame_types::is_valid;

/// Header: type (2) + size (2) + crc (2) = 6 bytes.
pub const HEADER_SIZE: usize = 6;

/// A validated frame header.
///
/// ```text
/// ┌──────────────┬──────────────┬──────────────────────────┐
/// │ Type (2B BE) │ Size (2B BE) │ CRC16(type ‖ size) (2B)  │
/// └──────────────┴──────────────┴──────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    frame_type: u16,
    size: u16,
    crc: u16,
}

impl Header {
    /// Build a header for an outbound frame, computing its checksum.
    ///
    /// Only type 0 is rejected; a zero-size frame is valid.
    pub fn new(frame_type: u16, size: u16) -> Result<Self> {
        if !is_valid(frame_type) {
            return Err(FrameError::ZeroType);
        }
        Ok(Self {
            frame_type,
            size,
            crc: checksum(frame_type, size),
        })
    }

    /// Parse and validate a candidate header window.
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Result<Self> {
        let frame_type = u16::from_be_bytes([bytes[0], bytes[1]]);
        let size = u16::from_be_bytes([bytes[2], bytes[3]]);
        let crc = u16::from_be_bytes([bytes[4], bytes[5]]);

        if !is_valid(frame_type) {
            return Err(FrameError::ZeroType);
        }
        let expected = checksum(frame_type, size);
        if crc != expected {
            return Err(FrameError::CrcMismatch {
                expected,
                actual: crc,
            });
        }
        Ok(Self {
            frame_type,
            size,
            crc,
        })
    }

    pub fn frame_type(&self) -> u16 {
        self.frame_type
    }

    /// Declared payload length in bytes.
    pub fn size(&self) -> u16 {
        self.size
    }

    pub fn crc(&self) -> u16 {
        self.crc
    }

    /// Wire representation.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let [t0, t1] = self.frame_type.to_be_bytes();
        let [s0, s1] = self.size.to_be_bytes();
        let [c0, c1] = self.crc.to_be_bytes();
        [t0, t1, s0, s1, c0, c1]
    }
}

fn checksum(frame_type: u16, size: u16) -> u16 {
    let [t0, t1] = frame_type.to_be_bytes();
    let [s0, s1] = size.to_be_bytes();
    crc16(&[t0, t1, s0, s1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_computes_crc() {
        let header = Header::new(8, 25).unwrap();
        assert_eq!(header.crc(), 0xAE79);
        assert_eq!(header.to_bytes(), [0x00, 0x08, 0x00, 0x19, 0xAE, 0x79]);
    }

    #[test]
    fn parse_accepts_valid_header() {
        let header = Header::parse(&[0x00, 0x08, 0x00, 0x19, 0xAE, 0x79]).unwrap();
        assert_eq!(header.frame_type(), 8);
        assert_eq!(header.size(), 25);
    }

    #[test]
    fn parse_rejects_bad_crc() {
        let err = Header::parse(&[0x00, 0x08, 0x00, 0x19, 0x79, 0xAE]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::CrcMismatch {
                expected: 0xAE79,
                actual: 0x79AE
            }
        ));
    }

    #[test]
    fn type_zero_is_rejected_both_ways() {
        assert!(matches!(Header::new(0, 4), Err(FrameError::ZeroType)));
        assert!(matches!(Header::new(0, 0), Err(FrameError::ZeroType)));

        let [c0, c1] = checksum(0, 4).to_be_bytes();
        let window = [0, 0, 0, 4, c0, c1];
        assert!(matches!(Header::parse(&window), Err(FrameError::ZeroType)));
    }

    #[test]
    fn header_accepts_exactly_the_valid_types() {
        for frame_type in [0, 1, crate::frame_types::RPC, u16::MAX] {
            let built = Header::new(frame_type, 1);
            assert_eq!(built.is_ok(), is_valid(frame_type), "type {frame_type}");
            if let Ok(header) = built {
                assert_eq!(Header::parse(&header.to_bytes()).unwrap(), header);
            }
        }
    }

    #[test]
    fn zero_size_is_valid() {
        let header = Header::new(3, 0).unwrap();
        assert_eq!(Header::parse(&header.to_bytes()).unwrap(), header);
    }

    #[test]
    fn all_zero_window_is_not_a_header() {
        assert!(Header::parse(&[0; HEADER_SIZE]).is_err());
    }
}
