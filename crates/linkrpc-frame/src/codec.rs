use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::header::{Header, HEADER_SIZE};

/// Default largest payload a receiver will collect: 1 KiB.
///
/// Links in this family often end at a microcontroller with a fixed receive
/// buffer, so the default is deliberately small.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024;

/// Default pause between polls when the byte source has no data.
pub const DEFAULT_IDLE_BACKOFF: Duration = Duration::from_millis(1);

/// A complete, validated frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame type from the header; selects the handler.
    pub frame_type: u16,
    /// Exactly `header.size` payload bytes.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(frame_type: u16, payload: impl Into<Bytes>) -> Self {
        Self {
            frame_type,
            payload: payload.into(),
        }
    }

    /// Payload length in bytes.
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format, appending to `dst`.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────┬──────────┬──────────────────┐
/// │ Type     │ Size     │ CRC16    │ Payload          │
/// │ (2B BE)  │ (2B BE)  │ (2B BE)  │ (Size bytes)     │
/// └──────────┴──────────┴──────────┴──────────────────┘
/// ```
pub fn encode_frame(frame_type: u16, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let size = u16::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: payload.len(),
        max: u16::MAX as usize,
    })?;
    let header = Header::new(frame_type, size)?;

    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&header.to_bytes());
    dst.put_slice(payload);
    Ok(())
}

/// Wrap a payload with a freshly computed header, ready for a byte sink.
pub fn wrap(frame_type: u16, payload: &[u8]) -> Result<Bytes> {
    let mut dst = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    encode_frame(frame_type, payload, &mut dst)?;
    Ok(dst.freeze())
}

/// Configuration for framing on one link.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Largest payload a receiver collects; bigger declared sizes are
    /// treated as noise. Senders refuse to emit bigger frames. Default: 1 KiB.
    pub max_frame_size: usize,
    /// Sleep between polls while the source reports no data.
    /// `None` retries immediately.
    pub idle_backoff: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            idle_backoff: Some(DEFAULT_IDLE_BACKOFF),
        }
    }
}
