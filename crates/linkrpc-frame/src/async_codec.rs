//! Resynchronizing `tokio_util` codec for async byte streams.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::assembler::FrameAssembler;
use crate::codec::{encode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};

/// Frame codec for use with `FramedRead`/`FramedWrite`.
///
/// Decoding runs the same byte-at-a-time state machine as the blocking
/// parser, so noise between frames is skipped rather than reported.
#[derive(Debug)]
pub struct FrameCodec {
    assembler: FrameAssembler,
    max_frame_size: usize,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::with_config(&FrameConfig::default())
    }

    pub fn with_config(config: &FrameConfig) -> Self {
        Self {
            assembler: FrameAssembler::with_max_frame_size(config.max_frame_size),
            max_frame_size: config.max_frame_size,
        }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        while src.has_remaining() {
            let byte = src.get_u8();
            if let Some(frame) = self.assembler.push(byte) {
                trace!(
                    frame_type = frame.frame_type,
                    size = frame.size(),
                    "decoded frame"
                );
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        if item.size() > self.max_frame_size {
            return Err(FrameError::PayloadTooLarge {
                size: item.size(),
                max: self.max_frame_size,
            });
        }
        encode_frame(item.frame_type, &item.payload, dst)
    }
}
