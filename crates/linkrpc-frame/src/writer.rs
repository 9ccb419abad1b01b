use bytes::BytesMut;
use linkrpc_transport::ByteSink;

use crate::codec::{encode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Writes complete frames to a byte sink.
///
/// Each frame is encoded into a reused buffer and written in full before
/// `send` returns, so frames from one writer never interleave.
pub struct FrameWriter<S> {
    sink: S,
    buf: BytesMut,
    config: FrameConfig,
}

impl<S: ByteSink> FrameWriter<S> {
    /// Create a new frame writer with default configuration.
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(sink: S, config: FrameConfig) -> Self {
        Self {
            sink,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send(frame.frame_type, frame.payload.as_ref())
    }

    /// Wrap `payload` in a header of type `frame_type` and send it.
    pub fn send(&mut self, frame_type: u16, payload: &[u8]) -> Result<()> {
        if payload.len() > self.config.max_frame_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_frame_size,
            });
        }

        self.buf.clear();
        encode_frame(frame_type, payload, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.sink.write_bytes(&self.buf[offset..])? {
                0 => return Err(FrameError::Closed),
                n => offset += n,
            }
        }

        self.flush()
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    /// Mutably borrow the underlying sink.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the writer and return the sink.
    pub fn into_inner(self) -> S {
        self.sink
    }

    /// Update the largest payload accepted by subsequent sends.
    pub fn set_max_frame_size(&mut self, max_frame_size: usize) {
        self.config.max_frame_size = max_frame_size;
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<S> std::fmt::Debug for FrameWriter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameWriter")
            .field("buffered", &self.buf.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
