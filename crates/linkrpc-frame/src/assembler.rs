use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::codec::{Frame, DEFAULT_MAX_FRAME_SIZE};
use crate::header::{Header, HEADER_SIZE};

/// Observable state of a [`FrameAssembler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    /// Hunting for a header in the rolling window.
    Idle,
    /// A header was accepted; payload bytes are being collected.
    Collecting {
        frame_type: u16,
        size: u16,
        received: usize,
    },
}

/// Byte-at-a-time frame recognizer.
///
/// While idle, every incoming byte is shifted into a 6-byte window and the
/// window is tested as a header. A window that fails the CRC or carries
/// type 0 is noise and the hunt continues with the next byte, so the
/// assembler resynchronizes by itself after corruption or loss.
///
/// Once a header is accepted the window is cleared and exactly `size`
/// payload bytes are collected. Every completed frame returns the
/// assembler to idle.
#[derive(Debug)]
pub struct FrameAssembler {
    window: [u8; HEADER_SIZE],
    header: Option<Header>,
    payload: BytesMut,
    max_frame_size: usize,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create an assembler that ignores headers declaring more than
    /// `max_frame_size` payload bytes.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            window: [0; HEADER_SIZE],
            header: None,
            payload: BytesMut::new(),
            max_frame_size,
        }
    }

    /// Advance the state machine by one byte.
    ///
    /// Returns a frame when `byte` completes one.
    pub fn push(&mut self, byte: u8) -> Option<Frame> {
        match self.header {
            None => self.hunt(byte),
            Some(header) => self.collect(header, byte),
        }
    }

    pub fn state(&self) -> AssemblerState {
        match self.header {
            None => AssemblerState::Idle,
            Some(header) => AssemblerState::Collecting {
                frame_type: header.frame_type(),
                size: header.size(),
                received: self.payload.len(),
            },
        }
    }

    /// Abandon any frame in progress and clear the header window.
    pub fn reset(&mut self) {
        if let Some(header) = self.header.take() {
            debug!(
                frame_type = header.frame_type(),
                received = self.payload.len(),
                size = header.size(),
                "abandoning partial frame"
            );
        }
        self.window = [0; HEADER_SIZE];
        self.payload.clear();
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    pub fn set_max_frame_size(&mut self, max_frame_size: usize) {
        self.max_frame_size = max_frame_size;
    }

    fn hunt(&mut self, byte: u8) -> Option<Frame> {
        self.window.copy_within(1.., 0);
        self.window[HEADER_SIZE - 1] = byte;

        let header = Header::parse(&self.window).ok()?;
        let size = usize::from(header.size());
        if size > self.max_frame_size {
            // A CRC-valid window can still be noise; an impossible size
            // marks it as such.
            trace!(
                frame_type = header.frame_type(),
                size,
                max = self.max_frame_size,
                "ignoring header with oversize payload"
            );
            return None;
        }

        self.window = [0; HEADER_SIZE];
        trace!(frame_type = header.frame_type(), size, "header accepted");

        if size == 0 {
            return Some(Frame::new(header.frame_type(), Bytes::new()));
        }
        self.payload.clear();
        self.payload.reserve(size);
        self.header = Some(header);
        None
    }

    fn collect(&mut self, header: Header, byte: u8) -> Option<Frame> {
        self.payload.put_u8(byte);
        if self.payload.len() < usize::from(header.size()) {
            return None;
        }
        self.header = None;
        Some(Frame::new(header.frame_type(), self.payload.split().freeze()))
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}
