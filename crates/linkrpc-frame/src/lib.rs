//! CRC-checked stream framing for byte-oriented links.
//!
//! Every frame on the wire starts with a 6-byte header:
//! - A 2-byte big-endian frame type (never 0)
//! - A 2-byte big-endian payload size
//! - A 2-byte big-endian CRC-16 of the four bytes above
//!
//! There is no magic number or escaping. A receiver finds frames by testing
//! every 6-byte window of the stream as a candidate header, which also makes
//! it resynchronize on its own after noise or dropped bytes.

pub mod assembler;
#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod crc;
pub mod error;
pub mod frame_types;
pub mod handler;
pub mod header;
pub mod parser;
pub mod writer;

pub use assembler::{AssemblerState, FrameAssembler};
#[cfg(feature = "async")]
pub use async_codec::FrameCodec;
pub use codec::{encode_frame, wrap, Frame, FrameConfig, DEFAULT_MAX_FRAME_SIZE};
pub use crc::crc16;
pub use error::{FrameError, Result};
pub use frame_types::RPC;
pub use handler::{FrameHandler, HandlerRegistry};
pub use header::{Header, HEADER_SIZE};
pub use parser::{ReadLoopExit, StreamParser};
pub use writer::FrameWriter;
