//! Minimal RPC transport for byte-oriented links.
//!
//! linkrpc connects a host process to a peer (often a microcontroller on a
//! serial line) with three layers:
//!
//! - [`codec`]: a compact, self-describing encoding for short sequences of
//!   typed values
//! - [`frame`]: CRC-checked framing that finds frames in a continuous byte
//!   stream and recovers from noise on its own
//! - [`rpc`]: function-id dispatch and calls (behind the `rpc` feature)
//!
//! [`transport`] defines the byte source/sink capabilities the layers run
//! on, with Unix socket and in-memory links.

/// Re-export transport types.
pub mod transport {
    pub use linkrpc_transport::*;
}

/// Re-export value codec types.
pub mod codec {
    pub use linkrpc_codec::*;
}

/// Re-export frame types.
pub mod frame {
    pub use linkrpc_frame::*;
}

/// Re-export RPC types (requires `rpc` feature).
#[cfg(feature = "rpc")]
pub mod rpc {
    pub use linkrpc_rpc::*;
}
